//! CREATE TABLE assembly and terminal.

use crate::builder::{Builder, State};
use crate::error::{Error, Result};
use crate::ident;
use crate::schema::Column;

impl Builder {
    /// Execute `CREATE TABLE IF NOT EXISTS` with the given column
    /// definitions.
    pub async fn create(&mut self, columns: Vec<Column>) -> Result<()> {
        let mut state = self.take_state();
        if let Some(err) = state.take_error() {
            return Err(err);
        }
        let sql = build_create(&state, &columns)?;
        self.database().execute(sql, Vec::new(), state.timeout).await?;
        Ok(())
    }
}

pub(crate) fn build_create(state: &State, columns: &[Column]) -> Result<String> {
    let table = state
        .table
        .as_deref()
        .ok_or_else(|| Error::validation("table name is required"))?;
    ident::validate(table)?;

    if columns.is_empty() {
        return Err(Error::validation("no columns defined"));
    }

    let mut sql = String::from("CREATE TABLE IF NOT EXISTS ");
    sql.push_str(&ident::quote(table));
    sql.push_str(" (");

    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        ident::validate(&column.name)?;
        sql.push_str(&ident::quote(&column.name));
        sql.push(' ');
        sql.push_str(&column.definition()?);
    }

    sql.push(')');
    Ok(sql)
}
