//! DELETE assembly and terminal.

use crate::builder::{Builder, State};
use crate::error::{Error, Result};
use crate::ident;

impl Builder {
    /// Execute the DELETE and return the affected-row count.
    ///
    /// Deleting without a WHERE clause requires `force = true`. SQLite's
    /// DELETE cannot carry JOIN, GROUP BY, HAVING, ORDER BY, LIMIT, or
    /// OFFSET; any of those set on the builder fails before dispatch.
    pub async fn delete(&mut self, force: bool) -> Result<u64> {
        let mut state = self.take_state();
        if let Some(err) = state.take_error() {
            return Err(err);
        }
        let sql = build_delete(&state, force)?;
        let args = state.where_clause.take_args();
        let result = self.database().execute(sql, args, state.timeout).await?;
        Ok(result.rows_affected)
    }
}

pub(crate) fn build_delete(state: &State, force: bool) -> Result<String> {
    if state.where_clause.is_empty() && !force {
        return Err(Error::validation(
            "delete without where requires force = true",
        ));
    }

    let table = state
        .table
        .as_deref()
        .ok_or_else(|| Error::validation("table name is required"))?;
    ident::validate(table)?;

    if !state.join_list.is_empty() {
        return Err(Error::unsupported("SQLite DELETE does not support JOIN"));
    }
    if !state.group_by.is_empty() {
        return Err(Error::unsupported(
            "SQLite DELETE does not support GROUP BY",
        ));
    }
    if !state.having_clause.is_empty() || state.having_clause.has_args() {
        return Err(Error::unsupported("SQLite DELETE does not support HAVING"));
    }
    if !state.order_by.is_empty() {
        return Err(Error::unsupported(
            "SQLite DELETE does not support ORDER BY",
        ));
    }
    if state.limit.is_some() || state.offset.is_some() {
        return Err(Error::unsupported(
            "SQLite DELETE does not support LIMIT / OFFSET",
        ));
    }

    let mut sql = String::from("DELETE FROM ");
    sql.push_str(&ident::quote(table));
    sql.push_str(&state.where_clause.render("WHERE"));
    Ok(sql)
}
