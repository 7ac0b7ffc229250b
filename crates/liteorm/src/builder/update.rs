//! UPDATE configuration, assembly, and terminal.

use rusqlite::types::Value;

use crate::builder::{Builder, State};
use crate::error::{Error, Result};
use crate::ident;
use crate::value::Values;

impl Builder {
    /// Append `"col" = "col" + 1` to the SET list.
    pub fn increase(&mut self, column: &str) -> &mut Self {
        self.increase_by(column, 1)
    }

    /// Append `"col" = "col" + n` to the SET list.
    pub fn increase_by(&mut self, column: &str, n: i64) -> &mut Self {
        match ident::validate(column) {
            Ok(()) => {
                let col = ident::quote(column);
                self.state.update_list.push(format!("{col} = {col} + {n}"));
            }
            Err(e) => self.record("increase", e),
        }
        self
    }

    /// Append `"col" = "col" - 1` to the SET list.
    pub fn decrease(&mut self, column: &str) -> &mut Self {
        self.decrease_by(column, 1)
    }

    /// Append `"col" = "col" - n` to the SET list.
    pub fn decrease_by(&mut self, column: &str, n: i64) -> &mut Self {
        match ident::validate(column) {
            Ok(()) => {
                let col = ident::quote(column);
                self.state.update_list.push(format!("{col} = {col} - {n}"));
            }
            Err(e) => self.record("decrease", e),
        }
        self
    }

    /// Append `"col" = NOT "col"` to the SET list.
    pub fn toggle(&mut self, column: &str) -> &mut Self {
        match ident::validate(column) {
            Ok(()) => {
                let col = ident::quote(column);
                self.state.update_list.push(format!("{col} = NOT {col}"));
            }
            Err(e) => self.record("toggle", e),
        }
        self
    }

    /// Execute the UPDATE and return the affected-row count.
    ///
    /// `data` is merged after any expressions queued by
    /// `increase`/`decrease`/`toggle`; passing an empty payload is fine as
    /// long as at least one such expression is queued.
    pub async fn update(&mut self, data: Values) -> Result<u64> {
        let mut state = self.take_state();
        if let Some(err) = state.take_error() {
            return Err(err);
        }
        let (sql, mut args) = build_update(&state, data)?;
        args.extend(state.where_clause.take_args());
        let result = self.database().execute(sql, args, state.timeout).await?;
        Ok(result.rows_affected)
    }
}

/// Assemble `UPDATE ... SET ... [WHERE ...]`; returns the SET arguments only
/// (WHERE arguments are appended by the caller, after them).
pub(crate) fn build_update(state: &State, data: Values) -> Result<(String, Vec<Value>)> {
    let table = state
        .table
        .as_deref()
        .ok_or_else(|| Error::validation("table name is required"))?;
    ident::validate(table)?;

    if data.is_empty() && state.update_list.is_empty() {
        return Err(Error::validation("no data defined"));
    }
    if let Some(err) = data.first_error() {
        return Err(err);
    }
    for key in data.keys() {
        ident::validate(key)?;
    }

    let mut parts: Vec<String> = state.update_list.clone();
    let mut args = Vec::with_capacity(data.len());
    for (key, value) in data.into_pairs() {
        parts.push(format!("{} = ?", ident::quote(&key)));
        args.push(value);
    }

    let mut sql = String::from("UPDATE ");
    sql.push_str(&ident::quote(table));
    sql.push_str(" SET ");
    sql.push_str(&parts.join(", "));
    sql.push_str(&state.where_clause.render("WHERE"));

    Ok((sql, args))
}
