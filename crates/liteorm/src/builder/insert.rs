//! INSERT configuration, assembly, and write terminals.

use rusqlite::types::Value;

use crate::builder::{Builder, State};
use crate::error::{Error, Result};
use crate::ident;
use crate::value::Values;

/// Conflict-resolution mode applied when an INSERT violates a constraint.
///
/// Maps 1:1 onto SQLite's `INSERT OR <mode>` keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    Ignore,
    Replace,
    Abort,
    Fail,
    Rollback,
}

impl Conflict {
    fn as_sql(self) -> &'static str {
        match self {
            Conflict::Ignore => "IGNORE",
            Conflict::Replace => "REPLACE",
            Conflict::Abort => "ABORT",
            Conflict::Fail => "FAIL",
            Conflict::Rollback => "ROLLBACK",
        }
    }
}

impl Builder {
    /// Set the conflict-resolution mode for the next `insert`/`upsert`.
    pub fn conflict(&mut self, mode: Conflict) -> &mut Self {
        self.state.conflict = Some(mode);
        self
    }

    /// Insert one row and return the last insert rowid.
    pub async fn insert(&mut self, data: Values) -> Result<i64> {
        let mut state = self.take_state();
        if let Some(err) = state.take_error() {
            return Err(err);
        }
        let (sql, args) = build_insert(&state, data, None)?;
        let result = self.database().execute(sql, args, state.timeout).await?;
        Ok(result.last_insert_rowid)
    }

    /// Insert one row with an `ON CONFLICT DO UPDATE SET` payload and return
    /// the last insert rowid.
    pub async fn upsert(&mut self, data: Values, on_conflict: Values) -> Result<i64> {
        let mut state = self.take_state();
        if let Some(err) = state.take_error() {
            return Err(err);
        }
        let (sql, args) = build_insert(&state, data, Some(on_conflict))?;
        let result = self.database().execute(sql, args, state.timeout).await?;
        Ok(result.last_insert_rowid)
    }

    /// Insert many rows in one multi-row VALUES statement and return the
    /// affected-row count.
    ///
    /// The first row's columns define the statement; every row must supply
    /// exactly the same column set.
    pub async fn insert_batch(&mut self, rows: Vec<Values>) -> Result<u64> {
        let mut state = self.take_state();
        if let Some(err) = state.take_error() {
            return Err(err);
        }
        let (sql, args) = build_insert_batch(&state, rows)?;
        let result = self.database().execute(sql, args, state.timeout).await?;
        Ok(result.rows_affected)
    }
}

fn validated_table(state: &State) -> Result<&str> {
    let table = state
        .table
        .as_deref()
        .ok_or_else(|| Error::validation("table name is required"))?;
    ident::validate(table)?;
    Ok(table)
}

/// Assemble `INSERT [OR <mode>] INTO ... VALUES (...)` with keys bound in
/// sorted order, plus an optional upsert payload.
pub(crate) fn build_insert(
    state: &State,
    data: Values,
    on_conflict: Option<Values>,
) -> Result<(String, Vec<Value>)> {
    let table = validated_table(state)?;

    if data.is_empty() {
        return Err(Error::validation("no data defined"));
    }
    if let Some(err) = data.first_error() {
        return Err(err);
    }
    for key in data.keys() {
        ident::validate(key)?;
    }

    let pairs = data.into_pairs();
    let mut columns = Vec::with_capacity(pairs.len());
    let mut args = Vec::with_capacity(pairs.len());
    for (key, value) in pairs {
        columns.push(ident::quote(&key));
        args.push(value);
    }
    let placeholders = vec!["?"; columns.len()].join(", ");

    let mut sql = String::from("INSERT");
    if let Some(mode) = state.conflict {
        sql.push_str(" OR ");
        sql.push_str(mode.as_sql());
    }
    sql.push_str(" INTO ");
    sql.push_str(&ident::quote(table));
    sql.push_str(" (");
    sql.push_str(&columns.join(", "));
    sql.push_str(") VALUES (");
    sql.push_str(&placeholders);
    sql.push(')');

    if let Some(update) = on_conflict {
        if !update.is_empty() {
            if let Some(err) = update.first_error() {
                return Err(err);
            }
            for key in update.keys() {
                ident::validate(key)?;
            }
            let mut set_parts = Vec::with_capacity(update.len());
            for (key, value) in update.into_pairs() {
                set_parts.push(format!("{} = ?", ident::quote(&key)));
                args.push(value);
            }
            sql.push_str(" ON CONFLICT DO UPDATE SET ");
            sql.push_str(&set_parts.join(", "));
        }
    }

    Ok((sql, args))
}

/// Assemble a multi-row INSERT; the first row's sorted keys define the
/// column order and every row must match them exactly.
pub(crate) fn build_insert_batch(
    state: &State,
    rows: Vec<Values>,
) -> Result<(String, Vec<Value>)> {
    let table = validated_table(state)?;

    if rows.is_empty() {
        return Err(Error::validation("no rows to insert"));
    }

    let first = &rows[0];
    if first.is_empty() {
        return Err(Error::validation("no data defined"));
    }
    for key in first.keys() {
        ident::validate(key)?;
    }
    let columns: Vec<String> = first.keys().map(|k| k.to_string()).collect();

    let mut sql = String::from("INSERT INTO ");
    sql.push_str(&ident::quote(table));
    sql.push_str(" (");
    let quoted: Vec<String> = columns.iter().map(|k| ident::quote(k)).collect();
    sql.push_str(&quoted.join(", "));
    sql.push_str(") VALUES ");

    let placeholders = format!("({})", vec!["?"; columns.len()].join(", "));
    let mut args = Vec::with_capacity(rows.len() * columns.len());

    for (idx, row) in rows.into_iter().enumerate() {
        if let Some(err) = row.first_error() {
            return Err(err);
        }
        if !row.keys().eq(columns.iter().map(String::as_str)) {
            return Err(Error::validation(format!(
                "row {idx} does not match the column set of the first row"
            )));
        }
        if idx > 0 {
            sql.push_str(", ");
        }
        sql.push_str(&placeholders);
        for (_, value) in row.into_pairs() {
            args.push(value);
        }
    }

    Ok((sql, args))
}
