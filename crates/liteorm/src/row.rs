//! Row mapping traits and utilities.
//!
//! Query results are materialized on the dispatch thread into owned [`Row`]
//! values: a shared column header plus one owned SQLite value per column.
//! Typed access goes through [`rusqlite::types::FromSql`]; whole-struct
//! decoding goes through an explicit [`FromRow`] implementation per record
//! type.

use std::sync::Arc;

use rusqlite::types::{FromSql, Value, ValueRef};

use crate::error::{Error, Result};

/// A materialized result row.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<Vec<String>>,
    values: Vec<Value>,
}

impl Row {
    pub(crate) fn new(columns: Arc<Vec<String>>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Column names, in projection order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get a column value by name.
    pub fn get<T: FromSql>(&self, column: &str) -> Result<T> {
        let idx = self
            .columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| Error::decode(column, "no such column"))?;
        self.decode(idx, column)
    }

    /// Get a column value by position.
    pub fn get_idx<T: FromSql>(&self, idx: usize) -> Result<T> {
        let column = self
            .columns
            .get(idx)
            .map(String::as_str)
            .unwrap_or("<out of range>");
        self.decode(idx, column)
    }

    /// Raw value by position, if present.
    pub fn value(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    fn decode<T: FromSql>(&self, idx: usize, column: &str) -> Result<T> {
        let value = self
            .values
            .get(idx)
            .ok_or_else(|| Error::decode(column, "column index out of range"))?;
        T::column_result(ValueRef::from(value)).map_err(|e| Error::decode(column, e.to_string()))
    }
}

/// Trait for converting a result row into a Rust struct.
///
/// Implementations name the columns they need explicitly; there is no
/// field-tag reflection.
///
/// # Example
/// ```ignore
/// struct User {
///     id: i64,
///     name: String,
/// }
///
/// impl FromRow for User {
///     fn from_row(row: &Row) -> liteorm::Result<Self> {
///         Ok(Self {
///             id: row.get("id")?,
///             name: row.get("name")?,
///         })
///     }
/// }
/// ```
pub trait FromRow: Sized {
    /// Convert a result row into `Self`
    fn from_row(row: &Row) -> Result<Self>;
}
