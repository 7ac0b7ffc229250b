//! Owned bind-value handling.
//!
//! Builder chain methods accept anything implementing [`rusqlite::ToSql`] and
//! convert it eagerly into an owned [`Value`], so the assembled statement and
//! its argument vector can be moved onto the blocking dispatch thread.

use std::collections::BTreeMap;

use rusqlite::ToSql;
use rusqlite::types::{ToSqlOutput, Value};

use crate::error::{Error, Result};

/// Convert a `ToSql` value into an owned [`Value`].
pub(crate) fn to_value<T: ToSql + ?Sized>(value: &T) -> Result<Value> {
    match value.to_sql().map_err(Error::from_sqlite)? {
        ToSqlOutput::Owned(v) => Ok(v),
        ToSqlOutput::Borrowed(r) => Ok(r.into()),
        other => Err(Error::validation(format!(
            "unsupported bind value: {other:?}"
        ))),
    }
}

/// A column → value payload for INSERT and UPDATE statements.
///
/// Keys always iterate in lexicographic order, so placeholder ordering is
/// deterministic no matter how the payload was assembled.
///
/// # Example
/// ```ignore
/// let row = Values::new().set("name", "alice").set("age", 30);
/// db.builder().table("users").insert(row).await?;
/// ```
#[derive(Debug, Default)]
pub struct Values {
    map: BTreeMap<String, Value>,
    errors: Vec<(String, String)>,
}

impl Values {
    /// Create an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value.
    ///
    /// Conversion failures are recorded and surfaced by the terminal call
    /// that consumes the payload, preserving chainability.
    pub fn set(mut self, column: impl Into<String>, value: impl ToSql) -> Self {
        let column = column.into();
        match to_value(&value) {
            Ok(v) => {
                self.map.insert(column, v);
            }
            Err(e) => self.errors.push((column, e.to_string())),
        }
        self
    }

    /// Set an optional column value (`None` => skip).
    pub fn set_opt(self, column: impl Into<String>, value: Option<impl ToSql>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// Number of columns in the payload.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the payload holds no columns.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// First recorded conversion failure, if any.
    pub(crate) fn first_error(&self) -> Option<Error> {
        self.errors
            .first()
            .map(|(col, msg)| Error::validation(format!("value for `{col}`: {msg}")))
    }

    /// Sorted column names.
    pub(crate) fn keys(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    /// Consume the payload into sorted `(column, value)` pairs.
    pub(crate) fn into_pairs(self) -> Vec<(String, Value)> {
        self.map.into_iter().collect()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Values {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            errors: Vec::new(),
        }
    }
}
