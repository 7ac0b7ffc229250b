//! Table schema definitions for CREATE TABLE.

use rusqlite::ToSql;
use rusqlite::types::Value;

use crate::error::{Error, Result};
use crate::ident;
use crate::value::to_value;

/// A column definition for [`Builder::create`](crate::Builder::create).
///
/// Columns are NOT NULL by default; call [`nullable`](Column::nullable) to
/// allow NULL.
///
/// # Example
/// ```ignore
/// let columns = vec![
///     Column::new("id", "INTEGER").primary_key().auto_increment(),
///     Column::new("name", "TEXT"),
///     Column::new("email", "TEXT").unique().default_value(""),
/// ];
/// db.builder().table("users").create(columns).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Column {
    pub(crate) name: String,
    sql_type: String,
    primary_key: bool,
    nullable: bool,
    auto_increment: bool,
    unique: bool,
    default: Option<Value>,
    references: Option<(String, String)>,
    invalid: Option<String>,
}

impl Column {
    /// Create a column with the given name and declared type.
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            primary_key: false,
            nullable: false,
            auto_increment: false,
            unique: false,
            default: None,
            references: None,
            invalid: None,
        }
    }

    /// Mark the column as PRIMARY KEY.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Allow NULL values.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Mark the column AUTOINCREMENT.
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Add a UNIQUE constraint.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Set a DEFAULT value.
    pub fn default_value(mut self, value: impl ToSql) -> Self {
        match to_value(&value) {
            Ok(v) => self.default = Some(v),
            Err(e) => self.invalid = Some(e.to_string()),
        }
        self
    }

    /// Add a foreign-key REFERENCES clause.
    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.references = Some((table.into(), column.into()));
        self
    }

    /// Render the column definition (everything after the quoted name).
    pub(crate) fn definition(&self) -> Result<String> {
        if let Some(msg) = &self.invalid {
            return Err(Error::validation(format!(
                "column `{}`: {msg}",
                self.name
            )));
        }

        let mut parts = vec![self.sql_type.clone()];

        if self.primary_key {
            parts.push("PRIMARY KEY".into());
        }
        if self.auto_increment {
            parts.push("AUTOINCREMENT".into());
        }
        if self.unique {
            parts.push("UNIQUE".into());
        }
        if !self.nullable {
            parts.push("NOT NULL".into());
        }
        if let Some(default) = &self.default {
            parts.push(format!("DEFAULT {}", format_literal(default)));
        }
        if let Some((table, column)) = &self.references {
            ident::validate(table)?;
            ident::validate(column)?;
            parts.push(format!(
                "REFERENCES {}({})",
                ident::quote(table),
                ident::quote(column)
            ));
        }

        Ok(parts.join(" "))
    }
}

/// Render a value as a SQL literal for DEFAULT clauses.
fn format_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".into(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Blob(b) => {
            let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
            format!("X'{hex}'")
        }
    }
}
