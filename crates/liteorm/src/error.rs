//! Error types for liteorm

use std::time::Duration;

use thiserror::Error;

/// Result type alias for liteorm operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for builder and dispatch operations
#[derive(Debug, Error)]
pub enum Error {
    /// Database connection error
    #[error("connection error: {0}")]
    Connection(String),

    /// Connection pool error
    #[error("pool error: {0}")]
    Pool(String),

    /// No database registered under the given key
    #[error("database `{0}` is not registered")]
    UnknownDatabase(String),

    /// Identifier rejected by validation (empty, too long, bad character, reserved word)
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Builder configuration or payload validation error
    #[error("validation error: {0}")]
    Validation(String),

    /// Clause combination the target statement kind cannot express
    #[error("unsupported statement: {0}")]
    Unsupported(String),

    /// Write statement dispatched against a read-only handle
    #[error("write operation on read-only database: {0}")]
    ReadOnly(String),

    /// Statement rejected by the engine
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Row decode/mapping error
    #[error("decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Dispatch exceeded the builder's timeout
    #[error("statement timed out after {0:?}")]
    Timeout(Duration),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an unsupported-statement error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    /// Create an invalid-identifier error
    pub fn identifier(message: impl Into<String>) -> Self {
        Self::InvalidIdentifier(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::InvalidIdentifier(_))
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Classify a rusqlite error into a more specific liteorm error.
    ///
    /// Read-only violations are detected from the SQLite result code rather
    /// than the message text.
    pub fn from_sqlite(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, _) = &err {
            if code.code == rusqlite::ErrorCode::ReadOnly {
                return Self::ReadOnly(err.to_string());
            }
        }
        Self::Sqlite(err)
    }

    /// Re-attach the name of the chain method that recorded this error.
    pub(crate) fn prefixed(self, op: &str) -> Self {
        match self {
            Self::InvalidIdentifier(m) => Self::InvalidIdentifier(format!("{op}: {m}")),
            Self::Validation(m) => Self::Validation(format!("{op}: {m}")),
            other => other,
        }
    }
}
