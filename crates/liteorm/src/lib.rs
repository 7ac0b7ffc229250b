//! # liteorm
//!
//! A lightweight SQLite query builder for Rust.
//!
//! ## Features
//!
//! - **Fluent statements**: compose CREATE/SELECT/INSERT/UPDATE/DELETE through
//!   chained calls; the builder only ever emits a statement string plus a
//!   positional argument vector
//! - **Validated identifiers**: bare table/column names are checked against
//!   charset, length, and the reserved-keyword set before being quoted
//! - **Deferred errors**: chain calls never fail; the first recorded problem
//!   is returned by the next terminal call
//! - **Read/write routing**: writes serialize through a single-connection
//!   pool inside IMMEDIATE transactions, reads fan out over a pooled
//!   read-only side, WAL keeps them from blocking each other
//! - **Safe defaults**: DELETE without WHERE requires an explicit force flag
//!
//! ## Example
//!
//! ```ignore
//! use liteorm::{Column, Config, Database, Direction, Values};
//!
//! let db = Database::open(Config::new("./data.db")).await?;
//!
//! db.builder().table("users").create(vec![
//!     Column::new("id", "INTEGER").primary_key().auto_increment(),
//!     Column::new("name", "TEXT"),
//!     Column::new("email", "TEXT").default_value(""),
//! ]).await?;
//!
//! let id = db
//!     .builder()
//!     .table("users")
//!     .insert(Values::new().set("name", "alice").set("email", "a@example.com"))
//!     .await?;
//!
//! let rows = db
//!     .builder()
//!     .table("users")
//!     .where_eq("name", "alice")
//!     .order_by("id", Direction::Desc)
//!     .limit(10)
//!     .get()
//!     .await?;
//! # Ok::<(), liteorm::Error>(())
//! ```

pub mod builder;
pub mod connector;
pub mod db;
pub mod error;
pub mod ident;
pub mod row;
pub mod schema;
pub mod value;

mod pool;

pub use builder::{Builder, Conflict, Direction};
pub use connector::Connector;
pub use db::{Config, Database};
pub use error::{Error, Result};
pub use row::{FromRow, Row};
pub use schema::Column;
pub use value::Values;

// Engine types that appear in public signatures
pub use rusqlite::ToSql;
pub use rusqlite::types::Value;
