//! The fluent statement builder.
//!
//! A [`Builder`] is bound to one [`Database`] and configured through chained
//! `&mut self` calls. Chain methods never fail; validation problems are
//! recorded on the builder and the first one is returned by the next terminal
//! call before any SQL is assembled. Every terminal call takes the whole
//! accumulated state up front, so the builder is left cleared and reusable no
//! matter how the call ends.
//!
//! A builder is not meant to be shared: one logical caller drives it at a
//! time, which `&mut self` chaining already enforces at compile time.
//!
//! # Example
//! ```ignore
//! let db = Database::open(Config::new("./data.db")).await?;
//! let mut builder = db.builder();
//!
//! let active = builder
//!     .table("users")
//!     .where_eq("status", "active")
//!     .order_by("created_at", Direction::Desc)
//!     .limit(20)
//!     .get()
//!     .await?;
//! ```

mod conditions;
mod create;
mod delete;
mod insert;
mod select;
mod update;


use std::time::Duration;

pub use self::insert::Conflict;
pub use self::select::Direction;

use crate::db::Database;
use crate::error::Error;

use self::conditions::ConditionList;
use self::select::Join;

/// Accumulated builder state, reset by every terminal call.
#[derive(Debug, Default)]
pub(crate) struct State {
    pub(crate) table: Option<String>,
    pub(crate) select_list: Vec<String>,
    pub(crate) update_list: Vec<String>,
    pub(crate) where_clause: ConditionList,
    pub(crate) having_clause: ConditionList,
    pub(crate) join_list: Vec<Join>,
    pub(crate) conflict: Option<Conflict>,
    pub(crate) order_by: Vec<(String, Direction)>,
    pub(crate) group_by: Vec<String>,
    pub(crate) limit: Option<i64>,
    pub(crate) offset: Option<i64>,
    pub(crate) with_total: bool,
    pub(crate) timeout: Option<Duration>,
    pub(crate) errors: Vec<Error>,
}

impl State {
    /// Pop the first recorded chain-call error, if any.
    pub(crate) fn take_error(&mut self) -> Option<Error> {
        if self.errors.is_empty() {
            None
        } else {
            Some(self.errors.remove(0))
        }
    }
}

/// Chainable statement builder bound to a [`Database`].
pub struct Builder {
    db: Database,
    pub(crate) state: State,
}

impl Builder {
    pub(crate) fn new(db: Database) -> Self {
        Self {
            db,
            state: State::default(),
        }
    }

    /// Set the target table.
    pub fn table(&mut self, name: impl Into<String>) -> &mut Self {
        self.state.table = Some(name.into());
        self
    }

    /// Set the projected columns; replaces any previous selection.
    ///
    /// Columns are validated at assembly time; `"*"` is passed through.
    pub fn select(&mut self, columns: &[&str]) -> &mut Self {
        self.state.select_list = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Attach a dispatch timeout to the next terminal call.
    pub fn timeout(&mut self, timeout: Duration) -> &mut Self {
        self.state.timeout = Some(timeout);
        self
    }

    /// Validation errors recorded by chain calls so far.
    pub fn errors(&self) -> &[Error] {
        &self.state.errors
    }

    /// The database this builder dispatches through.
    pub fn database(&self) -> &Database {
        &self.db
    }

    pub(crate) fn record(&mut self, op: &'static str, err: Error) {
        self.state.errors.push(err.prefixed(op));
    }

    /// Move the accumulated state out, leaving the builder cleared.
    pub(crate) fn take_state(&mut self) -> State {
        std::mem::take(&mut self.state)
    }
}
