//! Connection pool plumbing.
//!
//! Each [`Database`](crate::Database) owns two `deadpool` pools over
//! `rusqlite` connections against the same backing file:
//!
//! - the **write** pool is capped at a single connection, opened read-write
//!   with WAL journaling, foreign keys enabled, and a busy timeout; every
//!   write runs inside an IMMEDIATE transaction so writers serialize cleanly
//!   against SQLite's single-writer rule
//! - the **read** pool holds many connections opened with read-only flags,
//!   letting reads run in parallel while WAL keeps them unblocked by the
//!   writer

use std::path::{Path, PathBuf};
use std::time::Duration;

use deadpool::managed::{self, Metrics, RecycleError, RecycleResult};
use rusqlite::{Connection, OpenFlags};

use crate::error::{Error, Result};

/// How long a connection waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Which side of the router a pool serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PoolKind {
    Write,
    Read,
}

/// `deadpool` manager that opens and recycles rusqlite connections.
#[derive(Debug)]
pub(crate) struct ConnectionManager {
    path: PathBuf,
    kind: PoolKind,
    max_lifetime: Option<Duration>,
}

impl ConnectionManager {
    pub(crate) fn new(path: &Path, kind: PoolKind, max_lifetime: Option<Duration>) -> Self {
        Self {
            path: path.to_path_buf(),
            kind,
            max_lifetime,
        }
    }

    fn open(&self) -> rusqlite::Result<Connection> {
        match self.kind {
            PoolKind::Write => {
                let conn = Connection::open(&self.path)?;
                conn.busy_timeout(BUSY_TIMEOUT)?;
                // journal_mode returns the resulting mode as a row
                let _: String =
                    conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
                conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA synchronous = NORMAL;")?;
                Ok(conn)
            }
            PoolKind::Read => {
                let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX
                    | OpenFlags::SQLITE_OPEN_URI;
                let conn = Connection::open_with_flags(&self.path, flags)?;
                conn.busy_timeout(BUSY_TIMEOUT)?;
                Ok(conn)
            }
        }
    }
}

impl managed::Manager for ConnectionManager {
    type Type = Connection;
    type Error = rusqlite::Error;

    async fn create(&self) -> rusqlite::Result<Connection> {
        self.open()
    }

    async fn recycle(
        &self,
        conn: &mut Connection,
        metrics: &Metrics,
    ) -> RecycleResult<rusqlite::Error> {
        if let Some(max) = self.max_lifetime {
            if metrics.age() > max {
                return Err(RecycleError::Message(
                    "connection exceeded max lifetime".into(),
                ));
            }
        }
        conn.execute_batch("").map_err(RecycleError::Backend)
    }
}

/// Pool of rusqlite connections.
pub(crate) type Pool = managed::Pool<ConnectionManager>;

/// Build a pool of the given kind and size.
pub(crate) fn create_pool(
    path: &Path,
    kind: PoolKind,
    max_size: usize,
    max_lifetime: Option<Duration>,
) -> Result<Pool> {
    let manager = ConnectionManager::new(path, kind, max_lifetime);
    Pool::builder(manager)
        .max_size(max_size)
        .build()
        .map_err(|e| Error::Pool(e.to_string()))
}
