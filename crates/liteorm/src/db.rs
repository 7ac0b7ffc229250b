//! The connection router.
//!
//! A [`Database`] owns the write and read pools for one SQLite file and
//! decides which pool serves a statement: mutations go through the
//! single-connection write pool inside an IMMEDIATE transaction, queries go
//! through the pooled read-only side. A background maintenance task issues
//! passive WAL checkpoints on a fixed interval and trims idle read
//! connections; its failures are logged, never propagated.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rusqlite::types::Value;
use rusqlite::{TransactionBehavior, params_from_iter};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::builder::Builder;
use crate::error::{Error, Result};
use crate::pool::{Pool, PoolKind, create_pool};
use crate::row::Row;

/// Fixed cadence of the background checkpoint / idle-trim task.
const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(60);

fn default_max_open() -> usize {
    50
}

fn default_max_idle() -> usize {
    25
}

/// Configuration for opening a [`Database`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Logical name; derived from the file stem of `path` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Filesystem location of the backing database file.
    pub path: PathBuf,
    /// Maximum connections in the read pool.
    #[serde(default = "default_max_open")]
    pub max_open_connections: usize,
    /// Idle read connections retained between maintenance ticks.
    #[serde(default = "default_max_idle")]
    pub max_idle_connections: usize,
    /// Maximum connection lifetime in seconds; 0 disables recycling.
    #[serde(default)]
    pub lifetime_seconds: u64,
}

impl Config {
    /// Configuration with defaults for the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            key: None,
            path: path.into(),
            max_open_connections: default_max_open(),
            max_idle_connections: default_max_idle(),
            lifetime_seconds: 0,
        }
    }

    /// Set the logical name.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub(crate) fn resolved_key(&self) -> String {
        match &self.key {
            Some(key) if !key.is_empty() => key.clone(),
            _ => self
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }
}

/// Outcome of a write dispatch.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ExecResult {
    pub(crate) rows_affected: u64,
    pub(crate) last_insert_rowid: i64,
}

struct Inner {
    key: String,
    path: PathBuf,
    write: Pool,
    read: Pool,
    maintenance: JoinHandle<()>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.maintenance.abort();
    }
}

/// Handle to one SQLite database: a single-connection write pool and a
/// read-only read pool over the same backing file.
///
/// Cloning is cheap and shares the pools.
#[derive(Clone)]
pub struct Database {
    inner: Arc<Inner>,
}

impl Database {
    /// Open (creating if necessary) the database described by `config`.
    ///
    /// The write connection is established eagerly so the file exists and is
    /// in WAL mode before any read-only connection is opened.
    pub async fn open(config: Config) -> Result<Database> {
        let key = config.resolved_key();
        let lifetime =
            (config.lifetime_seconds > 0).then(|| Duration::from_secs(config.lifetime_seconds));

        let write = create_pool(&config.path, PoolKind::Write, 1, lifetime)?;
        let read = create_pool(
            &config.path,
            PoolKind::Read,
            config.max_open_connections.max(1),
            lifetime,
        )?;

        write
            .get()
            .await
            .map_err(|e| Error::Connection(format!("failed to open db: {e}")))?;

        let maintenance = spawn_maintenance(
            key.clone(),
            write.clone(),
            read.clone(),
            config.max_idle_connections,
        );

        info!(db = %key, path = %config.path.display(), "database opened");

        Ok(Database {
            inner: Arc::new(Inner {
                key,
                path: config.path,
                write,
                read,
                maintenance,
            }),
        })
    }

    /// Logical name of this database.
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Start a statement builder bound to this database.
    pub fn builder(&self) -> Builder {
        Builder::new(self.clone())
    }

    /// Stop the maintenance task and close both pools.
    pub fn close(&self) {
        self.inner.maintenance.abort();
        self.inner.write.close();
        self.inner.read.close();
        info!(db = %self.inner.key, "database closed");
    }

    /// Dispatch a mutation through the write pool.
    pub(crate) async fn execute(
        &self,
        sql: String,
        args: Vec<Value>,
        timeout: Option<Duration>,
    ) -> Result<ExecResult> {
        debug!(db = %self.inner.key, sql = %sql, "execute");
        let write = self.inner.write.clone();
        let fut = async move {
            let mut conn = write.get().await.map_err(|e| Error::Pool(e.to_string()))?;
            tokio::task::spawn_blocking(move || {
                let tx = conn
                    .transaction_with_behavior(TransactionBehavior::Immediate)
                    .map_err(Error::from_sqlite)?;
                let rows_affected = tx
                    .prepare(&sql)
                    .and_then(|mut stmt| stmt.execute(params_from_iter(args)))
                    .map_err(Error::from_sqlite)? as u64;
                let last_insert_rowid = tx.last_insert_rowid();
                tx.commit().map_err(Error::from_sqlite)?;
                Ok(ExecResult {
                    rows_affected,
                    last_insert_rowid,
                })
            })
            .await
            .map_err(|e| Error::Other(format!("dispatch task failed: {e}")))?
        };
        with_timeout(timeout, fut).await
    }

    /// Dispatch a query through the read pool, materializing all rows.
    pub(crate) async fn query(
        &self,
        sql: String,
        args: Vec<Value>,
        timeout: Option<Duration>,
    ) -> Result<Vec<Row>> {
        debug!(db = %self.inner.key, sql = %sql, "query");
        let read = self.inner.read.clone();
        let fut = async move {
            let conn = read.get().await.map_err(|e| Error::Pool(e.to_string()))?;
            tokio::task::spawn_blocking(move || {
                let mut stmt = conn.prepare(&sql).map_err(Error::from_sqlite)?;
                let columns: Arc<Vec<String>> =
                    Arc::new(stmt.column_names().iter().map(|c| c.to_string()).collect());
                let mut rows = stmt
                    .query(params_from_iter(args))
                    .map_err(Error::from_sqlite)?;
                let mut out = Vec::new();
                while let Some(row) = rows.next().map_err(Error::from_sqlite)? {
                    let mut values = Vec::with_capacity(columns.len());
                    for idx in 0..columns.len() {
                        values.push(row.get::<_, Value>(idx).map_err(Error::from_sqlite)?);
                    }
                    out.push(Row::new(columns.clone(), values));
                }
                Ok(out)
            })
            .await
            .map_err(|e| Error::Other(format!("dispatch task failed: {e}")))?
        };
        with_timeout(timeout, fut).await
    }
}

async fn with_timeout<T>(
    timeout: Option<Duration>,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match timeout {
        Some(d) => match tokio::time::timeout(d, fut).await {
            Ok(res) => res,
            Err(_) => Err(Error::Timeout(d)),
        },
        None => fut.await,
    }
}

fn spawn_maintenance(
    key: String,
    write: Pool,
    read: Pool,
    max_idle: usize,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(MAINTENANCE_INTERVAL);
        // the first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            checkpoint(&write, &key).await;
            trim_idle(&read, max_idle).await;
        }
    })
}

/// Ask SQLite to move WAL frames back into the main file without blocking
/// readers or the writer.
async fn checkpoint(write: &Pool, key: &str) {
    let conn = match write.get().await {
        Ok(conn) => conn,
        Err(e) => {
            warn!(db = %key, error = %e, "checkpoint: could not acquire write connection");
            return;
        }
    };
    let outcome = tokio::task::spawn_blocking(move || {
        conn.query_row("PRAGMA wal_checkpoint(PASSIVE)", [], |_| Ok(()))
    })
    .await;
    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(db = %key, error = %e, "passive checkpoint failed"),
        Err(e) => warn!(db = %key, error = %e, "checkpoint task failed"),
    }
}

/// Drop one idle read connection per tick while the pool holds more than
/// `max_idle`.
async fn trim_idle(read: &Pool, max_idle: usize) {
    let status = read.status();
    if status.available as usize > max_idle {
        if let Ok(obj) = read.get().await {
            let _ = deadpool::managed::Object::take(obj);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn scratch() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(Config::new(dir.path().join("test.db")))
            .await
            .unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn execute_and_query_roundtrip() {
        let (_dir, db) = scratch().await;
        db.execute("CREATE TABLE t (x INTEGER)".into(), vec![], None)
            .await
            .unwrap();
        let result = db
            .execute(
                "INSERT INTO t (x) VALUES (?)".into(),
                vec![Value::Integer(42)],
                None,
            )
            .await
            .unwrap();
        assert_eq!(result.rows_affected, 1);

        let rows = db
            .query("SELECT x FROM t".into(), vec![], None)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get::<i64>("x").unwrap(), 42);
    }

    #[tokio::test]
    async fn last_insert_rowid_is_reported() {
        let (_dir, db) = scratch().await;
        db.execute(
            "CREATE TABLE t (id INTEGER PRIMARY KEY AUTOINCREMENT, v TEXT)".into(),
            vec![],
            None,
        )
        .await
        .unwrap();
        let first = db
            .execute(
                "INSERT INTO t (v) VALUES (?)".into(),
                vec![Value::Text("a".into())],
                None,
            )
            .await
            .unwrap();
        let second = db
            .execute(
                "INSERT INTO t (v) VALUES (?)".into(),
                vec![Value::Text("b".into())],
                None,
            )
            .await
            .unwrap();
        assert_eq!(first.last_insert_rowid, 1);
        assert_eq!(second.last_insert_rowid, 2);
    }

    #[tokio::test]
    async fn timeout_surfaces_error() {
        let res: Result<()> = with_timeout(Some(Duration::from_millis(10)), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(res, Err(Error::Timeout(_))));
    }

    #[tokio::test]
    async fn key_derived_from_file_stem() {
        let config = Config::new("/tmp/some/orders.db");
        assert_eq!(config.resolved_key(), "orders");
        let config = Config::new("/tmp/some/orders.db").key("main");
        assert_eq!(config.resolved_key(), "main");
    }
}
