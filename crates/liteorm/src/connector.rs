//! Registry of open databases keyed by logical name.
//!
//! A [`Connector`] is an explicitly constructed, explicitly owned value; there
//! is no process-wide singleton. The internal map is mutex-protected for
//! registration, lookup, and teardown.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::builder::Builder;
use crate::db::{Config, Database};
use crate::error::{Error, Result};

/// Owns a set of [`Database`] handles, one per logical key.
#[derive(Default)]
pub struct Connector {
    map: Mutex<HashMap<String, Database>>,
}

impl Connector {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open and register the database described by `config`.
    ///
    /// If a database is already registered under the resolved key, the
    /// existing handle is returned and the config is ignored.
    pub async fn open(&self, config: Config) -> Result<Database> {
        let key = config.resolved_key();
        if let Some(db) = self.map.lock().unwrap().get(&key) {
            return Ok(db.clone());
        }

        let db = Database::open(config).await?;
        let mut map = self.map.lock().unwrap();
        // a racing open may have registered the key first; that one wins
        Ok(map.entry(key).or_insert(db).clone())
    }

    /// Look up a registered database.
    pub fn get(&self, key: &str) -> Result<Database> {
        self.map
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| Error::UnknownDatabase(key.to_string()))
    }

    /// Start a builder against a registered database.
    pub fn builder(&self, key: &str) -> Result<Builder> {
        Ok(self.get(key)?.builder())
    }

    /// Close every registered database and empty the registry.
    pub fn close(&self) {
        let mut map = self.map.lock().unwrap();
        for db in map.values() {
            db.close();
        }
        map.clear();
    }
}
