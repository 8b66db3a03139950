pub mod cli;
pub mod collection;
pub mod config;
pub mod document;
pub mod errors;
pub mod http;
pub mod logger;
pub mod query;
pub mod types;
pub mod users;
pub mod utils;
pub mod wal;

use crate::collection::Collection;
use crate::errors::DbError;
use crate::utils::json::json_value_to_bson_document;
use crate::wal::Wal;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Embedded document store: named collections, optionally backed by an operation log.
pub struct Database {
    collections: RwLock<HashMap<String, Arc<Collection>>>,
    wal: Option<Arc<Mutex<Wal>>>,
    open: Arc<AtomicBool>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path())
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}

impl Database {
    /// A database that lives only as long as the handle.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            wal: None,
            open: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Opens the database. With `None` nothing is persisted; otherwise the operation log at
    /// `path` is created if missing and replayed into memory.
    ///
    /// # Errors
    /// Fails when the log cannot be opened or one of its records cannot be decoded.
    pub fn open(path: Option<&Path>) -> Result<Self, DbError> {
        let Some(path) = path else { return Ok(Self::in_memory()) };
        let (wal, records) = Wal::open(path)?;
        let db = Self {
            collections: RwLock::new(HashMap::new()),
            wal: Some(Arc::new(Mutex::new(wal))),
            open: Arc::new(AtomicBool::new(true)),
        };
        for rec in records {
            let data = match rec.value_json.as_deref() {
                Some(bytes) => {
                    let value: serde_json::Value = serde_json::from_slice(bytes)?;
                    Some(json_value_to_bson_document(&value)?)
                }
                None => None,
            };
            db.collection(&rec.collection)?.replay(rec.op, rec.id, data, rec.ts_millis);
        }
        log::info!("database opened at {}", path.display());
        Ok(db)
    }

    /// Returns the named collection, creating it on first use.
    pub fn collection(&self, name: &str) -> Result<Arc<Collection>, DbError> {
        if !self.is_open() {
            return Err(DbError::Closed);
        }
        if let Some(c) = self.collections.read().get(name) {
            return Ok(c.clone());
        }
        let mut map = self.collections.write();
        let col = map
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Collection::new(name.to_string(), self.wal.clone(), self.open.clone())));
        Ok(col.clone())
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn path(&self) -> Option<PathBuf> {
        self.wal.as_ref().map(|w| w.lock().path().to_path_buf())
    }

    /// Flushes the log and marks the handle closed. Later operations fail with `Closed`.
    /// Closing twice is a no-op.
    pub fn close(&self) -> Result<(), DbError> {
        if !self.open.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        if let Some(wal) = &self.wal {
            wal.lock().flush()?;
        }
        log::info!("database closed");
        Ok(())
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::in_memory()
    }
}
