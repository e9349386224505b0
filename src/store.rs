// 🗄️ Local Persistence - key-value store + dataset blob
// SQLite (WAL) in production, in-memory map for tests. The dataset lives
// under one well-known key and is overwritten wholesale on ingestion.

use crate::error::{SkyError, SkyResult};
use crate::record::PlanetRecord;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Key holding the serialized array of planet records
pub const DATASET_KEY: &str = "allExoplanets";

/// Key holding [`DatasetMeta`] for the current blob
pub const DATASET_META_KEY: &str = "datasetMeta";

// ============================================================================
// KEY-VALUE STORE
// ============================================================================

/// Minimal string key-value storage
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> SkyResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> SkyResult<()>;
    fn remove(&mut self, key: &str) -> SkyResult<()>;
}

/// SQLite-backed store, one row per key
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database file, creating parent directories as needed
    pub fn open(path: &Path) -> SkyResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        setup_database(&conn)?;
        debug!(path = %path.display(), "opened key-value store");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> SkyResult<Self> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;
        Ok(Self { conn })
    }

    /// Number of keys stored
    pub fn key_count(&self) -> SkyResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))?;
        Ok(count)
    }
}

pub fn setup_database(conn: &Connection) -> SkyResult<()> {
    // Enable WAL mode for crash recovery (in-memory databases stay in "memory" mode)
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    debug!(%mode, "journal mode");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> SkyResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> SkyResult<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> SkyResult<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

/// In-process store
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> SkyResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> SkyResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> SkyResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

// ============================================================================
// DATASET
// ============================================================================

/// Provenance of the stored blob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMeta {
    /// Ingestion run that produced the blob
    pub run_id: String,
    pub fetched_at: DateTime<Utc>,
    /// SHA-256 of the CSV body, hex
    pub checksum: String,
    pub record_count: usize,
    pub parse_errors: usize,
}

/// Dataset persistence on top of any [`KeyValueStore`]
pub struct DatasetStore<S: KeyValueStore> {
    kv: S,
}

impl<S: KeyValueStore> DatasetStore<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    pub fn kv(&self) -> &S {
        &self.kv
    }

    pub fn kv_mut(&mut self) -> &mut S {
        &mut self.kv
    }

    pub fn into_inner(self) -> S {
        self.kv
    }

    /// Overwrite blob and metadata
    pub fn save_dataset(&mut self, records: &[PlanetRecord], meta: &DatasetMeta) -> SkyResult<()> {
        self.save_records(records)?;
        self.save_meta(meta)
    }

    /// Overwrite the blob only (enrichment commits)
    pub fn save_records(&mut self, records: &[PlanetRecord]) -> SkyResult<()> {
        let blob = serde_json::to_string(records)?;
        self.kv.set(DATASET_KEY, &blob)
    }

    pub fn save_meta(&mut self, meta: &DatasetMeta) -> SkyResult<()> {
        let json = serde_json::to_string(meta)?;
        self.kv.set(DATASET_META_KEY, &json)
    }

    /// Read the blob, distinguishing "absent" (`Ok(None)`) from "unreadable" (`Err`)
    pub fn try_load_dataset(&self) -> SkyResult<Option<Vec<PlanetRecord>>> {
        match self.kv.get(DATASET_KEY)? {
            Some(blob) => {
                let records: Vec<PlanetRecord> =
                    serde_json::from_str(&blob).map_err(SkyError::Serialization)?;
                Ok(Some(records))
            }
            None => Ok(None),
        }
    }

    /// Read the blob; an unreadable blob is logged and treated as absent
    pub fn load_dataset(&self) -> Option<Vec<PlanetRecord>> {
        match self.try_load_dataset() {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "stored dataset unreadable, ignoring it");
                None
            }
        }
    }

    pub fn load_meta(&self) -> Option<DatasetMeta> {
        let raw = match self.kv.get(DATASET_META_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "dataset metadata unavailable");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(meta) => Some(meta),
            Err(e) => {
                warn!(error = %e, "dataset metadata unreadable");
                None
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
