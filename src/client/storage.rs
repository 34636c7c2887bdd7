//! # Local Persistence
//!
//! String-keyed store mirroring the collections across sessions. Each
//! collection, the profile and the bearer token are kept under their own key
//! as a JSON document:
//!
//! | Key             | Contents                         |
//! |-----------------|----------------------------------|
//! | `savedImages`   | `[ImageRecord]`                  |
//! | `lovedImages`   | `[ImageRecord]`                  |
//! | `historyImages` | `[ImageRecord]` (newest first)   |
//! | `userProfile`   | `UserProfile`                    |
//! | `token`         | bearer token string              |
//!
//! The store is written on every mutation and read once at session start.
//! An unreadable entry is logged and treated as absent.
//!
//! ## Backends
//!
//! - [`SqliteStore`] - a single `kv` table in `<data dir>/artline.db`, WAL mode
//! - [`MemoryStore`] - a map behind a mutex, for tests and throwaway sessions

use crate::client::state::{CollectionKind, LocalMirror};
use crate::shared::error::SharedError;
use crate::shared::image::ImageRecord;
use crate::shared::profile::UserProfile;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

/// File name of the local database inside the data directory
pub const DATABASE_FILE: &str = "artline.db";

/// Key holding the user profile
pub const PROFILE_KEY: &str = "userProfile";

/// Key holding the bearer token
pub const TOKEN_KEY: &str = "token";

/// Every key this crate writes
pub const ALL_KEYS: [&str; 5] = [
    "savedImages",
    "lovedImages",
    "historyImages",
    PROFILE_KEY,
    TOKEN_KEY,
];

/// String-keyed persistent store
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, SharedError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), SharedError>;
    async fn remove(&self, key: &str) -> Result<(), SharedError>;
}

/// SQLite-backed store
///
/// One row per key in the `kv` table. Writes are upserts, so a key is
/// always either its previous or its new document.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open or create the database at `path`
    pub async fn open(path: &Path) -> Result<Self, SharedError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SharedError::storage(parent.display().to_string(), e.to_string()))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let store = Self::connect(options).await?;
        tracing::debug!(path = %path.display(), "local database opened");
        Ok(store)
    }

    /// Open a private in-memory database
    pub async fn in_memory() -> Result<Self, SharedError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| SharedError::storage("sqlite::memory:", e.to_string()))?;
        Self::connect(options).await
    }

    async fn connect(options: SqliteConnectOptions) -> Result<Self, SharedError> {
        // A single long-lived connection; an in-memory database dies with it
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| SharedError::storage("database", format!("failed to connect: {}", e)))?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), SharedError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| SharedError::storage("kv", format!("failed to create table: {}", e)))?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, SharedError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| SharedError::storage(key, e.to_string()))?;
        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), SharedError> {
        sqlx::query(
            "INSERT INTO kv (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| SharedError::storage(key, e.to_string()))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), SharedError> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| SharedError::storage(key, e.to_string()))?;
        Ok(())
    }
}

/// In-memory store, for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, SharedError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| SharedError::storage(key, "store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), SharedError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| SharedError::storage(key, "store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), SharedError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| SharedError::storage(key, "store lock poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}

async fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to read persisted state");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "discarding unreadable persisted state");
            None
        }
    }
}

/// Rebuild the mirror from persisted state
pub async fn load_mirror(store: &dyn KeyValueStore) -> LocalMirror {
    let saved = load_collection(store, CollectionKind::Saved).await;
    let loved = load_collection(store, CollectionKind::Loved).await;
    let history = load_collection(store, CollectionKind::History).await;
    let profile: UserProfile = read_json(store, PROFILE_KEY).await.unwrap_or_default();

    LocalMirror::from_parts(saved, loved, history, profile)
}

async fn load_collection(store: &dyn KeyValueStore, kind: CollectionKind) -> Vec<ImageRecord> {
    read_json(store, kind.storage_key()).await.unwrap_or_default()
}

/// Write one collection
pub async fn save_collection(
    store: &dyn KeyValueStore,
    mirror: &LocalMirror,
    kind: CollectionKind,
) -> Result<(), SharedError> {
    let json = serde_json::to_string(mirror.set(kind).records())?;
    store.set(kind.storage_key(), &json).await
}

/// Write the profile
pub async fn save_profile(store: &dyn KeyValueStore, profile: &UserProfile) -> Result<(), SharedError> {
    let json = serde_json::to_string(profile)?;
    store.set(PROFILE_KEY, &json).await
}

pub async fn load_token(store: &dyn KeyValueStore) -> Option<String> {
    read_json(store, TOKEN_KEY).await
}

pub async fn save_token(store: &dyn KeyValueStore, token: &str) -> Result<(), SharedError> {
    store.set(TOKEN_KEY, &serde_json::to_string(token)?).await
}

/// Remove every key this crate writes
pub async fn wipe(store: &dyn KeyValueStore) -> Result<(), SharedError> {
    for key in ALL_KEYS {
        store.remove(key).await?;
    }
    Ok(())
}
