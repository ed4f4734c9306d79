//! Durable Session Storage
//!
//! Information Hiding:
//! - Storage backend implementation details hidden behind trait
//! - Allows swapping between filesystem, SQLite and memory without API changes
//! - Record naming delegated to `SessionKey::storage_name`

use crate::config::{SessionSettings, StorageBackend};
use crate::session::{SessionKey, UserSession};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub mod filesystem;
pub mod memory;
pub mod sqlite;

pub use filesystem::FileSystemStore;
pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

/// One durable record per (user, session).
#[async_trait]
pub trait SessionStore: Send + Sync {
    fn backend(&self) -> &'static str;

    /// Write the whole session, replacing any previous record.
    async fn save(&self, session: &UserSession) -> Result<()>;

    /// `Ok(None)` when no record exists.
    async fn load(&self, key: &SessionKey) -> Result<Option<UserSession>>;

    /// Returns whether a record was removed.
    async fn delete(&self, key: &SessionKey) -> Result<bool>;

    /// Storage names of every record.
    async fn list(&self) -> Result<Vec<String>>;

    /// Remove records last written before `cutoff`; returns their names.
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<Vec<String>>;

    async fn exists(&self, key: &SessionKey) -> Result<bool> {
        Ok(self.load(key).await?.is_some())
    }
}

/// Open the backend selected in settings.
pub async fn open(settings: &SessionSettings) -> Result<Arc<dyn SessionStore>> {
    let store: Arc<dyn SessionStore> = match settings.backend {
        StorageBackend::File => Arc::new(FileSystemStore::new(settings.cache_dir.clone()).await?),
        StorageBackend::Sqlite => Arc::new(SqliteStore::open(settings.sqlite_path.clone()).await?),
        StorageBackend::Memory => Arc::new(InMemoryStore::new()),
    };
    tracing::info!("Session store: {}", store.backend());
    Ok(store)
}
