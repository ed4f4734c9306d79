//! File System Session Storage
//!
//! Information Hiding:
//! - File paths and JSON serialization format hidden from users
//! - Directory structure management hidden behind interface
//! - Age of a record is the file's modification time

use super::SessionStore;
use crate::session::{SessionKey, UserSession};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tokio::fs;

/// Files are stored as {base_path}/{safe_user}_{safe_session}.json
pub struct FileSystemStore {
    base_path: PathBuf,
}

impl FileSystemStore {
    pub async fn new(base_path: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_path)
            .await
            .context("Failed to create session cache directory")?;

        Ok(Self { base_path })
    }

    fn session_path(&self, key: &SessionKey) -> PathBuf {
        self.base_path.join(format!("{}.json", key.storage_name()))
    }

    async fn json_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut entries = fs::read_dir(&self.base_path)
            .await
            .context("Failed to read session cache directory")?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .context("Failed to read directory entry")?
        {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                files.push(path);
            }
        }
        Ok(files)
    }
}

fn stem(path: &std::path::Path) -> Option<String> {
    path.file_stem().and_then(|s| s.to_str()).map(str::to_string)
}

#[async_trait]
impl SessionStore for FileSystemStore {
    fn backend(&self) -> &'static str {
        "file"
    }

    async fn save(&self, session: &UserSession) -> Result<()> {
        let path = self.session_path(&session.key());
        let json = serde_json::to_string_pretty(session).context("Failed to serialize session")?;

        fs::write(&path, json)
            .await
            .context(format!("Failed to write session file: {:?}", path))?;

        tracing::debug!(
            "[FileSystemStore] Saved session '{}' ({} interactions) to {:?}",
            session.key(),
            session.context_history.len(),
            path
        );
        Ok(())
    }

    async fn load(&self, key: &SessionKey) -> Result<Option<UserSession>> {
        let path = self.session_path(key);

        if !fs::try_exists(&path).await.unwrap_or(false) {
            tracing::debug!("[FileSystemStore] Session '{}' does not exist", key);
            return Ok(None);
        }

        let json = fs::read_to_string(&path)
            .await
            .context(format!("Failed to read session file: {:?}", path))?;

        let session: UserSession =
            serde_json::from_str(&json).context(format!("Failed to parse session file: {:?}", path))?;

        tracing::debug!("[FileSystemStore] Loaded session '{}' from {:?}", key, path);
        Ok(Some(session))
    }

    async fn delete(&self, key: &SessionKey) -> Result<bool> {
        let path = self.session_path(key);

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(false);
        }
        fs::remove_file(&path)
            .await
            .context(format!("Failed to delete session file: {:?}", path))?;
        tracing::debug!("[FileSystemStore] Deleted session '{}' at {:?}", key, path);
        Ok(true)
    }

    async fn list(&self) -> Result<Vec<String>> {
        let names: Vec<String> = self.json_files().await?.iter().filter_map(|p| stem(p)).collect();
        tracing::debug!("[FileSystemStore] Listed {} sessions", names.len());
        Ok(names)
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<Vec<String>> {
        let mut purged = Vec::new();
        for path in self.json_files().await? {
            let modified = match fs::metadata(&path).await.and_then(|m| m.modified()) {
                Ok(time) => DateTime::<Utc>::from(time),
                Err(e) => {
                    tracing::warn!("[FileSystemStore] Cannot stat {:?}: {}", path, e);
                    continue;
                }
            };
            if modified >= cutoff {
                continue;
            }
            match fs::remove_file(&path).await {
                Ok(()) => {
                    if let Some(name) = stem(&path) {
                        purged.push(name);
                    }
                }
                Err(e) => tracing::warn!("[FileSystemStore] Failed to remove {:?}: {}", path, e),
            }
        }
        Ok(purged)
    }
}
