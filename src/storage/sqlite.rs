//! SQLite Session Storage
//!
//! Information Hiding:
//! - Schema and SQL statements hidden from users
//! - Blocking rusqlite calls moved off the runtime with spawn_blocking
//! - Each row holds the whole session as a JSON document

use super::SessionStore;
use crate::session::{SessionKey, UserSession};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS user_sessions (
    storage_name TEXT PRIMARY KEY,
    user_id      TEXT NOT NULL,
    session_id   TEXT NOT NULL,
    data         TEXT NOT NULL,
    written_at   TEXT NOT NULL
)";

pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub async fn open(path: PathBuf) -> Result<Self> {
        let conn = tokio::task::spawn_blocking(move || -> Result<Connection> {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).context("Failed to create database directory")?;
            }
            let conn = Connection::open(&path).context(format!("Failed to open database {:?}", path))?;
            conn.execute(SCHEMA, []).context("Failed to create sessions table")?;
            Ok(conn)
        })
        .await??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to create database")?;
        conn.execute(SCHEMA, []).context("Failed to create sessions table")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| anyhow!("session database lock poisoned"))?;
            op(&guard)
        })
        .await?
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn save(&self, session: &UserSession) -> Result<()> {
        let name = session.key().storage_name();
        let user_id = session.user_id.clone();
        let session_id = session.session_id.clone();
        let data = serde_json::to_string(session).context("Failed to serialize session")?;
        let written_at = Utc::now().to_rfc3339();

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO user_sessions (storage_name, user_id, session_id, data, written_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(storage_name) DO UPDATE SET data = excluded.data, written_at = excluded.written_at",
                params![name, user_id, session_id, data, written_at],
            )
            .context("Failed to write session row")?;
            tracing::debug!("[SqliteStore] Saved session '{}'", name);
            Ok(())
        })
        .await
    }

    async fn load(&self, key: &SessionKey) -> Result<Option<UserSession>> {
        let name = key.storage_name();
        let data: Option<String> = self
            .with_conn(move |conn| {
                conn.query_row(
                    "SELECT data FROM user_sessions WHERE storage_name = ?1",
                    params![name],
                    |row| row.get(0),
                )
                .optional()
                .context("Failed to read session row")
            })
            .await?;

        match data {
            Some(json) => Ok(Some(
                serde_json::from_str(&json).context("Failed to parse stored session")?,
            )),
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &SessionKey) -> Result<bool> {
        let name = key.storage_name();
        self.with_conn(move |conn| {
            let removed = conn
                .execute("DELETE FROM user_sessions WHERE storage_name = ?1", params![name])
                .context("Failed to delete session row")?;
            Ok(removed > 0)
        })
        .await
    }

    async fn list(&self) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT storage_name FROM user_sessions ORDER BY storage_name")?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(names)
        })
        .await
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<Vec<String>> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare("SELECT storage_name, written_at FROM user_sessions")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
                .collect::<rusqlite::Result<Vec<(String, String)>>>()?;

            let mut purged = Vec::new();
            for (name, written_at) in rows {
                let expired = DateTime::parse_from_rfc3339(&written_at)
                    .map(|t| t.with_timezone(&Utc) < cutoff)
                    .unwrap_or(true);
                if expired {
                    conn.execute("DELETE FROM user_sessions WHERE storage_name = ?1", params![name])?;
                    purged.push(name);
                }
            }
            tracing::debug!("[SqliteStore] Purged {} sessions", purged.len());
            Ok(purged)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::InteractionRecord;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let key = SessionKey::new("john@example.com", "s1");
        let mut session = UserSession::new(&key);
        session.record(InteractionRecord::new("q", "a", Some("orders".into())), 50);

        store.save(&session).await.unwrap();
        store.save(&session).await.unwrap();

        let loaded = store.load(&key).await.unwrap().unwrap();
        assert_eq!(loaded.active_topics, vec!["orders"]);
        assert_eq!(store.list().await.unwrap(), vec!["john_at_example.com_s1"]);
    }

    #[tokio::test]
    async fn test_delete_and_purge() {
        let store = SqliteStore::open_in_memory().unwrap();
        let key = SessionKey::new("u", "s");
        store.save(&UserSession::new(&key)).await.unwrap();

        assert!(store.purge_older_than(Utc::now() - chrono::Duration::days(30)).await.unwrap().is_empty());
        assert!(store.delete(&key).await.unwrap());
        assert!(!store.delete(&key).await.unwrap());

        store.save(&UserSession::new(&key)).await.unwrap();
        let purged = store.purge_older_than(Utc::now() + chrono::Duration::seconds(1)).await.unwrap();
        assert_eq!(purged, vec!["u_s"]);
    }

    #[tokio::test]
    async fn test_file_database_persists() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("sessions.db");
        let key = SessionKey::new("u", "s");

        SqliteStore::open(path.clone())
            .await
            .unwrap()
            .save(&UserSession::new(&key))
            .await
            .unwrap();

        let reopened = SqliteStore::open(path).await.unwrap();
        assert!(reopened.exists(&key).await.unwrap());
    }
}
