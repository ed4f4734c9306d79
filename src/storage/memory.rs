//! In-Memory Session Storage
//!
//! Information Hiding:
//! - HashMap storage structure hidden from users
//! - Thread-safe access via RwLock hidden behind async interface
//! - Suitable for testing and ephemeral sessions

use super::SessionStore;
use crate::session::{SessionKey, UserSession};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

struct Record {
    session: UserSession,
    written_at: DateTime<Utc>,
}

/// Data is lost when process terminates
pub struct InMemoryStore {
    records: Arc<RwLock<HashMap<String, Record>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn save(&self, session: &UserSession) -> Result<()> {
        let name = session.key().storage_name();
        self.records.write().await.insert(
            name.clone(),
            Record {
                session: session.clone(),
                written_at: Utc::now(),
            },
        );
        tracing::debug!("[InMemoryStore] Saved session '{}'", name);
        Ok(())
    }

    async fn load(&self, key: &SessionKey) -> Result<Option<UserSession>> {
        let records = self.records.read().await;
        Ok(records.get(&key.storage_name()).map(|r| r.session.clone()))
    }

    async fn delete(&self, key: &SessionKey) -> Result<bool> {
        Ok(self.records.write().await.remove(&key.storage_name()).is_some())
    }

    async fn list(&self) -> Result<Vec<String>> {
        Ok(self.records.read().await.keys().cloned().collect())
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<Vec<String>> {
        let mut records = self.records.write().await;
        let expired: Vec<String> = records
            .iter()
            .filter(|(_, r)| r.written_at < cutoff)
            .map(|(name, _)| name.clone())
            .collect();
        for name in &expired {
            records.remove(name);
        }
        tracing::debug!("[InMemoryStore] Purged {} sessions", expired.len());
        Ok(expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_load_delete() {
        let store = InMemoryStore::new();
        let key = SessionKey::new("u", "s");
        let mut session = UserSession::new(&key);
        session.add_topic("orders");

        store.save(&session).await.unwrap();
        assert_eq!(store.load(&key).await.unwrap(), Some(session));
        assert_eq!(store.list().await.unwrap(), vec!["u_s"]);

        assert!(store.delete(&key).await.unwrap());
        assert!(store.load(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_purge() {
        let store = InMemoryStore::new();
        store.save(&UserSession::new(&SessionKey::new("u", "s"))).await.unwrap();

        assert!(store.purge_older_than(Utc::now() - chrono::Duration::hours(1)).await.unwrap().is_empty());
        assert_eq!(
            store.purge_older_than(Utc::now() + chrono::Duration::seconds(1)).await.unwrap(),
            vec!["u_s"]
        );
    }
}
