//! Session/Profile Cache
//!
//! Information Hiding:
//! - In-memory map of per-key slots; each slot initialised exactly once
//! - Durable store read through on a cache miss, written after every change
//! - Profile enrichment attempted once, at creation
//!
//! Every update to one (user, session) runs under that session's own lock,
//! so concurrent turns for the same key cannot lose an appended interaction.

use super::{InteractionRecord, SessionKey, UserSession};
use crate::config::{ContextSettings, SessionSettings};
use crate::context::composer::SessionContext;
use crate::context::Labels;
use crate::providers::identity::UserIdentifier;
use crate::providers::UserClient;
use crate::storage::SessionStore;
use chrono::{Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell, RwLock};

type SessionSlot = Arc<OnceCell<Arc<Mutex<UserSession>>>>;

const BALANCE_QUERY: &str = "balance điểm points";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub memory: usize,
    pub durable: usize,
}

pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    users: Option<UserClient>,
    sessions: RwLock<HashMap<SessionKey, SessionSlot>>,
    settings: SessionSettings,
    context: ContextSettings,
    labels: &'static Labels,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn SessionStore>,
        users: Option<UserClient>,
        settings: SessionSettings,
        context: ContextSettings,
    ) -> Self {
        let labels = Labels::for_language(context.language);
        Self {
            store,
            users,
            sessions: RwLock::new(HashMap::new()),
            settings,
            context,
            labels,
        }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub async fn cached_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }

    fn connected_users(&self) -> Option<&UserClient> {
        self.users.as_ref().filter(|client| client.is_connected())
    }

    async fn slot(&self, key: &SessionKey) -> SessionSlot {
        if let Some(slot) = self.sessions.read().await.get(key) {
            return slot.clone();
        }
        self.sessions
            .write()
            .await
            .entry(key.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }

    async fn handle(&self, key: &SessionKey) -> Arc<Mutex<UserSession>> {
        let slot = self.slot(key).await;
        let handle = slot
            .get_or_init(|| async { Arc::new(Mutex::new(self.load_or_create(key).await)) })
            .await
            .clone();
        handle
    }

    async fn load_or_create(&self, key: &SessionKey) -> UserSession {
        match self.store.load(key).await {
            Ok(Some(session)) if session.key() == *key => {
                tracing::debug!("[SessionManager] Loaded session '{}' from {}", key, self.store.backend());
                return session;
            }
            // storage names are lossy, so a different key can land on the same record
            Ok(Some(session)) => {
                tracing::warn!(
                    "[SessionManager] Stored record for '{}' belongs to '{}', starting fresh",
                    key,
                    session.key()
                )
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("[SessionManager] Unreadable record for '{}', starting fresh: {:#}", key, e)
            }
        }

        let mut session = UserSession::new(key);
        if let Some(users) = self.connected_users() {
            match users.get_user_profile(&key.user_id).await {
                Ok(profile) => {
                    tracing::debug!("[SessionManager] Enriched '{}' with provider profile", key);
                    session.enrich(profile, self.settings.load_history);
                }
                Err(e) => tracing::warn!("[SessionManager] Could not fetch profile for '{}': {}", key.user_id, e),
            }
        }

        self.persist(&session).await;
        tracing::info!("[SessionManager] Created session '{}'", key);
        session
    }

    async fn persist(&self, session: &UserSession) {
        if let Err(e) = self.store.save(session).await {
            tracing::error!("[SessionManager] Failed to persist '{}': {:#}", session.key(), e);
        }
    }

    /// Snapshot of the session, creating and enriching it on first use.
    pub async fn get_or_create(&self, user_id: &str, session_id: &str) -> UserSession {
        let key = SessionKey::new(user_id, session_id);
        let handle = self.handle(&key).await;
        let session = handle.lock().await;
        session.clone()
    }

    /// Append one interaction and persist, atomically for this key.
    pub async fn update_context(
        &self,
        user_id: &str,
        session_id: &str,
        user_message: &str,
        bot_response: &str,
        topic: Option<&str>,
    ) {
        let key = SessionKey::new(user_id, session_id);
        let handle = self.handle(&key).await;
        let mut session = handle.lock().await;

        session.record(
            InteractionRecord::new(user_message, bot_response, topic.map(str::to_string)),
            self.settings.max_history,
        );
        self.persist(&session).await;
    }

    pub async fn set_preference(&self, user_id: &str, session_id: &str, key: &str, value: Value) {
        let handle = self.handle(&SessionKey::new(user_id, session_id)).await;
        let mut session = handle.lock().await;
        session.preferences.insert(key.to_string(), value);
        session.last_updated = Utc::now();
        self.persist(&session).await;
    }

    /// Provider preferences overlaid with those of the user's most recently
    /// updated cached session.
    pub async fn get_user_preferences(&self, user_id: &str, keys: Option<&[&str]>) -> HashMap<String, Value> {
        let mut preferences = HashMap::new();
        if let Some(users) = self.connected_users() {
            match users.get_user_preferences(user_id, keys).await {
                Ok(found) => preferences.extend(found),
                Err(e) => tracing::debug!("[SessionManager] No provider preferences for '{}': {}", user_id, e),
            }
        }

        let slots: Vec<SessionSlot> = self
            .sessions
            .read()
            .await
            .iter()
            .filter(|(key, _)| key.user_id == user_id)
            .map(|(_, slot)| slot.clone())
            .collect();

        let mut latest: Option<UserSession> = None;
        for slot in slots {
            if let Some(handle) = slot.get() {
                let session = handle.lock().await;
                if latest.as_ref().map_or(true, |l| session.last_updated > l.last_updated) {
                    latest = Some(session.clone());
                }
            }
        }

        if let Some(session) = latest {
            preferences.extend(
                session
                    .preferences
                    .into_iter()
                    .filter(|(k, _)| keys.map_or(true, |keys| keys.contains(&k.as_str()))),
            );
        }
        preferences
    }

    /// Session block for prompt injection; empty when nothing is known.
    pub async fn get_user_context_for_rag(&self, user_id: &str, session_id: &str) -> String {
        let session = self.get_or_create(user_id, session_id).await;

        let anonymous = UserIdentifier::parse(user_id).is_anonymous();
        let balance = match self.connected_users() {
            Some(users) if !anonymous => match users.query_user_data(user_id, BALANCE_QUERY).await {
                Ok(mut answer) => answer.get_mut("result").map(Value::take),
                Err(e) => {
                    tracing::debug!("[SessionManager] Balance unavailable for '{}': {}", user_id, e);
                    None
                }
            },
            _ => None,
        };

        SessionContext::new(self.labels, &self.context).render(&session, balance.as_ref())
    }

    pub async fn query_user_data(&self, user_id: &str, query: &str) -> Option<Value> {
        let users = self.connected_users()?;
        match users.query_user_data(user_id, query).await {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::warn!("[SessionManager] query_user_data failed for '{}': {}", user_id, e);
                None
            }
        }
    }

    /// Drop sessions idle for longer than `max_age_days`, from memory and
    /// from the durable store.
    pub async fn cleanup_old_sessions(&self, max_age_days: i64) -> CleanupReport {
        let cutoff = Utc::now() - Duration::days(max_age_days);

        let purged = match self.store.purge_older_than(cutoff).await {
            Ok(names) => names,
            Err(e) => {
                tracing::error!("[SessionManager] Durable cleanup failed: {:#}", e);
                Vec::new()
            }
        };

        let snapshot: Vec<(SessionKey, SessionSlot)> = self
            .sessions
            .read()
            .await
            .iter()
            .map(|(k, s)| (k.clone(), s.clone()))
            .collect();

        let mut expired = Vec::new();
        for (key, slot) in snapshot {
            let stale = match slot.get() {
                Some(handle) => handle.lock().await.is_older_than(cutoff),
                None => false,
            };
            if stale || purged.contains(&key.storage_name()) {
                expired.push(key);
            }
        }

        let mut sessions = self.sessions.write().await;
        for key in &expired {
            sessions.remove(key);
        }

        let report = CleanupReport {
            memory: expired.len(),
            durable: purged.len(),
        };
        tracing::info!(
            "[SessionManager] Cleanup removed {} cached and {} stored sessions older than {} days",
            report.memory,
            report.durable,
            max_age_days
        );
        report
    }
}
