//! Per-(user, session) state
//!
//! Information Hiding:
//! - History bounds and topic bookkeeping enforced by `UserSession` itself
//! - Durable key derivation (identifier sanitising) kept in `SessionKey`
//! - Cache, locking and enrichment live in `manager`

pub mod manager;

pub use manager::SessionManager;

use crate::providers::UserProfile;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey {
    pub user_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(user_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }

    /// `{user}_{session}` with path-hostile characters replaced, usable as a
    /// file stem or row key.
    pub fn storage_name(&self) -> String {
        format!("{}_{}", sanitize(&self.user_id), sanitize(&self.session_id))
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user_id, self.session_id)
    }
}

fn sanitize(part: &str) -> String {
    part.replace('@', "_at_")
        .replace(['/', '\\', ':'], "_")
}

/// One user turn and the assistant's reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    #[serde(deserialize_with = "lenient_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub user_message: String,
    pub bot_response: String,
    #[serde(default)]
    pub topic: Option<String>,
}

/// RFC 3339, or an ISO timestamp without offset read as UTC.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(at) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(at.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&raw, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
}

impl InteractionRecord {
    pub fn new(user_message: impl Into<String>, bot_response: impl Into<String>, topic: Option<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            user_message: user_message.into(),
            bot_response: bot_response.into(),
            topic,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSession {
    pub user_id: String,
    pub session_id: String,
    #[serde(default)]
    pub profile: Option<UserProfile>,
    #[serde(default)]
    pub preferences: HashMap<String, Value>,
    /// Oldest first.
    #[serde(default)]
    pub context_history: Vec<InteractionRecord>,
    pub last_updated: DateTime<Utc>,
    /// Unique, least recently mentioned first.
    #[serde(default)]
    pub active_topics: Vec<String>,
}

impl UserSession {
    pub fn new(key: &SessionKey) -> Self {
        Self {
            user_id: key.user_id.clone(),
            session_id: key.session_id.clone(),
            profile: None,
            preferences: HashMap::new(),
            context_history: Vec::new(),
            last_updated: Utc::now(),
            active_topics: Vec::new(),
        }
    }

    pub fn key(&self) -> SessionKey {
        SessionKey::new(self.user_id.clone(), self.session_id.clone())
    }

    /// Attach a fetched profile: its preferences and the last `load_history`
    /// history items that parse as interactions.
    pub fn enrich(&mut self, profile: UserProfile, load_history: usize) {
        self.preferences.extend(profile.preferences.clone());

        let parsed: Vec<InteractionRecord> = profile
            .history
            .iter()
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect();
        let dropped = profile.history.len() - parsed.len();
        if dropped > 0 {
            tracing::debug!(
                "[UserSession] Skipped {} profile history items for '{}' that are not interactions",
                dropped,
                self.user_id
            );
        }
        let skip = parsed.len().saturating_sub(load_history);
        self.context_history.extend(parsed.into_iter().skip(skip));

        self.profile = Some(profile);
    }

    /// Append one interaction, evicting the oldest beyond `max_history`.
    pub fn record(&mut self, interaction: InteractionRecord, max_history: usize) {
        if let Some(topic) = interaction.topic.clone() {
            self.add_topic(topic);
        }
        self.context_history.push(interaction);
        if self.context_history.len() > max_history {
            let excess = self.context_history.len() - max_history;
            self.context_history.drain(..excess);
        }
        self.last_updated = Utc::now();
    }

    pub fn add_topic(&mut self, topic: impl Into<String>) {
        let topic = topic.into();
        if topic.trim().is_empty() {
            return;
        }
        self.active_topics.retain(|t| *t != topic);
        self.active_topics.push(topic);
    }

    pub fn recent_topics(&self, limit: usize) -> &[String] {
        let start = self.active_topics.len().saturating_sub(limit);
        &self.active_topics[start..]
    }

    pub fn recent_interactions(&self, limit: usize) -> &[InteractionRecord] {
        let start = self.context_history.len().saturating_sub(limit);
        &self.context_history[start..]
    }

    pub fn is_older_than(&self, cutoff: DateTime<Utc>) -> bool {
        self.last_updated < cutoff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_storage_name_sanitizes_both_parts() {
        let key = SessionKey::new("john@example.com", "web:tab/1\\x");
        assert_eq!(key.storage_name(), "john_at_example.com_web_tab_1_x");
    }

    #[test]
    fn test_record_keeps_most_recent_fifo() {
        let mut session = UserSession::new(&SessionKey::new("u", "s"));
        for i in 0..60 {
            session.record(InteractionRecord::new(format!("q{}", i), format!("a{}", i), None), 50);
        }
        assert_eq!(session.context_history.len(), 50);
        assert_eq!(session.context_history[0].user_message, "q10");
        assert_eq!(session.context_history[49].user_message, "q59");
    }

    #[test]
    fn test_topics_unique_and_recency_ordered() {
        let mut session = UserSession::new(&SessionKey::new("u", "s"));
        for topic in ["orders", "balance", "orders", "delivery"] {
            session.add_topic(topic);
        }
        assert_eq!(session.active_topics, vec!["balance", "orders", "delivery"]);
        assert_eq!(session.recent_topics(2), ["orders", "delivery"]);
    }

    #[test]
    fn test_enrich_takes_last_parsable_history() {
        let mut history: Vec<Value> = (0..25)
            .map(|i| {
                json!({
                    "timestamp": "2024-05-01T09:30:00Z",
                    "user_message": format!("q{}", i),
                    "bot_response": "a",
                    "type": "chat"
                })
            })
            .collect();
        history.push(json!({"unexpected": true}));

        let profile = UserProfile {
            user_id: "u".into(),
            name: Some("Admin".into()),
            preferences: HashMap::from([("language".to_string(), json!("vi"))]),
            history,
            ..Default::default()
        };

        let mut session = UserSession::new(&SessionKey::new("u", "s"));
        session.enrich(profile, 20);

        assert_eq!(session.context_history.len(), 20);
        assert_eq!(session.context_history[0].user_message, "q5");
        assert_eq!(session.preferences["language"], "vi");
        assert!(session.profile.is_some());
    }

    #[test]
    fn test_record_serializes_topics_as_list() {
        let mut session = UserSession::new(&SessionKey::new("u", "s"));
        session.add_topic("orders");
        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["active_topics"], json!(["orders"]));
        assert!(value["last_updated"].is_string());
    }

    #[test]
    fn test_enrich_reads_naive_timestamps_as_utc() {
        let profile = UserProfile {
            user_id: "u".into(),
            history: vec![
                json!({
                    "timestamp": "2024-05-01T09:30:00.123456",
                    "user_message": "naive",
                    "bot_response": "a"
                }),
                json!({
                    "timestamp": "2024-05-01 10:00:00",
                    "user_message": "spaced",
                    "bot_response": "a"
                }),
                json!({
                    "timestamp": "yesterday",
                    "user_message": "garbage",
                    "bot_response": "a"
                }),
            ],
            ..Default::default()
        };

        let mut session = UserSession::new(&SessionKey::new("u", "s"));
        session.enrich(profile, 20);

        let messages: Vec<&str> = session.context_history.iter().map(|r| r.user_message.as_str()).collect();
        assert_eq!(messages, vec!["naive", "spaced"]);
        let first = session.context_history[0].timestamp;
        assert_eq!(first.to_rfc3339(), "2024-05-01T09:30:00.123456+00:00");
    }
}
