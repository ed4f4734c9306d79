//! Context Composer: session state + order fragments -> one prompt block.

use super::labels::Labels;
use crate::config::ContextSettings;
use crate::core::format::snippet;
use crate::session::UserSession;
use serde_json::Value;

/// Preference keys worth showing to the model.
const PREFERENCE_HINTS: [&str; 4] = ["language", "communication", "style", "format"];

/// Renders the session half of the context block.
pub struct SessionContext<'a> {
    labels: &'static Labels,
    settings: &'a ContextSettings,
}

impl<'a> SessionContext<'a> {
    pub fn new(labels: &'static Labels, settings: &'a ContextSettings) -> Self {
        Self { labels, settings }
    }

    /// `balance` is the `result` object of a balance query, if one was made.
    /// Returns an empty string when there is nothing to say.
    pub fn render(&self, session: &UserSession, balance: Option<&Value>) -> String {
        let l = self.labels;
        let mut parts = Vec::new();

        if let Some(name) = session.profile.as_ref().and_then(|p| p.name.as_deref()) {
            parts.push(format!("{}: {}", l.user_name, name));
        }

        let mut preferences: Vec<(&String, &Value)> = session
            .preferences
            .iter()
            .filter(|(key, _)| {
                let key = key.to_lowercase();
                PREFERENCE_HINTS.iter().any(|hint| key.contains(hint))
            })
            .collect();
        if !preferences.is_empty() {
            preferences.sort_by(|a, b| a.0.cmp(b.0));
            let rendered: Vec<String> = preferences
                .iter()
                .map(|(key, value)| format!("{}: {}", key, display(value)))
                .collect();
            parts.push(format!("{}: {}", l.preferences, rendered.join(", ")));
        }

        if let Some(line) = balance.and_then(|b| self.balance_line(b)) {
            parts.push(line);
        }

        let topics = session.recent_topics(self.settings.max_topics);
        if !topics.is_empty() {
            parts.push(format!("{}: {}", l.topics, topics.join(", ")));
        }

        let interactions = session.recent_interactions(self.settings.max_interactions);
        if !interactions.is_empty() {
            parts.push(l.conversation.to_string());
            for interaction in interactions {
                parts.push(format!("- {}: {}", l.user_turn, self.clip(&interaction.user_message)));
                parts.push(format!("- {}: {}", l.assistant_turn, self.clip(&interaction.bot_response)));
            }
        }

        parts.join("\n")
    }

    fn balance_line(&self, result: &Value) -> Option<String> {
        let balance = result.get("balance").filter(|b| b.is_object())?;
        let formatted = balance.get("formatted").and_then(Value::as_str)?;
        let points = balance
            .get("points_formatted")
            .and_then(Value::as_str)
            .unwrap_or("0");
        Some(format!(
            "{}: {} {}, {} {}",
            self.labels.user_balance, formatted, self.settings.currency, points, self.labels.points
        ))
    }

    fn clip(&self, text: &str) -> String {
        let clipped = snippet(text, self.settings.snippet_chars);
        if clipped.chars().count() < text.chars().count() {
            format!("{}...", clipped)
        } else {
            clipped
        }
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Merge the session block and the order fragments. Never empty: with
/// nothing known the block is just the user id line.
pub fn compose(session_context: &str, order_context: &str, user_id: &str, labels: &Labels) -> String {
    let mut parts = Vec::new();
    if !session_context.trim().is_empty() {
        parts.push(session_context.to_string());
    }
    if !order_context.trim().is_empty() {
        parts.push(format!("{}\n{}", labels.order_header, order_context));
    }
    if parts.is_empty() {
        return format!("{}: {}", labels.user_id, user_id);
    }
    parts.join("\n")
}
