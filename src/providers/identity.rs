//! User identifier resolution
//!
//! A user identifier may be a UUID, an email, a username, or the literal
//! `anonymous`. The shape is classified once, then exactly one lookup is
//! dispatched for it.

use super::clients::UserClient;
use crate::error::{ProviderError, ProviderResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use uuid::Uuid;

pub const ANONYMOUS: &str = "anonymous";

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIdentifier {
    Anonymous,
    Uuid(Uuid),
    Email(String),
    Username(String),
}

impl UserIdentifier {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == ANONYMOUS {
            return UserIdentifier::Anonymous;
        }
        if let Ok(id) = Uuid::parse_str(trimmed) {
            return UserIdentifier::Uuid(id);
        }
        if EMAIL_RE.is_match(trimmed) {
            return UserIdentifier::Email(trimmed.to_string());
        }
        UserIdentifier::Username(trimmed.to_string())
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, UserIdentifier::Anonymous)
    }
}

/// Outcome of resolving an identifier to a canonical user id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Anonymous,
    Uuid(Uuid),
    Email { user_id: String, email: String },
    Username { user_id: String, username: String },
    Unresolved(String),
}

impl Resolution {
    /// Canonical id to hand to providers, if one was found.
    pub fn user_id(&self) -> Option<String> {
        match self {
            Resolution::Uuid(id) => Some(id.to_string()),
            Resolution::Email { user_id, .. } | Resolution::Username { user_id, .. } => {
                Some(user_id.clone())
            }
            Resolution::Anonymous | Resolution::Unresolved(_) => None,
        }
    }
}

/// Resolve `raw` against the user provider. A provider that answers "not
/// found" yields `Unresolved`; channel failures stay errors.
pub async fn resolve(client: &UserClient, raw: &str) -> ProviderResult<Resolution> {
    match UserIdentifier::parse(raw) {
        UserIdentifier::Anonymous => Ok(Resolution::Anonymous),
        UserIdentifier::Uuid(id) => Ok(Resolution::Uuid(id)),
        UserIdentifier::Email(email) => match client.get_user_by_email(&email).await {
            Ok(found) => Ok(extract_user_id(&found)
                .map(|user_id| Resolution::Email {
                    user_id,
                    email: email.clone(),
                })
                .unwrap_or(Resolution::Unresolved(email))),
            Err(ProviderError::Application(_)) | Err(ProviderError::NotFound(_)) => {
                Ok(Resolution::Unresolved(email))
            }
            Err(e) => Err(e),
        },
        UserIdentifier::Username(username) => match client.get_user_by_username(&username).await {
            Ok(found) => Ok(extract_user_id(&found)
                .map(|user_id| Resolution::Username {
                    user_id,
                    username: username.clone(),
                })
                .unwrap_or(Resolution::Unresolved(username))),
            Err(ProviderError::Application(_)) | Err(ProviderError::NotFound(_)) => {
                Ok(Resolution::Unresolved(username))
            }
            Err(e) => Err(e),
        },
    }
}

fn extract_user_id(found: &Value) -> Option<String> {
    found
        .get("user_id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::registry::tests::MockTransport;
    use crate::providers::ProviderRegistry;
    use serde_json::json;
    use std::sync::Arc;
    use tokio::time::Duration;

    #[test]
    fn test_parse_shapes() {
        assert_eq!(UserIdentifier::parse("anonymous"), UserIdentifier::Anonymous);
        assert_eq!(UserIdentifier::parse(""), UserIdentifier::Anonymous);
        assert!(matches!(
            UserIdentifier::parse("6f1c2a3e-1b2c-4d5e-8f90-123456789abc"),
            UserIdentifier::Uuid(_)
        ));
        assert_eq!(
            UserIdentifier::parse("john@example.com"),
            UserIdentifier::Email("john@example.com".to_string())
        );
        assert_eq!(
            UserIdentifier::parse("user123"),
            UserIdentifier::Username("user123".to_string())
        );
    }

    fn client(transport: MockTransport) -> (UserClient, Arc<MockTransport>) {
        let transport = Arc::new(transport);
        let mut registry = ProviderRegistry::new(Duration::from_secs(1));
        registry.register("users", transport.clone());
        (UserClient::new(Arc::new(registry), "users"), transport)
    }

    #[tokio::test]
    async fn test_resolve_email_dispatches_one_lookup() {
        let (client, transport) = client(MockTransport::new().with(
            "get_user_by_email",
            Ok(json!({"user_id": "6f1c2a3e-1b2c-4d5e-8f90-123456789abc", "email": "john@example.com"})),
        ));

        let resolution = resolve(&client, "john@example.com").await.unwrap();
        assert_eq!(
            resolution.user_id().as_deref(),
            Some("6f1c2a3e-1b2c-4d5e-8f90-123456789abc")
        );
        assert_eq!(transport.methods_called(), vec!["get_user_by_email"]);
    }

    #[tokio::test]
    async fn test_resolve_unknown_username_is_unresolved() {
        let (client, _) = client(MockTransport::new().with(
            "get_user_by_username",
            Err(ProviderError::Application("User not found with username ghost".into())),
        ));

        let resolution = resolve(&client, "ghost").await.unwrap();
        assert_eq!(resolution, Resolution::Unresolved("ghost".to_string()));
    }

    #[tokio::test]
    async fn test_resolve_transport_failure_stays_error() {
        let (client, _) = client(
            MockTransport::new().with("get_user_by_username", Err(ProviderError::Protocol("garbage".into()))),
        );

        assert!(resolve(&client, "someone").await.is_err());
    }

    #[tokio::test]
    async fn test_resolve_uuid_and_anonymous_need_no_call() {
        let (client, transport) = client(MockTransport::new());

        assert_eq!(resolve(&client, "anonymous").await.unwrap(), Resolution::Anonymous);
        assert!(matches!(
            resolve(&client, "6f1c2a3e-1b2c-4d5e-8f90-123456789abc").await.unwrap(),
            Resolution::Uuid(_)
        ));
        assert!(transport.methods_called().is_empty());
    }
}
