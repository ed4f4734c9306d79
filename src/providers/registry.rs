//! Provider Registry
//!
//! Information Hiding:
//! - Connection storage and lookup hidden
//! - Transport construction from configuration hidden
//! - Per-call timeout and profile cache applied uniformly
//!
//! One connection per provider, shared by every session and turn.

use super::http::HttpTransport;
use super::process::ProcessTransport;
use super::{methods, ProviderConnection, Transport, UserProfile};
use crate::config::{ProviderConfig, Settings};
use crate::core::protocol::params;
use crate::error::{ProviderError, ProviderResult};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{timeout, Duration};

pub struct ProviderRegistry {
    connections: HashMap<String, ProviderConnection>,
    timeout: Duration,
    profile_cache: RwLock<HashMap<(String, String), UserProfile>>,
}

impl ProviderRegistry {
    pub fn new(timeout: Duration) -> Self {
        Self {
            connections: HashMap::new(),
            timeout,
            profile_cache: RwLock::new(HashMap::new()),
        }
    }

    /// Build a registry from settings, one transport per configured provider.
    /// A registry with no providers at all is a startup error.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        if settings.providers.is_empty() {
            return Err(anyhow::anyhow!("No data providers configured"));
        }

        let timeout = Duration::from_millis(settings.provider.timeout_ms);
        let mut registry = Self::new(timeout);

        for config in &settings.providers {
            registry.register_config(config, settings.provider.channel_buffer_size);
        }

        Ok(registry)
    }

    fn register_config(&mut self, config: &ProviderConfig, buffer_size: usize) {
        let transport: Arc<dyn Transport> = match &config.url {
            Some(url) => Arc::new(HttpTransport::new(config.name.clone(), url.clone(), self.timeout)),
            None => Arc::new(ProcessTransport::new(config.clone(), self.timeout, buffer_size)),
        };
        self.register(config.name.clone(), transport);
    }

    /// Register a transport under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, transport: Arc<dyn Transport>) {
        let name = name.into();
        let kind = transport.kind();
        tracing::info!("Registering provider: {} ({})", name, kind);
        self.connections.insert(
            name.clone(),
            ProviderConnection {
                name,
                kind,
                transport,
            },
        );
    }

    pub fn has_provider(&self, name: &str) -> bool {
        self.connections.contains_key(name)
    }

    pub fn provider_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.connections.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn connections(&self) -> Vec<ProviderConnection> {
        let mut connections: Vec<ProviderConnection> = self.connections.values().cloned().collect();
        connections.sort_by(|a, b| a.name.cmp(&b.name));
        connections
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Call `method` on `provider`. Never panics; every failure is a value.
    pub async fn invoke(&self, provider: &str, method: &str, params: Value) -> ProviderResult<Value> {
        let connection = self
            .connections
            .get(provider)
            .ok_or_else(|| ProviderError::UnknownProvider(provider.to_string()))?;

        let outcome = match timeout(self.timeout, connection.transport.call(method, params)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.timeout.as_millis() as u64)),
        };

        match &outcome {
            Ok(_) => tracing::debug!("[Registry] {}.{} ok", provider, method),
            Err(e) if e.is_transport() => {
                tracing::warn!("[Registry] {}.{} transport failure: {}", provider, method, e)
            }
            Err(e) => tracing::debug!("[Registry] {}.{} reported: {}", provider, method, e),
        }

        outcome
    }

    /// Profile lookup with a per-(provider, user) cache. Use
    /// [`ProviderRegistry::fetch_user_profile`] to bypass the cache.
    pub async fn get_user_profile(&self, provider: &str, user_id: &str) -> ProviderResult<UserProfile> {
        let key = (provider.to_string(), user_id.to_string());
        if let Some(profile) = self.profile_cache.read().await.get(&key) {
            tracing::debug!("[Registry] profile cache hit for {} on {}", user_id, provider);
            return Ok(profile.clone());
        }

        let profile = self.fetch_user_profile(provider, user_id).await?;
        self.profile_cache.write().await.insert(key, profile.clone());
        Ok(profile)
    }

    pub async fn fetch_user_profile(&self, provider: &str, user_id: &str) -> ProviderResult<UserProfile> {
        let value = self
            .invoke(
                provider,
                methods::GET_USER_PROFILE,
                params([("user_id", Some(json!(user_id)))]),
            )
            .await?;

        serde_json::from_value(value)
            .map_err(|e| ProviderError::Application(format!("unusable profile payload: {}", e)))
    }

    /// Free-text user data query. With no provider named, each registered
    /// provider is tried in name order until one answers.
    pub async fn query_user_data(
        &self,
        user_id: &str,
        query: &str,
        provider: Option<&str>,
    ) -> ProviderResult<Value> {
        let candidates = match provider {
            Some(name) => vec![name.to_string()],
            None => self.provider_names(),
        };

        let mut last_error = ProviderError::NotFound(format!("no provider answered for {}", user_id));
        for name in candidates {
            match self
                .invoke(
                    &name,
                    methods::QUERY_USER_DATA,
                    params([("user_id", Some(json!(user_id))), ("query", Some(json!(query)))]),
                )
                .await
            {
                Ok(result) => return Ok(result),
                Err(e) => last_error = e,
            }
        }
        Err(last_error)
    }

    /// Close every connection and forget cached profiles.
    pub async fn shutdown(&self) {
        for connection in self.connections.values() {
            connection.transport.close().await;
            tracing::info!("Closed provider: {}", connection.name);
        }
        self.profile_cache.write().await.clear();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted transport: answers from a method -> response table and
    /// records every call.
    pub struct MockTransport {
        responses: HashMap<String, ProviderResult<Value>>,
        pub calls: Mutex<Vec<(String, Value)>>,
        pub call_count: AtomicUsize,
        delay: Option<Duration>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self {
                responses: HashMap::new(),
                calls: Mutex::new(Vec::new()),
                call_count: AtomicUsize::new(0),
                delay: None,
            }
        }

        pub fn with(mut self, method: &str, response: ProviderResult<Value>) -> Self {
            self.responses.insert(method.to_string(), response);
            self
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn methods_called(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|(m, _)| m.clone()).collect()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        fn kind(&self) -> super::super::TransportKind {
            super::super::TransportKind::Process
        }

        async fn call(&self, method: &str, params: Value) -> ProviderResult<Value> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            self.calls.lock().unwrap().push((method.to_string(), params));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.responses
                .get(method)
                .cloned()
                .unwrap_or_else(|| Err(ProviderError::Application(format!("Unknown method: {}", method))))
        }

        async fn close(&self) {}
    }

    #[tokio::test]
    async fn test_unknown_provider_is_a_value() {
        let registry = ProviderRegistry::new(Duration::from_secs(1));
        let err = registry.invoke("missing", "anything", json!({})).await.unwrap_err();
        assert!(matches!(err, ProviderError::UnknownProvider(name) if name == "missing"));
    }

    #[tokio::test]
    async fn test_invoke_routes_by_provider_name() {
        let mut registry = ProviderRegistry::new(Duration::from_secs(1));
        let orders = Arc::new(MockTransport::new().with("get_order_summary", Ok(json!({"summary": {}}))));
        registry.register("orders", orders.clone());

        assert!(registry.has_provider("orders"));
        let result = registry.invoke("orders", "get_order_summary", json!({})).await.unwrap();
        assert!(result.get("summary").is_some());
        assert_eq!(orders.methods_called(), vec!["get_order_summary"]);
    }

    #[tokio::test]
    async fn test_invoke_times_out() {
        let mut registry = ProviderRegistry::new(Duration::from_millis(20));
        let slow = MockTransport::new()
            .with("get_order_summary", Ok(json!({})))
            .with_delay(Duration::from_millis(500));
        registry.register("orders", Arc::new(slow));

        let err = registry.invoke("orders", "get_order_summary", json!({})).await.unwrap_err();
        assert!(matches!(err, ProviderError::Timeout(20)));
    }

    #[tokio::test]
    async fn test_profile_cache_avoids_second_fetch() {
        let mut registry = ProviderRegistry::new(Duration::from_secs(1));
        let users = Arc::new(MockTransport::new().with(
            "get_user_profile",
            Ok(json!({"user_id": "admin", "name": "Admin User", "preferences": {"language": "vi"}})),
        ));
        registry.register("users", users.clone());

        let first = registry.get_user_profile("users", "admin").await.unwrap();
        let second = registry.get_user_profile("users", "admin").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.name.as_deref(), Some("Admin User"));
        assert_eq!(users.call_count.load(Ordering::SeqCst), 1);

        registry.fetch_user_profile("users", "admin").await.unwrap();
        assert_eq!(users.call_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_query_user_data_tries_each_provider() {
        let mut registry = ProviderRegistry::new(Duration::from_secs(1));
        registry.register("a_orders", Arc::new(MockTransport::new()));
        registry.register(
            "b_users",
            Arc::new(MockTransport::new().with("query_user_data", Ok(json!({"result": {"summary": "ok"}})))),
        );

        let result = registry.query_user_data("admin", "who am i", None).await.unwrap();
        assert_eq!(result["result"]["summary"], "ok");
    }

    #[test]
    fn test_from_settings_requires_providers() {
        let settings = Settings::default();
        assert!(ProviderRegistry::from_settings(&settings).is_err());
    }
}
