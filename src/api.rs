//! Context engine facade
//!
//! One `ContextEngine` per process, built at startup and shared by reference
//! with every request handler. It owns the provider registry, the session
//! manager and the aggregator; nothing is held in ambient globals.

use crate::actors::SweeperHandle;
use crate::config::Settings;
use crate::context::{compose, ContextAggregator, FragmentRenderer, Labels};
use crate::intent::{Classification, IntentClassifier, KeywordTable};
use crate::providers::{OrderClient, ProviderRegistry, UserClient};
use crate::session::manager::CleanupReport;
use crate::session::{SessionManager, UserSession};
use crate::storage::{self, SessionStore};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::time::Duration;

pub struct ContextEngine {
    settings: Settings,
    registry: Arc<ProviderRegistry>,
    sessions: Arc<SessionManager>,
    aggregator: ContextAggregator,
    labels: &'static Labels,
}

impl ContextEngine {
    /// Build the engine from settings: providers, durable store, keyword
    /// self-check. Fails only on startup-fatal conditions.
    pub async fn init(settings: Settings) -> Result<Self> {
        let registry = ProviderRegistry::from_settings(&settings)?;
        let store = storage::open(&settings.session).await?;
        Self::with_parts(settings, registry, store)
    }

    /// Build the engine around an already populated registry and store.
    pub fn with_parts(
        settings: Settings,
        registry: ProviderRegistry,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self> {
        let classifier = IntentClassifier::new(KeywordTable::builtin().clone())
            .context("Keyword table failed its coverage check")?;

        let registry = Arc::new(registry);
        let users = UserClient::new(registry.clone(), settings.provider.user_provider.clone());
        let orders = OrderClient::new(registry.clone(), settings.provider.order_provider.clone());

        if !users.is_connected() {
            tracing::warn!(
                "User provider '{}' is not configured; profile and balance lookups are disabled",
                settings.provider.user_provider
            );
        }
        if !registry.has_provider(orders.provider()) {
            tracing::warn!(
                "Order provider '{}' is not configured; order fragments will report no data",
                settings.provider.order_provider
            );
        }

        let labels = Labels::for_language(settings.context.language);
        let renderer = FragmentRenderer::new(
            labels,
            settings.context.currency.clone(),
            settings.context.delivery_days_ahead,
        );
        let aggregator = ContextAggregator::new(
            users.clone(),
            orders,
            classifier,
            renderer,
            settings.context.delivery_days_ahead,
            settings.context.recent_limit,
        );
        let sessions = Arc::new(SessionManager::new(
            store,
            Some(users),
            settings.session.clone(),
            settings.context.clone(),
        ));

        tracing::info!(
            "Context engine ready: providers [{}]",
            registry.provider_names().join(", ")
        );

        Ok(Self {
            settings,
            registry,
            sessions,
            aggregator,
            labels,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    pub fn classify(&self, query: &str) -> Classification {
        self.aggregator.classifier().classify(query)
    }

    /// Order and balance fragments for `query`, one line per fragment.
    pub async fn classify_and_aggregate(&self, query: &str, user_id: &str) -> String {
        self.aggregator.classify_and_aggregate(query, user_id).await
    }

    pub async fn get_user_context_for_rag(&self, user_id: &str, session_id: &str) -> String {
        self.sessions.get_user_context_for_rag(user_id, session_id).await
    }

    pub async fn get_or_create_session(&self, user_id: &str, session_id: &str) -> UserSession {
        self.sessions.get_or_create(user_id, session_id).await
    }

    pub async fn update_context(
        &self,
        user_id: &str,
        session_id: &str,
        user_message: &str,
        bot_response: &str,
        topic: Option<&str>,
    ) {
        self.sessions
            .update_context(user_id, session_id, user_message, bot_response, topic)
            .await
    }

    /// The merged block handed to prompt assembly. Never empty.
    pub async fn build_context(&self, query: &str, user_id: &str, session_id: &str) -> String {
        let (session_context, order_context) = tokio::join!(
            self.get_user_context_for_rag(user_id, session_id),
            self.classify_and_aggregate(query, user_id)
        );
        compose(&session_context, &order_context, user_id, self.labels)
    }

    pub async fn cleanup_old_sessions(&self, max_age_days: i64) -> CleanupReport {
        self.sessions.cleanup_old_sessions(max_age_days).await
    }

    /// Start the periodic retention sweep with the configured interval.
    pub fn spawn_sweeper(&self) -> SweeperHandle {
        SweeperHandle::spawn(
            self.sessions.clone(),
            Duration::from_secs(self.settings.session.cleanup_interval_secs),
            self.settings.session.retention_days,
        )
    }

    pub async fn shutdown(&self) {
        self.registry.shutdown().await;
        tracing::info!("Context engine shutdown complete");
    }
}
