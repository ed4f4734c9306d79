//! Typed views over the registry for the two provider classes.
//!
//! Each client pins one provider name and exposes one async method per wire
//! method, so callers never spell method names or parameter keys.

use super::{methods, ProviderRegistry, UserProfile};
use crate::core::protocol::params;
use crate::error::ProviderResult;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct UserClient {
    registry: Arc<ProviderRegistry>,
    provider: String,
}

impl UserClient {
    pub fn new(registry: Arc<ProviderRegistry>, provider: impl Into<String>) -> Self {
        Self {
            registry,
            provider: provider.into(),
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn is_connected(&self) -> bool {
        self.registry.has_provider(&self.provider)
    }

    async fn call(&self, method: &str, params: Value) -> ProviderResult<Value> {
        self.registry.invoke(&self.provider, method, params).await
    }

    /// Cached per (provider, user).
    pub async fn get_user_profile(&self, user_id: &str) -> ProviderResult<UserProfile> {
        self.registry.get_user_profile(&self.provider, user_id).await
    }

    pub async fn get_user_preferences(
        &self,
        user_id: &str,
        keys: Option<&[&str]>,
    ) -> ProviderResult<HashMap<String, Value>> {
        let profile = self.get_user_profile(user_id).await?;
        Ok(match keys {
            Some(keys) => profile
                .preferences
                .into_iter()
                .filter(|(k, _)| keys.contains(&k.as_str()))
                .collect(),
            None => profile.preferences,
        })
    }

    /// Last ten profile history items whose `type` equals `context_type`.
    pub async fn get_user_history(&self, user_id: &str, context_type: &str) -> ProviderResult<Vec<Value>> {
        let profile = self.get_user_profile(user_id).await?;
        let relevant: Vec<Value> = profile
            .history
            .into_iter()
            .filter(|item| item.get("type").and_then(Value::as_str) == Some(context_type))
            .collect();
        let skip = relevant.len().saturating_sub(10);
        Ok(relevant.into_iter().skip(skip).collect())
    }

    pub async fn get_user_by_email(&self, email: &str) -> ProviderResult<Value> {
        self.call(methods::GET_USER_BY_EMAIL, params([("email", Some(json!(email)))]))
            .await
    }

    pub async fn get_user_by_username(&self, username: &str) -> ProviderResult<Value> {
        self.call(
            methods::GET_USER_BY_USERNAME,
            params([("username", Some(json!(username)))]),
        )
        .await
    }

    pub async fn query_user_data(&self, user_id: &str, query: &str) -> ProviderResult<Value> {
        self.registry
            .query_user_data(user_id, query, Some(&self.provider))
            .await
    }

    pub async fn get_user_balance(&self, user_id: &str) -> ProviderResult<Value> {
        self.call(methods::GET_USER_BALANCE, params([("user_id", Some(json!(user_id)))]))
            .await
    }

    pub async fn get_user_points(&self, user_id: &str) -> ProviderResult<Value> {
        self.call(methods::GET_USER_POINTS, params([("user_id", Some(json!(user_id)))]))
            .await
    }

    pub async fn get_balance_info(&self, user_id: &str) -> ProviderResult<Value> {
        self.call(methods::GET_BALANCE_INFO, params([("user_id", Some(json!(user_id)))]))
            .await
    }

    pub async fn get_top_balances(&self, limit: u32) -> ProviderResult<Value> {
        self.call(methods::GET_TOP_BALANCES, params([("limit", Some(json!(limit)))]))
            .await
    }

    pub async fn get_balance_stats(&self) -> ProviderResult<Value> {
        self.call(methods::GET_BALANCE_STATS, json!({})).await
    }

    pub async fn search_user_balances(&self, user_ids: &[String]) -> ProviderResult<Value> {
        self.call(
            methods::SEARCH_USER_BALANCES,
            params([("user_ids", Some(json!(user_ids)))]),
        )
        .await
    }
}

#[derive(Clone)]
pub struct OrderClient {
    registry: Arc<ProviderRegistry>,
    provider: String,
}

impl OrderClient {
    pub fn new(registry: Arc<ProviderRegistry>, provider: impl Into<String>) -> Self {
        Self {
            registry,
            provider: provider.into(),
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Call any order method that takes only an optional `user_id`.
    pub async fn call_for_user(&self, method: &str, user_id: Option<&str>) -> ProviderResult<Value> {
        self.registry
            .invoke(&self.provider, method, params([("user_id", user_id.map(|u| json!(u)))]))
            .await
    }

    pub async fn get_pending_orders_count(&self, user_id: Option<&str>) -> ProviderResult<Value> {
        self.call_for_user(methods::GET_PENDING_ORDERS_COUNT, user_id).await
    }

    pub async fn get_pending_payment_amount(&self, user_id: Option<&str>) -> ProviderResult<Value> {
        self.call_for_user(methods::GET_PENDING_PAYMENT_AMOUNT, user_id).await
    }

    pub async fn get_delivery_estimates(&self, user_id: Option<&str>, days_ahead: u32) -> ProviderResult<Value> {
        self.registry
            .invoke(
                &self.provider,
                methods::GET_DELIVERY_ESTIMATES,
                params([
                    ("user_id", user_id.map(|u| json!(u))),
                    ("days_ahead", Some(json!(days_ahead))),
                ]),
            )
            .await
    }

    pub async fn get_order_summary(&self, user_id: Option<&str>) -> ProviderResult<Value> {
        self.call_for_user(methods::GET_ORDER_SUMMARY, user_id).await
    }

    pub async fn get_recent_orders(&self, user_id: Option<&str>, limit: u32) -> ProviderResult<Value> {
        self.registry
            .invoke(
                &self.provider,
                methods::GET_RECENT_ORDERS,
                params([
                    ("user_id", user_id.map(|u| json!(u))),
                    ("limit", Some(json!(limit))),
                ]),
            )
            .await
    }

    pub async fn get_user_order_dashboard(&self, user_id: &str) -> ProviderResult<Value> {
        self.call_for_user(methods::GET_USER_ORDER_DASHBOARD, Some(user_id)).await
    }

    pub async fn query_order_data(&self, user_id: &str, query: &str) -> ProviderResult<Value> {
        self.registry
            .invoke(
                &self.provider,
                methods::QUERY_ORDER_DATA,
                params([("user_id", Some(json!(user_id))), ("query", Some(json!(query)))]),
            )
            .await
    }
}
