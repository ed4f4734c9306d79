//! Data Provider access
//!
//! Information Hiding:
//! - Transport kind (subprocess pipe or HTTP) hidden behind `Transport`
//! - Connection ownership confined to the registry
//! - Method names for each provider class collected in `methods`
//! - Callers see `invoke(provider, method, params) -> Result<Value, ProviderError>`

pub mod clients;
pub mod demo;
pub mod http;
pub mod identity;
pub mod process;
pub mod registry;
pub mod server;

use crate::error::ProviderResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub use clients::{OrderClient, UserClient};
pub use registry::ProviderRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Process,
    Http,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Process => write!(f, "process"),
            TransportKind::Http => write!(f, "http"),
        }
    }
}

/// A request/response channel to one Data Provider.
#[async_trait]
pub trait Transport: Send + Sync {
    fn kind(&self) -> TransportKind;

    /// Issue one call. Provider-reported errors inside the result surface as
    /// `ProviderError::Application`.
    async fn call(&self, method: &str, params: Value) -> ProviderResult<Value>;

    /// Release the underlying channel. Later calls fail with `Closed`.
    async fn close(&self);
}

/// Live channel to one named provider, owned by the registry.
#[derive(Clone)]
pub struct ProviderConnection {
    pub name: String,
    pub kind: TransportKind,
    pub(crate) transport: Arc<dyn Transport>,
}

impl fmt::Debug for ProviderConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConnection")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Profile snapshot returned by `get_user_profile`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub preferences: HashMap<String, Value>,
    #[serde(default)]
    pub history: Vec<Value>,
    #[serde(default)]
    pub custom_data: HashMap<String, Value>,
}

/// Method names understood by each provider class.
pub mod methods {
    pub const GET_USER_PROFILE: &str = "get_user_profile";
    pub const GET_USER_BY_EMAIL: &str = "get_user_by_email";
    pub const GET_USER_BY_USERNAME: &str = "get_user_by_username";
    pub const QUERY_USER_DATA: &str = "query_user_data";
    pub const GET_USER_BALANCE: &str = "get_user_balance";
    pub const GET_USER_POINTS: &str = "get_user_points";
    pub const GET_BALANCE_INFO: &str = "get_balance_info";
    pub const GET_TOP_BALANCES: &str = "get_top_balances";
    pub const GET_BALANCE_STATS: &str = "get_balance_stats";
    pub const SEARCH_USER_BALANCES: &str = "search_user_balances";

    pub const USER_METHODS: [&str; 10] = [
        GET_USER_PROFILE,
        GET_USER_BY_EMAIL,
        GET_USER_BY_USERNAME,
        QUERY_USER_DATA,
        GET_USER_BALANCE,
        GET_USER_POINTS,
        GET_BALANCE_INFO,
        GET_TOP_BALANCES,
        GET_BALANCE_STATS,
        SEARCH_USER_BALANCES,
    ];

    pub const GET_PENDING_ORDERS_COUNT: &str = "get_pending_orders_count";
    pub const GET_PENDING_PAYMENT_AMOUNT: &str = "get_pending_payment_amount";
    pub const GET_DELIVERY_ESTIMATES: &str = "get_delivery_estimates";
    pub const GET_NEXT_DELIVERY_ORDER: &str = "get_next_delivery_order";
    pub const GET_ORDER_SUMMARY: &str = "get_order_summary";
    pub const GET_COMPLETED_ORDERS_SUMMARY: &str = "get_completed_orders_summary";
    pub const GET_RECENT_ORDERS: &str = "get_recent_orders";
    pub const GET_LATEST_ORDER: &str = "get_latest_order";
    pub const GET_HIGHEST_VALUE_ORDER: &str = "get_highest_value_order";
    pub const GET_LOWEST_VALUE_ORDER: &str = "get_lowest_value_order";
    pub const GET_AVERAGE_ORDER_VALUE: &str = "get_average_order_value";
    pub const GET_USER_ORDER_DASHBOARD: &str = "get_user_order_dashboard";
    pub const QUERY_ORDER_DATA: &str = "query_order_data";

    pub const ORDER_METHODS: [&str; 13] = [
        GET_PENDING_ORDERS_COUNT,
        GET_PENDING_PAYMENT_AMOUNT,
        GET_DELIVERY_ESTIMATES,
        GET_NEXT_DELIVERY_ORDER,
        GET_ORDER_SUMMARY,
        GET_COMPLETED_ORDERS_SUMMARY,
        GET_RECENT_ORDERS,
        GET_LATEST_ORDER,
        GET_HIGHEST_VALUE_ORDER,
        GET_LOWEST_VALUE_ORDER,
        GET_AVERAGE_ORDER_VALUE,
        GET_USER_ORDER_DASHBOARD,
        QUERY_ORDER_DATA,
    ];
}
