//! Context Aggregator
//!
//! One provider call per matched tag, issued concurrently, fragments put
//! back in declared tag order. Every failure becomes a fragment.

use super::render::FragmentRenderer;
use super::{render_fragments, ContextFragment, FragmentKind};
use crate::error::{ProviderError, ProviderResult};
use crate::intent::{IntentClassifier, IntentTag};
use crate::providers::identity::{self, Resolution};
use crate::providers::{methods, OrderClient, UserClient};
use futures::future::join_all;
use serde_json::Value;

pub struct ContextAggregator {
    users: UserClient,
    orders: OrderClient,
    classifier: IntentClassifier,
    renderer: FragmentRenderer,
    days_ahead: u32,
    recent_limit: u32,
}

/// The user as seen by one turn.
struct TurnUser {
    raw: String,
    resolution: ProviderResult<Resolution>,
}

impl TurnUser {
    /// Canonical id when a lookup resolved one, else the raw identifier.
    fn provider_id(&self) -> &str {
        match &self.resolution {
            Ok(Resolution::Email { user_id, .. }) | Ok(Resolution::Username { user_id, .. }) => user_id,
            _ => &self.raw,
        }
    }
}

impl ContextAggregator {
    pub fn new(
        users: UserClient,
        orders: OrderClient,
        classifier: IntentClassifier,
        renderer: FragmentRenderer,
        days_ahead: u32,
        recent_limit: u32,
    ) -> Self {
        Self {
            users,
            orders,
            classifier,
            renderer,
            days_ahead,
            recent_limit,
        }
    }

    pub fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    /// Tags to fetch for `query`, in assembly order. `latest` yields to
    /// `recent` when both match.
    pub fn plan(&self, query: &str) -> Vec<IntentTag> {
        let classification = self.classifier.classify(query);
        let suppress_latest = classification.contains(IntentTag::Recent);
        classification
            .tags
            .into_iter()
            .filter(|tag| !(suppress_latest && *tag == IntentTag::Latest))
            .collect()
    }

    pub async fn classify_and_aggregate(&self, query: &str, user_id: &str) -> String {
        render_fragments(&self.aggregate(query, user_id).await)
    }

    pub async fn aggregate(&self, query: &str, user_id: &str) -> Vec<ContextFragment> {
        let plan = self.plan(query);
        let user = self.resolve_user(user_id).await;

        if plan.is_empty() {
            tracing::debug!("[Aggregator] no intent matched, using dashboard");
            return vec![self.dashboard(&user).await];
        }

        let mut fragments = join_all(plan.iter().map(|tag| self.fetch(*tag, &user))).await;

        if fragments.iter().all(ContextFragment::is_failure) {
            tracing::warn!("[Aggregator] all {} lookups failed, trying dashboard", fragments.len());
            let dashboard = self.dashboard(&user).await;
            if !dashboard.is_failure() {
                fragments.push(dashboard);
            }
        }

        fragments
    }

    async fn resolve_user(&self, raw: &str) -> TurnUser {
        let resolution = identity::resolve(&self.users, raw).await;
        match &resolution {
            Ok(Resolution::Unresolved(id)) => {
                tracing::warn!("[Aggregator] user identifier '{}' not found", id)
            }
            Err(e) => tracing::warn!("[Aggregator] could not resolve '{}': {}", raw, e),
            Ok(_) => {}
        }
        TurnUser {
            raw: raw.to_string(),
            resolution,
        }
    }

    async fn fetch(&self, tag: IntentTag, user: &TurnUser) -> ContextFragment {
        let uid = Some(user.provider_id());
        let outcome = match tag {
            IntentTag::Balance => return self.balance(user).await,
            IntentTag::Pending => self.orders.get_pending_orders_count(uid).await,
            IntentTag::Payment => self.orders.get_pending_payment_amount(uid).await,
            IntentTag::Delivery => self.orders.get_delivery_estimates(uid, self.days_ahead).await,
            IntentTag::NextDelivery => {
                self.orders.call_for_user(methods::GET_NEXT_DELIVERY_ORDER, uid).await
            }
            IntentTag::Summary => self.orders.get_order_summary(uid).await,
            IntentTag::Completed => {
                self.orders
                    .call_for_user(methods::GET_COMPLETED_ORDERS_SUMMARY, uid)
                    .await
            }
            IntentTag::Recent => self.orders.get_recent_orders(uid, self.recent_limit).await,
            IntentTag::Latest => self.orders.call_for_user(methods::GET_LATEST_ORDER, uid).await,
            IntentTag::HighestValue => {
                self.orders.call_for_user(methods::GET_HIGHEST_VALUE_ORDER, uid).await
            }
            IntentTag::LowestValue => {
                self.orders.call_for_user(methods::GET_LOWEST_VALUE_ORDER, uid).await
            }
            IntentTag::AverageValue => {
                self.orders.call_for_user(methods::GET_AVERAGE_ORDER_VALUE, uid).await
            }
        };

        self.fragment(Some(tag), outcome, |result| self.renderer.render(tag, result))
    }

    async fn balance(&self, user: &TurnUser) -> ContextFragment {
        let labels = self.renderer.labels();
        let tag = Some(IntentTag::Balance);
        match &user.resolution {
            Ok(Resolution::Anonymous) => {
                ContextFragment::failed(tag, FragmentKind::Anonymous, labels.balance_anonymous)
            }
            Ok(Resolution::Unresolved(_)) => {
                ContextFragment::failed(tag, FragmentKind::NoData, labels.no_data)
            }
            Err(e) => self.fragment(tag, Err(e.clone()), |_| None),
            Ok(_) => {
                let outcome = self.users.get_balance_info(user.provider_id()).await;
                self.fragment(tag, outcome, |result| self.renderer.render(IntentTag::Balance, result))
            }
        }
    }

    async fn dashboard(&self, user: &TurnUser) -> ContextFragment {
        let outcome = self.orders.get_user_order_dashboard(user.provider_id()).await;
        self.fragment(None, outcome, |result| self.renderer.dashboard(result))
    }

    fn fragment<F>(&self, tag: Option<IntentTag>, outcome: ProviderResult<Value>, render: F) -> ContextFragment
    where
        F: FnOnce(&Value) -> Option<String>,
    {
        let labels = self.renderer.labels();
        let name = tag.map(|t| t.as_str()).unwrap_or("dashboard");
        match outcome {
            Ok(result) => match render(&result) {
                Some(text) => ContextFragment::data(tag, text),
                None => {
                    tracing::warn!("[Aggregator] {} answer lacked expected fields", name);
                    ContextFragment::failed(tag, FragmentKind::NoData, labels.no_data)
                }
            },
            Err(e) => {
                let kind = FragmentKind::from(&e);
                tracing::warn!("[Aggregator] {} degraded to {:?}: {}", name, kind, e);
                let text = match kind {
                    FragmentKind::Unavailable => labels.unavailable,
                    _ => labels.no_data,
                };
                ContextFragment::failed(tag, kind, text)
            }
        }
    }
}

impl From<&ProviderError> for FragmentKind {
    fn from(error: &ProviderError) -> Self {
        if error.is_transport() {
            FragmentKind::Unavailable
        } else {
            FragmentKind::NoData
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::labels::EN;
    use crate::providers::registry::tests::MockTransport;
    use crate::providers::ProviderRegistry;
    use serde_json::json;
    use std::sync::Arc;
    use tokio::time::Duration;

    const UID: &str = "6f1c2a3e-1b2c-4d5e-8f90-123456789abc";

    fn aggregator(users: MockTransport, orders: MockTransport) -> (ContextAggregator, Arc<MockTransport>, Arc<MockTransport>) {
        let users = Arc::new(users);
        let orders = Arc::new(orders);
        let mut registry = ProviderRegistry::new(Duration::from_millis(200));
        registry.register("users", users.clone());
        registry.register("orders", orders.clone());
        let registry = Arc::new(registry);

        let aggregator = ContextAggregator::new(
            UserClient::new(registry.clone(), "users"),
            OrderClient::new(registry, "orders"),
            IntentClassifier::default(),
            FragmentRenderer::new(&EN, "VND", 7),
            7,
            5,
        );
        (aggregator, users, orders)
    }

    fn dashboard() -> Value {
        json!({"dashboard": {
            "pending_orders": {"count": 1},
            "financial": {"unpaid_amount": 1000},
            "deliveries": {"upcoming_7_days": 0},
            "recent_orders": []
        }})
    }

    #[tokio::test]
    async fn test_pending_query_issues_pending_lookup() {
        let (aggregator, _, orders) = aggregator(
            MockTransport::new(),
            MockTransport::new().with(
                "get_pending_orders_count",
                Ok(json!({"pending_orders_count": 2, "pending_items_count": 5})),
            ),
        );

        let text = aggregator
            .classify_and_aggregate("Tôi cần kiểm tra trạng thái đơn hàng đang chờ giao", UID)
            .await;

        assert_eq!(text, "Pending orders: 2 orders, 5 items");
        let calls = orders.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1["user_id"], UID);
    }

    #[tokio::test]
    async fn test_fragments_follow_declared_order() {
        let orders = MockTransport::new()
            .with("get_pending_payment_amount", Ok(json!({"unpaid_amount": 5, "unpaid_orders": 1, "total_pending_amount": 5})))
            .with("get_delivery_estimates", Ok(json!({"upcoming_deliveries": 1, "total_shipped_pending": 1})));
        let (aggregator, _, _) = aggregator(MockTransport::new(), orders);

        let fragments = aggregator
            .aggregate("delivery date and payment please", UID)
            .await;

        let tags: Vec<_> = fragments.iter().map(|f| f.tag).collect();
        assert_eq!(tags, vec![Some(IntentTag::Payment), Some(IntentTag::Delivery)]);
        assert!(fragments.iter().all(|f| f.kind == FragmentKind::Data));
    }

    #[tokio::test]
    async fn test_latest_suppressed_by_recent() {
        let (aggregator, _, _) = aggregator(MockTransport::new(), MockTransport::new());
        assert_eq!(aggregator.plan("my latest and recent orders"), vec![IntentTag::Recent]);
        assert_eq!(aggregator.plan("my latest order"), vec![IntentTag::Latest]);
    }

    #[tokio::test]
    async fn test_no_match_falls_back_to_dashboard() {
        let (aggregator, _, orders) = aggregator(
            MockTransport::new(),
            MockTransport::new().with("get_user_order_dashboard", Ok(dashboard())),
        );

        let fragments = aggregator.aggregate("hello there", UID).await;

        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].tag, None);
        assert!(fragments[0].text.starts_with("Order overview:"));
        assert_eq!(orders.methods_called(), vec!["get_user_order_dashboard"]);
    }

    #[tokio::test]
    async fn test_anonymous_balance_makes_no_call() {
        let (aggregator, users, orders) = aggregator(MockTransport::new(), MockTransport::new());

        let fragments = aggregator.aggregate("What's my balance?", "anonymous").await;

        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].kind, FragmentKind::Anonymous);
        assert_eq!(fragments[0].text, EN.balance_anonymous);
        assert!(users.methods_called().is_empty());
        assert!(orders.methods_called().is_empty());
    }

    #[tokio::test]
    async fn test_email_resolved_once_then_used_for_balance() {
        let users = MockTransport::new()
            .with("get_user_by_email", Ok(json!({"user_id": UID})))
            .with(
                "get_balance_info",
                Ok(json!({"balance": {"amount": 1250000}, "points": {"amount": 10}})),
            );
        let (aggregator, users, _) = aggregator(users, MockTransport::new());

        let text = aggregator
            .classify_and_aggregate("số dư của tôi", "admin@example.com")
            .await;

        assert_eq!(text, "Balance: 1,250,000 VND, 10 points");
        assert_eq!(users.methods_called(), vec!["get_user_by_email", "get_balance_info"]);
        assert_eq!(users.calls.lock().unwrap()[1].1["user_id"], UID);
    }

    #[tokio::test]
    async fn test_unresolved_user_gets_no_data_for_balance() {
        let users = MockTransport::new().with(
            "get_user_by_username",
            Err(ProviderError::Application("User not found with username ghost".into())),
        );
        let (aggregator, _, _) = aggregator(users, MockTransport::new());

        let fragments = aggregator.aggregate("balance?", "ghost").await;
        assert_eq!(fragments[0].kind, FragmentKind::NoData);
        assert_eq!(fragments[0].text, "No data available");
    }

    #[tokio::test]
    async fn test_transport_failure_isolated_to_its_tag() {
        let orders = MockTransport::new()
            .with("get_pending_orders_count", Err(ProviderError::Protocol("not json".into())))
            .with("get_order_summary", Ok(json!({"summary": {"total_orders": 3}})));
        let (aggregator, _, _) = aggregator(MockTransport::new(), orders);

        let fragments = aggregator.aggregate("pending orders summary", UID).await;

        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].text, "Unable to retrieve data");
        assert_eq!(fragments[0].kind, FragmentKind::Unavailable);
        assert_eq!(fragments[1].tag, Some(IntentTag::Summary));
        assert_eq!(fragments[1].kind, FragmentKind::Data);
    }

    #[tokio::test]
    async fn test_all_failed_appends_dashboard() {
        let orders = MockTransport::new()
            .with("get_pending_orders_count", Err(ProviderError::Application("db down".into())))
            .with("get_user_order_dashboard", Ok(dashboard()));
        let (aggregator, _, _) = aggregator(MockTransport::new(), orders);

        let fragments = aggregator.aggregate("pending?", UID).await;

        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].text, "No data available");
        assert_eq!(fragments[1].tag, None);
    }

    #[tokio::test]
    async fn test_slow_provider_degrades_to_unavailable() {
        let orders = MockTransport::new()
            .with("get_pending_orders_count", Ok(json!({"pending_orders_count": 1, "pending_items_count": 1})))
            .with_delay(Duration::from_secs(2));
        let (aggregator, _, _) = aggregator(MockTransport::new(), orders);

        let fragments = aggregator.aggregate("pending?", UID).await;
        assert_eq!(fragments[0].kind, FragmentKind::Unavailable);
    }
}
