use super::fixtures::{self, DemoItem, DemoOrder};
use super::{error, param_str};
use crate::core::format::group_thousands;
use crate::providers::methods;
use crate::providers::server::ProviderHandler;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

const DELIVERY_MIN_DAYS: i64 = 3;
const DELIVERY_MAX_DAYS: i64 = 5;

pub struct DemoOrderProvider {
    orders: Vec<DemoOrder>,
    now: DateTime<Utc>,
}

impl Default for DemoOrderProvider {
    fn default() -> Self {
        Self::new()
    }
}

struct Estimate<'a> {
    order: &'a DemoOrder,
    item: &'a DemoItem,
    shipped_at: DateTime<Utc>,
    min: DateTime<Utc>,
    max: DateTime<Utc>,
}

impl DemoOrderProvider {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            orders: fixtures::orders(now),
            now,
        }
    }

    /// Orders owned by `user_id`, or every order when no user is given.
    fn scoped(&self, user_id: Option<&str>) -> Vec<&DemoOrder> {
        self.orders
            .iter()
            .filter(|order| user_id.map_or(true, |id| order.user_id == id))
            .collect()
    }

    fn query_time(&self) -> String {
        self.now.to_rfc3339()
    }

    fn pending_count(&self, user_id: Option<&str>) -> Value {
        let orders = self.scoped(user_id);
        let items = orders.iter().flat_map(|o| o.items.iter()).filter(|i| i.is_open()).count();
        let pending_orders = orders
            .iter()
            .filter(|o| o.items.iter().any(DemoItem::is_open))
            .count();
        json!({
            "pending_orders_count": pending_orders,
            "pending_items_count": items,
            "user_id": user_id,
            "query_time": self.query_time(),
        })
    }

    fn pending_payment(&self, user_id: Option<&str>) -> Value {
        let orders = self.scoped(user_id);
        let mut total_pending = 0;
        let mut unpaid = 0;
        let mut items = 0;
        let mut pending_orders = 0;
        let mut unpaid_orders = 0;
        for order in orders {
            let open: i64 = order.items.iter().filter(|i| i.is_open()).map(DemoItem::value).sum();
            let open_items = order.items.iter().filter(|i| i.is_open()).count();
            if open_items == 0 {
                continue;
            }
            pending_orders += 1;
            items += open_items;
            total_pending += open;
            if !order.deposited {
                unpaid += open;
                unpaid_orders += 1;
            }
        }
        json!({
            "total_pending_amount": total_pending,
            "total_pending_items": items,
            "total_pending_orders": pending_orders,
            "unpaid_amount": unpaid,
            "unpaid_orders": unpaid_orders,
            "user_id": user_id,
            "query_time": self.query_time(),
        })
    }

    fn estimates(&self, user_id: Option<&str>) -> Vec<Estimate<'_>> {
        let mut estimates: Vec<Estimate> = self
            .scoped(user_id)
            .into_iter()
            .flat_map(|order| order.items.iter().map(move |item| (order, item)))
            .filter(|(_, item)| item.is_in_transit())
            .filter_map(|(order, item)| {
                item.shipped_at.map(|shipped_at| Estimate {
                    order,
                    item,
                    shipped_at,
                    min: shipped_at + Duration::days(DELIVERY_MIN_DAYS),
                    max: shipped_at + Duration::days(DELIVERY_MAX_DAYS),
                })
            })
            .collect();
        estimates.sort_by(|a, b| b.shipped_at.cmp(&a.shipped_at));
        estimates
    }

    fn delivery_estimates(&self, user_id: Option<&str>, days_ahead: i64) -> Value {
        let horizon = self.now + Duration::days(days_ahead);
        let estimates = self.estimates(user_id);
        let upcoming = estimates.iter().filter(|e| e.max <= horizon).count();
        let entries: Vec<Value> = estimates
            .iter()
            .map(|e| {
                json!({
                    "order_id": e.order.order_id,
                    "customer_name": e.order.customer_name,
                    "address": e.order.address,
                    "shipped_at": e.shipped_at.to_rfc3339(),
                    "estimated_delivery_min": e.min.to_rfc3339(),
                    "estimated_delivery_max": e.max.to_rfc3339(),
                    "total_value": e.item.value(),
                    "quantity": e.item.quantity,
                })
            })
            .collect();
        json!({
            "total_shipped_pending": entries.len(),
            "delivery_estimates": entries,
            "upcoming_deliveries": upcoming,
            "days_ahead": days_ahead,
            "user_id": user_id,
        })
    }

    fn next_delivery(&self, user_id: Option<&str>) -> Value {
        let next = self.estimates(user_id).into_iter().min_by_key(|e| e.min);
        match next {
            Some(e) => json!({
                "next_delivery": {
                    "order_id": e.order.order_id,
                    "estimated_delivery_min": e.min.to_rfc3339(),
                    "estimated_delivery_max": e.max.to_rfc3339(),
                    "total_value": e.order.total_value(),
                }
            }),
            None => json!({ "next_delivery": null }),
        }
    }

    fn summary(&self, user_id: Option<&str>) -> Value {
        let orders = self.scoped(user_id);
        let items: Vec<&DemoItem> = orders.iter().flat_map(|o| o.items.iter()).collect();
        json!({
            "summary": {
                "total_orders": orders.len(),
                "total_items": items.len(),
                "total_value": orders.iter().map(|o| o.total_value()).sum::<i64>(),
                "delivered_items": items.iter().filter(|i| i.delivered_at.is_some()).count(),
                "shipping_items": items.iter().filter(|i| i.is_in_transit()).count(),
                "pending_items": items.iter().filter(|i| i.is_open() && i.shipped_at.is_none()).count(),
                "cancelled_items": items.iter().filter(|i| i.cancelled_at.is_some()).count(),
            },
            "user_id": user_id,
        })
    }

    fn completed_summary(&self, user_id: Option<&str>) -> Value {
        let completed: Vec<&DemoOrder> = self
            .scoped(user_id)
            .into_iter()
            .filter(|o| o.status() == "delivered")
            .collect();
        json!({
            "completed_summary": {
                "completed_orders": completed.len(),
                "completed_items": completed.iter().map(|o| o.items.len()).sum::<usize>(),
                "completed_value": completed.iter().map(|o| o.total_value()).sum::<i64>(),
            },
            "user_id": user_id,
        })
    }

    fn by_recency(&self, user_id: Option<&str>) -> Vec<&DemoOrder> {
        let mut orders = self.scoped(user_id);
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    fn recent(&self, user_id: Option<&str>, limit: usize) -> Value {
        let recent: Vec<Value> = self
            .by_recency(user_id)
            .into_iter()
            .take(limit)
            .map(DemoOrder::to_json)
            .collect();
        json!({
            "count": recent.len(),
            "recent_orders": recent,
            "user_id": user_id,
        })
    }

    fn latest(&self, user_id: Option<&str>) -> Value {
        let latest = self.by_recency(user_id).first().map(|o| o.to_json());
        json!({ "latest_order": latest })
    }

    /// Cancelled orders do not count towards value statistics.
    fn valued(&self, user_id: Option<&str>) -> Vec<&DemoOrder> {
        self.scoped(user_id)
            .into_iter()
            .filter(|o| o.status() != "cancelled")
            .collect()
    }

    fn highest(&self, user_id: Option<&str>) -> Value {
        let order = self.valued(user_id).into_iter().max_by_key(|o| o.total_value());
        json!({ "highest_value_order": order.map(DemoOrder::to_json) })
    }

    fn lowest(&self, user_id: Option<&str>) -> Value {
        let order = self.valued(user_id).into_iter().min_by_key(|o| o.total_value());
        json!({ "lowest_value_order": order.map(DemoOrder::to_json) })
    }

    fn average(&self, user_id: Option<&str>) -> Value {
        let orders = self.valued(user_id);
        let total: i64 = orders.iter().map(|o| o.total_value()).sum();
        let average = if orders.is_empty() {
            0.0
        } else {
            total as f64 / orders.len() as f64
        };
        json!({
            "average_order_value": average,
            "order_count": orders.len(),
            "user_id": user_id,
        })
    }

    fn dashboard(&self, user_id: Option<&str>) -> Value {
        let Some(user_id) = user_id else {
            return error("user_id is required");
        };
        let user = Some(user_id);
        let pending = self.pending_count(user);
        let payment = self.pending_payment(user);
        let deliveries = self.delivery_estimates(user, 7);
        let summary = self.summary(user);
        let recent = self.recent(user, 5);

        let top_estimates: Vec<Value> = deliveries["delivery_estimates"]
            .as_array()
            .map(|all| all.iter().take(3).cloned().collect())
            .unwrap_or_default();

        json!({
            "dashboard": {
                "user_id": user_id,
                "pending_orders": {
                    "count": pending["pending_orders_count"],
                    "items": pending["pending_items_count"],
                },
                "financial": {
                    "total_pending_amount": payment["total_pending_amount"],
                    "unpaid_amount": payment["unpaid_amount"],
                    "unpaid_orders": payment["unpaid_orders"],
                },
                "deliveries": {
                    "upcoming_7_days": deliveries["upcoming_deliveries"],
                    "total_shipped": deliveries["total_shipped_pending"],
                    "estimates": top_estimates,
                },
                "summary": summary["summary"],
                "recent_orders": recent["recent_orders"],
            },
            "generated_at": pending["query_time"],
        })
    }

    fn query(&self, user_id: Option<&str>, query: Option<&str>) -> Value {
        let Some(user_id) = user_id else {
            return error("user_id is required");
        };
        let Some(query) = query else {
            return error("query is required");
        };
        let query = query.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| query.contains(w));
        let user = Some(user_id);

        if has(&["chờ giao", "pending", "đang chờ", "chưa giao"]) {
            let data = self.pending_count(user);
            let answer = format!(
                "You have {} pending orders with {} items in total.",
                data["pending_orders_count"], data["pending_items_count"]
            );
            json!({ "answer": answer, "data": data })
        } else if has(&["tiền", "thanh toán", "phải trả", "payment", "money"]) {
            let data = self.pending_payment(user);
            let answer = format!(
                "You need to pay {} VND across {} unpaid orders. Orders in progress total {} VND.",
                group_thousands(data["unpaid_amount"].as_i64().unwrap_or(0)),
                data["unpaid_orders"],
                group_thousands(data["total_pending_amount"].as_i64().unwrap_or(0)),
            );
            json!({ "answer": answer, "data": data })
        } else if has(&["giao hàng", "delivery", "dự kiến", "khi nào đến"]) {
            let data = self.delivery_estimates(user, 7);
            let mut answer = format!(
                "You have {} orders expected within the next 7 days.",
                data["upcoming_deliveries"]
            );
            if let Some(first) = data["delivery_estimates"].get(0) {
                answer.push_str(&format!(
                    " The nearest ({}) arrives between {} and {}.",
                    first["order_id"].as_str().unwrap_or("N/A"),
                    crate::core::format::date_only(&first["estimated_delivery_min"]),
                    crate::core::format::date_only(&first["estimated_delivery_max"]),
                ));
            }
            json!({ "answer": answer, "data": data })
        } else if has(&["tổng quan", "summary", "thống kê", "overview"]) {
            let data = self.summary(user);
            let s = &data["summary"];
            let answer = format!(
                "{} orders, {} items, total value {} VND.",
                s["total_orders"],
                s["total_items"],
                group_thousands(s["total_value"].as_i64().unwrap_or(0)),
            );
            json!({ "answer": answer, "data": data })
        } else if has(&["gần đây", "recent", "mới nhất", "latest"]) {
            let data = self.recent(user, 5);
            let answer = format!("You have {} recent orders.", data["count"]);
            json!({ "answer": answer, "data": data })
        } else {
            let data = self.dashboard(user);
            let d = &data["dashboard"];
            let answer = format!(
                "{} pending orders, {} VND to pay, {} deliveries in the next 7 days.",
                d["pending_orders"]["count"],
                group_thousands(d["financial"]["unpaid_amount"].as_i64().unwrap_or(0)),
                d["deliveries"]["upcoming_7_days"],
            );
            json!({ "answer": answer, "data": data })
        }
    }
}

#[async_trait]
impl ProviderHandler for DemoOrderProvider {
    fn name(&self) -> &str {
        "demo-order-provider"
    }

    fn methods(&self) -> Vec<&'static str> {
        methods::ORDER_METHODS.to_vec()
    }

    async fn handle(&self, method: &str, params: &Value) -> Result<Option<Value>> {
        let user_id = param_str(params, "user_id");
        let result = match method {
            methods::GET_PENDING_ORDERS_COUNT => self.pending_count(user_id),
            methods::GET_PENDING_PAYMENT_AMOUNT => self.pending_payment(user_id),
            methods::GET_DELIVERY_ESTIMATES => {
                let days = params.get("days_ahead").and_then(Value::as_i64).unwrap_or(30);
                self.delivery_estimates(user_id, days)
            }
            methods::GET_NEXT_DELIVERY_ORDER => self.next_delivery(user_id),
            methods::GET_ORDER_SUMMARY => self.summary(user_id),
            methods::GET_COMPLETED_ORDERS_SUMMARY => self.completed_summary(user_id),
            methods::GET_RECENT_ORDERS => {
                let limit = params.get("limit").and_then(Value::as_u64).unwrap_or(10);
                self.recent(user_id, limit as usize)
            }
            methods::GET_LATEST_ORDER => self.latest(user_id),
            methods::GET_HIGHEST_VALUE_ORDER => self.highest(user_id),
            methods::GET_LOWEST_VALUE_ORDER => self.lowest(user_id),
            methods::GET_AVERAGE_ORDER_VALUE => self.average(user_id),
            methods::GET_USER_ORDER_DASHBOARD => self.dashboard(user_id),
            methods::QUERY_ORDER_DATA => self.query(user_id, param_str(params, "query")),
            _ => return Ok(None),
        };
        Ok(Some(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::demo::{ADMIN_ID, JOHN_ID};

    async fn call(method: &str, params: Value) -> Value {
        DemoOrderProvider::new()
            .handle(method, &params)
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_pending_counts_for_admin() {
        let result = call("get_pending_orders_count", json!({"user_id": ADMIN_ID})).await;
        assert_eq!(result["pending_orders_count"], 2);
        assert_eq!(result["pending_items_count"], 5);
    }

    #[tokio::test]
    async fn test_pending_payment_splits_unpaid() {
        let result = call("get_pending_payment_amount", json!({"user_id": ADMIN_ID})).await;
        assert_eq!(result["total_pending_amount"], 610_000);
        assert_eq!(result["unpaid_amount"], 280_000);
        assert_eq!(result["unpaid_orders"], 1);
    }

    #[tokio::test]
    async fn test_delivery_window() {
        let result = call(
            "get_delivery_estimates",
            json!({"user_id": ADMIN_ID, "days_ahead": 7}),
        )
        .await;
        assert_eq!(result["total_shipped_pending"], 3);
        assert_eq!(result["upcoming_deliveries"], 3);

        let narrow = call(
            "get_delivery_estimates",
            json!({"user_id": ADMIN_ID, "days_ahead": 3}),
        )
        .await;
        assert_eq!(narrow["upcoming_deliveries"], 1);
    }

    #[tokio::test]
    async fn test_value_statistics_skip_cancelled() {
        let highest = call("get_highest_value_order", json!({"user_id": ADMIN_ID})).await;
        assert_eq!(highest["highest_value_order"]["order_id"], "ORD-1001");

        let lowest = call("get_lowest_value_order", json!({"user_id": ADMIN_ID})).await;
        assert_eq!(lowest["lowest_value_order"]["order_id"], "ORD-1002");

        let average = call("get_average_order_value", json!({"user_id": ADMIN_ID})).await;
        assert_eq!(average["order_count"], 3);
    }

    #[tokio::test]
    async fn test_recent_and_latest_order() {
        let recent = call("get_recent_orders", json!({"user_id": ADMIN_ID, "limit": 2})).await;
        assert_eq!(recent["count"], 2);
        assert_eq!(recent["recent_orders"][0]["order_id"], "ORD-1003");
        assert_eq!(recent["recent_orders"][0]["status"], "shipping");

        let latest = call("get_latest_order", json!({"user_id": JOHN_ID})).await;
        assert_eq!(latest["latest_order"]["order_id"], "ORD-2001");
    }

    #[tokio::test]
    async fn test_dashboard_requires_user() {
        let missing = call("get_user_order_dashboard", json!({})).await;
        assert_eq!(missing["error"], "user_id is required");

        let dashboard = call("get_user_order_dashboard", json!({"user_id": ADMIN_ID})).await;
        assert_eq!(dashboard["dashboard"]["pending_orders"]["count"], 2);
        assert_eq!(dashboard["dashboard"]["financial"]["unpaid_amount"], 280_000);
    }

    #[tokio::test]
    async fn test_query_order_data_routes_by_keyword() {
        let pending = call(
            "query_order_data",
            json!({"user_id": ADMIN_ID, "query": "đơn nào đang chờ giao?"}),
        )
        .await;
        assert!(pending["answer"].as_str().unwrap().contains("2 pending orders"));
    }
}
