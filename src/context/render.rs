//! Provider result -> fragment text.
//!
//! Each renderer returns `None` when the payload lacks the field the line is
//! built around, so the caller can substitute the "no data" wording.

use super::labels::Labels;
use crate::core::format::{as_amount, as_count, date_only, group_thousands, money, text_or};
use crate::intent::IntentTag;
use serde_json::Value;

pub struct FragmentRenderer {
    labels: &'static Labels,
    currency: String,
    days_ahead: u32,
}

impl FragmentRenderer {
    pub fn new(labels: &'static Labels, currency: impl Into<String>, days_ahead: u32) -> Self {
        Self {
            labels,
            currency: currency.into(),
            days_ahead,
        }
    }

    pub fn labels(&self) -> &'static Labels {
        self.labels
    }

    fn money(&self, value: &Value) -> String {
        money(value, &self.currency)
    }

    pub fn render(&self, tag: IntentTag, result: &Value) -> Option<String> {
        match tag {
            IntentTag::Pending => self.pending(result),
            IntentTag::Payment => self.payment(result),
            IntentTag::Delivery => self.delivery(result),
            IntentTag::NextDelivery => self.next_delivery(result),
            IntentTag::Summary => self.summary(result),
            IntentTag::Completed => self.completed(result),
            IntentTag::Recent => self.recent(result),
            IntentTag::Latest => self.single_order(self.labels.latest, result.get("latest_order")),
            IntentTag::HighestValue => {
                self.single_order(self.labels.highest_value, result.get("highest_value_order"))
            }
            IntentTag::LowestValue => {
                self.single_order(self.labels.lowest_value, result.get("lowest_value_order"))
            }
            IntentTag::AverageValue => self.average(result),
            IntentTag::Balance => self.balance(result),
        }
    }

    fn pending(&self, result: &Value) -> Option<String> {
        let orders = present(result, "pending_orders_count")?;
        let items = present(result, "pending_items_count")?;
        let l = self.labels;
        Some(format!(
            "{}: {} {}, {} {}",
            l.pending,
            as_count(orders),
            l.orders,
            as_count(items),
            l.items
        ))
    }

    fn payment(&self, result: &Value) -> Option<String> {
        let unpaid = present(result, "unpaid_amount")?;
        let l = self.labels;
        Some(format!(
            "{}: {} {} ({} {}), {} {}",
            l.payment,
            self.money(unpaid),
            l.unpaid,
            as_count(&result["unpaid_orders"]),
            l.orders,
            self.money(&result["total_pending_amount"]),
            l.in_progress
        ))
    }

    fn delivery(&self, result: &Value) -> Option<String> {
        let upcoming = present(result, "upcoming_deliveries")?;
        let l = self.labels;
        let days = result
            .get("days_ahead")
            .map(as_count)
            .unwrap_or(self.days_ahead as u64);
        let mut text = format!(
            "{}: {} {} {} {}, {} {}",
            l.delivery,
            as_count(upcoming),
            l.expected_within,
            days,
            l.days,
            as_count(&result["total_shipped_pending"]),
            l.in_transit
        );
        if let Some(nearest) = result["delivery_estimates"].as_array().and_then(|e| e.first()) {
            text.push_str(&format!(
                "\n  * {}: {} - {}",
                text_or(&nearest["order_id"], "N/A"),
                date_only(&nearest["estimated_delivery_min"]),
                date_only(&nearest["estimated_delivery_max"])
            ));
        }
        Some(text)
    }

    fn next_delivery(&self, result: &Value) -> Option<String> {
        let next = present(result, "next_delivery")?;
        Some(format!(
            "{}: {}, {} - {} ({})",
            self.labels.next_delivery,
            text_or(&next["order_id"], "N/A"),
            date_only(&next["estimated_delivery_min"]),
            date_only(&next["estimated_delivery_max"]),
            self.money(&next["total_value"])
        ))
    }

    fn summary(&self, result: &Value) -> Option<String> {
        let s = present(result, "summary")?;
        let l = self.labels;
        Some(format!(
            "{}: {} {}, {} {}, {}; {} {}, {} {}, {} {}, {} {}",
            l.summary,
            as_count(&s["total_orders"]),
            l.orders,
            as_count(&s["total_items"]),
            l.items,
            self.money(&s["total_value"]),
            as_count(&s["delivered_items"]),
            l.delivered,
            as_count(&s["shipping_items"]),
            l.shipping,
            as_count(&s["pending_items"]),
            l.waiting,
            as_count(&s["cancelled_items"]),
            l.cancelled
        ))
    }

    fn completed(&self, result: &Value) -> Option<String> {
        let c = present(result, "completed_summary")?;
        let l = self.labels;
        Some(format!(
            "{}: {} {}, {} {}, {}",
            l.completed,
            as_count(&c["completed_orders"]),
            l.orders,
            as_count(&c["completed_items"]),
            l.items,
            self.money(&c["completed_value"])
        ))
    }

    fn order_line(&self, order: &Value) -> String {
        format!(
            "{} ({}) - {} - {}",
            text_or(&order["order_id"], "N/A"),
            text_or(&order["status"], "unknown"),
            self.money(&order["total_value"]),
            date_only(&order["created_at"])
        )
    }

    fn recent(&self, result: &Value) -> Option<String> {
        let orders = present(result, "recent_orders")?.as_array()?;
        let l = self.labels;
        if orders.is_empty() {
            return Some(format!("{}: 0 {}", l.recent, l.orders));
        }
        let mut text = format!("{}:", l.recent);
        for order in orders {
            text.push_str("\n  * ");
            text.push_str(&self.order_line(order));
        }
        Some(text)
    }

    fn single_order(&self, title: &str, order: Option<&Value>) -> Option<String> {
        let order = order.filter(|o| o.is_object())?;
        Some(format!("{}: {}", title, self.order_line(order)))
    }

    fn average(&self, result: &Value) -> Option<String> {
        let average = present(result, "average_order_value")?;
        Some(format!(
            "{}: {} ({} {})",
            self.labels.average_value,
            self.money(average),
            as_count(&result["order_count"]),
            self.labels.orders
        ))
    }

    fn balance(&self, result: &Value) -> Option<String> {
        let amount = present(&result["balance"], "amount")?;
        Some(format!(
            "{}: {}, {} {}",
            self.labels.balance,
            self.money(amount),
            group_thousands(as_amount(&result["points"]["amount"])),
            self.labels.points
        ))
    }

    /// Composite fragment from `get_user_order_dashboard`.
    pub fn dashboard(&self, result: &Value) -> Option<String> {
        let d = present(result, "dashboard")?;
        let l = self.labels;
        let mut text = format!(
            "{}:\n- {}: {}\n- {}: {}\n- {} ({} {}): {}",
            l.dashboard,
            l.pending,
            as_count(&d["pending_orders"]["count"]),
            l.unpaid_amount,
            self.money(&d["financial"]["unpaid_amount"]),
            l.upcoming,
            self.days_ahead,
            l.days,
            as_count(&d["deliveries"]["upcoming_7_days"])
        );
        if let Some(recent) = d["recent_orders"].as_array().filter(|r| !r.is_empty()) {
            text.push_str(&format!("\n- {}:", l.recent));
            for order in recent.iter().take(3) {
                text.push_str("\n  * ");
                text.push_str(&self.order_line(order));
            }
        }
        Some(text)
    }
}

fn present<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key).filter(|v| !v.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::labels::{EN, VI};
    use serde_json::json;

    fn renderer() -> FragmentRenderer {
        FragmentRenderer::new(&EN, "VND", 7)
    }

    #[test]
    fn test_pending_line_carries_both_counts() {
        let text = renderer()
            .render(
                IntentTag::Pending,
                &json!({"pending_orders_count": 2, "pending_items_count": 5}),
            )
            .unwrap();
        assert_eq!(text, "Pending orders: 2 orders, 5 items");
    }

    #[test]
    fn test_pending_line_in_vietnamese() {
        let text = FragmentRenderer::new(&VI, "VND", 7)
            .render(
                IntentTag::Pending,
                &json!({"pending_orders_count": 2, "pending_items_count": 5}),
            )
            .unwrap();
        assert_eq!(text, "Đơn hàng đang chờ giao: 2 đơn, 5 sản phẩm");
    }

    #[test]
    fn test_missing_field_is_none() {
        assert!(renderer().render(IntentTag::Pending, &json!({})).is_none());
        assert!(renderer()
            .render(IntentTag::Latest, &json!({"latest_order": null}))
            .is_none());
    }

    #[test]
    fn test_payment_groups_thousands() {
        let text = renderer()
            .render(
                IntentTag::Payment,
                &json!({"unpaid_amount": 280000, "unpaid_orders": 1, "total_pending_amount": 610000}),
            )
            .unwrap();
        assert_eq!(text, "Payment due: 280,000 VND unpaid (1 orders), 610,000 VND in progress");
    }

    #[test]
    fn test_recent_lists_orders_with_dates_truncated() {
        let text = renderer()
            .render(
                IntentTag::Recent,
                &json!({"recent_orders": [
                    {"order_id": "ORD-1", "status": "shipping", "total_value": 330000, "created_at": "2024-05-02T10:11:12+00:00"}
                ]}),
            )
            .unwrap();
        assert_eq!(text, "Recent orders:\n  * ORD-1 (shipping) - 330,000 VND - 2024-05-02");
    }

    #[test]
    fn test_average_is_rounded() {
        let text = renderer()
            .render(
                IntentTag::AverageValue,
                &json!({"average_order_value": 353333.67, "order_count": 3}),
            )
            .unwrap();
        assert_eq!(text, "Average order value: 353,334 VND (3 orders)");
    }

    #[test]
    fn test_balance_line() {
        let text = renderer()
            .render(
                IntentTag::Balance,
                &json!({"balance": {"amount": 1250000}, "points": {"amount": 3400}}),
            )
            .unwrap();
        assert_eq!(text, "Balance: 1,250,000 VND, 3,400 points");
    }

    #[test]
    fn test_dashboard_fragment() {
        let text = renderer()
            .dashboard(&json!({"dashboard": {
                "pending_orders": {"count": 2, "items": 5},
                "financial": {"unpaid_amount": 280000},
                "deliveries": {"upcoming_7_days": 3},
                "recent_orders": []
            }}))
            .unwrap();
        assert_eq!(
            text,
            "Order overview:\n- Pending orders: 2\n- Unpaid amount: 280,000 VND\n- Upcoming deliveries (7 days): 3"
        );
    }
}
