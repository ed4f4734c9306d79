//! Fixture data shared by the demo providers.
//!
//! Order timestamps are relative to construction time so delivery windows
//! stay meaningful whenever the demo runs.

use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

pub const ADMIN_ID: &str = "6f1c2a3e-1b2c-4d5e-8f90-123456789abc";
pub const JOHN_ID: &str = "0b7e4c1d-2f3a-4b5c-9d6e-7f8091a2b3c4";

#[derive(Debug, Clone)]
pub struct DemoUser {
    pub id: &'static str,
    pub username: &'static str,
    pub email: &'static str,
    pub first_name: &'static str,
    pub last_name: &'static str,
    pub nickname: Option<&'static str>,
    pub role: &'static str,
    pub phone: Option<&'static str>,
    pub language: &'static str,
    pub store_id: Option<&'static str>,
    pub level: u32,
    pub balance: i64,
    pub points: i64,
    pub history: Vec<Value>,
}

impl DemoUser {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

pub fn users() -> Vec<DemoUser> {
    vec![
        DemoUser {
            id: ADMIN_ID,
            username: "admin",
            email: "admin@example.com",
            first_name: "Admin",
            last_name: "User",
            nickname: Some("boss"),
            role: "admin",
            phone: Some("+84 901 234 567"),
            language: "vi",
            store_id: Some("a1b2c3d4-0000-4000-8000-000000000001"),
            level: 5,
            balance: 1_250_000,
            points: 3_400,
            history: vec![json!({
                "type": "chat",
                "timestamp": "2024-05-01T09:30:00Z",
                "user_message": "Đơn hàng ORD-1001 đã giao chưa?",
                "bot_response": "Đơn hàng ORD-1001 đã được giao thành công.",
                "topic": "orders"
            })],
        },
        DemoUser {
            id: JOHN_ID,
            username: "user123",
            email: "john@example.com",
            first_name: "John",
            last_name: "Doe",
            nickname: None,
            role: "customer",
            phone: None,
            language: "en",
            store_id: None,
            level: 1,
            balance: 85_000,
            points: 120,
            history: Vec::new(),
        },
    ]
}

#[derive(Debug, Clone)]
pub struct DemoItem {
    pub price: i64,
    pub quantity: i64,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl DemoItem {
    fn new(price: i64, quantity: i64) -> Self {
        Self {
            price,
            quantity,
            shipped_at: None,
            delivered_at: None,
            cancelled_at: None,
        }
    }

    fn shipped(mut self, at: DateTime<Utc>) -> Self {
        self.shipped_at = Some(at);
        self
    }

    fn delivered(mut self, at: DateTime<Utc>) -> Self {
        self.delivered_at = Some(at);
        self
    }

    fn cancelled(mut self, at: DateTime<Utc>) -> Self {
        self.cancelled_at = Some(at);
        self
    }

    pub fn value(&self) -> i64 {
        self.price * self.quantity
    }

    /// Neither delivered nor cancelled.
    pub fn is_open(&self) -> bool {
        self.delivered_at.is_none() && self.cancelled_at.is_none()
    }

    pub fn is_in_transit(&self) -> bool {
        self.shipped_at.is_some() && self.is_open()
    }
}

#[derive(Debug, Clone)]
pub struct DemoOrder {
    pub order_id: &'static str,
    pub user_id: &'static str,
    pub customer_name: &'static str,
    pub address: &'static str,
    pub created_at: DateTime<Utc>,
    pub deposited: bool,
    pub payment_method: &'static str,
    pub items: Vec<DemoItem>,
}

impl DemoOrder {
    pub fn total_value(&self) -> i64 {
        self.items.iter().map(DemoItem::value).sum()
    }

    pub fn status(&self) -> &'static str {
        if self.items.iter().all(|item| item.delivered_at.is_some()) {
            "delivered"
        } else if self.items.iter().any(|item| item.cancelled_at.is_some()) {
            "cancelled"
        } else if self.items.iter().any(|item| item.shipped_at.is_some()) {
            "shipping"
        } else {
            "pending"
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "order_id": self.order_id,
            "customer_name": self.customer_name,
            "address": self.address,
            "created_at": self.created_at.to_rfc3339(),
            "deposited": self.deposited,
            "payment_method": self.payment_method,
            "item_count": self.items.len(),
            "total_value": self.total_value(),
            "status": self.status(),
        })
    }
}

pub fn orders(now: DateTime<Utc>) -> Vec<DemoOrder> {
    let days = |n: i64| now - Duration::days(n);
    vec![
        DemoOrder {
            order_id: "ORD-1001",
            user_id: ADMIN_ID,
            customer_name: "Admin User",
            address: "12 Nguyen Hue, District 1, HCMC",
            created_at: days(10),
            deposited: true,
            payment_method: "bank_transfer",
            items: vec![DemoItem::new(450_000, 1).shipped(days(9)).delivered(days(7))],
        },
        DemoOrder {
            order_id: "ORD-1002",
            user_id: ADMIN_ID,
            customer_name: "Admin User",
            address: "12 Nguyen Hue, District 1, HCMC",
            created_at: days(3),
            deposited: false,
            payment_method: "cod",
            items: vec![DemoItem::new(120_000, 1), DemoItem::new(80_000, 2)],
        },
        DemoOrder {
            order_id: "ORD-1003",
            user_id: ADMIN_ID,
            customer_name: "Admin User",
            address: "45 Le Loi, District 3, HCMC",
            created_at: days(2),
            deposited: true,
            payment_method: "momo",
            items: vec![
                DemoItem::new(200_000, 1).shipped(days(1)),
                DemoItem::new(50_000, 2).shipped(days(1)),
                DemoItem::new(30_000, 1).shipped(days(2)),
            ],
        },
        DemoOrder {
            order_id: "ORD-1004",
            user_id: ADMIN_ID,
            customer_name: "Admin User",
            address: "12 Nguyen Hue, District 1, HCMC",
            created_at: days(20),
            deposited: false,
            payment_method: "cod",
            items: vec![DemoItem::new(99_000, 1).cancelled(days(19))],
        },
        DemoOrder {
            order_id: "ORD-2001",
            user_id: JOHN_ID,
            customer_name: "John Doe",
            address: "7 Tran Phu, Hanoi",
            created_at: days(1),
            deposited: false,
            payment_method: "cod",
            items: vec![DemoItem::new(65_000, 1)],
        },
    ]
}
