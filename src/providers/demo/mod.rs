//! Demo Data Providers
//!
//! In-memory user/balance and order-management handlers backed by fixture
//! data. `ragbridge serve-demo --kind user|order` runs one of them on stdio
//! so the process transport has a real counterpart to talk to.

mod fixtures;
mod orders;
mod users;

pub use fixtures::{ADMIN_ID, JOHN_ID};
pub use orders::DemoOrderProvider;
pub use users::DemoUserProvider;

use super::server::ProviderHandler;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DemoKind {
    User,
    Order,
}

pub fn handler(kind: DemoKind) -> Box<dyn ProviderHandler> {
    match kind {
        DemoKind::User => Box::new(DemoUserProvider::new()),
        DemoKind::Order => Box::new(DemoOrderProvider::new()),
    }
}

fn error(message: impl Into<String>) -> Value {
    json!({ "error": message.into() })
}

fn param_str<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
}
