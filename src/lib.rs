//! ragbridge - user-context enrichment and query routing for RAG chatbots
//!
//! This library classifies chat queries by keyword intent, fetches the
//! matching facts from JSON-RPC data providers (over subprocess pipes or
//! HTTP), and merges them with a durable per-session user profile into one
//! text block for prompt injection.

pub mod actors;
pub mod config;
pub mod context;
pub mod core;
pub mod error;
pub mod intent;
pub mod providers;
pub mod session;
pub mod storage;
pub mod utils;

pub mod api;
pub mod cli;

pub use api::ContextEngine;
pub use config::Settings;
pub use context::ContextFragment;
pub use error::{ProviderError, ProviderResult};
pub use intent::{Classification, IntentClassifier, IntentTag};
pub use session::{InteractionRecord, SessionKey, SessionManager, UserSession};
