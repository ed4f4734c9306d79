use ragbridge::config::{ProviderConfig, Settings, StorageBackend};
use ragbridge::providers::demo::{ADMIN_ID, JOHN_ID};
use ragbridge::providers::ProviderRegistry;
use ragbridge::{ContextEngine, ProviderError};
use serde_json::json;
use tempfile::TempDir;

const BIN: &str = env!("CARGO_BIN_EXE_ragbridge");

fn demo(name: &str, kind: &str) -> ProviderConfig {
    ProviderConfig::process(
        name,
        BIN,
        vec!["serve-demo".to_string(), "--kind".to_string(), kind.to_string()],
    )
}

fn settings(cache_dir: &TempDir) -> Settings {
    let mut settings = Settings::default();
    settings.session.backend = StorageBackend::File;
    settings.session.cache_dir = cache_dir.path().to_path_buf();
    settings.providers = vec![
        demo(&settings.provider.user_provider, "user"),
        demo(&settings.provider.order_provider, "order"),
    ];
    settings
}

#[tokio::test]
async fn test_process_provider_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let registry = ProviderRegistry::from_settings(&settings(&temp_dir)).unwrap();

    let profile = registry.get_user_profile("user_profile_server", ADMIN_ID).await.unwrap();
    assert_eq!(profile.name.as_deref(), Some("Admin User"));

    let pending = registry
        .invoke("order_management_server", "get_pending_orders_count", json!({"user_id": ADMIN_ID}))
        .await
        .unwrap();
    assert_eq!(pending["pending_orders_count"], 2);
    assert_eq!(pending["pending_items_count"], 5);

    registry.shutdown().await;
}

#[tokio::test]
async fn test_unknown_method_is_application_error() {
    let temp_dir = TempDir::new().unwrap();
    let registry = ProviderRegistry::from_settings(&settings(&temp_dir)).unwrap();

    let err = registry
        .invoke("order_management_server", "drop_all_orders", json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Application(ref m) if m.contains("Unknown method: drop_all_orders")));

    // the channel survives an application error
    let summary = registry
        .invoke("order_management_server", "get_order_summary", json!({"user_id": JOHN_ID}))
        .await
        .unwrap();
    assert_eq!(summary["summary"]["total_orders"], 1);

    registry.shutdown().await;
}

#[tokio::test]
async fn test_vietnamese_pending_query_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let engine = ContextEngine::init(settings(&temp_dir)).await.unwrap();

    let text = engine
        .classify_and_aggregate("Tôi cần kiểm tra trạng thái đơn hàng đang chờ giao", ADMIN_ID)
        .await;
    assert_eq!(text, "Pending orders: 2 orders, 5 items");

    engine.shutdown().await;
}

#[tokio::test]
async fn test_unmatched_query_uses_dashboard() {
    let temp_dir = TempDir::new().unwrap();
    let engine = ContextEngine::init(settings(&temp_dir)).await.unwrap();

    let text = engine.classify_and_aggregate("hello there", ADMIN_ID).await;
    assert!(text.starts_with("Order overview:"));
    assert!(text.contains("- Pending orders: 2"));
    assert!(text.contains("- Unpaid amount: 280,000 VND"));

    engine.shutdown().await;
}

#[tokio::test]
async fn test_email_identifier_and_session_persistence() {
    let temp_dir = TempDir::new().unwrap();
    {
        let engine = ContextEngine::init(settings(&temp_dir)).await.unwrap();
        let text = engine.build_context("what is my balance?", "john@example.com", "chat-1").await;
        assert!(text.contains("User's name: John Doe"));
        assert!(text.contains("Balance: 85,000 VND, 120 points"));

        engine
            .update_context("john@example.com", "chat-1", "what is my balance?", "85,000 VND", Some("balance"))
            .await;
        engine.shutdown().await;
    }

    assert!(temp_dir.path().join("john_at_example.com_chat-1.json").exists());

    let engine = ContextEngine::init(settings(&temp_dir)).await.unwrap();
    let session = engine.get_or_create_session("john@example.com", "chat-1").await;
    assert_eq!(session.active_topics, vec!["balance"]);
    assert_eq!(session.context_history.last().unwrap().bot_response, "85,000 VND");
    engine.shutdown().await;
}

#[tokio::test]
async fn test_malformed_provider_line_degrades_one_tag() {
    let temp_dir = TempDir::new().unwrap();
    let mut settings = settings(&temp_dir);
    let order_provider = settings.provider.order_provider.clone();
    settings.providers.retain(|p| p.name != order_provider);
    settings.providers.push(ProviderConfig::process(
        order_provider,
        "sh",
        vec![
            "-c".to_string(),
            "while read line; do echo 'this is not json'; done".to_string(),
        ],
    ));
    let engine = ContextEngine::init(settings).await.unwrap();

    let text = engine
        .classify_and_aggregate("show my pending orders and balance", ADMIN_ID)
        .await;
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines, vec!["Unable to retrieve data", "Balance: 1,250,000 VND, 3,400 points"]);
    engine.shutdown().await;
}

#[tokio::test]
async fn test_dead_process_is_respawned() {
    let temp_dir = TempDir::new().unwrap();
    let mut settings = settings(&temp_dir);
    // answers exactly one request, echoing its id, then exits
    settings.providers = vec![ProviderConfig::process(
        "one_shot",
        "sh",
        vec![
            "-c".to_string(),
            r#"read line; id=$(printf '%s' "$line" | sed 's/.*"id":\([0-9]*\).*/\1/'); printf '{"jsonrpc":"2.0","id":%s,"result":{"ok":true}}\n' "$id""#
                .to_string(),
        ],
    )];
    let registry = ProviderRegistry::from_settings(&settings).unwrap();

    let first = registry.invoke("one_shot", "ping", json!({})).await.unwrap();
    assert_eq!(first["ok"], true);

    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    let second = registry.invoke("one_shot", "ping", json!({})).await.unwrap();
    assert_eq!(second["ok"], true);

    registry.shutdown().await;
}
