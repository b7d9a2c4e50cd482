//! Offline unit tests for erpbridge-db pool configuration and row types.
//! These tests do not require a live database connection.

use erpbridge_core::{AppConfig, Environment, ErpMode};
use erpbridge_db::{PoolConfig, SyncRunRow, TermRow};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        erp_mode: ErpMode::Fixture,
        erp_base_url: None,
        erp_api_key: None,
        erp_products_path: "/productos".to_string(),
        erp_stock_path: "/stock".to_string(),
        erp_orders_path: "/pedidos".to_string(),
        erp_customers_path: "/clientes".to_string(),
        erp_request_timeout_secs: 30,
        erp_user_agent: "ua".to_string(),
        erp_max_retries: 3,
        erp_retry_backoff_base_ms: 500,
        fixture_dir: PathBuf::from("./fixtures"),
        image_source_dir: PathBuf::from("./images"),
        image_fallback_dir: PathBuf::from("./images/fallback"),
        media_dir: PathBuf::from("./media"),
        image_timeout_secs: 20,
        sync_schedule: None,
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: confirm that [`SyncRunRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn sync_run_row_has_expected_fields() {
    use chrono::Utc;
    use uuid::Uuid;

    let row = SyncRunRow {
        id: 1_i64,
        public_id: Uuid::new_v4(),
        trigger_source: "cli".to_string(),
        erp_mode: "fixture".to_string(),
        status: "queued".to_string(),
        started_at: None,
        completed_at: None,
        items_processed: 0_i32,
        items_failed: 0_i32,
        items_created: 0_i32,
        items_updated: 0_i32,
        message: None,
        created_at: Utc::now(),
    };

    assert_eq!(row.id, 1);
    assert_eq!(row.trigger_source, "cli");
    assert_eq!(row.erp_mode, "fixture");
    assert_eq!(row.status, "queued");
    assert!(row.started_at.is_none());
    assert!(row.completed_at.is_none());
    assert!(row.message.is_none());
}

#[test]
fn term_row_has_expected_fields() {
    use chrono::Utc;

    let row = TermRow {
        id: 9_i64,
        taxonomy: "product_cat".to_string(),
        name: "Redes".to_string(),
        parent_id: Some(3),
        created_at: Utc::now(),
    };

    assert_eq!(row.taxonomy, "product_cat");
    assert_eq!(row.parent_id, Some(3));
}
