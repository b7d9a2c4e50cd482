use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Which ERP client implementation the process is wired with. Resolved once
/// at startup and never re-checked at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErpMode {
    /// JSON files on disk; the default for local development.
    Fixture,
    /// The live ERP REST API.
    Rest,
}

impl std::fmt::Display for ErpMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErpMode::Fixture => write!(f, "fixture"),
            ErpMode::Rest => write!(f, "rest"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub erp_mode: ErpMode,
    pub erp_base_url: Option<String>,
    pub erp_api_key: Option<String>,
    pub erp_products_path: String,
    pub erp_stock_path: String,
    pub erp_orders_path: String,
    pub erp_customers_path: String,
    pub erp_request_timeout_secs: u64,
    pub erp_user_agent: String,
    pub erp_max_retries: u32,
    pub erp_retry_backoff_base_ms: u64,
    pub fixture_dir: PathBuf,
    pub image_source_dir: PathBuf,
    pub image_fallback_dir: PathBuf,
    pub media_dir: PathBuf,
    pub image_timeout_secs: u64,
    pub sync_schedule: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("erp_mode", &self.erp_mode)
            .field("erp_base_url", &self.erp_base_url)
            .field(
                "erp_api_key",
                &self.erp_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("erp_products_path", &self.erp_products_path)
            .field("erp_stock_path", &self.erp_stock_path)
            .field("erp_orders_path", &self.erp_orders_path)
            .field("erp_customers_path", &self.erp_customers_path)
            .field("erp_request_timeout_secs", &self.erp_request_timeout_secs)
            .field("erp_user_agent", &self.erp_user_agent)
            .field("erp_max_retries", &self.erp_max_retries)
            .field("erp_retry_backoff_base_ms", &self.erp_retry_backoff_base_ms)
            .field("fixture_dir", &self.fixture_dir)
            .field("image_source_dir", &self.image_source_dir)
            .field("image_fallback_dir", &self.image_fallback_dir)
            .field("media_dir", &self.media_dir)
            .field("image_timeout_secs", &self.image_timeout_secs)
            .field("sync_schedule", &self.sync_schedule)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
