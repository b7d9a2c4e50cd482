use crate::app_config::{AppConfig, Environment, ErpMode};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does not read `.env` files. Used by tests
/// and by callers that manage the environment themselves.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so tests can drive it with a `HashMap` lookup instead of `set_var`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("ERPBRIDGE_ENV", "development"))?;
    let bind_addr = parse("ERPBRIDGE_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("ERPBRIDGE_LOG_LEVEL", "info");

    let erp_mode = parse_erp_mode(&or_default("ERPBRIDGE_ERP_MODE", "fixture"))?;
    let erp_base_url = optional("ERPBRIDGE_ERP_BASE_URL");
    if erp_mode == ErpMode::Rest && erp_base_url.is_none() {
        return Err(ConfigError::MissingEnvVar(
            "ERPBRIDGE_ERP_BASE_URL".to_string(),
        ));
    }
    let erp_api_key = optional("ERPBRIDGE_ERP_API_KEY");
    let erp_products_path = or_default("ERPBRIDGE_ERP_PRODUCTS_PATH", "/productos");
    let erp_stock_path = or_default("ERPBRIDGE_ERP_STOCK_PATH", "/stock");
    let erp_orders_path = or_default("ERPBRIDGE_ERP_ORDERS_PATH", "/pedidos");
    let erp_customers_path = or_default("ERPBRIDGE_ERP_CUSTOMERS_PATH", "/clientes");
    let erp_request_timeout_secs = parse_u64("ERPBRIDGE_ERP_REQUEST_TIMEOUT_SECS", "60")?;
    let erp_user_agent = or_default("ERPBRIDGE_ERP_USER_AGENT", "erpbridge/0.1 (catalog-sync)");
    let erp_max_retries = parse_u32("ERPBRIDGE_ERP_MAX_RETRIES", "2")?;
    let erp_retry_backoff_base_ms = parse_u64("ERPBRIDGE_ERP_RETRY_BACKOFF_BASE_MS", "1000")?;

    let fixture_dir = PathBuf::from(or_default("ERPBRIDGE_FIXTURE_DIR", "./fixtures"));
    let image_source_dir = PathBuf::from(or_default("ERPBRIDGE_IMAGE_SOURCE_DIR", "./erp-images"));
    let image_fallback_dir = PathBuf::from(or_default("ERPBRIDGE_IMAGE_FALLBACK_DIR", "./assets"));
    let media_dir = PathBuf::from(or_default("ERPBRIDGE_MEDIA_DIR", "./media"));
    let image_timeout_secs = parse_u64("ERPBRIDGE_IMAGE_TIMEOUT_SECS", "30")?;

    let sync_schedule = optional("ERPBRIDGE_SYNC_SCHEDULE");

    let db_max_connections = parse_u32("ERPBRIDGE_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("ERPBRIDGE_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("ERPBRIDGE_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        erp_mode,
        erp_base_url,
        erp_api_key,
        erp_products_path,
        erp_stock_path,
        erp_orders_path,
        erp_customers_path,
        erp_request_timeout_secs,
        erp_user_agent,
        erp_max_retries,
        erp_retry_backoff_base_ms,
        fixture_dir,
        image_source_dir,
        image_fallback_dir,
        media_dir,
        image_timeout_secs,
        sync_schedule,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "ERPBRIDGE_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

fn parse_erp_mode(s: &str) -> Result<ErpMode, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "fixture" | "mock" => Ok(ErpMode::Fixture),
        "rest" => Ok(ErpMode::Rest),
        other => Err(ConfigError::InvalidEnvVar {
            var: "ERPBRIDGE_ERP_MODE".to_string(),
            reason: format!("expected \"fixture\" or \"rest\", got \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
