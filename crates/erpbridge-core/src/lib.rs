pub mod app_config;
pub mod catalog;
pub mod config;
pub mod items;
pub mod ports;
pub mod report;
pub mod stock;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, ErpMode};
pub use catalog::{
    AssetId, CatalogEntry, EntryAttribute, EntryDraft, EntryId, EntryStatus, Taxonomy, TermId,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use items::{CategoryPath, ErpItem, SchemaVersion, UNKNOWN_IDENTIFIER};
pub use ports::{AssetStore, CatalogStore, StoreError};
pub use report::{RunStatus, SyncRunReport};
pub use stock::{
    cart_line_is_sufficient, check_cart_line, clamp_stock, Availability, InsufficientStock,
    RawStock, StockSignal,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
