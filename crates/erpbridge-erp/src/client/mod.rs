//! The ERP capability set and its two implementations.

mod fixture;
mod rest;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use erpbridge_core::{AppConfig, ErpMode, StockSignal};

use crate::error::ErpError;
use crate::types::{CustomerRecord, OrderReceipt, RawCatalogPayload};

pub use fixture::FixtureErpClient;
pub use rest::{EndpointPaths, RestErpClient};

/// Operations the sync engine and storefront hooks need from the ERP.
///
/// Implementations never fail: transport and decoding errors are logged and
/// turned into an empty or default result.
#[async_trait]
pub trait ErpClient: Send + Sync {
    /// Short name used in logs (`"fixture"`, `"rest"`).
    fn kind(&self) -> &'static str;

    /// Full product catalog. `modified_after` is advisory and may be ignored.
    async fn fetch_products(&self, modified_after: Option<DateTime<Utc>>) -> RawCatalogPayload;

    /// Live stock for one SKU. Unknown SKUs report zero and no backorder.
    async fn fetch_stock(&self, sku: &str) -> StockSignal;

    /// Hands an order to the ERP as-is.
    async fn submit_order(&self, payload: &serde_json::Value) -> OrderReceipt;

    async fn fetch_customer_by_tax_id(&self, _tax_id: &str) -> Option<CustomerRecord> {
        None
    }
}

/// Builds the client selected by `ERPBRIDGE_ERP_MODE`.
///
/// # Errors
///
/// Returns [`ErpError::InvalidBaseUrl`] if REST mode is selected without a
/// usable base URL, or [`ErpError::Http`] if the HTTP client cannot be built.
pub fn build_erp_client(config: &AppConfig) -> Result<Arc<dyn ErpClient>, ErpError> {
    match config.erp_mode {
        ErpMode::Fixture => {
            tracing::info!(dir = %config.fixture_dir.display(), "using fixture ERP client");
            Ok(Arc::new(FixtureErpClient::new(config.fixture_dir.clone())))
        }
        ErpMode::Rest => {
            let client = RestErpClient::from_config(config)?;
            tracing::info!(base_url = %client.base_url(), "using REST ERP client");
            Ok(Arc::new(client))
        }
    }
}
