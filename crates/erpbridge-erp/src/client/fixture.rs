use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use erpbridge_core::StockSignal;
use rand::Rng;
use serde::de::DeserializeOwned;

use super::ErpClient;
use crate::error::ErpError;
use crate::types::{CustomerRecord, OrderReceipt, RawCatalogPayload};

const PRODUCTS_FILE: &str = "products_catalog.json";
const STOCK_FILE: &str = "stock_responses.json";
const CUSTOMERS_FILE: &str = "customers.json";

/// ERP client backed by JSON files, for development and demos.
///
/// Files are re-read on every call so they can be edited while the server
/// runs. A missing file behaves like an empty ERP.
#[derive(Debug, Clone)]
pub struct FixtureErpClient {
    dir: PathBuf,
}

impl FixtureErpClient {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reads and parses one fixture file. `Ok(None)` when the file is absent.
    async fn read_fixture<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, ErpError> {
        let path = self.dir.join(name);
        let body = match tokio::fs::read_to_string(&path).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ErpError::Fixture { path, source: e }),
        };
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| ErpError::Deserialize {
                context: path.display().to_string(),
                source: e,
            })
    }
}

#[async_trait]
impl ErpClient for FixtureErpClient {
    fn kind(&self) -> &'static str {
        "fixture"
    }

    async fn fetch_products(&self, modified_after: Option<DateTime<Utc>>) -> RawCatalogPayload {
        if let Some(ts) = modified_after {
            tracing::debug!(modified_after = %ts, "fixture client ignores modified_after");
        }
        match self.read_fixture::<serde_json::Value>(PRODUCTS_FILE).await {
            Ok(Some(body)) => RawCatalogPayload::from_value(body),
            Ok(None) => {
                tracing::warn!(dir = %self.dir.display(), file = PRODUCTS_FILE, "fixture file missing");
                RawCatalogPayload::Empty
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load product fixture");
                RawCatalogPayload::Empty
            }
        }
    }

    async fn fetch_stock(&self, sku: &str) -> StockSignal {
        match self
            .read_fixture::<HashMap<String, StockSignal>>(STOCK_FILE)
            .await
        {
            Ok(Some(mut signals)) => signals.remove(sku).unwrap_or_default(),
            Ok(None) => StockSignal::default(),
            Err(e) => {
                tracing::error!(sku, error = %e, "failed to load stock fixture");
                StockSignal::default()
            }
        }
    }

    async fn submit_order(&self, payload: &serde_json::Value) -> OrderReceipt {
        let order_id = format!("MOCK-{}", rand::rng().random_range(1000..=9999));
        tracing::info!(external_order_id = %order_id, payload = %payload, "fixture order created");
        OrderReceipt {
            status: "success".to_string(),
            external_order_id: Some(order_id),
            message: None,
        }
    }

    async fn fetch_customer_by_tax_id(&self, tax_id: &str) -> Option<CustomerRecord> {
        match self
            .read_fixture::<HashMap<String, CustomerRecord>>(CUSTOMERS_FILE)
            .await
        {
            Ok(Some(mut customers)) => customers.remove(tax_id).map(|mut c| {
                if c.tax_id.is_empty() {
                    c.tax_id = tax_id.to_string();
                }
                c
            }),
            Ok(None) => None,
            Err(e) => {
                tracing::error!(tax_id, error = %e, "failed to load customer fixture");
                None
            }
        }
    }
}
