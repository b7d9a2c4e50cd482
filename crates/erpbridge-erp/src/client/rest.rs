//! HTTP client for the ERP REST API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use erpbridge_core::{AppConfig, StockSignal};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde_json::Value;

use super::ErpClient;
use crate::error::ErpError;
use crate::retry::retry_with_backoff;
use crate::types::{CustomerRecord, OrderReceipt, RawCatalogPayload};

const DEFAULT_USER_AGENT: &str = "erpbridge/0.1 (catalog-sync)";

/// Endpoint paths relative to the base URL. Stock and customer lookups
/// append the SKU / tax id as a final path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPaths {
    pub products: String,
    pub stock: String,
    pub orders: String,
    pub customers: String,
}

impl Default for EndpointPaths {
    fn default() -> Self {
        Self {
            products: "/productos".to_string(),
            stock: "/stock".to_string(),
            orders: "/pedidos".to_string(),
            customers: "/clientes".to_string(),
        }
    }
}

/// Network-backed ERP client.
///
/// Use [`RestErpClient::from_config`] in production or
/// [`RestErpClient::with_base_url`] to point at a mock server in tests.
pub struct RestErpClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
    paths: EndpointPaths,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl RestErpClient {
    /// Builds the client from application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ErpError::InvalidBaseUrl`] if no base URL is configured or it
    /// does not parse, or [`ErpError::Http`] if the `reqwest::Client` cannot
    /// be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self, ErpError> {
        let base_url = config
            .erp_base_url
            .as_deref()
            .ok_or_else(|| ErpError::InvalidBaseUrl {
                url: String::new(),
                reason: "ERPBRIDGE_ERP_BASE_URL is not set".to_string(),
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.erp_request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(config.erp_user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
            api_key: config.erp_api_key.clone(),
            paths: EndpointPaths {
                products: config.erp_products_path.clone(),
                stock: config.erp_stock_path.clone(),
                orders: config.erp_orders_path.clone(),
                customers: config.erp_customers_path.clone(),
            },
            max_retries: config.erp_max_retries,
            backoff_base_ms: config.erp_retry_backoff_base_ms,
        })
    }

    /// Creates a client with default paths and no retries (for testing with
    /// wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ErpError::InvalidBaseUrl`] if `base_url` does not parse, or
    /// [`ErpError::Http`] if the `reqwest::Client` cannot be constructed.
    pub fn with_base_url(
        base_url: &str,
        api_key: Option<&str>,
        timeout_secs: u64,
    ) -> Result<Self, ErpError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
            api_key: api_key.map(str::to_owned),
            paths: EndpointPaths::default(),
            max_retries: 0,
            backoff_base_ms: 0,
        })
    }

    #[must_use]
    pub fn with_paths(mut self, paths: EndpointPaths) -> Self {
        self.paths = paths;
        self
    }

    #[must_use]
    pub fn with_retries(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetches the product catalog.
    ///
    /// # Errors
    ///
    /// - [`ErpError::Http`] on network failure.
    /// - [`ErpError::UnexpectedStatus`] on a non-2xx status (5xx retried).
    /// - [`ErpError::Deserialize`] if the body is not JSON.
    pub async fn try_fetch_products(
        &self,
        modified_after: Option<DateTime<Utc>>,
    ) -> Result<RawCatalogPayload, ErpError> {
        let mut url = self.endpoint(&self.paths.products, None)?;
        if let Some(ts) = modified_after {
            url.query_pairs_mut().append_pair(
                "modified_after",
                &ts.to_rfc3339_opts(SecondsFormat::Secs, true),
            );
        }
        let body = self
            .request_json(|| self.authorized(self.client.get(url.clone())), &url)
            .await?;
        Ok(RawCatalogPayload::from_value(body))
    }

    /// Fetches live stock for one SKU. A 404 means "unknown SKU" and yields
    /// the default signal.
    ///
    /// # Errors
    ///
    /// Same as [`RestErpClient::try_fetch_products`].
    pub async fn try_fetch_stock(&self, sku: &str) -> Result<StockSignal, ErpError> {
        let url = self.endpoint(&self.paths.stock, Some(sku))?;
        let body = match self
            .request_json(|| self.authorized(self.client.get(url.clone())), &url)
            .await
        {
            Ok(body) => body,
            Err(ErpError::UnexpectedStatus { status: 404, .. }) => return Ok(StockSignal::default()),
            Err(e) => return Err(e),
        };
        serde_json::from_value(unwrap_data(body)).map_err(|e| ErpError::Deserialize {
            context: format!("stock(sku={sku})"),
            source: e,
        })
    }

    /// Posts an order. Not retried: the ERP may have accepted a request
    /// whose response was lost.
    ///
    /// # Errors
    ///
    /// Same as [`RestErpClient::try_fetch_products`].
    pub async fn try_submit_order(&self, payload: &Value) -> Result<OrderReceipt, ErpError> {
        let url = self.endpoint(&self.paths.orders, None)?;
        let response = self
            .authorized(self.client.post(url.clone()).json(payload))
            .send()
            .await?;
        let body = Self::read_json(response, &url).await?;
        serde_json::from_value(unwrap_data(body)).map_err(|e| ErpError::Deserialize {
            context: "submit_order".to_string(),
            source: e,
        })
    }

    /// Looks up a customer by tax id. A 404 yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Same as [`RestErpClient::try_fetch_products`].
    pub async fn try_fetch_customer(&self, tax_id: &str) -> Result<Option<CustomerRecord>, ErpError> {
        let url = self.endpoint(&self.paths.customers, Some(tax_id))?;
        let body = match self
            .request_json(|| self.authorized(self.client.get(url.clone())), &url)
            .await
        {
            Ok(body) => body,
            Err(ErpError::UnexpectedStatus { status: 404, .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        match unwrap_data(body) {
            Value::Null => Ok(None),
            data => serde_json::from_value(data)
                .map(Some)
                .map_err(|e| ErpError::Deserialize {
                    context: format!("customer(tax_id={tax_id})"),
                    source: e,
                }),
        }
    }

    /// Joins `path` onto the base URL, then appends `segment` percent-encoded.
    fn endpoint(&self, path: &str, segment: Option<&str>) -> Result<Url, ErpError> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let mut url = Url::parse(&joined).map_err(|e| ErpError::InvalidBaseUrl {
            url: joined.clone(),
            reason: e.to_string(),
        })?;
        if let Some(segment) = segment {
            url.path_segments_mut()
                .map_err(|()| ErpError::InvalidBaseUrl {
                    url: joined.clone(),
                    reason: "base URL cannot have path segments".to_string(),
                })?
                .pop_if_empty()
                .push(segment);
        }
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(reqwest::header::ACCEPT, "application/json");
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Sends a request with retry on transient failures and parses the body
    /// as JSON.
    async fn request_json<F>(&self, build: F, url: &Url) -> Result<Value, ErpError>
    where
        F: Fn() -> RequestBuilder,
    {
        let build = &build;
        retry_with_backoff(self.max_retries, self.backoff_base_ms, move || async move {
            let response = build().send().await?;
            Self::read_json(response, url).await
        })
        .await
    }

    async fn read_json(response: reqwest::Response, url: &Url) -> Result<Value, ErpError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ErpError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ErpError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }
}

#[async_trait]
impl ErpClient for RestErpClient {
    fn kind(&self) -> &'static str {
        "rest"
    }

    async fn fetch_products(&self, modified_after: Option<DateTime<Utc>>) -> RawCatalogPayload {
        match self.try_fetch_products(modified_after).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "ERP product fetch failed; returning empty catalog");
                RawCatalogPayload::Empty
            }
        }
    }

    async fn fetch_stock(&self, sku: &str) -> StockSignal {
        match self.try_fetch_stock(sku).await {
            Ok(signal) => signal,
            Err(e) => {
                tracing::error!(sku, error = %e, "ERP stock fetch failed; reporting no stock");
                StockSignal::default()
            }
        }
    }

    async fn submit_order(&self, payload: &Value) -> OrderReceipt {
        match self.try_submit_order(payload).await {
            Ok(receipt) => receipt,
            Err(e) => {
                tracing::error!(error = %e, "ERP order submission failed");
                OrderReceipt::failed(e.to_string())
            }
        }
    }

    async fn fetch_customer_by_tax_id(&self, tax_id: &str) -> Option<CustomerRecord> {
        match self.try_fetch_customer(tax_id).await {
            Ok(customer) => customer,
            Err(e) => {
                tracing::error!(tax_id, error = %e, "ERP customer lookup failed");
                None
            }
        }
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ErpError> {
    Url::parse(raw.trim()).map_err(|e| ErpError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Single-record responses may come wrapped as `{status, data}`; unwrap when
/// the wrapper is present.
fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") || map.contains_key("Data") => map
            .remove("data")
            .or_else(|| map.remove("Data"))
            .unwrap_or(Value::Null),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> RestErpClient {
        RestErpClient::with_base_url(base_url, Some("test-key"), 30)
            .expect("client construction should not fail")
    }

    #[test]
    fn endpoint_joins_paths_without_double_slashes() {
        let client = test_client("https://erp.example.com/api/");
        let url = client.endpoint("/productos", None).unwrap();
        assert_eq!(url.as_str(), "https://erp.example.com/api/productos");
    }

    #[test]
    fn endpoint_encodes_segment() {
        let client = test_client("https://erp.example.com/api");
        let url = client.endpoint("/stock", Some("CAB 6/305")).unwrap();
        assert_eq!(url.as_str(), "https://erp.example.com/api/stock/CAB%206%2F305");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = RestErpClient::with_base_url("not a url", None, 30)
            .err()
            .expect("should reject");
        assert!(matches!(err, ErpError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn unwrap_data_handles_both_shapes() {
        let wrapped = serde_json::json!({"status": "ok", "data": {"available_qty": 1}});
        assert_eq!(unwrap_data(wrapped), serde_json::json!({"available_qty": 1}));
        let bare = serde_json::json!({"available_qty": 1});
        assert_eq!(unwrap_data(bare.clone()), bare);
    }
}
