//! Live stock check for a shopper's cart.

use erpbridge_core::{check_cart_line, InsufficientStock};
use erpbridge_erp::ErpClient;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(default)]
    pub sku: String,
    #[serde(default, alias = "name")]
    pub product_name: String,
    #[serde(alias = "quantity")]
    pub requested_qty: u32,
}

/// Checks every line against the ERP's live stock and returns one notice per
/// line that cannot be fulfilled, in cart order.
///
/// Lines without a SKU are not ERP-managed and are skipped.
pub async fn check_cart(erp: &dyn ErpClient, lines: &[CartLine]) -> Vec<InsufficientStock> {
    let mut notices = Vec::new();
    for line in lines {
        let sku = line.sku.trim();
        if sku.is_empty() {
            continue;
        }
        let signal = erp.fetch_stock(sku).await;
        if let Err(notice) = check_cart_line(&line.product_name, sku, &signal, line.requested_qty) {
            tracing::info!(
                sku,
                requested = line.requested_qty,
                available = signal.available_qty,
                "cart line exceeds ERP stock"
            );
            notices.push(notice);
        }
    }
    notices
}
