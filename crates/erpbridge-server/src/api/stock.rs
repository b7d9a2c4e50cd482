use axum::{
    extract::{Path, State},
    Extension, Json,
};
use erpbridge_core::Availability;
use serde::Serialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct StockItem {
    sku: String,
    available_qty: i64,
    allow_backorder: bool,
    availability: Availability,
    label: &'static str,
}

pub(super) async fn get_stock(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(sku): Path<String>,
) -> Result<Json<ApiResponse<StockItem>>, ApiError> {
    let sku = sku.trim().to_string();
    if sku.is_empty() {
        return Err(ApiError::new(req_id.0, "validation_error", "sku is required"));
    }

    let signal = state.erp.fetch_stock(&sku).await;
    let availability = Availability::from_signal(&signal);

    Ok(Json(ApiResponse {
        data: StockItem {
            sku,
            available_qty: signal.available_qty,
            allow_backorder: signal.allow_backorder,
            availability,
            label: availability.label(),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
