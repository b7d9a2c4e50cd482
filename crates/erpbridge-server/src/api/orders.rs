use axum::{extract::State, Extension, Json};
use erpbridge_erp::OrderReceipt;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

/// Forwards the order document to the ERP unchanged.
pub(super) async fn submit_order(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<ApiResponse<OrderReceipt>>, ApiError> {
    if !payload.is_object() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "order must be a JSON object",
        ));
    }

    let receipt = state.erp.submit_order(&payload).await;
    if !receipt.is_success() {
        tracing::warn!(
            status = %receipt.status,
            message = receipt.message.as_deref().unwrap_or(""),
            "ERP did not accept the order"
        );
        let message = receipt
            .message
            .unwrap_or_else(|| format!("ERP answered with status '{}'", receipt.status));
        return Err(ApiError::new(req_id.0, "erp_rejected", message));
    }

    Ok(Json(ApiResponse {
        data: receipt,
        meta: ResponseMeta::new(req_id.0),
    }))
}
