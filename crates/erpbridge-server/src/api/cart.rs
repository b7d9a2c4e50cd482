use axum::{extract::State, http::StatusCode, Extension, Json};
use erpbridge_core::InsufficientStock;
use erpbridge_sync::CartLine;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct CartCheckRequest {
    pub lines: Vec<CartLine>,
}

#[derive(Debug, Serialize)]
pub(super) struct CartNotice {
    sku: String,
    product_name: String,
    requested_qty: u32,
    available_qty: i64,
    message: String,
}

#[derive(Debug, Serialize)]
pub(super) struct CartCheckData {
    ok: bool,
    notices: Vec<CartNotice>,
}

impl From<InsufficientStock> for CartNotice {
    fn from(notice: InsufficientStock) -> Self {
        Self {
            message: notice.to_string(),
            sku: notice.sku,
            product_name: notice.product_name,
            requested_qty: notice.requested_qty,
            available_qty: notice.available_qty,
        }
    }
}

/// Validates a cart against live ERP stock. Answers `422` with one notice
/// per line that cannot be fulfilled.
pub(super) async fn check_cart(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CartCheckRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CartCheckData>>), ApiError> {
    if body.lines.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "cart must contain at least one line",
        ));
    }

    let notices = erpbridge_sync::check_cart(state.erp.as_ref(), &body.lines).await;
    let status = if notices.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };

    Ok((
        status,
        Json(ApiResponse {
            data: CartCheckData {
                ok: notices.is_empty(),
                notices: notices.into_iter().map(CartNotice::from).collect(),
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}
