use axum::{
    extract::{Path, State},
    Extension, Json,
};
use erpbridge_erp::CustomerRecord;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

pub(super) async fn get_customer(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(tax_id): Path<String>,
) -> Result<Json<ApiResponse<CustomerRecord>>, ApiError> {
    match state.erp.fetch_customer_by_tax_id(tax_id.trim()).await {
        Some(customer) => Ok(Json(ApiResponse {
            data: customer,
            meta: ResponseMeta::new(req_id.0),
        })),
        None => Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("customer '{tax_id}' not found"),
        )),
    }
}
