use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use erpbridge_db::{SyncRunErrorRow, SyncRunRow};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;
use crate::runner::RunnerError;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct SyncRunsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TriggerQuery {
    /// Incremental sync: only products the ERP changed after this instant.
    pub modified_after: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub(super) struct SyncRunItem {
    run_id: Uuid,
    trigger_source: String,
    erp_mode: String,
    status: String,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    items_processed: i32,
    items_failed: i32,
    items_created: i32,
    items_updated: i32,
    message: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct SyncRunDetail {
    #[serde(flatten)]
    run: SyncRunItem,
    errors: Vec<String>,
}

impl From<SyncRunRow> for SyncRunItem {
    fn from(row: SyncRunRow) -> Self {
        Self {
            run_id: row.public_id,
            trigger_source: row.trigger_source,
            erp_mode: row.erp_mode,
            status: row.status,
            started_at: row.started_at,
            completed_at: row.completed_at,
            items_processed: row.items_processed,
            items_failed: row.items_failed,
            items_created: row.items_created,
            items_updated: row.items_updated,
            message: row.message,
            created_at: row.created_at,
        }
    }
}

pub(super) async fn list_sync_runs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<SyncRunsQuery>,
) -> Result<Json<ApiResponse<Vec<SyncRunItem>>>, ApiError> {
    let rows = erpbridge_db::list_sync_runs(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(SyncRunItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_sync_run(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(run_id): Path<Uuid>,
) -> Result<Json<ApiResponse<SyncRunDetail>>, ApiError> {
    let row = erpbridge_db::get_sync_run_by_public_id(&state.pool, run_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "not_found",
                format!("sync run {run_id} not found"),
            )
        })?;

    let errors = erpbridge_db::list_sync_run_errors(&state.pool, row.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: SyncRunDetail {
            run: SyncRunItem::from(row),
            errors: errors.into_iter().map(|e: SyncRunErrorRow| e.detail).collect(),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Queues a sync run and returns `202 Accepted` with the queued record.
/// Poll `GET /api/v1/sync/runs/{run_id}` for the outcome.
pub(super) async fn trigger_sync_run(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<TriggerQuery>,
) -> Result<(StatusCode, Json<ApiResponse<SyncRunItem>>), ApiError> {
    match state.runner.try_start("api", query.modified_after).await {
        Ok(row) => Ok((
            StatusCode::ACCEPTED,
            Json(ApiResponse {
                data: SyncRunItem::from(row),
                meta: ResponseMeta::new(req_id.0),
            }),
        )),
        Err(RunnerError::Busy) => Err(ApiError::new(
            req_id.0,
            "conflict",
            "a sync run is already in progress",
        )),
        Err(RunnerError::Db(e)) => Err(map_db_error(req_id.0, &e)),
    }
}
