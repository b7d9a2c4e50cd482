//! Database operations for `sync_runs` and `sync_run_errors`.

use chrono::{DateTime, Utc};
use erpbridge_core::SyncRunReport;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `sync_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SyncRunRow {
    pub id: i64,
    pub public_id: Uuid,
    /// `cli`, `api` or `scheduler`.
    pub trigger_source: String,
    pub erp_mode: String,
    /// `queued`, `running`, `completed`, `error` or `failed`.
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub items_processed: i32,
    pub items_failed: i32,
    pub items_created: i32,
    pub items_updated: i32,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A row from the `sync_run_errors` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SyncRunErrorRow {
    pub id: i64,
    pub sync_run_id: i64,
    pub position: i32,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

const RUN_COLUMNS: &str = "id, public_id, trigger_source, erp_mode, status, started_at, \
     completed_at, items_processed, items_failed, items_created, items_updated, message, created_at";

fn count(column: &'static str, value: u32) -> Result<i32, DbError> {
    i32::try_from(value).map_err(|_| DbError::OutOfRange {
        column,
        value: i64::from(value),
    })
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Creates a new sync run in `queued` status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_sync_run(
    pool: &PgPool,
    trigger_source: &str,
    erp_mode: &str,
) -> Result<SyncRunRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, SyncRunRow>(&format!(
        "INSERT INTO sync_runs (public_id, trigger_source, erp_mode, status) \
         VALUES ($1, $2, $3, 'queued') \
         RETURNING {RUN_COLUMNS}"
    ))
    .bind(public_id)
    .bind(trigger_source)
    .bind(erp_mode)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a run as `running` and sets `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `queued`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn start_sync_run(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE sync_runs \
         SET status = 'running', started_at = NOW() \
         WHERE id = $1 AND status = 'queued'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "queued",
        });
    }

    Ok(())
}

/// Records a finished run: `completed` or `error` according to the report,
/// the counters, the message, and one `sync_run_errors` row per detail line.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `running`,
/// [`DbError::OutOfRange`] if a counter overflows `INTEGER`, or
/// [`DbError::Sqlx`] if any statement fails. The transaction is rolled back
/// on error.
pub async fn complete_sync_run(
    pool: &PgPool,
    id: i64,
    report: &SyncRunReport,
) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "UPDATE sync_runs SET \
             status          = $1, \
             completed_at    = NOW(), \
             items_processed = $2, \
             items_failed    = $3, \
             items_created   = $4, \
             items_updated   = $5, \
             message         = $6 \
         WHERE id = $7 AND status = 'running'",
    )
    .bind(report.status.as_str())
    .bind(count("items_processed", report.processed)?)
    .bind(count("items_failed", report.errors)?)
    .bind(count("items_created", report.created)?)
    .bind(count("items_updated", report.updated)?)
    .bind(report.message.as_deref())
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "running",
        });
    }

    for (idx, detail) in report.details.iter().enumerate() {
        sqlx::query(
            "INSERT INTO sync_run_errors (sync_run_id, position, detail) VALUES ($1, $2, $3)",
        )
        .bind(id)
        .bind(i32::try_from(idx).unwrap_or(i32::MAX))
        .bind(detail)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Marks a run as `failed` (the run itself crashed before producing a
/// report), sets `completed_at = NOW()` and `message`.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is already finished,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn fail_sync_run(pool: &PgPool, id: i64, message: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE sync_runs \
         SET status = 'failed', completed_at = NOW(), message = $1 \
         WHERE id = $2 AND status IN ('queued', 'running')",
    )
    .bind(message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "queued or running",
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_sync_run_by_public_id(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<Option<SyncRunRow>, DbError> {
    let row = sqlx::query_as::<_, SyncRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM sync_runs WHERE public_id = $1"
    ))
    .bind(public_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Most recent runs first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_sync_runs(pool: &PgPool, limit: i64) -> Result<Vec<SyncRunRow>, DbError> {
    let rows = sqlx::query_as::<_, SyncRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM sync_runs ORDER BY created_at DESC, id DESC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Detail lines for one run, in the order they were reported.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_sync_run_errors(
    pool: &PgPool,
    sync_run_id: i64,
) -> Result<Vec<SyncRunErrorRow>, DbError> {
    let rows = sqlx::query_as::<_, SyncRunErrorRow>(
        "SELECT id, sync_run_id, position, detail, created_at \
         FROM sync_run_errors WHERE sync_run_id = $1 ORDER BY position",
    )
    .bind(sync_run_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
