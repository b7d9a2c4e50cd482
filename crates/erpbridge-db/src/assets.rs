//! Database operations for `catalog_assets`.

use chrono::{DateTime, Utc};
use erpbridge_core::{AssetId, EntryId};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `catalog_assets` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AssetRow {
    pub id: i64,
    pub entry_id: Option<i64>,
    /// Filename without extension; the lookup key for re-syncs.
    pub title: String,
    pub filename: String,
    pub file_path: String,
    pub content_type: String,
    pub byte_size: i64,
    pub sha256: String,
    pub created_at: DateTime<Utc>,
}

/// Column values for a new asset row.
#[derive(Debug, Clone)]
pub struct NewAsset<'a> {
    pub entry_id: EntryId,
    pub title: &'a str,
    pub filename: &'a str,
    pub file_path: &'a str,
    pub content_type: &'a str,
    pub byte_size: i64,
    pub sha256: &'a str,
}

/// Oldest asset with this exact title.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_asset_by_title(pool: &PgPool, title: &str) -> Result<Option<AssetId>, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM catalog_assets WHERE title = $1 ORDER BY id LIMIT 1",
    )
    .bind(title)
    .fetch_optional(pool)
    .await?;
    Ok(id)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_asset(pool: &PgPool, asset: &NewAsset<'_>) -> Result<AssetId, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO catalog_assets \
             (entry_id, title, filename, file_path, content_type, byte_size, sha256) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING id",
    )
    .bind(asset.entry_id)
    .bind(asset.title)
    .bind(asset.filename)
    .bind(asset.file_path)
    .bind(asset.content_type)
    .bind(asset.byte_size)
    .bind(asset.sha256)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_asset(pool: &PgPool, id: AssetId) -> Result<Option<AssetRow>, DbError> {
    let row = sqlx::query_as::<_, AssetRow>(
        "SELECT id, entry_id, title, filename, file_path, content_type, byte_size, sha256, created_at \
         FROM catalog_assets WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}
