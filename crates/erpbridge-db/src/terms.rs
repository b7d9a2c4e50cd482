//! Database operations for `catalog_terms`.

use chrono::{DateTime, Utc};
use erpbridge_core::{Taxonomy, TermId};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `catalog_terms` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TermRow {
    pub id: i64,
    pub taxonomy: String,
    pub name: String,
    pub parent_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Exact-name lookup within a taxonomy. `parent = None` matches top-level
/// terms only.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_term(
    pool: &PgPool,
    taxonomy: Taxonomy,
    name: &str,
    parent: Option<TermId>,
) -> Result<Option<TermId>, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM catalog_terms \
         WHERE taxonomy = $1 AND name = $2 AND parent_id IS NOT DISTINCT FROM $3",
    )
    .bind(taxonomy.as_str())
    .bind(name)
    .bind(parent)
    .fetch_optional(pool)
    .await?;
    Ok(id)
}

/// Inserts a term unless an identical one exists.
///
/// Returns `Ok(None)` when the unique index rejected the insert, which means
/// a concurrent writer created the same term first. Callers re-run
/// [`find_term`] in that case.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails for any other reason.
pub async fn insert_term(
    pool: &PgPool,
    taxonomy: Taxonomy,
    name: &str,
    parent: Option<TermId>,
) -> Result<Option<TermId>, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO catalog_terms (taxonomy, name, parent_id) \
         VALUES ($1, $2, $3) \
         ON CONFLICT DO NOTHING \
         RETURNING id",
    )
    .bind(taxonomy.as_str())
    .bind(name)
    .bind(parent)
    .fetch_optional(pool)
    .await?;
    Ok(id)
}
