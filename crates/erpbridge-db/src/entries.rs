//! Database operations for `catalog_entries` and their term, attribute and
//! gallery relations.

use chrono::{DateTime, Utc};
use erpbridge_core::{
    AssetId, CatalogEntry, EntryAttribute, EntryDraft, EntryId, EntryStatus, Taxonomy, TermId,
};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `catalog_entries` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CatalogEntryRow {
    pub id: i64,
    pub external_erp_id: Option<String>,
    pub sku: String,
    pub name: String,
    pub description: String,
    pub regular_price: Decimal,
    pub sale_price: Option<Decimal>,
    pub manage_stock: bool,
    /// `BIGINT NOT NULL CHECK (stock_quantity >= 0)`.
    pub stock_quantity: i64,
    pub status: String,
    pub primary_image_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct AttributeHeaderRow {
    taxonomy: String,
    position: i32,
    visible: bool,
}

const ENTRY_COLUMNS: &str = "id, external_erp_id, sku, name, description, regular_price, \
     sale_price, manage_stock, stock_quantity, status, primary_image_id, created_at, updated_at";

fn position(idx: usize) -> i32 {
    i32::try_from(idx).unwrap_or(i32::MAX)
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_entry_id_by_external_id(
    pool: &PgPool,
    external_id: &str,
) -> Result<Option<EntryId>, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM catalog_entries WHERE external_erp_id = $1",
    )
    .bind(external_id)
    .fetch_optional(pool)
    .await?;
    Ok(id)
}

/// Exact SKU match. Empty SKUs never match.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_entry_id_by_sku(pool: &PgPool, sku: &str) -> Result<Option<EntryId>, DbError> {
    if sku.is_empty() {
        return Ok(None);
    }
    let id = sqlx::query_scalar::<_, i64>("SELECT id FROM catalog_entries WHERE sku = $1")
        .bind(sku)
        .fetch_optional(pool)
        .await?;
    Ok(id)
}

/// Loads an entry with its categories, attributes and gallery.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any query fails.
pub async fn get_entry(pool: &PgPool, id: EntryId) -> Result<Option<CatalogEntry>, DbError> {
    let Some(row) = sqlx::query_as::<_, CatalogEntryRow>(&format!(
        "SELECT {ENTRY_COLUMNS} FROM catalog_entries WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    else {
        return Ok(None);
    };

    let category_ids = term_ids_for(pool, id, Taxonomy::ProductCategory).await?;

    let headers = sqlx::query_as::<_, AttributeHeaderRow>(
        "SELECT taxonomy, position, visible FROM catalog_entry_attributes \
         WHERE entry_id = $1 ORDER BY position, taxonomy",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let mut attributes = Vec::with_capacity(headers.len());
    for header in headers {
        let Some(taxonomy) = Taxonomy::from_name(&header.taxonomy) else {
            tracing::warn!(entry_id = id, taxonomy = %header.taxonomy, "skipping unknown attribute taxonomy");
            continue;
        };
        attributes.push(EntryAttribute {
            taxonomy,
            term_ids: term_ids_for(pool, id, taxonomy).await?,
            position: u32::try_from(header.position).unwrap_or(0),
            visible: header.visible,
        });
    }

    let gallery = sqlx::query_scalar::<_, i64>(
        "SELECT asset_id FROM catalog_entry_gallery WHERE entry_id = $1 ORDER BY position, asset_id",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(Some(CatalogEntry {
        id: row.id,
        external_erp_id: row.external_erp_id,
        sku: row.sku,
        name: row.name,
        description: row.description,
        regular_price: row.regular_price,
        sale_price: row.sale_price,
        manage_stock: row.manage_stock,
        stock_quantity: u32::try_from(row.stock_quantity).unwrap_or(u32::MAX),
        status: EntryStatus::from_stored(&row.status),
        category_ids,
        attributes,
        primary_image: row.primary_image_id,
        gallery,
    }))
}

async fn term_ids_for(
    pool: &PgPool,
    entry_id: EntryId,
    taxonomy: Taxonomy,
) -> Result<Vec<TermId>, DbError> {
    let ids = sqlx::query_scalar::<_, i64>(
        "SELECT et.term_id FROM catalog_entry_terms et \
         JOIN catalog_terms t ON t.id = et.term_id \
         WHERE et.entry_id = $1 AND t.taxonomy = $2 \
         ORDER BY et.position, et.term_id",
    )
    .bind(entry_id)
    .bind(taxonomy.as_str())
    .fetch_all(pool)
    .await?;
    Ok(ids)
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Inserts a new entry and returns its id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including unique
/// violations on `external_erp_id` or `sku`.
pub async fn insert_entry(pool: &PgPool, draft: &EntryDraft) -> Result<EntryId, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO catalog_entries \
             (external_erp_id, sku, name, description, regular_price, sale_price, \
              manage_stock, stock_quantity, status) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING id",
    )
    .bind(draft.external_erp_id.as_deref())
    .bind(&draft.sku)
    .bind(&draft.name)
    .bind(&draft.description)
    .bind(draft.regular_price)
    .bind(draft.sale_price)
    .bind(draft.manage_stock)
    .bind(i64::from(draft.stock_quantity))
    .bind(draft.status.as_str())
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Overwrites the scalar fields of an existing entry.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has `entry.id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_entry(pool: &PgPool, entry: &CatalogEntry) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE catalog_entries SET \
             external_erp_id = $1, \
             sku             = $2, \
             name            = $3, \
             description     = $4, \
             regular_price   = $5, \
             sale_price      = $6, \
             manage_stock    = $7, \
             stock_quantity  = $8, \
             status          = $9, \
             updated_at      = NOW() \
         WHERE id = $10",
    )
    .bind(entry.external_erp_id.as_deref())
    .bind(&entry.sku)
    .bind(&entry.name)
    .bind(&entry.description)
    .bind(entry.regular_price)
    .bind(entry.sale_price)
    .bind(entry.manage_stock)
    .bind(i64::from(entry.stock_quantity))
    .bind(entry.status.as_str())
    .bind(entry.id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Replaces the entry's category links, keeping the given order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; the transaction is
/// rolled back.
pub async fn replace_entry_categories(
    pool: &PgPool,
    entry_id: EntryId,
    term_ids: &[TermId],
) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "DELETE FROM catalog_entry_terms et USING catalog_terms t \
         WHERE et.term_id = t.id AND et.entry_id = $1 AND t.taxonomy = $2",
    )
    .bind(entry_id)
    .bind(Taxonomy::ProductCategory.as_str())
    .execute(&mut *tx)
    .await?;

    for (idx, term_id) in term_ids.iter().enumerate() {
        sqlx::query(
            "INSERT INTO catalog_entry_terms (entry_id, term_id, position) \
             VALUES ($1, $2, $3) ON CONFLICT (entry_id, term_id) DO NOTHING",
        )
        .bind(entry_id)
        .bind(term_id)
        .bind(position(idx))
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Replaces every attribute row and attribute term link on the entry.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; the transaction is
/// rolled back.
pub async fn replace_entry_attributes(
    pool: &PgPool,
    entry_id: EntryId,
    attributes: &[EntryAttribute],
) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM catalog_entry_attributes WHERE entry_id = $1")
        .bind(entry_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "DELETE FROM catalog_entry_terms et USING catalog_terms t \
         WHERE et.term_id = t.id AND et.entry_id = $1 AND t.taxonomy <> $2",
    )
    .bind(entry_id)
    .bind(Taxonomy::ProductCategory.as_str())
    .execute(&mut *tx)
    .await?;

    for attribute in attributes {
        sqlx::query(
            "INSERT INTO catalog_entry_attributes (entry_id, taxonomy, position, visible) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (entry_id, taxonomy) DO UPDATE SET \
                 position = EXCLUDED.position, \
                 visible  = EXCLUDED.visible",
        )
        .bind(entry_id)
        .bind(attribute.taxonomy.as_str())
        .bind(i32::try_from(attribute.position).unwrap_or(i32::MAX))
        .bind(attribute.visible)
        .execute(&mut *tx)
        .await?;

        for (idx, term_id) in attribute.term_ids.iter().enumerate() {
            sqlx::query(
                "INSERT INTO catalog_entry_terms (entry_id, term_id, position) \
                 VALUES ($1, $2, $3) ON CONFLICT (entry_id, term_id) DO NOTHING",
            )
            .bind(entry_id)
            .bind(term_id)
            .bind(position(idx))
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;
    Ok(())
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if the entry does not exist, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn set_entry_primary_image(
    pool: &PgPool,
    entry_id: EntryId,
    asset_id: AssetId,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE catalog_entries SET primary_image_id = $1, updated_at = NOW() WHERE id = $2",
    )
    .bind(asset_id)
    .bind(entry_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Replaces the entry's gallery, keeping the given order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; the transaction is
/// rolled back.
pub async fn replace_entry_gallery(
    pool: &PgPool,
    entry_id: EntryId,
    asset_ids: &[AssetId],
) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM catalog_entry_gallery WHERE entry_id = $1")
        .bind(entry_id)
        .execute(&mut *tx)
        .await?;

    for (idx, asset_id) in asset_ids.iter().enumerate() {
        sqlx::query(
            "INSERT INTO catalog_entry_gallery (entry_id, asset_id, position) \
             VALUES ($1, $2, $3) ON CONFLICT (entry_id, asset_id) DO NOTHING",
        )
        .bind(entry_id)
        .bind(asset_id)
        .bind(position(idx))
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}
