//! Postgres-backed [`CatalogStore`] and [`AssetStore`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use erpbridge_core::{
    AssetId, AssetStore, CatalogEntry, CatalogStore, EntryAttribute, EntryDraft, EntryId,
    StoreError, Taxonomy, TermId,
};
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use crate::assets::{find_asset_by_title, insert_asset, NewAsset};
use crate::entries::{
    find_entry_id_by_external_id, find_entry_id_by_sku, get_entry, insert_entry,
    replace_entry_attributes, replace_entry_categories, replace_entry_gallery,
    set_entry_primary_image, update_entry,
};
use crate::terms::{find_term, insert_term};
use crate::DbError;

/// Postgres SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => StoreError::NotFound(err.to_string()),
            DbError::Sqlx(sqlx::Error::Database(ref db))
                if db.code().as_deref() == Some(UNIQUE_VIOLATION) =>
            {
                StoreError::Conflict(db.message().to_string())
            }
            other => StoreError::Backend(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<EntryId>, StoreError> {
        Ok(find_entry_id_by_external_id(&self.pool, external_id).await?)
    }

    async fn find_by_sku(&self, sku: &str) -> Result<Option<EntryId>, StoreError> {
        Ok(find_entry_id_by_sku(&self.pool, sku).await?)
    }

    async fn create_entry(&self, draft: &EntryDraft) -> Result<EntryId, StoreError> {
        Ok(insert_entry(&self.pool, draft).await?)
    }

    async fn load_entry(&self, id: EntryId) -> Result<Option<CatalogEntry>, StoreError> {
        Ok(get_entry(&self.pool, id).await?)
    }

    async fn save_entry(&self, entry: &CatalogEntry) -> Result<(), StoreError> {
        Ok(update_entry(&self.pool, entry).await?)
    }

    async fn find_term(
        &self,
        taxonomy: Taxonomy,
        name: &str,
        parent: Option<TermId>,
    ) -> Result<Option<TermId>, StoreError> {
        Ok(find_term(&self.pool, taxonomy, name, parent).await?)
    }

    async fn create_term(
        &self,
        taxonomy: Taxonomy,
        name: &str,
        parent: Option<TermId>,
    ) -> Result<TermId, StoreError> {
        insert_term(&self.pool, taxonomy, name, parent)
            .await?
            .ok_or_else(|| StoreError::Conflict(format!("term '{name}' already exists in {taxonomy}")))
    }

    async fn assign_categories(&self, entry: EntryId, term_ids: &[TermId]) -> Result<(), StoreError> {
        Ok(replace_entry_categories(&self.pool, entry, term_ids).await?)
    }

    async fn assign_attributes(
        &self,
        entry: EntryId,
        attributes: &[EntryAttribute],
    ) -> Result<(), StoreError> {
        Ok(replace_entry_attributes(&self.pool, entry, attributes).await?)
    }

    async fn assign_primary_image(&self, entry: EntryId, asset: AssetId) -> Result<(), StoreError> {
        Ok(set_entry_primary_image(&self.pool, entry, asset).await?)
    }

    async fn assign_gallery_images(&self, entry: EntryId, assets: &[AssetId]) -> Result<(), StoreError> {
        Ok(replace_entry_gallery(&self.pool, entry, assets).await?)
    }
}

/// Writes asset bytes under a media directory and indexes them in
/// `catalog_assets`.
///
/// Files are named `<sha256 prefix>-<filename>`, so identical uploads of the
/// same name land on the same path.
#[derive(Debug, Clone)]
pub struct PgAssetStore {
    pool: PgPool,
    media_dir: PathBuf,
}

impl PgAssetStore {
    #[must_use]
    pub fn new(pool: PgPool, media_dir: impl Into<PathBuf>) -> Self {
        Self {
            pool,
            media_dir: media_dir.into(),
        }
    }

    #[must_use]
    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }
}

#[async_trait]
impl AssetStore for PgAssetStore {
    async fn find_by_title(&self, title: &str) -> Result<Option<AssetId>, StoreError> {
        Ok(find_asset_by_title(&self.pool, title).await?)
    }

    async fn store_asset(
        &self,
        entry: EntryId,
        filename: &str,
        title: &str,
        bytes: &[u8],
    ) -> Result<AssetId, StoreError> {
        let digest = format!("{:x}", Sha256::digest(bytes));
        let stored_name = format!("{}-{}", &digest[..16], sanitize_filename(filename));
        let path = self.media_dir.join(&stored_name);

        tokio::fs::create_dir_all(&self.media_dir).await?;
        tokio::fs::write(&path, bytes).await?;

        let byte_size = i64::try_from(bytes.len()).unwrap_or(i64::MAX);
        let file_path = path.to_string_lossy();
        let id = insert_asset(
            &self.pool,
            &NewAsset {
                entry_id: entry,
                title,
                filename,
                file_path: &file_path,
                content_type: content_type_for(filename),
                byte_size,
                sha256: &digest,
            },
        )
        .await?;

        tracing::debug!(entry_id = entry, asset_id = id, path = %path.display(), "stored asset");
        Ok(id)
    }
}

/// Keeps ASCII alphanumerics, `.`, `-` and `_`; everything else becomes `_`.
fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "asset".to_string()
    } else {
        trimmed.to_string()
    }
}

/// MIME type from the file extension.
fn content_type_for(filename: &str) -> &'static str {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("avif") => "image/avif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_filename_strips_path_and_odd_characters() {
        assert_eq!(sanitize_filename("cable utp.jpg"), "cable_utp.jpg");
        assert_eq!(sanitize_filename("../etc/passwd"), "_etc_passwd");
        assert_eq!(sanitize_filename(""), "asset");
        assert_eq!(sanitize_filename("..."), "asset");
    }

    #[test]
    fn content_type_from_extension() {
        assert_eq!(content_type_for("a.JPG"), "image/jpeg");
        assert_eq!(content_type_for("a.png"), "image/png");
        assert_eq!(content_type_for("a.webp"), "image/webp");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }

    #[test]
    fn not_found_maps_to_store_not_found() {
        let err: StoreError = DbError::NotFound.into();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn other_errors_map_to_backend() {
        let err: StoreError = DbError::Sqlx(sqlx::Error::RowNotFound).into();
        assert!(matches!(err, StoreError::Backend(_)));
    }
}
