//! Storage boundaries the sync engine writes through.
//!
//! Implemented over Postgres in `erpbridge-db` and in memory in
//! `erpbridge-sync`.

use async_trait::async_trait;
use thiserror::Error;

use crate::catalog::{AssetId, CatalogEntry, EntryAttribute, EntryDraft, EntryId, Taxonomy, TermId};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    /// A unique constraint rejected the write (duplicate SKU, ERP id or term).
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("asset I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read/write access to storefront catalog entries and term vocabularies.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<EntryId>, StoreError>;

    /// Exact SKU match. Callers never pass an empty SKU.
    async fn find_by_sku(&self, sku: &str) -> Result<Option<EntryId>, StoreError>;

    async fn create_entry(&self, draft: &EntryDraft) -> Result<EntryId, StoreError>;

    async fn load_entry(&self, id: EntryId) -> Result<Option<CatalogEntry>, StoreError>;

    /// Persists the scalar fields of an existing entry, including its ERP id
    /// link. Relations are written through the `assign_*` methods.
    async fn save_entry(&self, entry: &CatalogEntry) -> Result<(), StoreError>;

    /// Exact-name lookup within a taxonomy, scoped to `parent` when given.
    async fn find_term(
        &self,
        taxonomy: Taxonomy,
        name: &str,
        parent: Option<TermId>,
    ) -> Result<Option<TermId>, StoreError>;

    /// Creates a term. Returns [`StoreError::Conflict`] if an identical term
    /// already exists.
    async fn create_term(
        &self,
        taxonomy: Taxonomy,
        name: &str,
        parent: Option<TermId>,
    ) -> Result<TermId, StoreError>;

    /// Replaces the entry's category set, preserving the given order.
    async fn assign_categories(&self, entry: EntryId, term_ids: &[TermId]) -> Result<(), StoreError>;

    /// Replaces the entry's attribute rows.
    async fn assign_attributes(
        &self,
        entry: EntryId,
        attributes: &[EntryAttribute],
    ) -> Result<(), StoreError>;

    async fn assign_primary_image(&self, entry: EntryId, asset: AssetId) -> Result<(), StoreError>;

    /// Replaces the entry's gallery, preserving order.
    async fn assign_gallery_images(&self, entry: EntryId, assets: &[AssetId]) -> Result<(), StoreError>;
}

/// Stored image assets, addressable by their normalized title.
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn find_by_title(&self, title: &str) -> Result<Option<AssetId>, StoreError>;

    /// Stores the bytes and registers the asset against `entry`.
    async fn store_asset(
        &self,
        entry: EntryId,
        filename: &str,
        title: &str,
        bytes: &[u8],
    ) -> Result<AssetId, StoreError>;
}
