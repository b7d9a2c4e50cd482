//! The sync run: one ERP fetch, then a per-item upsert loop with failure
//! isolation at the item boundary.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use erpbridge_core::{
    CatalogStore, EntryDraft, EntryId, ErpItem, SchemaVersion, StoreError, SyncRunReport,
};
use erpbridge_erp::{map_item, normalize_payload, ErpClient};
use serde_json::Value;
use thiserror::Error;
use tracing::Instrument;

use crate::assets::ImageSync;
use crate::identity::resolve;
use crate::terms::TermResolver;

/// Report message for a run whose fetch produced no records.
pub const EMPTY_CATALOG_MESSAGE: &str = "no products received from the ERP";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Fetching,
    Mapping,
    Resolving,
    Upserting,
    ImageImporting,
    Reporting,
}

impl SyncPhase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Mapping => "mapping",
            Self::Resolving => "resolving",
            Self::Upserting => "upserting",
            Self::ImageImporting => "image_importing",
            Self::Reporting => "reporting",
        }
    }
}

fn enter(phase: SyncPhase) {
    tracing::debug!(phase = phase.as_str(), "sync phase");
}

/// Why a single item could not be synced. Never aborts the run.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("item has no usable ERP identifier")]
    MissingIdentifier,
    #[error("catalog entry {0} disappeared during sync")]
    EntryVanished(EntryId),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    Created(EntryId),
    Updated(EntryId),
}

impl ItemOutcome {
    #[must_use]
    pub fn entry_id(self) -> EntryId {
        match self {
            Self::Created(id) | Self::Updated(id) => id,
        }
    }
}

/// Current-schema records must carry `IdProducto`. Legacy records predate
/// ERP ids and may be identified by SKU alone.
fn require_identifier(item: &ErpItem) -> Result<(), ItemError> {
    let has_external_id = item.external_id.as_deref().is_some_and(|id| !id.is_empty());
    let legacy_sku = item.schema == SchemaVersion::Legacy && !item.sku.trim().is_empty();
    if has_external_id || legacy_sku {
        Ok(())
    } else {
        Err(ItemError::MissingIdentifier)
    }
}

/// Drives one catalog sync from an ERP client into a catalog store.
#[derive(Clone)]
pub struct SyncOrchestrator {
    erp: Arc<dyn ErpClient>,
    catalog: Arc<dyn CatalogStore>,
    images: Option<ImageSync>,
}

impl SyncOrchestrator {
    #[must_use]
    pub fn new(erp: Arc<dyn ErpClient>, catalog: Arc<dyn CatalogStore>) -> Self {
        Self {
            erp,
            catalog,
            images: None,
        }
    }

    #[must_use]
    pub fn with_images(mut self, images: ImageSync) -> Self {
        self.images = Some(images);
        self
    }

    /// Runs a full sync. Never fails: a run that cannot start reports
    /// `status = error`, and item failures are counted in the report.
    pub async fn run(&self, modified_after: Option<DateTime<Utc>>) -> SyncRunReport {
        enter(SyncPhase::Fetching);
        tracing::info!(erp = self.erp.kind(), ?modified_after, "fetching ERP catalog");
        let payload = self.erp.fetch_products(modified_after).await;
        let records = normalize_payload(payload);

        if records.is_empty() {
            tracing::warn!("ERP returned no products; nothing to sync");
            enter(SyncPhase::Reporting);
            enter(SyncPhase::Idle);
            return SyncRunReport::run_error(EMPTY_CATALOG_MESSAGE);
        }

        let report = self.sync_records(&records).await;
        enter(SyncPhase::Idle);
        report
    }

    /// Syncs an already-normalized list of raw records, one at a time.
    pub async fn sync_records(&self, records: &[Value]) -> SyncRunReport {
        let mut report = SyncRunReport::default();
        let mut terms = TermResolver::new(self.catalog.as_ref());

        for (index, raw) in records.iter().enumerate() {
            enter(SyncPhase::Mapping);
            let item = map_item(raw);
            let identifier = item.best_identifier().to_string();

            let span = tracing::info_span!("sync_item", index, item = %identifier);
            match self.sync_item(&mut terms, &item).instrument(span).await {
                Ok(ItemOutcome::Created(entry_id)) => {
                    tracing::debug!(entry_id, item = %identifier, "created catalog entry");
                    report.record_created();
                }
                Ok(ItemOutcome::Updated(entry_id)) => {
                    tracing::debug!(entry_id, item = %identifier, "updated catalog entry");
                    report.record_updated();
                }
                Err(e) => {
                    tracing::warn!(item = %identifier, error = %e, "item sync failed");
                    report.record_item_error(&identifier, &e);
                }
            }
        }

        enter(SyncPhase::Reporting);
        tracing::info!(
            processed = report.processed,
            errors = report.errors,
            created = report.created,
            updated = report.updated,
            "sync run finished"
        );
        report
    }

    /// Upserts one mapped item and everything hanging off it.
    ///
    /// # Errors
    ///
    /// Returns [`ItemError`] for a missing identifier or any store failure.
    pub async fn sync_item(
        &self,
        terms: &mut TermResolver<'_>,
        item: &ErpItem,
    ) -> Result<ItemOutcome, ItemError> {
        require_identifier(item)?;
        let draft = EntryDraft::from_item(item);

        enter(SyncPhase::Resolving);
        let matched = resolve(
            self.catalog.as_ref(),
            draft.external_erp_id.as_deref(),
            &draft.sku,
        )
        .await?;
        let category_ids = terms.resolve_categories(item.category.as_ref()).await;
        let attributes = terms.resolve_attributes(item).await;

        enter(SyncPhase::Upserting);
        let mut stored_attributes = Vec::new();
        let outcome = match matched {
            Some(found) => {
                let mut entry = self
                    .catalog
                    .load_entry(found.entry_id)
                    .await?
                    .ok_or(ItemError::EntryVanished(found.entry_id))?;
                entry.apply_draft(&draft);
                self.catalog.save_entry(&entry).await?;
                stored_attributes = entry.attributes;
                tracing::debug!(
                    entry_id = found.entry_id,
                    matched_by = found.matched_by.as_str(),
                    "matched existing entry"
                );
                ItemOutcome::Updated(found.entry_id)
            }
            None => ItemOutcome::Created(self.catalog.create_entry(&draft).await?),
        };
        let entry_id = outcome.entry_id();

        if !category_ids.is_empty() {
            self.catalog.assign_categories(entry_id, &category_ids).await?;
        }
        let attributes = attributes.merge_existing(&stored_attributes);
        self.catalog.assign_attributes(entry_id, &attributes).await?;

        if let Some(images) = &self.images {
            if !item.image_refs.is_empty() {
                enter(SyncPhase::ImageImporting);
                let imported = images.import_images(entry_id, &item.image_refs).await;
                if let Some(primary) = imported.primary {
                    self.catalog.assign_primary_image(entry_id, primary).await?;
                    self.catalog
                        .assign_gallery_images(entry_id, &imported.gallery)
                        .await?;
                }
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
