//! Matches an ERP item to an existing catalog entry.

use erpbridge_core::{CatalogStore, EntryId, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchedBy {
    ExternalId,
    Sku,
}

impl MatchedBy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ExternalId => "external_id",
            Self::Sku => "sku",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityMatch {
    pub entry_id: EntryId,
    pub matched_by: MatchedBy,
}

/// Finds the entry an item maps onto.
///
/// The ERP id link is authoritative once established. A SKU match is only
/// tried when the ERP id is unknown, and only for a non-empty SKU. It is
/// accepted for an entry with no ERP id yet, the same ERP id, or an item that
/// carries none. `Ok(None)` means the caller should create a new entry.
///
/// # Errors
///
/// Returns [`StoreError`] if a lookup fails.
pub async fn resolve(
    store: &dyn CatalogStore,
    external_id: Option<&str>,
    sku: &str,
) -> Result<Option<IdentityMatch>, StoreError> {
    if let Some(external_id) = external_id.filter(|id| !id.is_empty()) {
        if let Some(entry_id) = store.find_by_external_id(external_id).await? {
            return Ok(Some(IdentityMatch {
                entry_id,
                matched_by: MatchedBy::ExternalId,
            }));
        }
    }

    let sku = sku.trim();
    if sku.is_empty() {
        return Ok(None);
    }

    let Some(entry_id) = store.find_by_sku(sku).await? else {
        return Ok(None);
    };

    // A SKU hit on an entry linked to another ERP id belongs to that product.
    // Creating instead lets SKU uniqueness report the clash for this item.
    if let Some(incoming) = external_id.filter(|id| !id.is_empty()) {
        let linked = store
            .load_entry(entry_id)
            .await?
            .and_then(|entry| entry.external_erp_id);
        if linked.as_deref().is_some_and(|linked| linked != incoming) {
            tracing::warn!(
                entry_id,
                sku,
                incoming,
                linked = linked.as_deref().unwrap_or_default(),
                "SKU belongs to an entry linked to another ERP id"
            );
            return Ok(None);
        }
    }

    Ok(Some(IdentityMatch {
        entry_id,
        matched_by: MatchedBy::Sku,
    }))
}
