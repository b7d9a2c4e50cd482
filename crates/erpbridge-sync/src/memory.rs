//! In-memory [`CatalogStore`] and [`AssetStore`], used for preview runs and
//! tests. Enforces the same uniqueness rules as the Postgres schema.

use std::collections::BTreeMap;

use async_trait::async_trait;
use erpbridge_core::{
    AssetId, AssetStore, CatalogEntry, CatalogStore, EntryAttribute, EntryDraft, EntryId,
    StoreError, Taxonomy, TermId,
};
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTerm {
    pub id: TermId,
    pub taxonomy: Taxonomy,
    pub name: String,
    pub parent: Option<TermId>,
}

#[derive(Debug, Default)]
struct CatalogState {
    next_entry_id: EntryId,
    next_term_id: TermId,
    entries: BTreeMap<EntryId, CatalogEntry>,
    terms: Vec<StoredTerm>,
}

impl CatalogState {
    fn conflict_for(&self, external_id: Option<&str>, sku: &str, exclude: Option<EntryId>) -> Option<String> {
        self.entries
            .values()
            .filter(|e| Some(e.id) != exclude)
            .find_map(|e| match external_id {
                Some(id) if e.external_erp_id.as_deref() == Some(id) => {
                    Some(format!("external_erp_id '{id}' already linked"))
                }
                _ if !sku.is_empty() && e.sku == sku => Some(format!("sku '{sku}' already in use")),
                _ => None,
            })
    }

    fn entry_mut(&mut self, id: EntryId) -> Result<&mut CatalogEntry, StoreError> {
        self.entries
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("catalog entry {id}")))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    state: Mutex<CatalogState>,
}

impl InMemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every entry, ordered by id.
    pub async fn entries(&self) -> Vec<CatalogEntry> {
        self.state.lock().await.entries.values().cloned().collect()
    }

    pub async fn terms(&self, taxonomy: Taxonomy) -> Vec<StoredTerm> {
        self.state
            .lock()
            .await
            .terms
            .iter()
            .filter(|t| t.taxonomy == taxonomy)
            .cloned()
            .collect()
    }

    pub async fn term_name(&self, id: TermId) -> Option<String> {
        self.state
            .lock()
            .await
            .terms
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.name.clone())
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<EntryId>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .entries
            .values()
            .find(|e| e.external_erp_id.as_deref() == Some(external_id))
            .map(|e| e.id))
    }

    async fn find_by_sku(&self, sku: &str) -> Result<Option<EntryId>, StoreError> {
        if sku.is_empty() {
            return Ok(None);
        }
        let state = self.state.lock().await;
        Ok(state.entries.values().find(|e| e.sku == sku).map(|e| e.id))
    }

    async fn create_entry(&self, draft: &EntryDraft) -> Result<EntryId, StoreError> {
        let mut state = self.state.lock().await;
        if let Some(reason) = state.conflict_for(draft.external_erp_id.as_deref(), &draft.sku, None) {
            return Err(StoreError::Conflict(reason));
        }
        state.next_entry_id += 1;
        let id = state.next_entry_id;
        state.entries.insert(id, CatalogEntry::from_draft(id, draft));
        Ok(id)
    }

    async fn load_entry(&self, id: EntryId) -> Result<Option<CatalogEntry>, StoreError> {
        Ok(self.state.lock().await.entries.get(&id).cloned())
    }

    async fn save_entry(&self, entry: &CatalogEntry) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if let Some(reason) =
            state.conflict_for(entry.external_erp_id.as_deref(), &entry.sku, Some(entry.id))
        {
            return Err(StoreError::Conflict(reason));
        }
        let stored = state.entry_mut(entry.id)?;
        // Relations are owned by the assign_* methods.
        let mut updated = entry.clone();
        updated.category_ids = std::mem::take(&mut stored.category_ids);
        updated.attributes = std::mem::take(&mut stored.attributes);
        updated.primary_image = stored.primary_image;
        updated.gallery = std::mem::take(&mut stored.gallery);
        *stored = updated;
        Ok(())
    }

    async fn find_term(
        &self,
        taxonomy: Taxonomy,
        name: &str,
        parent: Option<TermId>,
    ) -> Result<Option<TermId>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .terms
            .iter()
            .find(|t| t.taxonomy == taxonomy && t.parent == parent && t.name == name)
            .map(|t| t.id))
    }

    async fn create_term(
        &self,
        taxonomy: Taxonomy,
        name: &str,
        parent: Option<TermId>,
    ) -> Result<TermId, StoreError> {
        let mut state = self.state.lock().await;
        if state
            .terms
            .iter()
            .any(|t| t.taxonomy == taxonomy && t.parent == parent && t.name == name)
        {
            return Err(StoreError::Conflict(format!(
                "term '{name}' already exists in {taxonomy}"
            )));
        }
        state.next_term_id += 1;
        let id = state.next_term_id;
        state.terms.push(StoredTerm {
            id,
            taxonomy,
            name: name.to_string(),
            parent,
        });
        Ok(id)
    }

    async fn assign_categories(&self, entry: EntryId, term_ids: &[TermId]) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.entry_mut(entry)?.category_ids = term_ids.to_vec();
        Ok(())
    }

    async fn assign_attributes(
        &self,
        entry: EntryId,
        attributes: &[EntryAttribute],
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.entry_mut(entry)?.attributes = attributes.to_vec();
        Ok(())
    }

    async fn assign_primary_image(&self, entry: EntryId, asset: AssetId) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.entry_mut(entry)?.primary_image = Some(asset);
        Ok(())
    }

    async fn assign_gallery_images(&self, entry: EntryId, assets: &[AssetId]) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.entry_mut(entry)?.gallery = assets.to_vec();
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    pub id: AssetId,
    pub entry_id: EntryId,
    pub filename: String,
    pub title: String,
    pub byte_size: usize,
}

#[derive(Debug, Default)]
pub struct InMemoryAssets {
    assets: Mutex<Vec<StoredAsset>>,
}

impl InMemoryAssets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn assets(&self) -> Vec<StoredAsset> {
        self.assets.lock().await.clone()
    }
}

#[async_trait]
impl AssetStore for InMemoryAssets {
    async fn find_by_title(&self, title: &str) -> Result<Option<AssetId>, StoreError> {
        Ok(self
            .assets
            .lock()
            .await
            .iter()
            .find(|a| a.title == title)
            .map(|a| a.id))
    }

    async fn store_asset(
        &self,
        entry: EntryId,
        filename: &str,
        title: &str,
        bytes: &[u8],
    ) -> Result<AssetId, StoreError> {
        let mut assets = self.assets.lock().await;
        let id = AssetId::try_from(assets.len()).unwrap_or(AssetId::MAX - 1) + 1;
        assets.push(StoredAsset {
            id,
            entry_id: entry,
            filename: filename.to_string(),
            title: title.to_string(),
            byte_size: bytes.len(),
        });
        Ok(id)
    }
}
