//! Get-or-create resolution for category, brand and specification terms.

use std::collections::HashMap;

use erpbridge_core::{CatalogStore, CategoryPath, EntryAttribute, ErpItem, StoreError, Taxonomy, TermId};

type CacheKey = (Taxonomy, Option<TermId>, String);

/// Resolves term names to ids, creating missing terms on first sight.
///
/// One resolver lives for one sync run; its cache guarantees each distinct
/// `(taxonomy, parent, name)` that resolved hits the store at most once per
/// run. Store failures are not cached, so a later item retries the term.
pub struct TermResolver<'a> {
    store: &'a dyn CatalogStore,
    cache: HashMap<CacheKey, TermId>,
}

/// Attribute rows for one item, plus the taxonomies whose terms could not be
/// resolved because the store failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedAttributes {
    pub attributes: Vec<EntryAttribute>,
    pub unresolved: Vec<Taxonomy>,
}

impl ResolvedAttributes {
    /// The rows to store on an entry that currently holds `existing`.
    ///
    /// An unresolved taxonomy keeps its stored row instead of being dropped.
    /// Positions are renumbered brand first, then specifications.
    #[must_use]
    pub fn merge_existing(self, existing: &[EntryAttribute]) -> Vec<EntryAttribute> {
        let Self {
            mut attributes,
            unresolved,
        } = self;
        attributes.extend(
            existing
                .iter()
                .filter(|attr| unresolved.contains(&attr.taxonomy))
                .cloned(),
        );
        attributes.sort_by_key(|attr| attribute_rank(attr.taxonomy));
        for (position, attr) in attributes.iter_mut().enumerate() {
            attr.position = u32::try_from(position).unwrap_or(u32::MAX);
        }
        attributes
    }
}

fn attribute_rank(taxonomy: Taxonomy) -> u8 {
    match taxonomy {
        Taxonomy::Brand => 0,
        Taxonomy::Specification => 1,
        Taxonomy::ProductCategory => 2,
    }
}

impl<'a> TermResolver<'a> {
    #[must_use]
    pub fn new(store: &'a dyn CatalogStore) -> Self {
        Self {
            store,
            cache: HashMap::new(),
        }
    }

    /// Looks a term up by exact name, creating it if absent.
    ///
    /// `None` means "no term": the name was blank or the store failed.
    /// Failures are logged, never raised, so one bad term cannot fail an item.
    pub async fn get_or_create_term(
        &mut self,
        taxonomy: Taxonomy,
        name: &str,
        parent: Option<TermId>,
    ) -> Option<TermId> {
        self.try_term(taxonomy, name, parent).await.ok().flatten()
    }

    /// Like [`Self::get_or_create_term`], but tells a blank name (`Ok(None)`)
    /// apart from a store failure.
    async fn try_term(
        &mut self,
        taxonomy: Taxonomy,
        name: &str,
        parent: Option<TermId>,
    ) -> Result<Option<TermId>, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        let key = (taxonomy, parent, name.to_string());
        if let Some(cached) = self.cache.get(&key) {
            return Ok(Some(*cached));
        }

        match self.lookup_or_create(taxonomy, name, parent).await {
            Ok(id) => {
                self.cache.insert(key, id);
                Ok(Some(id))
            }
            Err(e) => {
                tracing::warn!(%taxonomy, name, error = %e, "term resolution failed");
                Err(e)
            }
        }
    }

    async fn lookup_or_create(
        &self,
        taxonomy: Taxonomy,
        name: &str,
        parent: Option<TermId>,
    ) -> Result<TermId, StoreError> {
        if let Some(id) = self.store.find_term(taxonomy, name, parent).await? {
            return Ok(id);
        }

        match self.store.create_term(taxonomy, name, parent).await {
            Ok(id) => {
                tracing::debug!(%taxonomy, name, term_id = id, "created term");
                Ok(id)
            }
            Err(StoreError::Conflict(reason)) => {
                // Another run created it between our lookup and insert.
                self.store
                    .find_term(taxonomy, name, parent)
                    .await?
                    .ok_or(StoreError::Conflict(reason))
            }
            Err(e) => Err(e),
        }
    }

    /// Category ids for a path, parent first. A child that cannot be resolved
    /// leaves just the parent; an unresolved parent yields nothing.
    pub async fn resolve_categories(&mut self, path: Option<&CategoryPath>) -> Vec<TermId> {
        let Some(path) = path else {
            return Vec::new();
        };
        let Some(parent) = self
            .get_or_create_term(Taxonomy::ProductCategory, &path.parent, None)
            .await
        else {
            return Vec::new();
        };

        let mut ids = vec![parent];
        if let Some(child) = path.child.as_deref() {
            if let Some(child_id) = self
                .get_or_create_term(Taxonomy::ProductCategory, child, Some(parent))
                .await
            {
                ids.push(child_id);
            }
        }
        ids
    }

    /// Brand and specification attributes for an item, in that order.
    ///
    /// A taxonomy with no terms on the item is omitted. A taxonomy where any
    /// term hit a store failure is listed in
    /// [`ResolvedAttributes::unresolved`] instead.
    pub async fn resolve_attributes(&mut self, item: &ErpItem) -> ResolvedAttributes {
        let mut resolved = ResolvedAttributes::default();

        if let Some(brand) = item.brand.as_deref() {
            match self.try_term(Taxonomy::Brand, brand, None).await {
                Ok(Some(id)) => resolved.attributes.push(EntryAttribute {
                    taxonomy: Taxonomy::Brand,
                    term_ids: vec![id],
                    position: 0,
                    visible: true,
                }),
                Ok(None) => {}
                Err(_) => resolved.unresolved.push(Taxonomy::Brand),
            }
        }

        let mut spec_ids: Vec<TermId> = Vec::with_capacity(item.specifications.len());
        let mut spec_failed = false;
        for spec in &item.specifications {
            match self.try_term(Taxonomy::Specification, spec, None).await {
                Ok(Some(id)) if !spec_ids.contains(&id) => spec_ids.push(id),
                Ok(_) => {}
                Err(_) => spec_failed = true,
            }
        }
        if spec_failed {
            resolved.unresolved.push(Taxonomy::Specification);
        } else if !spec_ids.is_empty() {
            resolved.attributes.push(EntryAttribute {
                taxonomy: Taxonomy::Specification,
                term_ids: spec_ids,
                position: u32::try_from(resolved.attributes.len()).unwrap_or(u32::MAX),
                visible: true,
            });
        }

        resolved
    }
}
