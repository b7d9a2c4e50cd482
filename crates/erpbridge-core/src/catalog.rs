use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::items::ErpItem;

/// Internal storage id of a [`CatalogEntry`].
pub type EntryId = i64;
/// Internal id of a taxonomy term (category, brand or specification).
pub type TermId = i64;
/// Internal id of a stored image asset.
pub type AssetId = i64;

/// Term vocabularies the sync writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Taxonomy {
    /// Hierarchical product categories.
    #[serde(rename = "product_cat")]
    ProductCategory,
    #[serde(rename = "pa_marca")]
    Brand,
    #[serde(rename = "pa_especificaciones")]
    Specification,
}

impl Taxonomy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProductCategory => "product_cat",
            Self::Brand => "pa_marca",
            Self::Specification => "pa_especificaciones",
        }
    }

    /// Inverse of [`Taxonomy::as_str`].
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "product_cat" => Some(Self::ProductCategory),
            "pa_marca" => Some(Self::Brand),
            "pa_especificaciones" => Some(Self::Specification),
            _ => None,
        }
    }

    /// Display label for attribute taxonomies; categories have none.
    #[must_use]
    pub fn attribute_label(self) -> Option<&'static str> {
        match self {
            Self::ProductCategory => None,
            Self::Brand => Some("Marca"),
            Self::Specification => Some("Especificaciones"),
        }
    }
}

impl std::fmt::Display for Taxonomy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    #[default]
    Publish,
    Draft,
}

impl EntryStatus {
    #[must_use]
    pub fn from_active(active: bool) -> Self {
        if active {
            Self::Publish
        } else {
            Self::Draft
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Publish => "publish",
            Self::Draft => "draft",
        }
    }

    /// Parses a stored status string. Anything other than `draft` is
    /// treated as published.
    #[must_use]
    pub fn from_stored(s: &str) -> Self {
        if s.eq_ignore_ascii_case("draft") {
            Self::Draft
        } else {
            Self::Publish
        }
    }
}

/// One attribute row on a catalog entry: a taxonomy plus the terms it holds,
/// in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryAttribute {
    pub taxonomy: Taxonomy,
    pub term_ids: Vec<TermId>,
    pub position: u32,
    pub visible: bool,
}

/// Scalar fields written on every sync, either to create an entry or to
/// overwrite a matched one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDraft {
    pub external_erp_id: Option<String>,
    pub sku: String,
    pub name: String,
    pub description: String,
    pub regular_price: Decimal,
    pub sale_price: Option<Decimal>,
    pub manage_stock: bool,
    pub stock_quantity: u32,
    pub status: EntryStatus,
}

impl EntryDraft {
    /// Applies the price, stock and status rules to a mapped item.
    #[must_use]
    pub fn from_item(item: &ErpItem) -> Self {
        Self {
            external_erp_id: item.external_id.clone().filter(|id| !id.is_empty()),
            sku: item.sku.trim().to_string(),
            name: item.name.clone(),
            description: item.description.clone(),
            regular_price: item.list_price,
            sale_price: item.sale_price(),
            manage_stock: true,
            stock_quantity: item.stock_quantity(),
            status: EntryStatus::from_active(item.active),
        }
    }
}

/// A storefront product record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: EntryId,
    pub external_erp_id: Option<String>,
    pub sku: String,
    pub name: String,
    pub description: String,
    pub regular_price: Decimal,
    pub sale_price: Option<Decimal>,
    pub manage_stock: bool,
    pub stock_quantity: u32,
    pub status: EntryStatus,
    pub category_ids: Vec<TermId>,
    pub attributes: Vec<EntryAttribute>,
    pub primary_image: Option<AssetId>,
    pub gallery: Vec<AssetId>,
}

impl CatalogEntry {
    /// A fresh entry holding exactly the draft's fields.
    #[must_use]
    pub fn from_draft(id: EntryId, draft: &EntryDraft) -> Self {
        Self {
            id,
            external_erp_id: draft.external_erp_id.clone(),
            sku: draft.sku.clone(),
            name: draft.name.clone(),
            description: draft.description.clone(),
            regular_price: draft.regular_price,
            sale_price: draft.sale_price,
            manage_stock: draft.manage_stock,
            stock_quantity: draft.stock_quantity,
            status: draft.status,
            category_ids: Vec::new(),
            attributes: Vec::new(),
            primary_image: None,
            gallery: Vec::new(),
        }
    }

    /// Overwrites the scalar fields in place, keeping the storage id and
    /// relations.
    ///
    /// An empty draft SKU never clears an existing one. The ERP id is only
    /// written onto an unlinked entry: an established link is never replaced
    /// or removed.
    pub fn apply_draft(&mut self, draft: &EntryDraft) {
        if self.external_erp_id.is_none() {
            self.external_erp_id.clone_from(&draft.external_erp_id);
        }
        if !draft.sku.is_empty() {
            self.sku.clone_from(&draft.sku);
        }
        self.name.clone_from(&draft.name);
        self.description.clone_from(&draft.description);
        self.regular_price = draft.regular_price;
        self.sale_price = draft.sale_price;
        self.manage_stock = draft.manage_stock;
        self.stock_quantity = draft.stock_quantity;
        self.status = draft.status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stock::RawStock;

    fn item() -> ErpItem {
        ErpItem {
            external_id: Some("1001".to_string()),
            sku: " UTP-6 ".to_string(),
            name: "Cable UTP".to_string(),
            list_price: Decimal::from(95_000),
            offer_price: Decimal::from(85_000),
            stock: RawStock::Number(-4.0),
            active: false,
            ..ErpItem::default()
        }
    }

    #[test]
    fn draft_applies_price_stock_and_status_rules() {
        let draft = EntryDraft::from_item(&item());
        assert_eq!(draft.external_erp_id.as_deref(), Some("1001"));
        assert_eq!(draft.sku, "UTP-6");
        assert_eq!(draft.sale_price, Some(Decimal::from(85_000)));
        assert_eq!(draft.stock_quantity, 0);
        assert!(draft.manage_stock);
        assert_eq!(draft.status, EntryStatus::Draft);
    }

    #[test]
    fn apply_draft_keeps_id_and_relations() {
        let draft = EntryDraft::from_item(&item());
        let mut entry = CatalogEntry::from_draft(7, &draft);
        entry.category_ids = vec![3];
        entry.primary_image = Some(11);

        let mut next = draft.clone();
        next.name = "Cable UTP Cat6".to_string();
        next.sale_price = None;
        next.sku = String::new();
        entry.apply_draft(&next);

        assert_eq!(entry.id, 7);
        assert_eq!(entry.name, "Cable UTP Cat6");
        assert_eq!(entry.sale_price, None);
        assert_eq!(entry.sku, "UTP-6", "empty SKU must not clear the stored one");
        assert_eq!(entry.category_ids, vec![3]);
        assert_eq!(entry.primary_image, Some(11));
    }

    #[test]
    fn apply_draft_links_once_and_never_relinks() {
        let mut unlinked = EntryDraft::from_item(&item());
        unlinked.external_erp_id = None;
        let mut entry = CatalogEntry::from_draft(7, &unlinked);

        entry.apply_draft(&EntryDraft::from_item(&item()));
        assert_eq!(entry.external_erp_id.as_deref(), Some("1001"));

        let mut other = EntryDraft::from_item(&item());
        other.external_erp_id = Some("2002".to_string());
        entry.apply_draft(&other);
        assert_eq!(entry.external_erp_id.as_deref(), Some("1001"));

        entry.apply_draft(&unlinked);
        assert_eq!(entry.external_erp_id.as_deref(), Some("1001"));
    }

    #[test]
    fn taxonomy_names() {
        assert_eq!(Taxonomy::ProductCategory.as_str(), "product_cat");
        assert_eq!(Taxonomy::Brand.to_string(), "pa_marca");
        assert_eq!(Taxonomy::Specification.attribute_label(), Some("Especificaciones"));
        assert_eq!(Taxonomy::ProductCategory.attribute_label(), None);
    }

    #[test]
    fn status_round_trips_through_storage_string() {
        assert_eq!(EntryStatus::from_stored("draft"), EntryStatus::Draft);
        assert_eq!(EntryStatus::from_stored("publish"), EntryStatus::Publish);
        assert_eq!(EntryStatus::from_active(true).as_str(), "publish");
    }
}
