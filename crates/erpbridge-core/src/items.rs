use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::stock::{clamp_stock, RawStock};

/// Identifier used in run-report details when an item has neither an ERP id
/// nor a SKU.
pub const UNKNOWN_IDENTIFIER: &str = "UNKNOWN";

/// Which raw ERP record layout an [`ErpItem`] was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    /// `IdProducto` / `PrecioLista` / `Atributos` layout.
    V2,
    /// Nested `prices` / `stock` / `category` objects, lowercase keys.
    Legacy,
}

/// Zero, one or two category levels. A path always has a parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPath {
    pub parent: String,
    pub child: Option<String>,
}

impl CategoryPath {
    /// Builds a path from optional category and subcategory names.
    ///
    /// Blank names are ignored. A subcategory with no category is promoted to
    /// a top-level category rather than dropped.
    #[must_use]
    pub fn from_levels(category: Option<String>, subcategory: Option<String>) -> Option<Self> {
        let clean = |s: Option<String>| {
            s.map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        match (clean(category), clean(subcategory)) {
            (Some(parent), child) => Some(Self { parent, child }),
            (None, Some(parent)) => Some(Self {
                parent,
                child: None,
            }),
            (None, None) => None,
        }
    }
}

/// Canonical form of one ERP product record after field mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErpItem {
    /// Stable ERP identifier. Absent in some legacy payloads.
    pub external_id: Option<String>,
    /// May be empty.
    pub sku: String,
    pub name: String,
    pub description: String,
    pub list_price: Decimal,
    /// `0` means the ERP has no offer for this product.
    pub offer_price: Decimal,
    pub stock: RawStock,
    pub category: Option<CategoryPath>,
    pub brand: Option<String>,
    /// Ordered, trimmed, never contains empty tokens.
    pub specifications: Vec<String>,
    /// Filenames or URLs; the first is the primary image.
    pub image_refs: Vec<String>,
    pub active: bool,
    pub schema: SchemaVersion,
}

impl Default for ErpItem {
    fn default() -> Self {
        Self {
            external_id: None,
            sku: String::new(),
            name: String::new(),
            description: String::new(),
            list_price: Decimal::ZERO,
            offer_price: Decimal::ZERO,
            stock: RawStock::Missing,
            category: None,
            brand: None,
            specifications: Vec::new(),
            image_refs: Vec::new(),
            active: true,
            schema: SchemaVersion::Legacy,
        }
    }
}

impl ErpItem {
    /// The identifier used when reporting on this item: ERP id, else SKU,
    /// else [`UNKNOWN_IDENTIFIER`].
    #[must_use]
    pub fn best_identifier(&self) -> &str {
        match self.external_id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ if !self.sku.is_empty() => &self.sku,
            _ => UNKNOWN_IDENTIFIER,
        }
    }

    /// Sale price to publish, if the offer is valid.
    ///
    /// An offer only applies when it is positive and strictly below the list
    /// price; anything else clears the sale price.
    #[must_use]
    pub fn sale_price(&self) -> Option<Decimal> {
        (self.offer_price > Decimal::ZERO && self.offer_price < self.list_price)
            .then_some(self.offer_price)
    }

    /// Storable stock quantity, never negative.
    #[must_use]
    pub fn stock_quantity(&self) -> u32 {
        clamp_stock(&self.stock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn priced(list: i64, offer: i64) -> ErpItem {
        ErpItem {
            list_price: Decimal::from(list),
            offer_price: Decimal::from(offer),
            ..ErpItem::default()
        }
    }

    #[test]
    fn sale_price_when_offer_below_list() {
        assert_eq!(priced(95_000, 85_000).sale_price(), Some(Decimal::from(85_000)));
    }

    #[test]
    fn no_sale_price_without_offer() {
        assert_eq!(priced(95_000, 0).sale_price(), None);
    }

    #[test]
    fn no_sale_price_when_offer_not_below_list() {
        assert_eq!(priced(100, 150).sale_price(), None);
        assert_eq!(priced(100, 100).sale_price(), None);
    }

    #[test]
    fn best_identifier_prefers_external_id() {
        let item = ErpItem {
            external_id: Some("ERP-1".to_string()),
            sku: "SKU-1".to_string(),
            ..ErpItem::default()
        };
        assert_eq!(item.best_identifier(), "ERP-1");
    }

    #[test]
    fn best_identifier_falls_back_to_sku_then_unknown() {
        let item = ErpItem {
            sku: "SKU-1".to_string(),
            ..ErpItem::default()
        };
        assert_eq!(item.best_identifier(), "SKU-1");

        let item = ErpItem {
            external_id: Some(String::new()),
            ..ErpItem::default()
        };
        assert_eq!(item.best_identifier(), UNKNOWN_IDENTIFIER);
    }

    #[test]
    fn default_item_is_active() {
        assert!(ErpItem::default().active);
        assert_eq!(ErpItem::default().stock_quantity(), 0);
    }

    #[test]
    fn category_path_from_levels() {
        assert_eq!(CategoryPath::from_levels(None, None), None);
        assert_eq!(
            CategoryPath::from_levels(Some("Redes".into()), Some(" ".into())),
            Some(CategoryPath {
                parent: "Redes".into(),
                child: None
            })
        );
        assert_eq!(
            CategoryPath::from_levels(Some("Redes".into()), Some("Cables".into())),
            Some(CategoryPath {
                parent: "Redes".into(),
                child: Some("Cables".into())
            })
        );
    }

    #[test]
    fn lone_subcategory_is_promoted() {
        assert_eq!(
            CategoryPath::from_levels(None, Some("Cables".into())),
            Some(CategoryPath {
                parent: "Cables".into(),
                child: None
            })
        );
    }
}
