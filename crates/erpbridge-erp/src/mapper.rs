//! Translation from raw, versioned ERP records to [`ErpItem`].
//!
//! Every extraction has a default: empty string, zero, empty list, `None`,
//! and `true` for the active flag. Mapping never fails; a record that is not
//! a JSON object maps to an empty item with no identifier.

use std::str::FromStr;

use erpbridge_core::{CategoryPath, ErpItem, RawStock, SchemaVersion};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

/// Keys that only appear in the current (V2) record layout. Any one of them
/// marks a record as V2.
const V2_KEYS: &[&str] = &[
    "IdProducto",
    "Sku",
    "Nombre",
    "Descripcion",
    "PrecioLista",
    "PrecioOferta",
    "Stock",
    "Categoria",
    "Subcategoria",
    "Marca",
    "Atributos",
    "Imagenes",
    "ImagenPrincipal",
    "Activo",
];

/// Detects which layout a record uses.
#[must_use]
pub fn detect_schema(record: &Map<String, Value>) -> SchemaVersion {
    if V2_KEYS.iter().any(|k| record.contains_key(*k)) {
        SchemaVersion::V2
    } else {
        SchemaVersion::Legacy
    }
}

/// Maps one raw record to its canonical form.
#[must_use]
pub fn map_item(raw: &Value) -> ErpItem {
    let Some(record) = raw.as_object() else {
        return ErpItem::default();
    };
    match detect_schema(record) {
        SchemaVersion::V2 => map_v2(record),
        SchemaVersion::Legacy => map_legacy(record),
    }
}

fn map_v2(r: &Map<String, Value>) -> ErpItem {
    let mut image_refs = Vec::new();
    if let Some(primary) = text(r.get("ImagenPrincipal")) {
        image_refs.push(primary);
    }
    for image in image_list(r.get("Imagenes")) {
        if !image_refs.contains(&image) {
            image_refs.push(image);
        }
    }

    ErpItem {
        external_id: text(r.get("IdProducto")),
        sku: text(r.get("Sku")).unwrap_or_default(),
        name: text(r.get("Nombre")).unwrap_or_default(),
        description: text(r.get("Descripcion")).unwrap_or_default(),
        list_price: parse_price(r.get("PrecioLista")),
        offer_price: parse_price(r.get("PrecioOferta")),
        stock: RawStock::from_json(r.get("Stock")),
        category: CategoryPath::from_levels(
            term_name(r.get("Categoria")),
            term_name(r.get("Subcategoria")),
        ),
        brand: term_name(r.get("Marca")),
        specifications: specification_list(r.get("Atributos")),
        image_refs,
        active: parse_flag(r.get("Activo")),
        schema: SchemaVersion::V2,
    }
}

fn map_legacy(r: &Map<String, Value>) -> ErpItem {
    let prices = r.get("prices");
    let stock = match r.get("stock") {
        Some(Value::Object(s)) => s.get("quantity"),
        other => other,
    };

    let mut brand = term_name(r.get("brand"));
    let mut specifications = Vec::new();
    if let Some(Value::Array(attributes)) = r.get("attributes") {
        for attr in attributes {
            let name = text(attr.get("name")).unwrap_or_default();
            let value = attr.get("value");
            if name.eq_ignore_ascii_case("marca") || name.eq_ignore_ascii_case("brand") {
                if brand.is_none() {
                    brand = text(value);
                }
            } else {
                specifications.extend(specification_list(value));
            }
        }
    }

    let mut image_refs = Vec::new();
    if let Some(filename) = text(r.get("image_filename")) {
        image_refs.push(filename);
    }
    for image in image_list(r.get("images")) {
        if !image_refs.contains(&image) {
            image_refs.push(image);
        }
    }

    ErpItem {
        external_id: text(r.get("id")),
        sku: text(r.get("sku")).unwrap_or_default(),
        name: text(r.get("name")).unwrap_or_default(),
        description: text(r.get("description")).unwrap_or_default(),
        list_price: parse_price(prices.and_then(|p| p.get("web_price"))),
        offer_price: parse_price(prices.and_then(|p| p.get("offer_price"))),
        stock: RawStock::from_json(stock),
        category: CategoryPath::from_levels(
            term_name(r.get("category")),
            term_name(r.get("subcategory")),
        ),
        brand,
        specifications,
        image_refs,
        active: parse_flag(r.get("active")),
        schema: SchemaVersion::Legacy,
    }
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

/// Trimmed, non-empty text from a string or number node.
fn text(value: Option<&Value>) -> Option<String> {
    let s = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

/// A term name given either as a plain string or as `{ "name": .. }` /
/// `{ "Nombre": .. }`.
fn term_name(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Object(obj) => text(obj.get("name")).or_else(|| text(obj.get("Nombre"))),
        other => text(Some(other)),
    }
}

/// Parses a price from a number or numeric string.
///
/// Accepts a leading `$` and either `.` or `,` as the decimal separator. When
/// both appear, the last one is the decimal separator. When only one kind
/// appears and it splits the digits into well-formed groups of three
/// (`95.000`, `1.249.990`, `12,500`), it is read as thousands grouping, as
/// peso amounts carry no decimals. Non-numeric or negative input maps to zero.
#[must_use]
pub fn parse_price(value: Option<&Value>) -> Decimal {
    let parsed = match value {
        Some(Value::Number(n)) => {
            let s = n.to_string();
            Decimal::from_str(&s)
                .or_else(|_| Decimal::from_scientific(&s))
                .ok()
        }
        Some(Value::String(s)) => parse_price_text(s),
        _ => None,
    };
    match parsed {
        Some(d) if d > Decimal::ZERO => d.normalize(),
        _ => Decimal::ZERO,
    }
}

fn parse_price_text(raw: &str) -> Option<Decimal> {
    let s: String = raw
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if s.is_empty() {
        return None;
    }
    let last_dot = s.rfind('.');
    let last_comma = s.rfind(',');
    let canonical = match (last_dot, last_comma) {
        (Some(d), Some(c)) if c > d => s.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => s.replace(',', ""),
        (Some(_), None) if is_thousands_grouped(&s, '.') => s.replace('.', ""),
        (None, Some(_)) if is_thousands_grouped(&s, ',') => s.replace(',', ""),
        (None, Some(_)) => s.replace(',', "."),
        _ => s,
    };
    Decimal::from_str(&canonical).ok()
}

/// `1.234`, `95.000` and `1.249.990` are grouped; `19.99`, `0.500` and
/// `1234.567` are not.
fn is_thousands_grouped(s: &str, sep: char) -> bool {
    let mut groups = s.split(sep);
    let lead = groups.next().unwrap_or_default();
    let lead_ok = (1..=3).contains(&lead.len())
        && lead.bytes().all(|b| b.is_ascii_digit())
        && !lead.starts_with('0');
    lead_ok && groups.all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit()))
}

/// Splits a slash-delimited specification string into trimmed, non-empty
/// tokens. Arrays of strings are accepted and each element is split the same
/// way.
#[must_use]
pub fn specification_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => split_tokens(s, '/'),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| text(Some(v)))
            .flat_map(|s| split_tokens(&s, '/'))
            .collect(),
        Some(Value::Number(n)) => vec![n.to_string()],
        _ => Vec::new(),
    }
}

/// Image references from an array or a comma-separated string.
fn image_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => split_tokens(s, ','),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| match v {
                Value::Object(obj) => text(obj.get("url")).or_else(|| text(obj.get("src"))),
                other => text(Some(other)),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn split_tokens(s: &str, sep: char) -> Vec<String> {
    s.split(sep)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Active flag from a bool, number or string. Missing or unrecognized values
/// default to `true`.
fn parse_flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_none_or(|f| f != 0.0),
        Some(Value::String(s)) => !matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "0" | "false" | "n" | "no" | "inactivo" | "inactive"
        ),
        _ => true,
    }
}

#[cfg(test)]
#[path = "mapper_test.rs"]
mod tests;
