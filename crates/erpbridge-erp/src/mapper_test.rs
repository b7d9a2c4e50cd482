use super::*;
use serde_json::json;

// -----------------------------------------------------------------------
// Schema detection
// -----------------------------------------------------------------------

#[test]
fn any_v2_key_selects_v2() {
    let item = map_item(&json!({"Nombre": "Switch 8p", "sku": "ignored"}));
    assert_eq!(item.schema, SchemaVersion::V2);
    assert_eq!(item.name, "Switch 8p");
    assert_eq!(item.sku, "", "legacy keys are not read from a V2 record");
}

#[test]
fn lowercase_keys_select_legacy() {
    let item = map_item(&json!({"sku": "SW-8", "name": "Switch 8p"}));
    assert_eq!(item.schema, SchemaVersion::Legacy);
    assert_eq!(item.sku, "SW-8");
}

#[test]
fn non_object_maps_to_empty_item() {
    for raw in [json!(null), json!("text"), json!([1, 2]), json!(42)] {
        let item = map_item(&raw);
        assert_eq!(item, ErpItem::default(), "raw: {raw}");
        assert!(item.external_id.is_none());
    }
}

// -----------------------------------------------------------------------
// V2 records
// -----------------------------------------------------------------------

fn v2_record() -> Value {
    json!({
        "IdProducto": 1001,
        "Sku": "UTP-CAT6-305",
        "Nombre": "Cable UTP Cat6 305m",
        "Descripcion": "Bobina de cable",
        "PrecioLista": 95000,
        "PrecioOferta": "85000",
        "Stock": 12.7,
        "Categoria": "Redes",
        "Subcategoria": "Cables",
        "Marca": "Dixon",
        "Atributos": "CAT6/GRIS/300M",
        "ImagenPrincipal": "utp-cat6.jpg",
        "Imagenes": ["utp-cat6.jpg", "https://cdn.example.com/utp-side.png"],
        "Activo": "S"
    })
}

#[test]
fn v2_record_maps_every_field() {
    let item = map_item(&v2_record());
    assert_eq!(item.external_id.as_deref(), Some("1001"));
    assert_eq!(item.sku, "UTP-CAT6-305");
    assert_eq!(item.name, "Cable UTP Cat6 305m");
    assert_eq!(item.description, "Bobina de cable");
    assert_eq!(item.list_price, Decimal::from(95_000));
    assert_eq!(item.offer_price, Decimal::from(85_000));
    assert_eq!(item.stock_quantity(), 12);
    assert_eq!(
        item.category,
        Some(CategoryPath {
            parent: "Redes".to_string(),
            child: Some("Cables".to_string()),
        })
    );
    assert_eq!(item.brand.as_deref(), Some("Dixon"));
    assert_eq!(item.specifications, vec!["CAT6", "GRIS", "300M"]);
    assert!(item.active);
}

#[test]
fn v2_primary_image_comes_first_without_duplicates() {
    let item = map_item(&v2_record());
    assert_eq!(
        item.image_refs,
        vec!["utp-cat6.jpg", "https://cdn.example.com/utp-side.png"]
    );
}

#[test]
fn v2_comma_separated_images() {
    let item = map_item(&json!({"IdProducto": "7", "Imagenes": "a.jpg, b.jpg,,c.jpg "}));
    assert_eq!(item.image_refs, vec!["a.jpg", "b.jpg", "c.jpg"]);
}

#[test]
fn v2_sale_price_follows_offer_rule() {
    let item = map_item(&v2_record());
    assert_eq!(item.sale_price(), Some(Decimal::from(85_000)));

    let item = map_item(&json!({"IdProducto": 1, "PrecioLista": 95000, "PrecioOferta": 0}));
    assert_eq!(item.sale_price(), None);

    let item = map_item(&json!({"IdProducto": 1, "PrecioLista": 100, "PrecioOferta": 150}));
    assert_eq!(item.sale_price(), None);
}

#[test]
fn v2_missing_fields_use_defaults() {
    let item = map_item(&json!({"IdProducto": "X-1"}));
    assert_eq!(item.sku, "");
    assert_eq!(item.name, "");
    assert_eq!(item.list_price, Decimal::ZERO);
    assert_eq!(item.offer_price, Decimal::ZERO);
    assert_eq!(item.stock, RawStock::Missing);
    assert!(item.category.is_none());
    assert!(item.brand.is_none());
    assert!(item.specifications.is_empty());
    assert!(item.image_refs.is_empty());
    assert!(item.active);
}

#[test]
fn v2_inactive_flag_variants() {
    for flag in [json!(false), json!(0), json!("N"), json!("false")] {
        let item = map_item(&json!({"IdProducto": 1, "Activo": flag}));
        assert!(!item.active, "flag: {flag}");
    }
}

#[test]
fn blank_identifier_is_absent() {
    let item = map_item(&json!({"IdProducto": "  ", "Sku": "ONLY-SKU"}));
    assert!(item.external_id.is_none());
    assert_eq!(item.best_identifier(), "ONLY-SKU");
}

// -----------------------------------------------------------------------
// Legacy records
// -----------------------------------------------------------------------

#[test]
fn legacy_record_maps_nested_fields() {
    let item = map_item(&json!({
        "id": "L-55",
        "sku": "CAM-IP-4MP",
        "name": "Cámara IP 4MP",
        "description": "Domo exterior",
        "prices": {"web_price": "129990", "offer_price": 119990},
        "stock": {"quantity": -3},
        "category": {"name": "Seguridad"},
        "subcategory": {"name": "Cámaras"},
        "attributes": [
            {"name": "Marca", "value": "Hikvision"},
            {"name": "Resolución", "value": "4MP"},
            {"name": "Montaje", "value": "Domo / Exterior"}
        ],
        "image_filename": "cam-ip.jpg",
        "active": true
    }));

    assert_eq!(item.external_id.as_deref(), Some("L-55"));
    assert_eq!(item.list_price, Decimal::from(129_990));
    assert_eq!(item.offer_price, Decimal::from(119_990));
    assert_eq!(item.stock_quantity(), 0);
    assert_eq!(item.category.as_ref().map(|c| c.parent.as_str()), Some("Seguridad"));
    assert_eq!(
        item.category.as_ref().and_then(|c| c.child.as_deref()),
        Some("Cámaras")
    );
    assert_eq!(item.brand.as_deref(), Some("Hikvision"));
    assert_eq!(item.specifications, vec!["4MP", "Domo", "Exterior"]);
    assert_eq!(item.image_refs, vec!["cam-ip.jpg"]);
}

#[test]
fn legacy_record_without_id_has_no_external_id() {
    let item = map_item(&json!({"sku": "OLD-1", "name": "Legacy"}));
    assert!(item.external_id.is_none());
    assert_eq!(item.best_identifier(), "OLD-1");
}

#[test]
fn legacy_scalar_stock_is_accepted() {
    let item = map_item(&json!({"sku": "S", "stock": "8"}));
    assert_eq!(item.stock_quantity(), 8);
}

#[test]
fn legacy_brand_field_wins_over_brand_attribute() {
    let item = map_item(&json!({
        "sku": "S",
        "brand": "Ubiquiti",
        "attributes": [{"name": "brand", "value": "Other"}]
    }));
    assert_eq!(item.brand.as_deref(), Some("Ubiquiti"));
    assert!(item.specifications.is_empty());
}

// -----------------------------------------------------------------------
// Field helpers
// -----------------------------------------------------------------------

#[test]
fn specification_split_trims_and_drops_empty_tokens() {
    assert_eq!(
        specification_list(Some(&json!(" CAT6 / /GRIS//300M/ "))),
        vec!["CAT6", "GRIS", "300M"]
    );
    assert!(specification_list(Some(&json!(""))).is_empty());
    assert!(specification_list(None).is_empty());
}

#[test]
fn price_parsing_accepts_common_formats() {
    let p = |v: Value| parse_price(Some(&v));
    assert_eq!(p(json!(95000)), Decimal::from(95_000));
    assert_eq!(p(json!("95000")), Decimal::from(95_000));
    assert_eq!(p(json!("1234,5")), Decimal::from_str("1234.5").unwrap());
    assert_eq!(p(json!("$ 1.234,50")), Decimal::from_str("1234.5").unwrap());
    assert_eq!(p(json!("1,234.50")), Decimal::from_str("1234.5").unwrap());
    assert_eq!(p(json!(19.99)), Decimal::from_str("19.99").unwrap());
}

#[test]
fn lone_separator_before_three_digits_is_grouping() {
    let p = |v: Value| parse_price(Some(&v));
    assert_eq!(p(json!("95.000")), Decimal::from(95_000));
    assert_eq!(p(json!("$95.000")), Decimal::from(95_000));
    assert_eq!(p(json!("$1.249.990")), Decimal::from(1_249_990));
    assert_eq!(p(json!("12,500")), Decimal::from(12_500));
    assert_eq!(p(json!("19.99")), Decimal::from_str("19.99").unwrap());
    assert_eq!(p(json!("0.500")), Decimal::from_str("0.5").unwrap());
    assert_eq!(p(json!("1234.567")), Decimal::from_str("1234.567").unwrap());
    assert_eq!(p(json!("1.2.3")), Decimal::ZERO);
}

#[test]
fn price_parsing_rejects_invalid_and_negative() {
    let p = |v: Value| parse_price(Some(&v));
    assert_eq!(p(json!("abc")), Decimal::ZERO);
    assert_eq!(p(json!(-10)), Decimal::ZERO);
    assert_eq!(p(json!("-10")), Decimal::ZERO);
    assert_eq!(p(json!(null)), Decimal::ZERO);
    assert_eq!(p(json!({"amount": 5})), Decimal::ZERO);
    assert_eq!(parse_price(None), Decimal::ZERO);
}
