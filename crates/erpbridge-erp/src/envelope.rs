//! Collapses the known payload shapes into one list of raw records.

use serde_json::Value;

use crate::types::RawCatalogPayload;

/// Returns `true` when an envelope status means "data follows".
///
/// Accepted: the number `200` (or the string `"200"`), the strings
/// `"success"` / `"ok"` in any case, and boolean `true`.
#[must_use]
pub fn is_success_status(status: &Value) -> bool {
    match status {
        Value::Number(n) => n.as_u64() == Some(200),
        Value::String(s) => {
            let s = s.trim();
            s == "200" || s.eq_ignore_ascii_case("success") || s.eq_ignore_ascii_case("ok")
        }
        Value::Bool(b) => *b,
        _ => false,
    }
}

/// Normalizes a payload into the ordered list of raw product records.
///
/// An envelope with a missing or non-success status, or without an array
/// under `data`, yields an empty list. The reason is logged at `warn`.
#[must_use]
pub fn normalize_payload(payload: RawCatalogPayload) -> Vec<Value> {
    match payload {
        RawCatalogPayload::Bare(items) => items,
        RawCatalogPayload::Envelope { status, data } => {
            let Some(status) = status else {
                tracing::warn!("ERP envelope has no status field; treating as empty");
                return Vec::new();
            };
            if !is_success_status(&status) {
                tracing::warn!(status = %status, "ERP envelope reports failure; treating as empty");
                return Vec::new();
            }
            match data {
                Some(Value::Array(items)) => items,
                Some(other) => {
                    tracing::warn!(
                        kind = json_kind(&other),
                        "ERP envelope data is not an array; treating as empty"
                    );
                    Vec::new()
                }
                None => {
                    tracing::warn!("ERP envelope has no data field; treating as empty");
                    Vec::new()
                }
            }
        }
        RawCatalogPayload::Empty => Vec::new(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(status: Value, data: Value) -> RawCatalogPayload {
        RawCatalogPayload::from_value(json!({ "status": status, "data": data }))
    }

    #[test]
    fn success_sentinels() {
        assert!(is_success_status(&json!(200)));
        assert!(is_success_status(&json!("success")));
        assert!(is_success_status(&json!("OK")));
        assert!(is_success_status(&json!(true)));
        assert!(!is_success_status(&json!(500)));
        assert!(!is_success_status(&json!("error")));
        assert!(!is_success_status(&json!(false)));
        assert!(!is_success_status(&Value::Null));
    }

    #[test]
    fn bare_list_passes_through() {
        let items = normalize_payload(RawCatalogPayload::Bare(vec![json!({"sku": "A"})]));
        assert_eq!(items, vec![json!({"sku": "A"})]);
    }

    #[test]
    fn successful_envelope_unwraps_data() {
        let items = normalize_payload(RawCatalogPayload::from_value(
            json!({"Estado": 200, "Data": [{"IdProducto": 1}, {"IdProducto": 2}]}),
        ));
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn failed_envelope_is_empty() {
        assert!(normalize_payload(envelope(json!("error"), json!([{"sku": "A"}]))).is_empty());
    }

    #[test]
    fn envelope_without_data_is_empty() {
        let payload = RawCatalogPayload::from_value(json!({"status": "success"}));
        assert!(normalize_payload(payload).is_empty());
    }

    #[test]
    fn envelope_without_status_is_empty() {
        let payload = RawCatalogPayload::from_value(json!({"data": [{"sku": "A"}]}));
        assert!(normalize_payload(payload).is_empty());
    }

    #[test]
    fn envelope_with_object_data_is_empty() {
        assert!(normalize_payload(envelope(json!(200), json!({"sku": "A"}))).is_empty());
    }
}
