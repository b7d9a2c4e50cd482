use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stock quantity exactly as the ERP sent it.
///
/// ERP revisions have shipped stock as integers, floats, numeric strings and
/// free text; the raw form is kept until [`clamp_stock`] turns it into a
/// storable quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum RawStock {
    Number(f64),
    Text(String),
    #[default]
    Missing,
}

impl RawStock {
    /// Reads a stock value out of an arbitrary JSON node. `null`, objects,
    /// arrays and booleans are all treated as missing.
    #[must_use]
    pub fn from_json(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Number(n)) => n.as_f64().map_or(Self::Missing, Self::Number),
            Some(Value::String(s)) => Self::Text(s.clone()),
            _ => Self::Missing,
        }
    }
}

/// Clamps a raw stock value to `max(0, floor(raw))`.
///
/// Non-numeric text, missing values, NaN and infinities all clamp to `0`.
/// Numeric strings are accepted with either `.` or `,` as the decimal
/// separator. Values beyond `u32::MAX` saturate.
#[must_use]
pub fn clamp_stock(raw: &RawStock) -> u32 {
    let value = match raw {
        RawStock::Number(n) => *n,
        RawStock::Text(s) => match s.trim().replace(',', ".").parse::<f64>() {
            Ok(n) => n,
            Err(_) => return 0,
        },
        RawStock::Missing => return 0,
    };

    if !value.is_finite() || value <= 0.0 {
        return 0;
    }

    let floored = value.floor();
    if floored >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let qty = floored as u32;
        qty
    }
}

/// Live stock answer from the ERP for one SKU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StockSignal {
    /// May be zero or negative when the ERP is oversold.
    #[serde(default)]
    pub available_qty: i64,
    #[serde(default)]
    pub allow_backorder: bool,
}

/// Returns `true` when a cart line can be fulfilled: either enough units are
/// available, or the ERP accepts backorders for the product.
#[must_use]
pub fn cart_line_is_sufficient(available: i64, requested: u32, allow_backorder: bool) -> bool {
    allow_backorder || available >= i64::from(requested)
}

/// A cart line that failed the live stock check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error(
    "The product \"{product_name}\" does not have enough stock and cannot be backordered. Available stock: {available_qty}."
)]
pub struct InsufficientStock {
    pub product_name: String,
    pub sku: String,
    pub requested_qty: u32,
    /// Quantity the ERP reported at the time of the check.
    pub available_qty: i64,
}

/// Evaluates one cart line against a live [`StockSignal`].
///
/// # Errors
///
/// Returns [`InsufficientStock`] carrying the user-facing notice when the line
/// cannot be fulfilled.
pub fn check_cart_line(
    product_name: &str,
    sku: &str,
    signal: &StockSignal,
    requested: u32,
) -> Result<(), InsufficientStock> {
    if cart_line_is_sufficient(signal.available_qty, requested, signal.allow_backorder) {
        Ok(())
    } else {
        Err(InsufficientStock {
            product_name: product_name.to_string(),
            sku: sku.to_string(),
            requested_qty: requested,
            available_qty: signal.available_qty,
        })
    }
}

/// Storefront availability class derived from a live stock signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Availability {
    InStock,
    AvailableOnBackorder,
    OutOfStock,
}

impl Availability {
    #[must_use]
    pub fn from_signal(signal: &StockSignal) -> Self {
        if signal.available_qty > 0 {
            Self::InStock
        } else if signal.allow_backorder {
            Self::AvailableOnBackorder
        } else {
            Self::OutOfStock
        }
    }

    /// Shopper-facing label, in the storefront's language.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::InStock => "Disponible",
            Self::AvailableOnBackorder => "Disponible para reserva",
            Self::OutOfStock => "Agotado",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clamp_negative_is_zero() {
        assert_eq!(clamp_stock(&RawStock::Number(-5.0)), 0);
    }

    #[test]
    fn clamp_floors_fractions() {
        assert_eq!(clamp_stock(&RawStock::Number(3.9)), 3);
        assert_eq!(clamp_stock(&RawStock::Number(0.99)), 0);
    }

    #[test]
    fn clamp_non_numeric_text_is_zero() {
        assert_eq!(clamp_stock(&RawStock::Text("abc".to_string())), 0);
        assert_eq!(clamp_stock(&RawStock::Missing), 0);
    }

    #[test]
    fn clamp_numeric_text() {
        assert_eq!(clamp_stock(&RawStock::Text(" 12 ".to_string())), 12);
        assert_eq!(clamp_stock(&RawStock::Text("7,8".to_string())), 7);
        assert_eq!(clamp_stock(&RawStock::Text("-2".to_string())), 0);
    }

    #[test]
    fn clamp_non_finite_and_huge_values() {
        assert_eq!(clamp_stock(&RawStock::Number(f64::NAN)), 0);
        assert_eq!(clamp_stock(&RawStock::Number(f64::INFINITY)), 0);
        assert_eq!(clamp_stock(&RawStock::Number(1e12)), u32::MAX);
    }

    #[test]
    fn raw_stock_from_json_variants() {
        assert_eq!(
            RawStock::from_json(Some(&json!(4))),
            RawStock::Number(4.0)
        );
        assert_eq!(
            RawStock::from_json(Some(&json!("9"))),
            RawStock::Text("9".to_string())
        );
        assert_eq!(RawStock::from_json(Some(&json!(null))), RawStock::Missing);
        assert_eq!(RawStock::from_json(Some(&json!(true))), RawStock::Missing);
        assert_eq!(RawStock::from_json(None), RawStock::Missing);
    }

    #[test]
    fn backorder_makes_empty_stock_sufficient() {
        assert!(cart_line_is_sufficient(0, 1, true));
        assert!(!cart_line_is_sufficient(0, 1, false));
    }

    #[test]
    fn exact_stock_is_sufficient() {
        assert!(cart_line_is_sufficient(5, 5, false));
        assert!(!cart_line_is_sufficient(4, 5, false));
        assert!(!cart_line_is_sufficient(-3, 1, false));
    }

    #[test]
    fn check_cart_line_notice_names_product_and_quantity() {
        let signal = StockSignal {
            available_qty: 2,
            allow_backorder: false,
        };
        let err = check_cart_line("Cable UTP Cat6", "UTP-6", &signal, 3).unwrap_err();
        assert_eq!(err.available_qty, 2);
        assert_eq!(err.requested_qty, 3);
        let notice = err.to_string();
        assert!(notice.contains("\"Cable UTP Cat6\""), "notice: {notice}");
        assert!(notice.contains("Available stock: 2."), "notice: {notice}");
    }

    #[test]
    fn check_cart_line_passes_with_backorder() {
        let signal = StockSignal {
            available_qty: 0,
            allow_backorder: true,
        };
        assert!(check_cart_line("Switch", "SW-1", &signal, 10).is_ok());
    }

    #[test]
    fn stock_signal_defaults_missing_fields() {
        let signal: StockSignal = serde_json::from_value(json!({})).unwrap();
        assert_eq!(signal, StockSignal::default());
        let signal: StockSignal =
            serde_json::from_value(json!({"available_qty": 3, "allow_backorder": true})).unwrap();
        assert_eq!(signal.available_qty, 3);
        assert!(signal.allow_backorder);
    }

    #[test]
    fn availability_classes() {
        let s = |qty, backorder| StockSignal {
            available_qty: qty,
            allow_backorder: backorder,
        };
        assert_eq!(Availability::from_signal(&s(4, false)), Availability::InStock);
        assert_eq!(
            Availability::from_signal(&s(0, true)),
            Availability::AvailableOnBackorder
        );
        assert_eq!(
            Availability::from_signal(&s(-1, false)),
            Availability::OutOfStock
        );
        assert_eq!(
            serde_json::to_value(Availability::AvailableOnBackorder).unwrap(),
            json!("available-on-backorder")
        );
        assert_eq!(Availability::OutOfStock.label(), "Agotado");
    }
}
