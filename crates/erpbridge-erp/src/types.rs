use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Product payload exactly as the ERP returned it, before normalization.
///
/// Two wire shapes are known: a bare JSON array of records, and an envelope
/// object carrying a status sentinel plus the array under `data`. Both the
/// English and Spanish key spellings are accepted for the envelope.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawCatalogPayload {
    Bare(Vec<Value>),
    Envelope {
        status: Option<Value>,
        data: Option<Value>,
    },
    /// Anything else, including transport failures absorbed by a client.
    #[default]
    Empty,
}

impl RawCatalogPayload {
    /// Classifies an arbitrary JSON body. Never fails.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::Bare(items),
            Value::Object(mut map) => {
                let status = map.remove("status").or_else(|| map.remove("Estado"));
                let data = map.remove("data").or_else(|| map.remove("Data"));
                Self::Envelope { status, data }
            }
            _ => Self::Empty,
        }
    }
}

/// Reply to [`crate::ErpClient::submit_order`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    #[serde(default = "default_order_status", alias = "Estado")]
    pub status: String,
    #[serde(default, alias = "erp_id", alias = "IdPedido")]
    pub external_order_id: Option<String>,
    #[serde(default, alias = "Mensaje")]
    pub message: Option<String>,
}

fn default_order_status() -> String {
    "error".to_string()
}

impl OrderReceipt {
    /// Receipt returned when the order could not be handed to the ERP.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            external_order_id: None,
            message: Some(message.into()),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success") || self.status.eq_ignore_ascii_case("ok")
    }
}

/// ERP customer master record, looked up by tax id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    #[serde(default, alias = "Rut", alias = "rut")]
    pub tax_id: String,
    #[serde(default, alias = "Nombre", alias = "RazonSocial")]
    pub name: String,
    #[serde(default, alias = "Email")]
    pub email: Option<String>,
    #[serde(default, alias = "Telefono")]
    pub phone: Option<String>,
    #[serde(default, alias = "Direccion")]
    pub address: Option<String>,
    /// Fields this crate does not interpret, kept for pass-through.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}
