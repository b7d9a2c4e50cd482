//! ERP side of the bridge: the client capability set, payload envelope
//! normalization and the versioned field mapper.

pub mod client;
pub mod envelope;
pub mod error;
pub mod mapper;
pub(crate) mod retry;
pub mod types;

pub use client::{build_erp_client, EndpointPaths, ErpClient, FixtureErpClient, RestErpClient};
pub use envelope::{is_success_status, normalize_payload};
pub use error::ErpError;
pub use mapper::{detect_schema, map_item};
pub use types::{CustomerRecord, OrderReceipt, RawCatalogPayload};
