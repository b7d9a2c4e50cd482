use std::path::PathBuf;

use thiserror::Error;

/// Errors raised inside the ERP clients.
///
/// These never reach the sync orchestrator: the [`crate::ErpClient`] impls
/// log them and fall back to an empty result. They are exposed through the
/// REST client's `try_*` methods for callers that need the reason.
#[derive(Debug, Error)]
pub enum ErpError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The ERP answered with a non-2xx status.
    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid ERP base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// A fixture file exists but could not be read.
    #[error("failed to read fixture {path}: {source}")]
    Fixture {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
