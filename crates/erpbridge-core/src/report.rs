use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Every item was attempted; individual items may still have failed.
    Completed,
    /// The run never reached item processing.
    Error,
}

impl RunStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

/// Outcome of one sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRunReport {
    pub status: RunStatus,
    /// Items upserted successfully.
    pub processed: u32,
    /// Items that failed at the item boundary.
    pub errors: u32,
    pub created: u32,
    pub updated: u32,
    pub message: Option<String>,
    /// `"[<identifier>] <message>"`, in processing order.
    pub details: Vec<String>,
}

impl Default for SyncRunReport {
    fn default() -> Self {
        Self {
            status: RunStatus::Completed,
            processed: 0,
            errors: 0,
            created: 0,
            updated: 0,
            message: None,
            details: Vec::new(),
        }
    }
}

impl SyncRunReport {
    /// A run that stopped before processing any item.
    #[must_use]
    pub fn run_error(message: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Error,
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn record_created(&mut self) {
        self.processed += 1;
        self.created += 1;
    }

    pub fn record_updated(&mut self) {
        self.processed += 1;
        self.updated += 1;
    }

    pub fn record_item_error(&mut self, identifier: &str, message: impl std::fmt::Display) {
        self.errors += 1;
        self.details.push(format!("[{identifier}] {message}"));
    }

    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.processed + self.errors
    }
}
