//! Catalog synchronization engine: identity resolution, term and image
//! resolution, the per-run orchestrator and the live cart stock check.

pub mod assets;
pub mod cart;
pub mod identity;
pub mod memory;
pub mod orchestrator;
pub mod terms;

pub use assets::{normalized_title, AssetImporter, ImageSync, ImportedImages};
pub use cart::{check_cart, CartLine};
pub use identity::{resolve, IdentityMatch, MatchedBy};
pub use memory::{InMemoryAssets, InMemoryCatalog};
pub use orchestrator::{ItemError, ItemOutcome, SyncOrchestrator, SyncPhase};
pub use terms::{ResolvedAttributes, TermResolver};
