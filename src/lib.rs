// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod config;
pub mod discovery;
pub mod keywords;
pub mod metrics;
pub mod source_tiers;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::config::DiscoveryConfig;
pub use crate::discovery::{
    detect_new, fingerprint, DiscoveryFilters, DiscoveryOutcome, Opportunity, RawRecord, Scorer,
    SourceAdapter,
};
pub use crate::keywords::WorkTypeKeywords;
pub use crate::source_tiers::SourceTiers;
pub use crate::store::{save_batch, BatchOutcome, InMemoryStore, OpportunityStore};
