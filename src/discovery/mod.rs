// src/discovery/mod.rs
pub mod adapters;
pub mod cache;
pub mod change;
pub mod normalize;
pub mod orchestrator;
pub mod rank;
pub mod score;
pub mod types;

use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;

pub use change::{detect_new, fingerprint};
pub use orchestrator::fetch_discovery_from_sources;
pub use rank::dedupe_and_rank;
pub use score::Scorer;
pub use types::{DiscoveryFilters, DiscoveryOutcome, Opportunity, RawRecord, SourceAdapter};

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "discovery_records_total",
            "Raw records fetched from all sources."
        );
        describe_counter!(
            "discovery_kept_total",
            "Opportunities surviving dedup/ranking."
        );
        describe_counter!(
            "discovery_dedup_total",
            "Records collapsed as duplicates of a higher-scoring variant."
        );
        describe_counter!(
            "discovery_source_errors_total",
            "Adapter fetch/parse failures degraded to empty results."
        );
        describe_histogram!("discovery_fetch_ms", "Per-adapter fetch time in milliseconds.");
        describe_gauge!(
            "discovery_last_run_ts",
            "Unix ts when a discovery run last completed."
        );
    });
}
