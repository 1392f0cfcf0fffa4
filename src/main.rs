//! Bid Scout — Binary Entrypoint
//! Boots the Axum HTTP server, wiring the source adapters, scorer, store,
//! and metrics into the discovery router.

use std::sync::Arc;

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bid_scout::api::{create_router, AppState};
use bid_scout::config::DiscoveryConfig;
use bid_scout::discovery::adapters::build_adapters;
use bid_scout::discovery::score::Scorer;
use bid_scout::keywords::WorkTypeKeywords;
use bid_scout::metrics::Metrics;
use bid_scout::source_tiers::SourceTiers;
use bid_scout::store::InMemoryStore;

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bid_scout=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = DiscoveryConfig::load_default().expect("Failed to load discovery config");

    let keywords = Arc::new(match &cfg.keywords_path {
        Some(p) => WorkTypeKeywords::load_from_file(p),
        None => WorkTypeKeywords::default(),
    });
    let tiers = match &cfg.source_tiers_path {
        Some(p) => SourceTiers::load_from_file(p),
        None => SourceTiers::default(),
    };

    let adapters = build_adapters(&cfg, keywords.clone()).expect("Failed to build source adapters");

    let metrics = Metrics::init(cfg.cache_ttl().as_millis() as u64);

    let state = AppState {
        adapters: Arc::new(adapters),
        scorer: Arc::new(Scorer::new((*keywords).clone(), tiers)),
        store: Arc::new(InMemoryStore::new()),
    };

    let router = create_router(state).merge(metrics.router());

    Ok(router.into())
}
