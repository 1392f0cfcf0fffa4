// src/api.rs
//! HTTP surface: one discovery endpoint plus health.
//!
//! A run that finds nothing still answers 200 with an empty list and the
//! per-source summary; the only 5xx path is the store itself being
//! unreachable before discovery starts.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::discovery::change::{detect_new, fingerprint};
use crate::discovery::orchestrator::fetch_discovery_from_sources;
use crate::discovery::score::Scorer;
use crate::discovery::types::{DiscoveryFilters, Opportunity, SourceAdapter, SourceSummary};
use crate::store::{save_batch, OpportunityStore};

#[derive(Clone)]
pub struct AppState {
    pub adapters: Arc<Vec<Box<dyn SourceAdapter>>>,
    pub scorer: Arc<Scorer>,
    pub store: Arc<dyn OpportunityStore>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/discover", post(discover))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Serialize)]
struct DiscoverResp {
    opportunities: Vec<Opportunity>,
    source_summary: Vec<SourceSummary>,
    new_count: usize,
    persisted: usize,
    persist_failed: usize,
}

#[derive(serde::Serialize)]
struct ErrorResp {
    error: String,
}

async fn discover(
    State(state): State<AppState>,
    Json(filters): Json<DiscoveryFilters>,
) -> Result<Json<DiscoverResp>, (StatusCode, Json<ErrorResp>)> {
    // Previous fingerprints come from the store; if the store itself is down
    // the whole operation fails here, before any scraping starts.
    let previous = state
        .store
        .filter(&|_: &Opportunity| true)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResp {
                    error: format!("store unavailable: {e:#}"),
                }),
            )
        })?;
    let previous_fps: Vec<String> = previous.iter().map(fingerprint).collect();

    let outcome = fetch_discovery_from_sources(&state.adapters, &filters, &state.scorer).await;

    let fresh = detect_new(&previous_fps, &outcome.opportunities);
    let batch = save_batch(state.store.as_ref(), &fresh).await;

    Ok(Json(DiscoverResp {
        new_count: fresh.len(),
        persisted: batch.succeeded.len(),
        persist_failed: batch.failed.len(),
        opportunities: outcome.opportunities,
        source_summary: outcome.source_summary,
    }))
}
