// src/metrics.rs
//! Prometheus wiring: recorder install + the `/metrics` route.

use axum::{routing::get, Router};
use metrics::gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder, register the discovery series, and
    /// expose a static gauge for the configured fetch-cache TTL.
    pub fn init(cache_ttl_ms: u64) -> Self {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .expect("prometheus: install recorder");

        crate::discovery::ensure_metrics_described();
        gauge!("discovery_fetch_cache_ttl_ms").set(cache_ttl_ms as f64);

        Self { handle }
    }

    /// Router exposing `/metrics` in Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
