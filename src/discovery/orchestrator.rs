// src/discovery/orchestrator.rs
//! Fan-out over the source call plan and drive of the full pipeline.
//!
//! All planned adapters are invoked concurrently and awaited jointly; a
//! failing or hung-then-timed-out adapter degrades to an empty per-source
//! result with the error recorded in its summary entry. Zero opportunities
//! with populated summary errors is still a successful run — callers tell
//! "nothing matched" from "all sources down" by reading the summary.

use futures::future::join_all;
use metrics::{counter, gauge, histogram};
use std::time::Instant;

use crate::discovery::normalize::normalize;
use crate::discovery::rank::dedupe_and_rank;
use crate::discovery::score::Scorer;
use crate::discovery::types::{
    DiscoveryFilters, DiscoveryOutcome, Opportunity, SourceAdapter, SourceRequest, SourceSummary,
};

/// Adapter keys only planned for a specific state filter.
const REGION_GATED: &[(&str, &str)] = &[("ca_county", "california")];

/// Select the adapters to invoke for this run: everything in the configured
/// set except region-gated adapters whose state does not match.
fn call_plan<'a>(
    adapters: &'a [Box<dyn SourceAdapter>],
    filters: &DiscoveryFilters,
) -> Vec<&'a dyn SourceAdapter> {
    let state = filters
        .state
        .as_deref()
        .unwrap_or("")
        .trim()
        .to_lowercase();

    adapters
        .iter()
        .map(AsRef::as_ref)
        .filter(|a| match REGION_GATED.iter().find(|(k, _)| *k == a.key()) {
            Some((_, wanted_state)) => state == *wanted_state,
            None => true,
        })
        .collect()
}

/// Invoke one adapter and degrade any error to an empty, summarized result.
async fn fetch_guarded(
    adapter: &dyn SourceAdapter,
    req: &SourceRequest,
    filters: &DiscoveryFilters,
) -> (SourceSummary, Vec<Opportunity>) {
    let t0 = Instant::now();
    let fetched = adapter.fetch(req).await;
    histogram!("discovery_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

    match fetched {
        Ok(raws) => {
            counter!("discovery_records_total").increment(raws.len() as u64);
            let opportunities: Vec<Opportunity> = raws
                .iter()
                .map(|raw| {
                    let mut op = normalize(raw, adapter.key());
                    if op.work_type.is_none() {
                        op.work_type = Some(filters.work_type.clone());
                    }
                    op
                })
                .collect();
            let summary = SourceSummary {
                source: adapter.key().to_string(),
                source_name: adapter.display_name().to_string(),
                success: true,
                count: opportunities.len(),
                error: None,
            };
            (summary, opportunities)
        }
        Err(e) => {
            tracing::warn!(error = ?e, source = adapter.key(), "source adapter failed");
            counter!("discovery_source_errors_total").increment(1);
            let summary = SourceSummary {
                source: adapter.key().to_string(),
                source_name: adapter.display_name().to_string(),
                success: false,
                count: 0,
                error: Some(format!("{e:#}")),
            };
            (summary, Vec::new())
        }
    }
}

/// Run one discovery pass: plan → concurrent fetch → normalize → dedup/rank.
///
/// Never fails; per-source trouble lands in the summary, and the final
/// ordering is imposed by the ranker regardless of adapter completion order.
pub async fn fetch_discovery_from_sources(
    adapters: &[Box<dyn SourceAdapter>],
    filters: &DiscoveryFilters,
    scorer: &Scorer,
) -> DiscoveryOutcome {
    crate::discovery::ensure_metrics_described();

    let req = SourceRequest::from(filters);
    let planned = call_plan(adapters, filters);

    let results = join_all(
        planned
            .iter()
            .map(|adapter| fetch_guarded(*adapter, &req, filters)),
    )
    .await;

    let mut source_summary = Vec::with_capacity(results.len());
    let mut aggregated: Vec<Opportunity> = Vec::new();
    for (summary, mut ops) in results {
        source_summary.push(summary);
        aggregated.append(&mut ops);
    }

    let before = aggregated.len();
    let opportunities = dedupe_and_rank(aggregated, filters, scorer);

    counter!("discovery_dedup_total").increment((before - opportunities.len()) as u64);
    counter!("discovery_kept_total").increment(opportunities.len() as u64);
    gauge!("discovery_last_run_ts").set(chrono::Utc::now().timestamp().max(0) as f64);

    tracing::info!(
        kept = opportunities.len(),
        fetched = before,
        sources = source_summary.len(),
        "discovery run complete"
    );

    DiscoveryOutcome {
        opportunities,
        source_summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::types::RawRecord;
    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::Value;

    struct StaticAdapter {
        key: &'static str,
        titles: Vec<&'static str>,
    }

    #[async_trait]
    impl SourceAdapter for StaticAdapter {
        async fn fetch(&self, _req: &SourceRequest) -> Result<Vec<RawRecord>> {
            Ok(self
                .titles
                .iter()
                .map(|t| {
                    let mut r = RawRecord::new();
                    r.insert("title".into(), Value::String(t.to_string()));
                    r
                })
                .collect())
        }
        fn key(&self) -> &'static str {
            self.key
        }
        fn display_name(&self) -> &'static str {
            self.key
        }
    }

    fn adapters() -> Vec<Box<dyn SourceAdapter>> {
        vec![
            Box::new(StaticAdapter { key: "sam_gov", titles: vec!["A"] }),
            Box::new(StaticAdapter { key: "ca_county", titles: vec!["B"] }),
            Box::new(StaticAdapter { key: "web", titles: vec!["C"] }),
        ]
    }

    #[test]
    fn county_adapter_gated_on_state() {
        let set = adapters();

        let ca = DiscoveryFilters {
            state: Some("California".into()),
            ..DiscoveryFilters::for_work_type("low_voltage")
        };
        let keys: Vec<_> = call_plan(&set, &ca).iter().map(|a| a.key()).collect();
        assert_eq!(keys, vec!["sam_gov", "ca_county", "web"]);

        let tx = DiscoveryFilters {
            state: Some("Texas".into()),
            ..DiscoveryFilters::for_work_type("low_voltage")
        };
        let keys: Vec<_> = call_plan(&set, &tx).iter().map(|a| a.key()).collect();
        assert_eq!(keys, vec!["sam_gov", "web"]);

        let none = DiscoveryFilters::for_work_type("low_voltage");
        let keys: Vec<_> = call_plan(&set, &none).iter().map(|a| a.key()).collect();
        assert_eq!(keys, vec!["sam_gov", "web"]);
    }

    #[tokio::test]
    async fn records_are_tagged_with_adapter_key() {
        let set = adapters();
        let filters = DiscoveryFilters {
            state: Some("California".into()),
            ..DiscoveryFilters::for_work_type("low_voltage")
        };
        let out = fetch_discovery_from_sources(&set, &filters, &Scorer::default()).await;
        assert_eq!(out.opportunities.len(), 3);
        assert!(out.opportunities.iter().any(|o| o.source == "ca_county"));
        assert!(out.source_summary.iter().all(|s| s.success));
    }
}
