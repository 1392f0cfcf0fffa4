// tests/discovery_partial_failure.rs
use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::Value;

use bid_scout::discovery::orchestrator::fetch_discovery_from_sources;
use bid_scout::discovery::types::{RawRecord, SourceAdapter, SourceRequest};
use bid_scout::{DiscoveryFilters, Scorer};

struct HealthyAdapter;

#[async_trait]
impl SourceAdapter for HealthyAdapter {
    async fn fetch(&self, _req: &SourceRequest) -> Result<Vec<RawRecord>> {
        let mut r = RawRecord::new();
        r.insert("title".into(), Value::String("Access control upgrade".into()));
        r.insert("agency".into(), Value::String("City of Anaheim".into()));
        Ok(vec![r])
    }
    fn key(&self) -> &'static str {
        "sam_gov"
    }
    fn display_name(&self) -> &'static str {
        "SAM.gov"
    }
}

struct BrokenAdapter;

#[async_trait]
impl SourceAdapter for BrokenAdapter {
    async fn fetch(&self, _req: &SourceRequest) -> Result<Vec<RawRecord>> {
        bail!("connection reset by peer")
    }
    fn key(&self) -> &'static str {
        "web"
    }
    fn display_name(&self) -> &'static str {
        "Web bid directory"
    }
}

#[tokio::test]
async fn one_broken_source_degrades_instead_of_failing_the_run() {
    let adapters: Vec<Box<dyn SourceAdapter>> =
        vec![Box::new(HealthyAdapter), Box::new(BrokenAdapter)];
    let filters = DiscoveryFilters::for_work_type("low_voltage");

    let out = fetch_discovery_from_sources(&adapters, &filters, &Scorer::default()).await;

    // records from the healthy source still flow through
    assert_eq!(out.opportunities.len(), 1);
    assert_eq!(out.opportunities[0].source, "sam_gov");

    let broken = out
        .source_summary
        .iter()
        .find(|s| s.source == "web")
        .expect("summary entry for broken source");
    assert!(!broken.success);
    assert_eq!(broken.count, 0);
    assert!(broken.error.as_deref().unwrap_or("").contains("connection reset"));
}

#[tokio::test]
async fn all_sources_down_is_still_a_successful_empty_run() {
    let adapters: Vec<Box<dyn SourceAdapter>> = vec![Box::new(BrokenAdapter)];
    let filters = DiscoveryFilters::for_work_type("low_voltage");

    let out = fetch_discovery_from_sources(&adapters, &filters, &Scorer::default()).await;

    assert!(out.opportunities.is_empty());
    assert_eq!(out.source_summary.len(), 1);
    assert!(out.source_summary.iter().all(|s| !s.success && s.error.is_some()));
}
