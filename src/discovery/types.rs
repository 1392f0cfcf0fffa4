// src/discovery/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Loosely-typed payload as returned by one external source. Field names vary
/// per site (`title` vs `project_name` vs `rfp_name`, etc.); the normalizer
/// resolves aliases into the canonical [`Opportunity`] shape.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Canonical, normalized bid/procurement listing.
///
/// `title`, `agency`, `location` and `source` are always non-empty; the
/// normalizer substitutes sentinel strings when a raw record lacks them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Opportunity {
    pub id: String,
    pub external_id: Option<String>,
    pub title: String,
    pub agency: String,
    pub location: String,
    pub state: Option<String>,
    pub county: Option<String>,
    pub city: Option<String>,
    pub source: String,
    pub source_type: String,
    pub source_name: String,
    pub url: Option<String>,
    pub description: String,
    pub requirements: Vec<String>,
    pub estimated_value: Option<f64>,
    pub due_date: Option<String>,
    pub posted_date: Option<String>,
    pub status: String,
    pub classification: Option<String>,
    pub work_type: Option<String>,
    /// Attached by the ranker; not part of canonical identity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_score: Option<i32>,
}

/// Query context for one discovery run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryFilters {
    pub work_type: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub city_county: Option<String>,
    #[serde(default)]
    pub classification: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    50
}

impl DiscoveryFilters {
    pub fn for_work_type(work_type: &str) -> Self {
        Self {
            work_type: work_type.to_string(),
            state: None,
            city_county: None,
            classification: None,
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

/// Request shape handed to each adapter. Derived from [`DiscoveryFilters`];
/// `city_county` is split so portal adapters can address either granularity.
#[derive(Debug, Clone)]
pub struct SourceRequest {
    pub work_type: String,
    pub state: Option<String>,
    pub county: Option<String>,
    pub city: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

impl From<&DiscoveryFilters> for SourceRequest {
    fn from(f: &DiscoveryFilters) -> Self {
        Self {
            work_type: f.work_type.clone(),
            state: f.state.clone(),
            county: f.city_county.clone(),
            city: f.city_county.clone(),
            page: f.page.max(1),
            page_size: f.page_size.clamp(1, 200),
        }
    }
}

/// One external source of raw listings.
///
/// Adapters report fetch/parse trouble as `Err`; the orchestrator degrades
/// that to an empty per-source result instead of failing the run. Adapters
/// must not panic past this boundary.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch(&self, req: &SourceRequest) -> Result<Vec<RawRecord>>;

    /// Stable adapter key used as `Opportunity::source` (e.g. `sam_gov`).
    fn key(&self) -> &'static str;

    /// Human-readable source name for summaries and logs.
    fn display_name(&self) -> &'static str;
}

/// Per-source observability entry. Lets callers tell "nothing matched" apart
/// from "the source errored".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSummary {
    pub source: String,
    pub source_name: String,
    pub success: bool,
    pub count: usize,
    pub error: Option<String>,
}

/// Result of one discovery run: the ranked, de-duplicated opportunity list
/// plus one summary entry per planned adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryOutcome {
    pub opportunities: Vec<Opportunity>,
    pub source_summary: Vec<SourceSummary>,
}
