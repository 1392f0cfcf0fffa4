// src/config.rs
//! Runtime configuration for the discovery service.
//!
//! Loaded from a TOML file (`$BID_SCOUT_CONFIG_PATH`, then
//! `config/discovery.toml`) with built-in defaults for everything, so the
//! service boots with no config at all. Secrets (the SAM.gov API key) come
//! from the environment, never from the file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PATH: &str = "BID_SCOUT_CONFIG_PATH";
const ENV_SAM_API_KEY: &str = "SAM_GOV_API_KEY";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Hard cap per outbound HTTP call so a hung portal cannot stall a run.
    pub request_timeout_secs: u64,
    /// Base sleep between successive requests to the same host.
    pub polite_delay_ms: u64,
    /// Random jitter added on top of the base sleep.
    pub polite_delay_jitter_ms: u64,
    /// TTL of the per-adapter fetch cache.
    pub cache_ttl_secs: u64,

    pub sam_gov_base_url: String,
    pub ca_county_portals: Vec<CountyPortal>,
    pub rss_feeds: Vec<String>,
    pub web_directory_base_url: String,

    /// Optional overrides for the built-in keyword / tier seeds.
    pub keywords_path: Option<PathBuf>,
    pub source_tiers_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CountyPortal {
    pub county: String,
    pub url: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            polite_delay_ms: 1_500,
            polite_delay_jitter_ms: 2_500,
            cache_ttl_secs: 300,
            sam_gov_base_url: "https://api.sam.gov/opportunities/v2".to_string(),
            ca_county_portals: vec![
                CountyPortal {
                    county: "Orange".into(),
                    url: "https://bids.ocgov.example/open-solicitations".into(),
                },
                CountyPortal {
                    county: "Los Angeles".into(),
                    url: "https://camisvr.lacounty.example/solicitations".into(),
                },
                CountyPortal {
                    county: "San Diego".into(),
                    url: "https://buynet.sandiegocounty.example/bids".into(),
                },
            ],
            rss_feeds: vec![
                "https://www.constructionbidsource.example/feed".into(),
                "https://www.bidnetdirect.example/rss/construction".into(),
            ],
            web_directory_base_url: "https://www.constructionbids.example/search".to_string(),
            keywords_path: None,
            source_tiers_path: None,
        }
    }
}

impl DiscoveryConfig {
    /// Load config using env var + fallbacks:
    /// 1) $BID_SCOUT_CONFIG_PATH
    /// 2) config/discovery.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_PATH) {
            let pb = PathBuf::from(p);
            return Self::load_from(&pb)
                .with_context(|| format!("{ENV_PATH} points at {}", pb.display()));
        }
        let default_p = PathBuf::from("config/discovery.toml");
        if default_p.exists() {
            return Self::load_from(&default_p);
        }
        Ok(Self::default())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading discovery config from {}", path.display()))?;
        toml::from_str(&content).context("parsing discovery config TOML")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// SAM.gov API key from the environment; `None` leaves the adapter in
    /// its degraded mode (it reports an error at fetch time).
    pub fn sam_api_key(&self) -> Option<String> {
        std::env::var(ENV_SAM_API_KEY)
            .ok()
            .filter(|s| !s.trim().is_empty())
    }
}
