//! # Source reliability tiers
//!
//! Maps an adapter key (e.g. `sam_gov`, `ca_county`, `web`) to base scoring
//! points reflecting how trustworthy and well-structured that source is.
//!
//! - Loads from JSON config (tiers per source key) with a built-in seed.
//! - Fallback order: exact match → substring match → default.
//! - Points are clamped to `[0, MAX_TIER_POINTS]` so a misconfigured file
//!   cannot let a source outrank keyword relevance.

use serde::Deserialize;
use std::{collections::HashMap, fs, path::Path};

/// Upper bound for tier points; keyword points are calibrated just below it.
pub const MAX_TIER_POINTS: i32 = 30;

/// Configuration for source tiers, loaded from JSON or defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceTiers {
    /// Points for sources with no tier entry.
    #[serde(default = "default_tier")]
    pub default_tier: i32,
    /// Explicit points per adapter key.
    #[serde(default)]
    pub tiers: HashMap<String, i32>,
}

fn default_tier() -> i32 {
    10
}

impl SourceTiers {
    /// Load from a JSON file, falling back to `default_seed()` on any error.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|_| Self::default_seed()),
            Err(_) => Self::default_seed(),
        }
    }

    /// Base points for a source key.
    pub fn points_for(&self, source: &str) -> i32 {
        let s = source.trim().to_ascii_lowercase();

        if let Some(&p) = self.tiers.get(&s) {
            return clamp_points(p);
        }
        for (k, &p) in &self.tiers {
            if s.contains(k.as_str()) {
                return clamp_points(p);
            }
        }
        clamp_points(self.default_tier)
    }

    /// Built-in seed: primary government API highest, generic scrape lowest.
    pub(crate) fn default_seed() -> Self {
        let mut tiers = HashMap::new();
        for (k, p) in [
            ("sam_gov", 30),
            ("state_portal", 25),
            ("ca_county", 20),
            ("county_portal", 20),
            ("construction_rss", 15),
            ("web", 10),
        ] {
            tiers.insert(k.to_string(), p);
        }
        Self {
            default_tier: 10,
            tiers,
        }
    }
}

impl Default for SourceTiers {
    fn default() -> Self {
        Self::default_seed()
    }
}

fn clamp_points(p: i32) -> i32 {
    p.clamp(0, MAX_TIER_POINTS)
}
