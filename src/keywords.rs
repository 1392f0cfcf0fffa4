//! # Work-type keyword table
//!
//! Maps a work-type key (e.g. `low_voltage`) to the synonym phrases and
//! NAICS codes that signal a listing is relevant to that trade.
//!
//! - Loads from JSON config (keywords per work type) with a built-in seed.
//! - Case-insensitive containment matching against listing text.
//! - One shared table: site adapters use it as an advisory pre-filter, the
//!   scorer uses it for keyword points, so both stay in agreement.

use serde::Deserialize;
use std::{collections::HashMap, fs, path::Path};

/// Configuration for work-type keywords, loaded from JSON or defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkTypeKeywords {
    /// Keyword phrases (and NAICS codes) per canonical work-type key.
    #[serde(default)]
    pub keywords: HashMap<String, Vec<String>>,
}

impl WorkTypeKeywords {
    /// Load from a JSON file, falling back to `default_seed()` on any error.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|_| Self::default_seed()),
            Err(_) => Self::default_seed(),
        }
    }

    /// Keyword set for a work type; empty slice when the type is unknown.
    pub fn keywords_for(&self, work_type: &str) -> &[String] {
        self.keywords
            .get(&normalize_key(work_type))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// True when `text` contains any keyword of the work type
    /// (case-insensitive containment).
    pub fn matches(&self, text: &str, work_type: &str) -> bool {
        let haystack = text.to_lowercase();
        self.keywords_for(work_type)
            .iter()
            .any(|kw| haystack.contains(&kw.to_lowercase()))
    }

    /// Built-in seed covering the trades the portals are scraped for.
    pub(crate) fn default_seed() -> Self {
        let mut keywords = HashMap::new();

        for (wt, kws) in [
            (
                "low_voltage",
                vec![
                    "low voltage",
                    "structured cabling",
                    "access control",
                    "security camera",
                    "cctv",
                    "fire alarm",
                    "data cabling",
                    "fiber optic",
                    "av system",
                    "238210",
                    "561621",
                ],
            ),
            (
                "electrical",
                vec![
                    "electrical",
                    "lighting",
                    "power distribution",
                    "switchgear",
                    "generator",
                    "ev charging",
                    "238210",
                ],
            ),
            (
                "hvac",
                vec![
                    "hvac",
                    "mechanical",
                    "air conditioning",
                    "ventilation",
                    "chiller",
                    "boiler",
                    "238220",
                ],
            ),
            (
                "plumbing",
                vec!["plumbing", "piping", "water line", "sewer", "backflow", "238220"],
            ),
            (
                "roofing",
                vec!["roofing", "roof replacement", "re-roof", "waterproofing", "238160"],
            ),
            (
                "concrete",
                vec!["concrete", "paving", "sidewalk", "curb and gutter", "238110"],
            ),
            (
                "general_construction",
                vec![
                    "construction",
                    "renovation",
                    "tenant improvement",
                    "remodel",
                    "general contractor",
                    "236220",
                ],
            ),
        ] {
            keywords.insert(wt.to_string(), kws.into_iter().map(String::from).collect());
        }

        Self { keywords }
    }
}

impl Default for WorkTypeKeywords {
    fn default() -> Self {
        Self::default_seed()
    }
}

/// Normalize a work-type key: lowercase, separators to underscores.
fn normalize_key(s: &str) -> String {
    s.trim()
        .to_ascii_lowercase()
        .replace([' ', '-', '/'], "_")
}
