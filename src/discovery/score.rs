// src/discovery/score.rs
//! Additive match scoring of a canonical opportunity against the query
//! filters.
//!
//! Point weights are ordered so that source tier ≥ keyword match ≥
//! classification match ≥ state match ≥ county/city match ≥ presence
//! bonuses. Keyword points sit close enough to the tier cap that a
//! keyword-matching listing from a low-tier scrape can overtake a
//! non-matching listing from the primary API.

use crate::discovery::types::{DiscoveryFilters, Opportunity};
use crate::keywords::WorkTypeKeywords;
use crate::source_tiers::SourceTiers;

pub const KEYWORD_POINTS: i32 = 25;
pub const CLASSIFICATION_POINTS: i32 = 15;
pub const STATE_POINTS: i32 = 10;
pub const CITY_COUNTY_POINTS: i32 = 5;
pub const PRESENCE_POINTS: i32 = 1;

/// Shared scoring context: the keyword table and source-tier table.
#[derive(Debug, Clone, Default)]
pub struct Scorer {
    pub keywords: WorkTypeKeywords,
    pub tiers: SourceTiers,
}

impl Scorer {
    pub fn new(keywords: WorkTypeKeywords, tiers: SourceTiers) -> Self {
        Self { keywords, tiers }
    }

    /// Compute the match score. Deterministic for identical input.
    pub fn score(&self, op: &Opportunity, filters: &DiscoveryFilters) -> i32 {
        let mut points = self.tiers.points_for(&op.source);

        let haystack = format!("{} {}", op.title, op.description).to_lowercase();

        if self.keywords.matches(&haystack, &filters.work_type) {
            points += KEYWORD_POINTS;
        }

        if let Some(cls) = non_empty(filters.classification.as_deref()) {
            let needle = cls.to_lowercase();
            let own_cls = op.classification.as_deref().unwrap_or("").to_lowercase();
            if haystack.contains(&needle) || own_cls.contains(&needle) {
                points += CLASSIFICATION_POINTS;
            }
        }

        let location = op.location.to_lowercase();
        if let Some(state) = non_empty(filters.state.as_deref()) {
            if location.contains(&state.to_lowercase()) {
                points += STATE_POINTS;
            }
        }
        if let Some(cc) = non_empty(filters.city_county.as_deref()) {
            let needle = cc.to_lowercase();
            let parts = op
                .county
                .as_deref()
                .unwrap_or("")
                .to_lowercase();
            let city = op.city.as_deref().unwrap_or("").to_lowercase();
            if location.contains(&needle) || parts.contains(&needle) || city.contains(&needle) {
                points += CITY_COUNTY_POINTS;
            }
        }

        if op.estimated_value.is_some() {
            points += PRESENCE_POINTS;
        }
        if op.due_date.is_some() {
            points += PRESENCE_POINTS;
        }

        points
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::normalize::normalize;
    use crate::discovery::types::RawRecord;
    use serde_json::json;

    fn op(v: serde_json::Value, source: &str) -> Opportunity {
        let raw: RawRecord = v.as_object().cloned().unwrap();
        normalize(&raw, source)
    }

    fn filters() -> DiscoveryFilters {
        DiscoveryFilters {
            work_type: "low_voltage".into(),
            state: Some("California".into()),
            city_county: Some("Irvine".into()),
            classification: None,
            page: 1,
            page_size: 50,
        }
    }

    #[test]
    fn keyword_and_location_points_stack() {
        let s = Scorer::default();
        let matching = op(
            json!({
                "title": "Low Voltage Upgrade",
                "agency": "City of Irvine",
                "city": "Irvine",
                "state": "California",
                "due_date": "2026-06-01",
                "estimated_value": "$250,000"
            }),
            "ca_county",
        );
        let plain = op(json!({"title": "Road resurfacing", "agency": "Caltrans"}), "ca_county");

        let f = filters();
        let hi = s.score(&matching, &f);
        let lo = s.score(&plain, &f);
        assert!(hi > lo);
        // tier 20 + keyword 25 + state 10 + city 5 + value 1 + due 1
        assert_eq!(hi, 62);
        assert_eq!(lo, 20);
    }

    #[test]
    fn keyword_match_on_low_tier_beats_silent_high_tier() {
        let s = Scorer::default();
        let f = DiscoveryFilters::for_work_type("low_voltage");
        let scraped = op(
            json!({"title": "Structured cabling for campus", "agency": "X"}),
            "web",
        );
        let api = op(json!({"title": "Bridge painting", "agency": "Y"}), "sam_gov");
        assert!(s.score(&scraped, &f) > s.score(&api, &f));
    }

    #[test]
    fn classification_filter_matches_own_field_or_text() {
        let s = Scorer::default();
        let mut f = DiscoveryFilters::for_work_type("low_voltage");
        f.classification = Some("238210".into());

        let tagged = op(
            json!({"title": "Cabling", "agency": "A", "naics_code": "238210"}),
            "web",
        );
        let untagged = op(json!({"title": "Cabling", "agency": "A"}), "web");
        assert_eq!(
            s.score(&tagged, &f) - s.score(&untagged, &f),
            CLASSIFICATION_POINTS
        );
    }

    #[test]
    fn weight_ordering_holds() {
        let max_tier = crate::source_tiers::MAX_TIER_POINTS;
        assert!(max_tier >= KEYWORD_POINTS);
        assert!(KEYWORD_POINTS >= CLASSIFICATION_POINTS);
        assert!(CLASSIFICATION_POINTS >= STATE_POINTS);
        assert!(STATE_POINTS >= CITY_COUNTY_POINTS);
        assert!(CITY_COUNTY_POINTS >= PRESENCE_POINTS);
    }
}
