// src/discovery/rank.rs
//! Collapse duplicate listings and order the survivors by match score.
//!
//! Two records are the same real-world opportunity when their dedup key
//! matches: lower-cased `(external_id | url | title)` plus agency. The
//! higher-scoring variant wins; ties keep the first-seen record. Losing
//! records are discarded whole (no field merging).

use std::collections::HashMap;

use crate::discovery::score::Scorer;
use crate::discovery::types::{DiscoveryFilters, Opportunity};

/// Composite identity used to collapse duplicates across sources.
pub fn dedup_key(op: &Opportunity) -> String {
    let primary = op
        .external_id
        .as_deref()
        .or(op.url.as_deref())
        .unwrap_or(&op.title);
    format!("{}|{}", primary.to_lowercase(), op.agency.to_lowercase())
}

/// Score, de-duplicate, and sort descending by score. The sort is stable, so
/// equal-score records keep their original discovery order and repeated
/// calls over the same input produce identical output.
pub fn dedupe_and_rank(
    opportunities: Vec<Opportunity>,
    filters: &DiscoveryFilters,
    scorer: &Scorer,
) -> Vec<Opportunity> {
    let mut survivors: Vec<Opportunity> = Vec::with_capacity(opportunities.len());
    let mut by_key: HashMap<String, usize> = HashMap::new();

    for mut op in opportunities {
        let score = scorer.score(&op, filters);
        op.match_score = Some(score);

        let key = dedup_key(&op);
        match by_key.get(&key) {
            Some(&idx) => {
                let held = survivors[idx].match_score.unwrap_or(0);
                if score > held {
                    survivors[idx] = op;
                }
            }
            None => {
                by_key.insert(key, survivors.len());
                survivors.push(op);
            }
        }
    }

    survivors.sort_by(|a, b| b.match_score.cmp(&a.match_score));
    survivors
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

    #[test]
    fn duplicate_key_keeps_higher_scoring_variant() {
        let f = DiscoveryFilters::for_work_type("low_voltage");
        let low = op(
            json!({"notice_id": "N-1", "title": "Fence repair", "agency": "City of Irvine"}),
            "web",
        );
        let high = op(
            json!({"notice_id": "N-1", "title": "Fence repair", "agency": "City of Irvine"}),
            "sam_gov",
        );

        let out = dedupe_and_rank(vec![low, high], &f, &Scorer::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].source, "sam_gov");
    }

    #[test]
    fn tie_keeps_first_seen() {
        let f = DiscoveryFilters::for_work_type("low_voltage");
        let mut a = op(json!({"title": "Same", "agency": "Same Agency"}), "web");
        a.url = Some("https://a.example/1".into());
        let mut b = a.clone();
        b.url = Some("https://a.example/1".into());
        b.description = "second copy".into();

        let out = dedupe_and_rank(vec![a.clone(), b], &f, &Scorer::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].description, a.description);
    }

    #[test]
    fn key_falls_back_from_id_to_url_to_title() {
        let mut with_id = op(json!({"notice_id": "X", "title": "T", "agency": "A"}), "web");
        with_id.url = Some("https://x".into());
        assert_eq!(dedup_key(&with_id), "x|a");

        with_id.external_id = None;
        assert_eq!(dedup_key(&with_id), "https://x|a");

        with_id.url = None;
        assert_eq!(dedup_key(&with_id), "t|a");
    }

    #[test]
    fn ordering_is_deterministic_and_stable() {
        let f = DiscoveryFilters::for_work_type("low_voltage");
        let list = vec![
            op(json!({"title": "Low voltage A", "agency": "A1"}), "web"),
            op(json!({"title": "Low voltage B", "agency": "B1"}), "web"),
            op(json!({"title": "Paving", "agency": "C1"}), "sam_gov"),
        ];

        let s = Scorer::default();
        let first = dedupe_and_rank(list.clone(), &f, &s);
        let second = dedupe_and_rank(list, &f, &s);
        assert_eq!(first, second);

        // equal-score records (A then B) keep discovery order
        assert_eq!(first[0].agency, "A1");
        assert_eq!(first[1].agency, "B1");
    }
}
