// tests/dedup_rank.rs
use serde_json::json;

use bid_scout::discovery::normalize::normalize;
use bid_scout::discovery::rank::dedupe_and_rank;
use bid_scout::discovery::types::RawRecord;
use bid_scout::{DiscoveryFilters, Opportunity, Scorer};

fn op(v: serde_json::Value, source: &str) -> Opportunity {
    let raw: RawRecord = v.as_object().cloned().unwrap();
    normalize(&raw, source)
}

#[test]
fn same_notice_from_two_sources_collapses_to_the_better_one() {
    let filters = DiscoveryFilters::for_work_type("low_voltage");

    // identical dedup key (external id + agency), different source tiers
    let from_scrape = op(
        json!({"notice_id": "N-77", "title": "Fiber backbone", "agency": "Metro Water District"}),
        "web",
    );
    let from_api = op(
        json!({"notice_id": "N-77", "title": "Fiber backbone", "agency": "Metro Water District"}),
        "sam_gov",
    );

    let out = dedupe_and_rank(vec![from_scrape, from_api], &filters, &Scorer::default());
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].source, "sam_gov");
    assert!(out[0].match_score.is_some());
}

#[test]
fn losing_record_is_discarded_whole() {
    let filters = DiscoveryFilters::for_work_type("low_voltage");

    // the loser carries a value the winner lacks; it must NOT be merged in
    let loser = op(
        json!({
            "notice_id": "N-9",
            "title": "Cabling",
            "agency": "A",
            "estimated_value": "$500,000"
        }),
        "web",
    );
    let winner = op(
        json!({"notice_id": "N-9", "title": "Cabling", "agency": "A"}),
        "sam_gov",
    );

    let out = dedupe_and_rank(vec![loser, winner], &filters, &Scorer::default());
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].source, "sam_gov");
    assert_eq!(out[0].estimated_value, None);
}

#[test]
fn ranker_is_idempotent_over_its_own_output() {
    let filters = DiscoveryFilters::for_work_type("low_voltage");
    let scorer = Scorer::default();
    let input = vec![
        op(json!({"title": "Low voltage campus", "agency": "A"}), "web"),
        op(json!({"title": "Paving", "agency": "B"}), "sam_gov"),
        op(json!({"title": "Low voltage campus", "agency": "A"}), "ca_county"),
    ];

    let once = dedupe_and_rank(input, &filters, &scorer);
    let twice = dedupe_and_rank(once.clone(), &filters, &scorer);
    assert_eq!(once, twice);
    assert_eq!(once.len(), 2);
}
