// src/discovery/normalize.rs
//! Raw-record → canonical [`Opportunity`] conversion.
//!
//! Every canonical field is resolved through an ordered list of alias keys,
//! so the same normalizer serves API payloads and scraped tables alike.
//! Missing fields degrade to sentinels or `None`; `normalize` is total and
//! never fails, even on an empty map.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use crate::discovery::types::{Opportunity, RawRecord};

pub const FALLBACK_TITLE: &str = "Untitled opportunity";
pub const FALLBACK_AGENCY: &str = "Unknown agency";
pub const FALLBACK_LOCATION: &str = "Unknown location";
pub const FALLBACK_DESCRIPTION: &str = "No description provided.";
pub const DEFAULT_STATUS: &str = "active";

const TITLE_ALIASES: &[&str] = &["project_name", "title", "rfp_name", "name"];
const AGENCY_ALIASES: &[&str] = &["agency", "organization", "department", "buyer", "owner"];
const LOCATION_ALIASES: &[&str] = &["location", "place_of_performance", "project_location"];
const STATE_ALIASES: &[&str] = &["state", "state_name"];
const COUNTY_ALIASES: &[&str] = &["county", "county_name"];
const CITY_ALIASES: &[&str] = &["city", "city_name", "municipality"];
const EXTERNAL_ID_ALIASES: &[&str] = &["notice_id", "external_id", "solicitation_number", "id"];
const URL_ALIASES: &[&str] = &["url", "link", "href", "ui_link"];
const DESCRIPTION_ALIASES: &[&str] = &["description", "summary", "details", "scope"];
const REQUIREMENTS_ALIASES: &[&str] = &["requirements", "qualifications"];
const VALUE_ALIASES: &[&str] = &["estimated_value", "budget", "contract_value", "value"];
const DUE_ALIASES: &[&str] = &["due_date", "response_deadline", "close_date", "deadline", "bid_date"];
const POSTED_ALIASES: &[&str] = &["posted_date", "published_date", "post_date", "issued_date"];
const STATUS_ALIASES: &[&str] = &["status", "opportunity_status"];
const CLASSIFICATION_ALIASES: &[&str] = &["classification", "naics", "naics_code", "category"];
const WORK_TYPE_ALIASES: &[&str] = &["work_type", "type_of_work", "trade"];
const SOURCE_TYPE_ALIASES: &[&str] = &["source_type"];
const SOURCE_NAME_ALIASES: &[&str] = &["source_name", "site_name"];

/// Convert one raw record, tagged with the adapter key it came from, into the
/// canonical shape. Never fails; an empty map yields a sentinel record.
pub fn normalize(raw: &RawRecord, source: &str) -> Opportunity {
    let title = first_string(raw, TITLE_ALIASES).unwrap_or_else(|| FALLBACK_TITLE.to_string());
    let agency = first_string(raw, AGENCY_ALIASES).unwrap_or_else(|| FALLBACK_AGENCY.to_string());

    let state = first_string(raw, STATE_ALIASES);
    let county = first_string(raw, COUNTY_ALIASES);
    let city = first_string(raw, CITY_ALIASES);

    let location = first_string(raw, LOCATION_ALIASES)
        .or_else(|| compose_location(city.as_deref(), county.as_deref(), state.as_deref()))
        .unwrap_or_else(|| FALLBACK_LOCATION.to_string());

    let external_id = first_string(raw, EXTERNAL_ID_ALIASES);
    let id = synthesize_id(source, external_id.as_deref(), &title, &agency);

    Opportunity {
        id,
        external_id,
        title,
        agency,
        location,
        state,
        county,
        city,
        source: source.to_string(),
        source_type: first_string(raw, SOURCE_TYPE_ALIASES).unwrap_or_else(|| source.to_string()),
        source_name: first_string(raw, SOURCE_NAME_ALIASES).unwrap_or_else(|| source.to_string()),
        url: first_string(raw, URL_ALIASES),
        description: first_string(raw, DESCRIPTION_ALIASES)
            .unwrap_or_else(|| FALLBACK_DESCRIPTION.to_string()),
        requirements: string_list(raw, REQUIREMENTS_ALIASES),
        estimated_value: first_value(raw, VALUE_ALIASES).and_then(normalize_currency),
        due_date: first_string(raw, DUE_ALIASES).as_deref().and_then(normalize_date),
        posted_date: first_string(raw, POSTED_ALIASES).as_deref().and_then(normalize_date),
        status: first_string(raw, STATUS_ALIASES).unwrap_or_else(|| DEFAULT_STATUS.to_string()),
        classification: first_string(raw, CLASSIFICATION_ALIASES),
        work_type: first_string(raw, WORK_TYPE_ALIASES),
        match_score: None,
    }
}

/// First non-empty string value among the alias keys, in priority order.
/// Numeric values are stringified so sites that emit numbers for id-like
/// fields still resolve.
fn first_string(raw: &RawRecord, aliases: &[&str]) -> Option<String> {
    for key in aliases {
        match raw.get(*key) {
            Some(Value::String(s)) => {
                let t = s.trim();
                if !t.is_empty() {
                    return Some(t.to_string());
                }
            }
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

fn first_value<'a>(raw: &'a RawRecord, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|k| raw.get(*k)).filter(|v| !v.is_null())
}

fn string_list(raw: &RawRecord, aliases: &[&str]) -> Vec<String> {
    for key in aliases {
        if let Some(Value::Array(items)) = raw.get(*key) {
            return items
                .iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
    }
    Vec::new()
}

fn compose_location(city: Option<&str>, county: Option<&str>, state: Option<&str>) -> Option<String> {
    let parts: Vec<&str> = [city, county, state].into_iter().flatten().collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

/// Deterministic identity: `source:externalId-or-title:agency`, lower-cased
/// with whitespace collapsed to dashes. Identical input always yields the
/// same id (dedup and fingerprinting depend on this), so no random or
/// time-based component is allowed here.
pub fn synthesize_id(source: &str, external_id: Option<&str>, title: &str, agency: &str) -> String {
    let key = external_id.map(slug).unwrap_or_else(|| slug(title));
    format!("{}:{}:{}", source, key, slug(agency))
}

fn slug(s: &str) -> String {
    s.trim().to_ascii_lowercase().split_whitespace().collect::<Vec<_>>().join("-")
}

/// Parse a currency-like value into a positive amount.
///
/// Strings are stripped of everything but digits and dots before parsing.
/// Anything non-finite or not strictly positive collapses to `None`.
/// Multiplier suffixes ("2.5M") are the scraping adapters' job; by the time
/// a value reaches this function it is expected to be pre-multiplied.
pub fn normalize_currency(value: &Value) -> Option<f64> {
    let amount = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let cleaned: String = s.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
            cleaned.parse::<f64>().ok()?
        }
        _ => return None,
    };
    (amount.is_finite() && amount > 0.0).then_some(amount)
}

/// Best-effort date parse → full ISO-8601 UTC string, or `None`.
///
/// Accepted inputs: RFC 3339, `YYYY-MM-DD`, `MM/DD/YYYY`,
/// `YYYY-MM-DD HH:MM:SS`, and RFC 2822 (RSS pubDate).
pub fn normalize_date(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(to_iso(dt.with_timezone(&Utc)));
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|ndt| to_iso(Utc.from_utc_datetime(&ndt)));
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%m/%d/%Y") {
        return d.and_hms_opt(0, 0, 0).map(|ndt| to_iso(Utc.from_utc_datetime(&ndt)));
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(to_iso(Utc.from_utc_datetime(&ndt)));
    }
    if let Ok(odt) = OffsetDateTime::parse(s, &Rfc2822) {
        let ts = odt.unix_timestamp();
        return Utc.timestamp_opt(ts, 0).single().map(to_iso);
    }

    None
}

fn to_iso(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(v: serde_json::Value) -> RawRecord {
        v.as_object().cloned().expect("object fixture")
    }

    #[test]
    fn empty_record_gets_sentinels() {
        let op = normalize(&RawRecord::new(), "web");
        assert_eq!(op.title, FALLBACK_TITLE);
        assert_eq!(op.agency, FALLBACK_AGENCY);
        assert_eq!(op.location, FALLBACK_LOCATION);
        assert_eq!(op.source, "web");
        assert_eq!(op.status, "active");
        assert!(op.requirements.is_empty());
        assert!(op.estimated_value.is_none());
    }

    #[test]
    fn alias_priority_prefers_project_name() {
        let op = normalize(
            &raw(json!({"project_name": "Terminal Rewire", "title": "ignored"})),
            "sam_gov",
        );
        assert_eq!(op.title, "Terminal Rewire");
    }

    #[test]
    fn location_composed_from_parts() {
        let op = normalize(&raw(json!({"city": "Irvine", "state": "California"})), "web");
        assert_eq!(op.location, "Irvine, California");
    }

    #[test]
    fn id_is_deterministic_and_uses_external_id() {
        let r = raw(json!({"notice_id": "OC-100", "title": "X", "agency": "Orange County"}));
        let a = normalize(&r, "ca_county");
        let b = normalize(&r, "ca_county");
        assert_eq!(a.id, b.id);
        assert_eq!(a.id, "ca_county:oc-100:orange-county");
    }

    #[test]
    fn currency_parses_formatted_strings() {
        assert_eq!(normalize_currency(&json!("$1,250.00")), Some(1250.0));
        assert_eq!(normalize_currency(&json!(98_000)), Some(98_000.0));
    }

    #[test]
    fn currency_rejects_empty_zero_negative() {
        assert_eq!(normalize_currency(&json!("")), None);
        assert_eq!(normalize_currency(&json!(0)), None);
        assert_eq!(normalize_currency(&json!(-5)), None);
        assert_eq!(normalize_currency(&json!("TBD")), None);
    }

    #[test]
    fn date_round_trips_plain_date() {
        assert_eq!(
            normalize_date("2026-06-01").as_deref(),
            Some("2026-06-01T00:00:00.000Z")
        );
    }

    #[test]
    fn date_accepts_us_and_rfc_formats() {
        assert_eq!(
            normalize_date("06/01/2026").as_deref(),
            Some("2026-06-01T00:00:00.000Z")
        );
        assert_eq!(
            normalize_date("Mon, 01 Jun 2026 12:00:00 +0000").as_deref(),
            Some("2026-06-01T12:00:00.000Z")
        );
    }

    #[test]
    fn date_rejects_garbage() {
        assert_eq!(normalize_date("not a date"), None);
        assert_eq!(normalize_date(""), None);
    }
}
