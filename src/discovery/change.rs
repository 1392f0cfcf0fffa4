// src/discovery/change.rs
//! "New since last run" detection.
//!
//! A fingerprint is a plain derived string, recomputed every run and never
//! persisted as an entity. It deliberately differs from the dedup key: the
//! due date is part of it, so a re-listed opportunity with a moved deadline
//! shows up as new again.

use std::collections::HashSet;

use crate::discovery::types::Opportunity;

/// `(external_id or title) | agency | (due_date or "")`.
pub fn fingerprint(op: &Opportunity) -> String {
    format!(
        "{}|{}|{}",
        op.external_id.as_deref().unwrap_or(&op.title),
        op.agency,
        op.due_date.as_deref().unwrap_or("")
    )
}

/// Pure subset selection: keep only opportunities whose fingerprint is absent
/// from the previous run's set. Loading and storing fingerprints is the
/// caller's job.
pub fn detect_new(previous_fingerprints: &[String], opportunities: &[Opportunity]) -> Vec<Opportunity> {
    let seen: HashSet<&str> = previous_fingerprints.iter().map(String::as_str).collect();
    opportunities
        .iter()
        .filter(|op| !seen.contains(fingerprint(op).as_str()))
        .cloned()
        .collect()
}
