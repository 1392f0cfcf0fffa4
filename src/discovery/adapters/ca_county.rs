// src/discovery/adapters/ca_county.rs
//! California county procurement portals (HTML table scrape).
//!
//! Planned only for California queries. Each configured portal page is a
//! plain HTML solicitation table; rows are pulled apart with regex, cleaned,
//! and pre-filtered against the work-type keyword table so downstream stages
//! are not flooded with every road-striping bid in the state.

use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;

use crate::config::{CountyPortal, DiscoveryConfig};
use crate::discovery::adapters::{clean_fragment, first_href, get_text, polite_delay};
use crate::discovery::cache::FetchCache;
use crate::discovery::normalize::normalize_date;
use crate::discovery::types::{RawRecord, SourceAdapter, SourceRequest};
use crate::keywords::WorkTypeKeywords;

pub struct CaCountyAdapter {
    client: reqwest::Client,
    cache: Arc<FetchCache>,
    keywords: Arc<WorkTypeKeywords>,
    portals: Vec<CountyPortal>,
    delay_ms: u64,
    jitter_ms: u64,
}

impl CaCountyAdapter {
    pub fn new(
        cfg: &DiscoveryConfig,
        client: reqwest::Client,
        cache: Arc<FetchCache>,
        keywords: Arc<WorkTypeKeywords>,
    ) -> Self {
        Self {
            client,
            cache,
            keywords,
            portals: cfg.ca_county_portals.clone(),
            delay_ms: cfg.polite_delay_ms,
            jitter_ms: cfg.polite_delay_jitter_ms,
        }
    }

    /// Parse one portal page into raw records. Public to the crate so tests
    /// can run it over fixtures without a network.
    pub fn parse_portal_page(&self, html: &str, portal: &CountyPortal, work_type: &str) -> Vec<RawRecord> {
        static RE_ROW: OnceCell<Regex> = OnceCell::new();
        static RE_CELL: OnceCell<Regex> = OnceCell::new();
        let re_row = RE_ROW.get_or_init(|| Regex::new(r"(?is)<tr[^>]*>(.*?)</tr>").unwrap());
        let re_cell = RE_CELL.get_or_init(|| Regex::new(r"(?is)<t[dh][^>]*>(.*?)</t[dh]>").unwrap());

        let mut out = Vec::new();
        for row in re_row.captures_iter(html) {
            let row_html = &row[1];
            let cells: Vec<String> = re_cell
                .captures_iter(row_html)
                .map(|c| clean_fragment(&c[1]))
                .collect();
            if cells.is_empty() || cells[0].is_empty() {
                continue;
            }

            let title = cells[0].clone();
            let row_text = cells.join(" ");
            if !self.keywords.matches(&row_text, work_type) {
                continue;
            }

            let mut raw = RawRecord::new();
            raw.insert("project_name".into(), Value::String(title));
            raw.insert(
                "agency".into(),
                Value::String(format!("{} County", portal.county)),
            );
            raw.insert("county".into(), Value::String(portal.county.clone()));
            raw.insert("state".into(), Value::String("California".into()));
            raw.insert("source_type".into(), Value::String("county_portal".into()));
            raw.insert(
                "source_name".into(),
                Value::String(format!("{} County procurement portal", portal.county)),
            );

            // Column layouts differ per county; pick out the date-looking and
            // money-looking cells instead of assuming positions.
            if let Some(due) = cells.iter().skip(1).find(|c| normalize_date(c).is_some()) {
                raw.insert("due_date".into(), Value::String(due.clone()));
            }
            if let Some(value) = cells.iter().skip(1).find(|c| c.contains('$')) {
                raw.insert("estimated_value".into(), Value::String(value.clone()));
            }
            if let Some(href) = first_href(row_html) {
                raw.insert("url".into(), Value::String(absolutize(&portal.url, &href)));
            }

            out.push(raw);
        }
        out
    }

    fn portals_for(&self, req: &SourceRequest) -> Vec<&CountyPortal> {
        match req.county.as_deref().map(str::to_lowercase) {
            Some(wanted) if !wanted.is_empty() => {
                let narrowed: Vec<&CountyPortal> = self
                    .portals
                    .iter()
                    .filter(|p| wanted.contains(&p.county.to_lowercase()))
                    .collect();
                // A city name ("Irvine") won't match any portal; scrape all.
                if narrowed.is_empty() {
                    self.portals.iter().collect()
                } else {
                    narrowed
                }
            }
            _ => self.portals.iter().collect(),
        }
    }
}

/// Join a scraped href against the portal's origin when it is site-relative.
fn absolutize(portal_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    static RE_ORIGIN: OnceCell<Regex> = OnceCell::new();
    let re = RE_ORIGIN.get_or_init(|| Regex::new(r"^(https?://[^/]+)").unwrap());
    match re.captures(portal_url) {
        Some(c) if href.starts_with('/') => format!("{}{}", &c[1], href),
        _ => href.to_string(),
    }
}

#[async_trait]
impl SourceAdapter for CaCountyAdapter {
    async fn fetch(&self, req: &SourceRequest) -> Result<Vec<RawRecord>> {
        let mut out = Vec::new();
        for (i, portal) in self.portals_for(req).into_iter().enumerate() {
            if i > 0 {
                polite_delay(self.delay_ms, self.jitter_ms).await;
            }
            match get_text(&self.client, &self.cache, &portal.url).await {
                Ok(html) => out.extend(self.parse_portal_page(&html, portal, &req.work_type)),
                Err(e) => {
                    // One dead county page should not sink the others.
                    tracing::warn!(error = ?e, county = %portal.county, "county portal fetch failed");
                }
            }
        }
        Ok(out)
    }

    fn key(&self) -> &'static str {
        "ca_county"
    }

    fn display_name(&self) -> &'static str {
        "California county portals"
    }
}
