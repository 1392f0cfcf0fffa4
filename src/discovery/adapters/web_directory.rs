// src/discovery/adapters/web_directory.rs
//! Generic web fallback: a scraped business-directory style listing site.
//!
//! The lowest-trust source in the plan, always included so a run still finds
//! something when the structured sources come up empty. Listing text is
//! free-form, so money amounts with multiplier suffixes ("$2.5M", "500k")
//! are expanded here before the generic normalizer sees them.

use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde_json::{Number, Value};
use std::sync::Arc;

use crate::config::DiscoveryConfig;
use crate::discovery::adapters::{clean_fragment, first_href, get_text, polite_delay};
use crate::discovery::cache::FetchCache;
use crate::discovery::types::{RawRecord, SourceAdapter, SourceRequest};
use crate::keywords::WorkTypeKeywords;

/// How many keyword terms to run through the site search per request.
const MAX_SEARCH_TERMS: usize = 2;

pub struct WebDirectoryAdapter {
    client: reqwest::Client,
    cache: Arc<FetchCache>,
    keywords: Arc<WorkTypeKeywords>,
    base_url: String,
    delay_ms: u64,
    jitter_ms: u64,
}

impl WebDirectoryAdapter {
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
            base_url: cfg.web_directory_base_url.clone(),
            delay_ms: cfg.polite_delay_ms,
            jitter_ms: cfg.polite_delay_jitter_ms,
        }
    }

    /// Parse one search-results page. Public to the crate for fixture tests.
    pub fn parse_listing_page(&self, html: &str, work_type: &str) -> Vec<RawRecord> {
        static RE_BLOCK: OnceCell<Regex> = OnceCell::new();
        static RE_ANCHOR: OnceCell<Regex> = OnceCell::new();
        static RE_AGENCY: OnceCell<Regex> = OnceCell::new();
        let re_block = RE_BLOCK.get_or_init(|| {
            Regex::new(r#"(?is)<(?:li|div|article)[^>]*class="[^"]*(?:listing|result|bid-item)[^"]*"[^>]*>(.*?)</(?:li|div|article)>"#).unwrap()
        });
        let re_anchor =
            RE_ANCHOR.get_or_init(|| Regex::new(r"(?is)<a[^>]*>(.*?)</a>").unwrap());
        let re_agency = RE_AGENCY
            .get_or_init(|| Regex::new(r"(?i)(?:agency|owner|issued by)[:\s]+([^.|<]{3,80})").unwrap());

        let mut out = Vec::new();
        for block in re_block.captures_iter(html) {
            let block_html = &block[1];
            let title = match re_anchor.captures(block_html) {
                Some(c) => clean_fragment(&c[1]),
                None => continue,
            };
            if title.is_empty() {
                continue;
            }

            let text = clean_fragment(block_html);
            if !self.keywords.matches(&text, work_type) {
                continue;
            }

            let mut raw = RawRecord::new();
            raw.insert("title".into(), Value::String(title));
            raw.insert("description".into(), Value::String(text.clone()));
            if let Some(href) = first_href(block_html) {
                raw.insert("url".into(), Value::String(href));
            }
            if let Some(agency) = re_agency.captures(&text) {
                raw.insert(
                    "agency".into(),
                    Value::String(agency[1].trim().to_string()),
                );
            }
            if let Some(amount) = parse_money_with_suffix(&text) {
                if let Some(n) = Number::from_f64(amount) {
                    raw.insert("estimated_value".into(), Value::Number(n));
                }
            }
            raw.insert("source_name".into(), Value::String("Construction bid directory".into()));
            raw.insert("source_type".into(), Value::String("web".into()));

            out.push(raw);
        }
        out
    }

    fn search_url(&self, term: &str, req: &SourceRequest) -> String {
        let mut url = format!(
            "{}?q={}&page={}",
            self.base_url,
            term.replace(' ', "+"),
            req.page
        );
        if let Some(state) = &req.state {
            url.push_str(&format!("&state={}", state.replace(' ', "+")));
        }
        url
    }
}

/// First dollar amount in the text, with "k"/"m"/"thousand"/"million"
/// suffixes expanded. Returns the pre-multiplied amount.
pub(crate) fn parse_money_with_suffix(text: &str) -> Option<f64> {
    static RE_MONEY: OnceCell<Regex> = OnceCell::new();
    let re = RE_MONEY.get_or_init(|| {
        Regex::new(r"(?i)\$\s*([\d][\d,]*(?:\.\d+)?)\s*(k|m|million|thousand)?\b").unwrap()
    });

    let caps = re.captures(text)?;
    let digits: String = caps[1].chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    let base: f64 = digits.parse().ok()?;
    let multiplier = match caps.get(2).map(|m| m.as_str().to_ascii_lowercase()) {
        Some(s) if s == "k" || s == "thousand" => 1_000.0,
        Some(s) if s == "m" || s == "million" => 1_000_000.0,
        _ => 1.0,
    };
    let amount = base * multiplier;
    (amount.is_finite() && amount > 0.0).then_some(amount)
}

#[async_trait]
impl SourceAdapter for WebDirectoryAdapter {
    async fn fetch(&self, req: &SourceRequest) -> Result<Vec<RawRecord>> {
        let terms: Vec<String> = self
            .keywords
            .keywords_for(&req.work_type)
            .iter()
            .filter(|t| t.parse::<u64>().is_err())
            .take(MAX_SEARCH_TERMS)
            .cloned()
            .collect();
        let terms = if terms.is_empty() {
            vec![req.work_type.replace('_', " ")]
        } else {
            terms
        };

        let mut out = Vec::new();
        for (i, term) in terms.iter().enumerate() {
            if i > 0 {
                polite_delay(self.delay_ms, self.jitter_ms).await;
            }
            let url = self.search_url(term, req);
            match get_text(&self.client, &self.cache, &url).await {
                Ok(html) => out.extend(self.parse_listing_page(&html, &req.work_type)),
                Err(e) => tracing::warn!(error = ?e, term = %term, "directory search failed"),
            }
        }
        Ok(out)
    }

    fn key(&self) -> &'static str {
        "web"
    }

    fn display_name(&self) -> &'static str {
        "Web bid directory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn adapter() -> WebDirectoryAdapter {
        let cfg = DiscoveryConfig::default();
        WebDirectoryAdapter::new(
            &cfg,
            reqwest::Client::new(),
            Arc::new(FetchCache::new(Duration::from_secs(60))),
            Arc::new(WorkTypeKeywords::default()),
        )
    }

    #[test]
    fn money_suffixes_are_expanded() {
        assert_eq!(parse_money_with_suffix("budget $2.5M total"), Some(2_500_000.0));
        assert_eq!(parse_money_with_suffix("around $500k"), Some(500_000.0));
        assert_eq!(parse_money_with_suffix("$3 million project"), Some(3_000_000.0));
        assert_eq!(parse_money_with_suffix("$750 thousand"), Some(750_000.0));
        assert_eq!(parse_money_with_suffix("$1,250.00 exactly"), Some(1250.0));
        assert_eq!(parse_money_with_suffix("no budget listed"), None);
    }

    #[test]
    fn listing_blocks_parse_and_filter() {
        let html = r#"
            <li class="bid-listing">
              <a href="https://dir.example/bid/77">Fiber Optic Backbone, District HQ</a>
              Agency: Unified School District. Budget $2.5M. Low voltage scope.
            </li>
            <li class="bid-listing">
              <a href="https://dir.example/bid/78">Landscaping annual contract</a>
              Agency: Parks Dept. Budget $90k.
            </li>"#;

        let out = adapter().parse_listing_page(html, "low_voltage");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["title"], "Fiber Optic Backbone, District HQ");
        assert_eq!(out[0]["agency"], "Unified School District");
        assert_eq!(out[0]["estimated_value"], 2_500_000.0);
        assert_eq!(out[0]["url"], "https://dir.example/bid/77");
    }
}
