// src/discovery/adapters/sam_gov.rs
//! SAM.gov opportunities API (the primary federal procurement source).
//!
//! Unlike the scraped portals this is a structured JSON API, so the adapter
//! queries it per keyword term and maps response items straight into raw
//! records. Requires `SAM_GOV_API_KEY` in the environment.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::config::DiscoveryConfig;
use crate::discovery::adapters::polite_delay;
use crate::discovery::cache::FetchCache;
use crate::discovery::types::{RawRecord, SourceAdapter, SourceRequest};
use crate::keywords::WorkTypeKeywords;

/// How many keyword terms to query per run; each is a separate API call.
const MAX_SEARCH_TERMS: usize = 3;

pub struct SamGovAdapter {
    client: reqwest::Client,
    cache: Arc<FetchCache>,
    keywords: Arc<WorkTypeKeywords>,
    base_url: String,
    api_key: Option<String>,
    delay_ms: u64,
    jitter_ms: u64,
}

impl SamGovAdapter {
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
            base_url: cfg.sam_gov_base_url.clone(),
            api_key: cfg.sam_api_key(),
            delay_ms: cfg.polite_delay_ms,
            jitter_ms: cfg.polite_delay_jitter_ms,
        }
    }

    /// Query URL for one search term. The API key never goes here: it is sent
    /// as a request header, so URLs stay safe to log and to echo in error
    /// strings and source summaries.
    fn search_url(&self, term: &str, req: &SourceRequest) -> String {
        let offset = (req.page - 1) * req.page_size;
        let mut url = format!(
            "{}/search?title={}&limit={}&offset={}&ptype=o",
            self.base_url,
            urlencode(term),
            req.page_size,
            offset
        );
        if let Some(state) = &req.state {
            url.push_str(&format!("&state={}", urlencode(state)));
        }
        url
    }

    /// Fetch a search page through the adapter cache, authenticating via the
    /// `X-Api-Key` header.
    async fn fetch_page(&self, api_key: &str, url: &str) -> Result<String> {
        if let Some(body) = self.cache.get(url) {
            return Ok(body);
        }

        let resp = self
            .client
            .get(url)
            .header("X-Api-Key", api_key)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        let resp = resp
            .error_for_status()
            .with_context(|| format!("non-2xx from {url}"))?;
        let body = resp.text().await.with_context(|| format!("reading body of {url}"))?;

        self.cache.put(url, &body);
        Ok(body)
    }

    /// Map one API item into the loose record shape the normalizer resolves.
    fn map_item(item: &Value) -> RawRecord {
        let mut raw = RawRecord::new();
        copy_str(&mut raw, "notice_id", item.get("noticeId"));
        copy_str(&mut raw, "title", item.get("title"));
        copy_str(&mut raw, "agency", item.get("fullParentPathName"));
        copy_str(&mut raw, "description", item.get("description"));
        copy_str(&mut raw, "due_date", item.get("responseDeadLine"));
        copy_str(&mut raw, "posted_date", item.get("postedDate"));
        copy_str(&mut raw, "url", item.get("uiLink"));
        copy_str(&mut raw, "naics_code", item.get("naicsCode"));
        copy_str(&mut raw, "status", item.get("active").and_then(active_to_status).as_ref());

        if let Some(pop) = item.get("placeOfPerformance") {
            copy_str(&mut raw, "state", pop.pointer("/state/name"));
            copy_str(&mut raw, "city", pop.pointer("/city/name"));
        }
        if let Some(award) = item.pointer("/award/amount") {
            raw.insert("estimated_value".into(), award.clone());
        }

        raw.insert("source_name".into(), Value::String("SAM.gov".into()));
        raw.insert("source_type".into(), Value::String("government_api".into()));
        raw
    }
}

fn active_to_status(v: &Value) -> Option<Value> {
    match v.as_str() {
        Some("Yes") => Some(Value::String("active".into())),
        Some("No") => Some(Value::String("closed".into())),
        _ => None,
    }
}

fn copy_str(raw: &mut RawRecord, key: &str, v: Option<&Value>) {
    if let Some(Value::String(s)) = v {
        if !s.trim().is_empty() {
            raw.insert(key.to_string(), Value::String(s.clone()));
        }
    }
}

fn urlencode(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            ' ' => "+".to_string(),
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => c.to_string(),
            other => format!("%{:02X}", other as u32),
        })
        .collect()
}

#[async_trait]
impl SourceAdapter for SamGovAdapter {
    async fn fetch(&self, req: &SourceRequest) -> Result<Vec<RawRecord>> {
        let Some(api_key) = self.api_key.clone() else {
            bail!("SAM_GOV_API_KEY is not set");
        };

        let terms: Vec<&String> = self
            .keywords
            .keywords_for(&req.work_type)
            .iter()
            .filter(|t| t.parse::<u64>().is_err()) // NAICS codes are not title terms
            .take(MAX_SEARCH_TERMS)
            .collect();
        if terms.is_empty() {
            bail!("no search terms for work type {:?}", req.work_type);
        }

        let mut out = Vec::new();
        for (i, term) in terms.iter().enumerate() {
            if i > 0 {
                polite_delay(self.delay_ms, self.jitter_ms).await;
            }

            let url = self.search_url(term, req);
            let body = self.fetch_page(&api_key, &url).await?;
            let parsed: Value =
                serde_json::from_str(&body).context("parsing SAM.gov response JSON")?;

            if let Some(items) = parsed.get("opportunitiesData").and_then(Value::as_array) {
                out.extend(items.iter().map(Self::map_item));
            }
        }

        tracing::debug!(count = out.len(), "sam_gov fetch complete");
        Ok(out)
    }

    fn key(&self) -> &'static str {
        "sam_gov"
    }

    fn display_name(&self) -> &'static str {
        "SAM.gov"
    }
}
