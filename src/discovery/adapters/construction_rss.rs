// src/discovery/adapters/construction_rss.rs
//! Construction bid RSS feeds.
//!
//! Feeds republish listings long after bids close, so any due date found in
//! an item must be strictly in the future; past or unparseable dates are
//! dropped (the item survives with no due date only if it is fresh enough to
//! carry none).

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use quick_xml::de::from_str;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::config::DiscoveryConfig;
use crate::discovery::adapters::{clean_fragment, get_text, polite_delay};
use crate::discovery::cache::FetchCache;
use crate::discovery::normalize::normalize_date;
use crate::discovery::types::{RawRecord, SourceAdapter, SourceRequest};
use crate::keywords::WorkTypeKeywords;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    title: Option<String>,
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

pub struct ConstructionRssAdapter {
    client: reqwest::Client,
    cache: Arc<FetchCache>,
    keywords: Arc<WorkTypeKeywords>,
    feeds: Vec<String>,
    delay_ms: u64,
    jitter_ms: u64,
}

impl ConstructionRssAdapter {
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
            feeds: cfg.rss_feeds.clone(),
            delay_ms: cfg.polite_delay_ms,
            jitter_ms: cfg.polite_delay_jitter_ms,
        }
    }

    /// Parse one feed body. `now` is injected so staleness is testable.
    pub fn parse_feed(&self, xml: &str, work_type: &str, now: DateTime<Utc>) -> Result<Vec<RawRecord>> {
        let rss: Rss = from_str(xml).context("parsing construction rss xml")?;
        let feed_name = rss
            .channel
            .title
            .as_deref()
            .map(clean_fragment)
            .unwrap_or_else(|| "Construction bid feed".to_string());

        let mut out = Vec::with_capacity(rss.channel.item.len());
        for it in rss.channel.item {
            let title = it.title.as_deref().map(clean_fragment).unwrap_or_default();
            let description = it.description.as_deref().map(clean_fragment).unwrap_or_default();
            if title.is_empty() {
                continue;
            }
            let text = format!("{title} {description}");
            if !self.keywords.matches(&text, work_type) {
                continue;
            }

            let mut raw = RawRecord::new();
            raw.insert("title".into(), Value::String(title));
            if !description.is_empty() {
                raw.insert("description".into(), Value::String(description.clone()));
            }
            if let Some(link) = it.link {
                raw.insert("url".into(), Value::String(link));
            }
            if let Some(pd) = it.pub_date.as_deref().and_then(normalize_date) {
                raw.insert("posted_date".into(), Value::String(pd));
            }
            if let Some(due) = future_due_date(&description, now) {
                raw.insert("due_date".into(), Value::String(due));
            }
            raw.insert("source_name".into(), Value::String(feed_name.clone()));
            raw.insert("source_type".into(), Value::String("rss".into()));

            out.push(raw);
        }
        Ok(out)
    }
}

/// Find a due-date mention in the item body and keep it only when it parses
/// and lies strictly in the future of `now`.
fn future_due_date(description: &str, now: DateTime<Utc>) -> Option<String> {
    static RE_DUE: OnceCell<Regex> = OnceCell::new();
    let re = RE_DUE.get_or_init(|| {
        Regex::new(r"(?i)(?:bids?\s+due|due\s+date|closing|deadline)[:\s]+(\d{4}-\d{2}-\d{2}|\d{1,2}/\d{1,2}/\d{4})")
            .unwrap()
    });

    let iso = normalize_date(&re.captures(description)?[1])?;
    let parsed = DateTime::parse_from_rfc3339(&iso).ok()?.with_timezone(&Utc);
    (parsed > now).then_some(iso)
}

#[async_trait]
impl SourceAdapter for ConstructionRssAdapter {
    async fn fetch(&self, req: &SourceRequest) -> Result<Vec<RawRecord>> {
        let now = Utc::now();
        let mut out = Vec::new();
        for (i, feed) in self.feeds.iter().enumerate() {
            if i > 0 {
                polite_delay(self.delay_ms, self.jitter_ms).await;
            }
            match get_text(&self.client, &self.cache, feed).await {
                Ok(xml) => match self.parse_feed(&xml, &req.work_type, now) {
                    Ok(records) => out.extend(records),
                    Err(e) => tracing::warn!(error = ?e, feed = %feed, "rss parse failed"),
                },
                Err(e) => tracing::warn!(error = ?e, feed = %feed, "rss fetch failed"),
            }
        }
        Ok(out)
    }

    fn key(&self) -> &'static str {
        "construction_rss"
    }

    fn display_name(&self) -> &'static str {
        "Construction bid RSS feeds"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    fn adapter() -> ConstructionRssAdapter {
        let cfg = DiscoveryConfig::default();
        ConstructionRssAdapter::new(
            &cfg,
            reqwest::Client::new(),
            Arc::new(FetchCache::new(Duration::from_secs(60))),
            Arc::new(WorkTypeKeywords::default()),
        )
    }

    const FEED: &str = r#"<?xml version="1.0"?>
        <rss version="2.0"><channel>
          <title>Example Bid Feed</title>
          <item>
            <title>Access Control Retrofit, Municipal Garage</title>
            <link>https://feeds.example/item/1</link>
            <pubDate>Mon, 04 May 2026 09:00:00 +0000</pubDate>
            <description>Bids due: 2026-06-01. Card readers and CCTV.</description>
          </item>
          <item>
            <title>Old HVAC tender</title>
            <link>https://feeds.example/item/2</link>
            <description>Deadline: 2020-01-01. Chiller replacement.</description>
          </item>
          <item>
            <title>Bridge deck repair</title>
            <link>https://feeds.example/item/3</link>
            <description>Concrete-free zone, steelwork only.</description>
          </item>
        </channel></rss>"#;

    fn fake_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 10, 0, 0, 0).unwrap()
    }

    #[test]
    fn keeps_relevant_item_with_future_due_date() {
        let out = adapter().parse_feed(FEED, "low_voltage", fake_now()).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["title"], "Access Control Retrofit, Municipal Garage");
        assert_eq!(out[0]["due_date"], "2026-06-01T00:00:00.000Z");
        assert_eq!(out[0]["posted_date"], "2026-05-04T09:00:00.000Z");
    }

    #[test]
    fn past_due_date_is_discarded() {
        let out = adapter().parse_feed(FEED, "hvac", fake_now()).unwrap();
        assert_eq!(out.len(), 1);
        assert!(out[0].get("due_date").is_none());
    }

    #[test]
    fn malformed_xml_is_an_error_not_a_panic() {
        assert!(adapter().parse_feed("<rss><chan", "hvac", fake_now()).is_err());
    }
}
