// src/discovery/adapters/mod.rs
//! One module per external source, plus the fetch plumbing they share.

pub mod ca_county;
pub mod construction_rss;
pub mod sam_gov;
pub mod web_directory;

use anyhow::{Context, Result};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

use crate::config::DiscoveryConfig;
use crate::discovery::cache::FetchCache;
use crate::discovery::types::SourceAdapter;
use crate::keywords::WorkTypeKeywords;

pub use ca_county::CaCountyAdapter;
pub use construction_rss::ConstructionRssAdapter;
pub use sam_gov::SamGovAdapter;
pub use web_directory::WebDirectoryAdapter;

/// Build the full production adapter set. Every adapter gets its own fetch
/// cache (caches are per-source, never shared across adapters) but they
/// share one HTTP client carrying the configured timeout.
pub fn build_adapters(
    cfg: &DiscoveryConfig,
    keywords: Arc<WorkTypeKeywords>,
) -> Result<Vec<Box<dyn SourceAdapter>>> {
    let client = reqwest::Client::builder()
        .timeout(cfg.request_timeout())
        .user_agent("bid-scout/0.1")
        .build()
        .context("building HTTP client")?;

    let cache = || Arc::new(FetchCache::new(cfg.cache_ttl()));

    Ok(vec![
        Box::new(SamGovAdapter::new(cfg, client.clone(), cache(), keywords.clone())),
        Box::new(CaCountyAdapter::new(cfg, client.clone(), cache(), keywords.clone())),
        Box::new(ConstructionRssAdapter::new(cfg, client.clone(), cache(), keywords.clone())),
        Box::new(WebDirectoryAdapter::new(cfg, client, cache(), keywords)),
    ])
}

/// Fetch a URL body through the adapter's cache. Network and status errors
/// come back as `Err` for the caller to degrade.
pub(crate) async fn get_text(
    client: &reqwest::Client,
    cache: &FetchCache,
    url: &str,
) -> Result<String> {
    if let Some(body) = cache.get(url) {
        return Ok(body);
    }

    let resp = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("GET {url}"))?;
    let resp = resp
        .error_for_status()
        .with_context(|| format!("non-2xx from {url}"))?;
    let body = resp.text().await.with_context(|| format!("reading body of {url}"))?;

    cache.put(url, &body);
    Ok(body)
}

/// Sleep between successive requests to the same host: base delay plus
/// random jitter, to stay under anti-bot rate limits. Sequential within one
/// adapter only; other adapters keep making progress concurrently.
pub(crate) async fn polite_delay(base_ms: u64, jitter_ms: u64) {
    let jitter = if jitter_ms > 0 {
        rand::rng().random_range(0..jitter_ms)
    } else {
        0
    };
    tokio::time::sleep(Duration::from_millis(base_ms + jitter)).await;
}

/// Strip markup from a scraped fragment: decode entities, drop tags,
/// collapse whitespace.
pub(crate) fn clean_fragment(s: &str) -> String {
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());

    let decoded = html_escape::decode_html_entities(s).to_string();
    let stripped = re_tags.replace_all(&decoded, " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First `href` attribute inside a markup fragment, if any.
pub(crate) fn first_href(s: &str) -> Option<String> {
    static RE_HREF: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re = RE_HREF.get_or_init(|| {
        regex::Regex::new(r#"(?i)href\s*=\s*["']([^"']+)["']"#).unwrap()
    });
    re.captures(s).map(|c| c[1].to_string())
}
