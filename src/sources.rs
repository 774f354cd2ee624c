//! Candidate-link listing from feeds and category pages.
//!
//! Both source kinds are normalized at this boundary into
//! [`FeedEntry`] records, so the extraction core never sees feed-library
//! entry shapes or raw anchor elements.
//!
//! Feeds are fetched with the configured headers first and then parsed
//! from the response bytes, which is more reliable than letting a feed
//! library fetch for itself. Category pages follow the homepage-scraping
//! pattern: select anchors, resolve relative hrefs against the page URL,
//! and dedupe while preserving document order.

use std::error::Error;

use itertools::Itertools;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

use crate::config::SourceSpec;
use crate::fetch::Fetcher;
use crate::models::FeedEntry;

/// List up to `cap` candidate article links from one configured source.
#[instrument(level = "info", skip(fetcher), fields(source = %source.url()))]
pub async fn list_candidates(
    fetcher: &Fetcher,
    source: &SourceSpec,
    cap: usize,
) -> Result<Vec<FeedEntry>, Box<dyn Error>> {
    match source {
        SourceSpec::Feed(url) => list_feed_entries(fetcher, url, cap).await,
        SourceSpec::Page {
            page,
            link_selector,
        } => list_page_links(fetcher, page, link_selector, cap).await,
    }
}

async fn list_feed_entries(
    fetcher: &Fetcher,
    feed_url: &str,
    cap: usize,
) -> Result<Vec<FeedEntry>, Box<dyn Error>> {
    let body = fetcher.fetch_text(feed_url).await?;
    let feed = feed_rs::parser::parse(body.as_bytes())?;
    let entries = entries_from_feed(feed, cap);
    info!(count = entries.len(), feed_url, "Listed feed entries");
    Ok(entries)
}

fn entries_from_feed(feed: feed_rs::model::Feed, cap: usize) -> Vec<FeedEntry> {
    let mut out = Vec::new();
    for entry in feed.entries {
        let Some(link) = entry_link(&entry) else {
            debug!(entry_id = %entry.id, "Feed entry has no usable link; skipping");
            continue;
        };
        out.push(FeedEntry {
            link,
            title: entry.title.map(|t| t.content),
        });
        if out.len() == cap {
            break;
        }
    }
    out
}

/// Extract an article URL from a feed entry across variant entry shapes:
/// the alternate (or unqualified) link, any non-empty link, or the entry
/// id when it is itself an absolute http(s) URL.
fn entry_link(entry: &feed_rs::model::Entry) -> Option<String> {
    for link in &entry.links {
        let href = link.href.trim();
        if href.is_empty() {
            continue;
        }
        let rel = link.rel.as_deref().unwrap_or("");
        if rel.is_empty() || rel.eq_ignore_ascii_case("alternate") {
            return Some(href.to_string());
        }
    }
    if let Some(link) = entry.links.iter().find(|l| !l.href.trim().is_empty()) {
        return Some(link.href.trim().to_string());
    }
    let id = entry.id.trim();
    if id.starts_with("http://") || id.starts_with("https://") {
        return Some(id.to_string());
    }
    None
}

async fn list_page_links(
    fetcher: &Fetcher,
    page_url: &str,
    link_selector: &str,
    cap: usize,
) -> Result<Vec<FeedEntry>, Box<dyn Error>> {
    let selector = Selector::parse(link_selector)
        .map_err(|e| format!("invalid link selector {link_selector:?}: {e}"))?;
    let base = Url::parse(page_url)?;
    let html = fetcher.fetch_text(page_url).await?;

    let document = Html::parse_document(&html);
    let entries: Vec<FeedEntry> = document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| base.join(href).ok())
        .map(|resolved| resolved.to_string())
        .unique()
        .take(cap)
        .map(|link| FeedEntry { link, title: None })
        .collect();

    info!(count = entries.len(), page_url, "Listed category page links");
    Ok(entries)
}
