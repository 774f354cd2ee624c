//! Best-effort metadata extraction from news-page markup conventions.
//!
//! Every field is independent: a missing or malformed value yields an
//! empty string or `None` for that field and never blocks the others.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use crate::utils::collapse_whitespace;

static H1: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").expect("static selector"));
static OG_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:title"]"#).expect("static selector"));
static OG_IMAGE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:image"]"#).expect("static selector"));
static META_BYL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="byl"]"#).expect("static selector"));
static META_AUTHOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="author"]"#).expect("static selector"));
static META_NEWS_KEYWORDS: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="news_keywords"]"#).expect("static selector"));
static META_KEYWORDS: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="keywords"]"#).expect("static selector"));
static META_PUBLISHED_TIME: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"meta[property="article:published_time"]"#).expect("static selector")
});
static META_ORIGINAL_DATE: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"meta[name="OriginalPublicationDate"]"#).expect("static selector")
});
static TIME_DATETIME: Lazy<Selector> =
    Lazy::new(|| Selector::parse("time[datetime]").expect("static selector"));

fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
}

/// First-level heading text, falling back to `og:title`, then empty.
pub fn extract_title(document: &Html) -> String {
    if let Some(h1) = document.select(&H1).next() {
        let text = collapse_whitespace(&h1.text().collect::<Vec<_>>().join(" "));
        if !text.is_empty() {
            return text;
        }
    }
    meta_content(document, &OG_TITLE).unwrap_or_default()
}

/// Byline-style meta name, then the generic author meta.
pub fn extract_author(document: &Html) -> Option<String> {
    meta_content(document, &META_BYL).or_else(|| meta_content(document, &META_AUTHOR))
}

pub fn extract_image(document: &Html) -> Option<String> {
    meta_content(document, &OG_IMAGE)
}

/// Keywords meta split on commas, lowercased and trimmed, empties dropped,
/// re-joined as a single delimited string.
pub fn extract_tags(document: &Html) -> Option<String> {
    let raw = meta_content(document, &META_NEWS_KEYWORDS)
        .or_else(|| meta_content(document, &META_KEYWORDS))?;
    let tags: Vec<String> = raw
        .split(',')
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect();
    if tags.is_empty() {
        None
    } else {
        Some(tags.join(", "))
    }
}

/// First date-bearing candidate in convention order, parsed to ISO-8601.
/// Parse failures are swallowed to `None`.
pub fn extract_published_date(document: &Html) -> Option<String> {
    let raw = meta_content(document, &META_PUBLISHED_TIME)
        .or_else(|| meta_content(document, &META_ORIGINAL_DATE))
        .or_else(|| {
            document
                .select(&TIME_DATETIME)
                .next()
                .and_then(|el| el.value().attr("datetime"))
                .map(|datetime| datetime.trim().to_string())
                .filter(|datetime| !datetime.is_empty())
        })?;
    parse_date(&raw)
}

fn parse_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.to_rfc3339());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.to_rfc3339());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.to_rfc3339());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.format("%Y-%m-%dT%H:%M:%S").to_string());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.format("%Y-%m-%d").to_string());
    }
    None
}
