//! Data models for harvested articles.
//!
//! - [`ArticleRecord`]: one extracted, deduplicated article, serialized as a
//!   CSV row in the persisted store (field order is the column order)
//! - [`FeedEntry`]: the fixed internal shape every feed entry or scraped
//!   category-page link is normalized into before the core sees it

use serde::{Deserialize, Serialize};

/// A fully extracted article, ready for dedup and persistence.
///
/// Field order matters: the CSV store serializes records in declaration
/// order, matching [`crate::store::COLUMNS`]. Optional fields serialize as
/// empty cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Short fingerprint of the canonical URL; stable across runs.
    pub id_article: String,
    /// Headline text; may be empty when the page declares none.
    pub title: String,
    /// Comma-joined lowercase keywords, when the page declares any.
    pub tags: Option<String>,
    /// Normalized multi-paragraph body text, at least the minimum length.
    pub content: String,
    /// Canonical URL when the page declares one, else the normalized
    /// request URL.
    pub url: String,
    /// Caller-supplied category label from the configuration.
    pub category: String,
    /// Human-readable publisher name inferred from the domain.
    pub source: String,
    pub author: Option<String>,
    pub image: Option<String>,
    /// ISO-8601 publication timestamp, when one could be parsed.
    pub published_date: Option<String>,
    /// Fingerprint over title plus content prefix; catches the same story
    /// republished under a different URL.
    pub content_hash: String,
}

/// A candidate article link, normalized from whatever shape the upstream
/// feed or category page provided.
#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub link: String,
    pub title: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_optionals_as_empty_csv_cells() {
        let record = ArticleRecord {
            id_article: "abc123def456".to_string(),
            title: "Headline".to_string(),
            tags: None,
            content: "Body".to_string(),
            url: "https://example.com/a".to_string(),
            category: "politics".to_string(),
            source: "Example".to_string(),
            author: None,
            image: None,
            published_date: None,
            content_hash: "deadbeef".to_string(),
        };

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(vec![]);
        writer.serialize(&record).unwrap();
        let row = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(
            row.trim_end(),
            "abc123def456,Headline,,Body,https://example.com/a,politics,Example,,,,deadbeef"
        );
    }

    #[test]
    fn test_record_roundtrips_through_csv() {
        let record = ArticleRecord {
            id_article: "abc123def456".to_string(),
            title: "A, quoted \"headline\"".to_string(),
            tags: Some("politics, uk".to_string()),
            content: "Line one.\n\nLine two.".to_string(),
            url: "https://example.com/a".to_string(),
            category: "politics".to_string(),
            source: "Example".to_string(),
            author: Some("Jo Reporter".to_string()),
            image: Some("https://example.com/a.jpg".to_string()),
            published_date: Some("2025-08-01T10:00:00+00:00".to_string()),
            content_hash: "deadbeef".to_string(),
        };

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(vec![]);
        writer.serialize(&record).unwrap();
        let bytes = writer.into_inner().unwrap();

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(&bytes[..]);
        let back: ArticleRecord = reader.deserialize().next().unwrap().unwrap();
        assert_eq!(back.title, record.title);
        assert_eq!(back.content, record.content);
        assert_eq!(back.tags, record.tags);
        assert_eq!(back.published_date, record.published_date);
    }
}
