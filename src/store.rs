//! The persisted CSV store.
//!
//! An append-only, header-first tabular file keyed for lookup by
//! `id_article` and `content_hash`. The file is created with its header if
//! absent or empty, read once at run start to seed the dedup key sets, and
//! appended once at run end. Rows are never rewritten.

use std::collections::HashSet;
use std::error::Error;
use std::fs::OpenOptions;
use std::path::Path;

use tracing::{info, instrument, warn};

use crate::models::ArticleRecord;

/// Column order of the store, matching [`ArticleRecord`] field order.
pub const COLUMNS: [&str; 11] = [
    "id_article",
    "title",
    "tags",
    "content",
    "url",
    "category",
    "source",
    "author",
    "image",
    "published_date",
    "content_hash",
];

/// Create the store with a header row if it is absent or empty.
///
/// Failure here aborts the run: a store that cannot be initialized is a
/// usage precondition violation, not a per-article hiccup.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn ensure_store(path: &Path) -> Result<(), Box<dyn Error>> {
    let is_empty = match std::fs::metadata(path) {
        Ok(meta) => meta.len() == 0,
        Err(_) => true,
    };
    if is_empty {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(COLUMNS)?;
        writer.flush()?;
        info!("Initialized store with header");
    }
    Ok(())
}

/// Load the `(id_article, content_hash)` key sets from the store.
///
/// Columns are located by header name, so a legacy store written before
/// `content_hash` existed still yields its ids. An unreadable store yields
/// empty sets with a warning rather than aborting; the run then simply
/// re-accepts everything, which the append keeps additive.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn load_known_keys(path: &Path) -> (HashSet<String>, HashSet<String>) {
    let mut ids = HashSet::new();
    let mut hashes = HashSet::new();

    let mut reader = match csv::ReaderBuilder::new().flexible(true).from_path(path) {
        Ok(reader) => reader,
        Err(e) => {
            warn!(error = %e, "Could not open store; starting with empty key sets");
            return (ids, hashes);
        }
    };
    let headers = match reader.headers() {
        Ok(headers) => headers.clone(),
        Err(e) => {
            warn!(error = %e, "Could not read store header; starting with empty key sets");
            return (ids, hashes);
        }
    };
    let Some(id_col) = headers.iter().position(|h| h == "id_article") else {
        warn!("Store has no id_article column; starting with empty key sets");
        return (ids, hashes);
    };
    let hash_col = headers.iter().position(|h| h == "content_hash");

    for row in reader.records() {
        let Ok(row) = row else { continue };
        if let Some(id) = row.get(id_col) {
            if !id.is_empty() {
                ids.insert(id.to_string());
            }
        }
        if let Some(hash) = hash_col.and_then(|col| row.get(col)) {
            if !hash.is_empty() {
                hashes.insert(hash.to_string());
            }
        }
    }
    (ids, hashes)
}

/// Append accepted records without rewriting the header.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = records.len()))]
pub fn append_records(path: &Path, records: &[ArticleRecord]) -> Result<(), Box<dyn Error>> {
    let file = OpenOptions::new().append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    info!(count = records.len(), "Appended new records to store");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::{article_id, content_hash};
    use std::path::PathBuf;

    fn temp_store(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("news_harvester_{}_{}.csv", name, std::process::id()))
    }

    fn record(url: &str, title: &str, content: &str) -> ArticleRecord {
        ArticleRecord {
            id_article: article_id(url),
            title: title.to_string(),
            tags: Some("politics, uk".to_string()),
            content: content.to_string(),
            url: url.to_string(),
            category: "politics".to_string(),
            source: "Example".to_string(),
            author: None,
            image: None,
            published_date: Some("2025-08-01T10:00:00+00:00".to_string()),
            content_hash: content_hash(title, content),
        }
    }

    #[test]
    fn test_ensure_store_writes_header_once() {
        let path = temp_store("header");
        let _ = std::fs::remove_file(&path);

        ensure_store(&path).unwrap();
        let first = std::fs::read_to_string(&path).unwrap();
        assert_eq!(first.trim_end(), COLUMNS.join(","));

        // A second call on a non-empty store must not rewrite anything.
        append_records(&path, &[record("https://example.com/a", "T", "Body")]).unwrap();
        ensure_store(&path).unwrap();
        let after = std::fs::read_to_string(&path).unwrap();
        assert_eq!(after.lines().count(), 2);
        assert!(after.starts_with(&COLUMNS.join(",")));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_appended_keys_are_loaded_back() {
        let path = temp_store("roundtrip");
        let _ = std::fs::remove_file(&path);

        ensure_store(&path).unwrap();
        let one = record("https://example.com/a", "T1", "Body one\n\nwith paragraphs");
        let two = record("https://example.com/b", "T2", "Body two");
        append_records(&path, &[one.clone(), two.clone()]).unwrap();

        let (ids, hashes) = load_known_keys(&path);
        assert!(ids.contains(&one.id_article));
        assert!(ids.contains(&two.id_article));
        assert!(hashes.contains(&one.content_hash));
        assert!(hashes.contains(&two.content_hash));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_store_yields_empty_key_sets() {
        let path = temp_store("missing");
        let _ = std::fs::remove_file(&path);
        let (ids, hashes) = load_known_keys(&path);
        assert!(ids.is_empty());
        assert!(hashes.is_empty());
    }

    #[test]
    fn test_legacy_store_without_content_hash_yields_ids_only() {
        let path = temp_store("legacy");
        std::fs::write(&path, "id_article,title\nabc123def456,Old headline\n").unwrap();
        let (ids, hashes) = load_known_keys(&path);
        assert!(ids.contains("abc123def456"));
        assert!(hashes.is_empty());
        let _ = std::fs::remove_file(&path);
    }
}
