//! Identity fingerprints and cross-run duplicate suppression.
//!
//! Two keys identify a story:
//!
//! - `id_article`: SHA-256 of the canonical URL (or the normalized request
//!   URL when no canonical link is declared), truncated to 12 hex chars.
//!   Deterministic, so the same story URL maps to the same id on every run.
//! - `content_hash`: SHA-256 over the title plus the first 4000 characters
//!   of the body. Catches the same story republished under a different URL.
//!
//! Truncation collisions are statistically negligible and not handled.
//!
//! [`DedupIndex`] holds the key sets loaded from the persisted store plus
//! run-local sets that grow as candidates are accepted, so a story cannot
//! be accepted twice within one run even when two feed entries normalize
//! to the same URL.

use std::collections::HashSet;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::models::ArticleRecord;

/// Width of the truncated URL fingerprint, in hex characters.
const ID_WIDTH: usize = 12;

/// Number of leading content characters covered by the content hash.
const HASH_PREFIX_CHARS: usize = 4000;

/// Compute the stable short article id from a canonical URL.
pub fn article_id(canonical_url: &str) -> String {
    let digest = Sha256::digest(canonical_url.as_bytes());
    hex::encode(digest)[..ID_WIDTH].to_string()
}

/// Compute the content fingerprint over `(title, content prefix)`.
pub fn content_hash(title: &str, content: &str) -> String {
    let prefix: String = content.chars().take(HASH_PREFIX_CHARS).collect();
    let digest = Sha256::digest(format!("{title}|{prefix}").as_bytes());
    hex::encode(digest)
}

/// Key sets deciding whether a candidate record is genuinely new.
#[derive(Debug)]
pub struct DedupIndex {
    known_ids: HashSet<String>,
    known_hashes: HashSet<String>,
    run_ids: HashSet<String>,
    run_hashes: HashSet<String>,
}

impl DedupIndex {
    /// Build an index seeded with the persisted store's key sets. The
    /// run-local sets start empty and are discarded with the index.
    pub fn new(known_ids: HashSet<String>, known_hashes: HashSet<String>) -> Self {
        Self {
            known_ids,
            known_hashes,
            run_ids: HashSet::new(),
            run_hashes: HashSet::new(),
        }
    }

    /// Accept the record if neither of its keys has been seen, recording
    /// both keys in the run-local sets immediately on acceptance.
    ///
    /// Returns `false` for duplicates. Rejection is a normal outcome, not
    /// an error; persisted keys are never mutated.
    pub fn admit(&mut self, record: &ArticleRecord) -> bool {
        if self.known_ids.contains(&record.id_article)
            || self.run_ids.contains(&record.id_article)
        {
            debug!(id_article = %record.id_article, url = %record.url, "Duplicate article id");
            return false;
        }
        if self.known_hashes.contains(&record.content_hash)
            || self.run_hashes.contains(&record.content_hash)
        {
            debug!(id_article = %record.id_article, url = %record.url, "Duplicate content hash");
            return false;
        }
        self.run_ids.insert(record.id_article.clone());
        self.run_hashes.insert(record.content_hash.clone());
        true
    }
}
