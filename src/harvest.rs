//! The ingestion orchestrator.
//!
//! Drives one sequential run: for each configured (category, source) pair,
//! list a bounded set of candidate links, normalize each early, fetch,
//! extract, dedup, and pause the politeness interval between fetches. No
//! concurrent fetches; the dedup sets and the accepted list are owned here
//! for the run's duration.
//!
//! Per-article failures are logged and skipped; a source that fails to
//! list is skipped with a warning and the run continues. Accepted records
//! are appended to the store once at the end of a clean run — a crash
//! mid-run loses that run's unflushed records, which is a documented
//! limitation of the at-end flush, not a bug.

use std::error::Error;

use tracing::{debug, info, instrument, warn};

use crate::config::HarvestConfig;
use crate::dedup::DedupIndex;
use crate::extract;
use crate::fetch::Fetcher;
use crate::models::ArticleRecord;
use crate::normalize::normalize_url;
use crate::sources;
use crate::store;
use crate::utils::truncate_for_log;

/// Counts reported at the end of a run.
#[derive(Debug, Default)]
pub struct HarvestSummary {
    pub candidates: usize,
    pub accepted: usize,
    pub duplicates: usize,
    pub no_article: usize,
    pub failed_fetches: usize,
    pub failed_sources: usize,
}

/// Outcome of one candidate link. Duplicate rejection and thin content
/// are expected outcomes, not errors.
enum CandidateOutcome {
    Accepted(ArticleRecord),
    Duplicate,
    NoArticle,
    FetchFailed,
}

/// Run the full ingestion pipeline against the configuration.
///
/// The store is initialized and its key sets loaded before any fetch;
/// failure to initialize or append aborts the run.
#[instrument(level = "info", skip_all)]
pub async fn run(
    config: &HarvestConfig,
    fetcher: &Fetcher,
    dry_run: bool,
) -> Result<HarvestSummary, Box<dyn Error>> {
    store::ensure_store(&config.output)?;
    let (known_ids, known_hashes) = store::load_known_keys(&config.output);
    info!(
        known_ids = known_ids.len(),
        known_hashes = known_hashes.len(),
        "Seeded dedup keys from store"
    );
    let mut dedup = DedupIndex::new(known_ids, known_hashes);

    let mut accepted: Vec<ArticleRecord> = Vec::new();
    let mut summary = HarvestSummary::default();

    for (category, source_list) in &config.categories {
        for source in source_list.iter() {
            let entries =
                match sources::list_candidates(fetcher, source, config.max_per_source).await {
                    Ok(entries) => entries,
                    Err(e) => {
                        warn!(
                            category = %category,
                            source = %source.url(),
                            error = %e,
                            "Source listing failed; skipping source"
                        );
                        summary.failed_sources += 1;
                        continue;
                    }
                };

            for entry in entries {
                summary.candidates += 1;
                let link = normalize_url(&entry.link, &config.strip_query_params);

                match process_candidate(fetcher, config, &mut dedup, &link, category).await {
                    CandidateOutcome::Accepted(record) => {
                        info!(
                            title = %truncate_for_log(&record.title, 80),
                            url = %record.url,
                            category = %record.category,
                            "Accepted article"
                        );
                        accepted.push(record);
                        summary.accepted += 1;
                    }
                    CandidateOutcome::Duplicate => {
                        debug!(url = %link, "Duplicate article; skipping");
                        summary.duplicates += 1;
                    }
                    CandidateOutcome::NoArticle => {
                        debug!(url = %link, "No usable article; skipping");
                        summary.no_article += 1;
                    }
                    CandidateOutcome::FetchFailed => {
                        summary.failed_fetches += 1;
                    }
                }

                tokio::time::sleep(config.pause()).await;
            }
        }
    }

    if dry_run {
        info!(accepted = accepted.len(), "Dry run; not appending to store");
    } else if accepted.is_empty() {
        info!("No new articles");
    } else {
        store::append_records(&config.output, &accepted)?;
    }

    Ok(summary)
}

async fn process_candidate(
    fetcher: &Fetcher,
    config: &HarvestConfig,
    dedup: &mut DedupIndex,
    link: &str,
    category: &str,
) -> CandidateOutcome {
    let html = match fetcher.fetch_text(link).await {
        Ok(html) => html,
        Err(e) => {
            warn!(url = %link, error = %e, "Fetch failed; skipping article");
            return CandidateOutcome::FetchFailed;
        }
    };

    let Some(record) = extract::parse_article(fetcher, config, &html, link, category).await else {
        return CandidateOutcome::NoArticle;
    };

    if !dedup.admit(&record) {
        return CandidateOutcome::Duplicate;
    }
    CandidateOutcome::Accepted(record)
}
