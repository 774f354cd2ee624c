//! # News Harvester
//!
//! Ingests news articles from RSS/Atom feeds and category pages, extracts
//! clean article text and metadata from arbitrary news-site HTML, and
//! appends only genuinely new articles to a persistent CSV dataset.
//!
//! ## Usage
//!
//! ```sh
//! news_harvester -c harvest.yaml
//! ```
//!
//! ## Architecture
//!
//! One sequential pipeline per run:
//! 1. **Listing**: discover candidate article URLs per configured
//!    (category, source) pair, from feeds or scraped category pages
//! 2. **Extraction**: fetch each page and run the metadata extractor and
//!    the four-stage body cascade over it
//! 3. **Dedup**: reject candidates whose URL fingerprint or content hash
//!    has been seen, in this run or in the persisted store
//! 4. **Persistence**: append accepted records to the CSV store at run end

use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod config;
mod dedup;
mod extract;
mod fetch;
mod harvest;
mod models;
mod normalize;
mod sources;
mod store;
mod utils;

use cli::Cli;
use config::HarvestConfig;
use fetch::Fetcher;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_harvester starting up");

    let args = Cli::parse();
    debug!(?args.config, ?args.output, args.dry_run, "Parsed CLI arguments");

    let mut config = match HarvestConfig::load(Path::new(&args.config)) {
        Ok(config) => config,
        Err(e) => {
            error!(path = %args.config, error = %e, "Failed to load configuration");
            return Err(e);
        }
    };
    if let Some(output) = args.output {
        config.output = PathBuf::from(output);
    }
    if config.categories.is_empty() {
        warn!("Configuration lists no categories; nothing to harvest");
    }

    let fetcher = Fetcher::new(&config)?;

    let summary = harvest::run(&config, &fetcher, args.dry_run).await?;

    let elapsed = start_time.elapsed();
    info!(
        candidates = summary.candidates,
        accepted = summary.accepted,
        duplicates = summary.duplicates,
        no_article = summary.no_article,
        failed_fetches = summary.failed_fetches,
        failed_sources = summary.failed_sources,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Harvest complete"
    );

    Ok(())
}
