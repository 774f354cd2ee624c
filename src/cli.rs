//! Command-line interface definitions.

use clap::Parser;

/// Command-line arguments for one harvest run.
///
/// # Examples
///
/// ```sh
/// # Run with a config file
/// news_harvester -c harvest.yaml
///
/// # Override the store path and skip the final append
/// news_harvester -c harvest.yaml -o /data/articles.csv --dry-run
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "NEWS_HARVESTER_CONFIG", default_value = "harvest.yaml")]
    pub config: String,

    /// Override the output CSV path from the configuration
    #[arg(short, long)]
    pub output: Option<String>,

    /// Extract and dedup normally but do not append to the store
    #[arg(long)]
    pub dry_run: bool,
}
