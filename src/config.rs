//! Run configuration.
//!
//! A single [`HarvestConfig`] is loaded from YAML and passed explicitly to
//! the orchestrator; there is no module-level mutable state. Every option
//! except the category/source map has a sensible default, so a minimal
//! config is just a list of feeds:
//!
//! ```yaml
//! categories:
//!   politics: https://feeds.example.com/politics/rss.xml
//!   world:
//!     - https://feeds.example.com/world/rss.xml
//!     - page: https://example.com/world
//!       link_selector: "article a[href]"
//! output: articles.csv
//! ```

use std::collections::{BTreeMap, HashSet};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, instrument};
use url::Url;

/// All recognized options for one harvest run.
#[derive(Debug, Clone, Deserialize)]
pub struct HarvestConfig {
    /// Category label to feed/page source(s). Iterated in key order so
    /// runs are deterministic.
    #[serde(default)]
    pub categories: BTreeMap<String, SourceList>,

    /// Safety cap on candidates per source per run.
    #[serde(default = "default_max_per_source")]
    pub max_per_source: usize,

    /// Politeness delay between article fetches, in seconds.
    #[serde(default = "default_pause_seconds")]
    pub pause_seconds: f64,

    /// Per-request fetch timeout, in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Path of the persisted CSV store.
    #[serde(default = "default_output")]
    pub output: PathBuf,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_accept_language")]
    pub accept_language: String,

    /// Tracking query parameters dropped during URL normalization.
    #[serde(default = "default_strip_query_params")]
    pub strip_query_params: HashSet<String>,

    /// Domain suffix to human-readable publisher name.
    #[serde(default = "default_source_names")]
    pub source_names: BTreeMap<String, String>,

    /// Ordered CSS selectors for the structural body-extraction stage.
    #[serde(default = "default_body_selectors")]
    pub body_selectors: Vec<String>,

    /// Minimum trimmed body length for a page to count as an article.
    #[serde(default = "default_min_content_chars")]
    pub min_content_chars: usize,

    /// Body length at which the extraction cascade stops refining.
    #[serde(default = "default_body_target_chars")]
    pub body_target_chars: usize,
}

/// One or many sources under a category.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SourceList {
    One(SourceSpec),
    Many(Vec<SourceSpec>),
}

impl SourceList {
    pub fn iter(&self) -> impl Iterator<Item = &SourceSpec> {
        match self {
            SourceList::One(spec) => std::slice::from_ref(spec).iter(),
            SourceList::Many(specs) => specs.iter(),
        }
    }
}

/// An RSS/Atom feed URL, or a category page to scrape for links.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SourceSpec {
    /// A bare string is a feed URL.
    Feed(String),
    /// A category page listing article links.
    Page {
        page: String,
        #[serde(default = "default_link_selector")]
        link_selector: String,
    },
}

impl SourceSpec {
    pub fn url(&self) -> &str {
        match self {
            SourceSpec::Feed(url) => url,
            SourceSpec::Page { page, .. } => page,
        }
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            categories: BTreeMap::new(),
            max_per_source: default_max_per_source(),
            pause_seconds: default_pause_seconds(),
            timeout_seconds: default_timeout_seconds(),
            output: default_output(),
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
            strip_query_params: default_strip_query_params(),
            source_names: default_source_names(),
            body_selectors: default_body_selectors(),
            min_content_chars: default_min_content_chars(),
            body_target_chars: default_body_target_chars(),
        }
    }
}

impl HarvestConfig {
    /// Load the configuration from a YAML file.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let raw = std::fs::read_to_string(path)?;
        let config: HarvestConfig = serde_yaml::from_str(&raw)?;
        info!(
            categories = config.categories.len(),
            output = %config.output.display(),
            "Loaded configuration"
        );
        Ok(config)
    }

    pub fn pause(&self) -> Duration {
        Duration::from_secs_f64(self.pause_seconds)
    }

    /// Infer a human-readable publisher name from a URL's domain.
    ///
    /// Strips common subdomain prefixes, suffix-matches against the
    /// configured map, and falls back to the bare host.
    pub fn source_name_for(&self, url: &str) -> String {
        let Ok(parsed) = Url::parse(url) else {
            return "Unknown".to_string();
        };
        let Some(host) = parsed.host_str() else {
            return "Unknown".to_string();
        };
        let mut host = host.to_ascii_lowercase();
        for prefix in ["www.", "edition.", "amp."] {
            if let Some(rest) = host.strip_prefix(prefix) {
                host = rest.to_string();
            }
        }
        for (domain, name) in &self.source_names {
            if host == *domain || host.ends_with(&format!(".{domain}")) {
                return name.clone();
            }
        }
        host
    }
}

pub(crate) fn default_max_per_source() -> usize {
    60
}

pub(crate) fn default_pause_seconds() -> f64 {
    1.2
}

pub(crate) fn default_timeout_seconds() -> u64 {
    20
}

pub(crate) fn default_output() -> PathBuf {
    PathBuf::from("articles.csv")
}

pub(crate) fn default_user_agent() -> String {
    format!(
        "news_harvester/{} (+https://github.com/news-harvester)",
        env!("CARGO_PKG_VERSION")
    )
}

pub(crate) fn default_accept_language() -> String {
    "en;q=0.9, fr;q=0.8".to_string()
}

pub fn default_strip_query_params() -> HashSet<String> {
    [
        "utm_source",
        "utm_medium",
        "utm_campaign",
        "utm_term",
        "utm_content",
        "at_medium",
        "at_campaign",
        "at_custom1",
        "ns_mchannel",
        "ns_source",
        "ns_campaign",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

pub(crate) fn default_source_names() -> BTreeMap<String, String> {
    [
        ("bbc.co.uk", "BBC"),
        ("bbc.com", "BBC"),
        ("cnn.com", "CNN"),
        ("reuters.com", "Reuters"),
        ("aljazeera.com", "Al Jazeera"),
        ("npr.org", "NPR"),
        ("theguardian.com", "The Guardian"),
        ("nytimes.com", "NYTimes"),
        ("washingtonpost.com", "Washington Post"),
        ("espn.com", "ESPN"),
        ("skysports.com", "Sky Sports"),
        ("eurosport.com", "Eurosport"),
    ]
    .into_iter()
    .map(|(domain, name)| (domain.to_string(), name.to_string()))
    .collect()
}

pub(crate) fn default_body_selectors() -> Vec<String> {
    [
        r#"[data-component="text-block"] p"#,
        "article p",
        "main p",
        r#"[class*="RichTextComponentWrapper"] p"#,
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

pub(crate) fn default_link_selector() -> String {
    "article a[href], h3 a[href]".to_string()
}

pub(crate) fn default_min_content_chars() -> usize {
    200
}

pub(crate) fn default_body_target_chars() -> usize {
    800
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_yaml_fills_defaults() {
        let yaml = r#"
categories:
  politics: https://feeds.example.com/politics/rss.xml
"#;
        let config: HarvestConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.max_per_source, 60);
        assert_eq!(config.timeout_seconds, 20);
        assert_eq!(config.min_content_chars, 200);
        assert_eq!(config.body_target_chars, 800);
        assert!(config.strip_query_params.contains("utm_source"));
        assert_eq!(config.output, PathBuf::from("articles.csv"));

        let sources: Vec<_> = config.categories["politics"].iter().collect();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].url(), "https://feeds.example.com/politics/rss.xml");
    }

    #[test]
    fn test_category_accepts_list_and_page_sources() {
        let yaml = r#"
categories:
  world:
    - https://feeds.example.com/world/rss.xml
    - page: https://example.com/world
      link_selector: ".teaser a[href]"
"#;
        let config: HarvestConfig = serde_yaml::from_str(yaml).unwrap();
        let sources: Vec<_> = config.categories["world"].iter().collect();
        assert_eq!(sources.len(), 2);
        assert!(matches!(sources[0], SourceSpec::Feed(_)));
        match sources[1] {
            SourceSpec::Page { page, link_selector } => {
                assert_eq!(page, "https://example.com/world");
                assert_eq!(link_selector, ".teaser a[href]");
            }
            other => panic!("expected page source, got {other:?}"),
        }
    }

    #[test]
    fn test_page_source_gets_default_link_selector() {
        let yaml = r#"
categories:
  tech:
    page: https://example.com/tech
"#;
        let config: HarvestConfig = serde_yaml::from_str(yaml).unwrap();
        let sources: Vec<_> = config.categories["tech"].iter().collect();
        match sources[0] {
            SourceSpec::Page { link_selector, .. } => {
                assert_eq!(link_selector, &default_link_selector());
            }
            other => panic!("expected page source, got {other:?}"),
        }
    }

    #[test]
    fn test_source_name_from_mapped_domain() {
        let config = HarvestConfig::default();
        assert_eq!(
            config.source_name_for("https://www.bbc.co.uk/news/article"),
            "BBC"
        );
        assert_eq!(
            config.source_name_for("https://edition.cnn.com/2025/story"),
            "CNN"
        );
        assert_eq!(
            config.source_name_for("https://amp.theguardian.com/politics/x"),
            "The Guardian"
        );
    }

    #[test]
    fn test_source_name_falls_back_to_host() {
        let config = HarvestConfig::default();
        assert_eq!(
            config.source_name_for("https://news.unknown-outlet.net/story"),
            "news.unknown-outlet.net"
        );
        assert_eq!(config.source_name_for("not a url"), "Unknown");
    }

    #[test]
    fn test_pause_duration() {
        let config = HarvestConfig::default();
        assert_eq!(config.pause(), Duration::from_millis(1200));
    }
}
