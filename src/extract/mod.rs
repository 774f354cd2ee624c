//! Per-page extraction: raw HTML in, candidate [`ArticleRecord`] out.
//!
//! Metadata and body extraction are independent and run in sequence over
//! the same parsed document; the body cascade's AMP stage may fetch one
//! alternate page. A page whose best body text is still under the minimum
//! length after the full cascade yields no record at all — extraction
//! fails closed rather than producing a thin article.

pub mod body;
pub mod metadata;

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use crate::config::HarvestConfig;
use crate::dedup;
use crate::fetch::Fetcher;
use crate::models::ArticleRecord;
use crate::normalize::normalize_url;

use body::{char_len, StaticExtract};

static CANONICAL_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"link[rel="canonical"]"#).expect("static selector"));

/// Everything the parsed document yields without further I/O. Scanning is
/// a single synchronous pass so the non-`Send` DOM never lives across an
/// await point.
struct PageScan {
    canonical: Option<String>,
    title: String,
    author: Option<String>,
    image: Option<String>,
    tags: Option<String>,
    published_date: Option<String>,
    body: StaticExtract,
}

fn scan_page(html: &str, page_url: &Url, config: &HarvestConfig) -> PageScan {
    let document = Html::parse_document(html);
    let canonical = document
        .select(&CANONICAL_LINK)
        .next()
        .and_then(|el| el.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty());

    PageScan {
        canonical,
        title: metadata::extract_title(&document),
        author: metadata::extract_author(&document),
        image: metadata::extract_image(&document),
        tags: metadata::extract_tags(&document),
        published_date: metadata::extract_published_date(&document),
        body: body::extract_body_static(
            html,
            page_url,
            &config.body_selectors,
            config.body_target_chars,
        ),
    }
}

/// Extract a candidate record from a fetched page.
///
/// Returns `None` for thin content; identity keys are computed from the
/// canonical URL when the page declares one, else the normalized request
/// URL.
#[instrument(level = "debug", skip(fetcher, config, html), fields(%url, category))]
pub async fn parse_article(
    fetcher: &Fetcher,
    config: &HarvestConfig,
    html: &str,
    url: &str,
    category: &str,
) -> Option<ArticleRecord> {
    let norm_url = normalize_url(url, &config.strip_query_params);
    let page_url = Url::parse(&norm_url).ok().or_else(|| Url::parse(url).ok())?;

    let scan = scan_page(html, &page_url, config);

    let identity_url = scan
        .canonical
        .as_deref()
        .map(|canonical| normalize_url(canonical, &config.strip_query_params))
        .unwrap_or_else(|| norm_url.clone());

    let mut content = scan.body.text;
    if char_len(&content) < config.body_target_chars {
        if let Some(amp) = scan.body.amp_href {
            content = amp_fallback(fetcher, &page_url, &amp, content).await;
        }
    }

    let content = content.trim().to_string();
    if char_len(&content) < config.min_content_chars {
        debug!(
            chars = char_len(&content),
            min = config.min_content_chars,
            "Body below minimum length; no article"
        );
        return None;
    }

    Some(ArticleRecord {
        id_article: dedup::article_id(&identity_url),
        content_hash: dedup::content_hash(&scan.title, &content),
        source: config.source_name_for(&identity_url),
        title: scan.title,
        tags: scan.tags,
        content,
        url: identity_url,
        category: category.to_string(),
        author: scan.author,
        image: scan.image,
        published_date: scan.published_date,
    })
}

/// Stage 4: fetch the declared AMP page and keep its paragraph text only
/// when longer than the current best. Fetch failures are non-fatal.
async fn amp_fallback(fetcher: &Fetcher, page_url: &Url, amp: &str, best: String) -> String {
    let amp_url = match page_url.join(amp) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => amp.to_string(),
    };
    match fetcher.fetch_text(&amp_url).await {
        Ok(amp_html) => {
            let amp_text = body::amp_paragraph_text(&amp_html);
            if char_len(&amp_text) > char_len(&best) {
                debug!(url = %amp_url, chars = char_len(&amp_text), "AMP fallback improved body");
                amp_text
            } else {
                best
            }
        }
        Err(e) => {
            debug!(url = %amp_url, error = %e, "AMP fetch failed; keeping current body");
            best
        }
    }
}
