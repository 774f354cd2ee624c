//! The body-extraction cascade.
//!
//! No single technique reliably extracts body text across heterogeneous,
//! template-varying news sites, so four strategies run as an ordered
//! cascade. Each later stage is attempted only while the best text so far
//! is under the target length, and each stage keeps its result only when
//! it is longer than the current best — a good result is never degraded.
//!
//! 1. Readability-style main-content extraction over the full document
//! 2. Structural selector extraction with the paragraph-cleaning rule
//! 3. JSON-LD `articleBody` scan across embedded structured-data blocks
//! 4. AMP alternate-page fetch, re-running a lightweight stage 2
//!
//! Stages 1–3 need no I/O and run in [`extract_body_static`]; the AMP
//! stage lives with the page-level orchestration in the parent module
//! because it fetches.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::utils::collapse_whitespace;

/// Class-attribute substrings marking boilerplate containers.
const BOILERPLATE_MARKERS: [&str; 5] = ["promo", "share", "related", "advert", "cookie"];

/// Ancestor elements whose text is never body copy.
const EXCLUDED_ANCESTORS: [&str; 6] = ["figure", "figcaption", "aside", "header", "footer", "nav"];

static JSON_LD: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).expect("static selector"));
static AMP_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"link[rel="amphtml"]"#).expect("static selector"));
static AMP_ARTICLE_P: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article p").expect("static selector"));
static AMP_MAIN_P: Lazy<Selector> = Lazy::new(|| Selector::parse("main p").expect("static selector"));
static AMP_ANY_P: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("static selector"));

/// Result of the three I/O-free cascade stages.
#[derive(Debug)]
pub struct StaticExtract {
    /// Longest body text found so far; may still be below the target.
    pub text: String,
    /// AMP alternate-page URL, present only when the text is still short
    /// and the document declares one.
    pub amp_href: Option<String>,
}

pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Run cascade stages 1–3 against a fetched document.
pub fn extract_body_static(
    html: &str,
    page_url: &Url,
    selectors: &[String],
    target_chars: usize,
) -> StaticExtract {
    let mut best = readability_text(html, page_url).unwrap_or_default();
    trace!(chars = char_len(&best), "Readability stage yield");

    let document = Html::parse_document(html);

    if char_len(&best) < target_chars {
        if let Some(text) = select_paragraph_text(&document, selectors) {
            if char_len(&text) > char_len(&best) {
                best = text;
            }
        }
        trace!(chars = char_len(&best), "Selector stage yield");
    }

    if char_len(&best) < target_chars {
        if let Some(body) = json_ld_body(&document, char_len(&best), target_chars) {
            best = body;
        }
        trace!(chars = char_len(&best), "JSON-LD stage yield");
    }

    let amp_href = if char_len(&best) < target_chars {
        amp_href(&document)
    } else {
        None
    };

    StaticExtract { text: best, amp_href }
}

fn readability_text(html: &str, page_url: &Url) -> Option<String> {
    match readability::extractor::extract(&mut html.as_bytes(), page_url) {
        Ok(product) => {
            let text = collapse_whitespace(&product.text);
            if text.is_empty() { None } else { Some(text) }
        }
        Err(e) => {
            debug!(error = %e, "Readability extraction failed");
            None
        }
    }
}

/// Stage 2: first selector pattern with a non-empty match set wins; the
/// matched paragraph nodes are joined under the paragraph-cleaning rule.
fn select_paragraph_text(document: &Html, selectors: &[String]) -> Option<String> {
    for pattern in selectors {
        let Ok(selector) = Selector::parse(pattern) else {
            debug!(pattern, "Skipping unparsable body selector");
            continue;
        };
        let nodes: Vec<ElementRef> = document.select(&selector).collect();
        if !nodes.is_empty() {
            return Some(clean_paragraphs(&nodes));
        }
    }
    None
}

/// The paragraph-cleaning rule: take each node's trimmed visible text,
/// discard texts under 3 chars, nodes carrying a boilerplate class marker,
/// and nodes inside an excluded or marked ancestor; join survivors with a
/// blank line in document order.
pub fn clean_paragraphs(nodes: &[ElementRef]) -> String {
    let mut kept = Vec::new();
    for node in nodes {
        let text = collapse_whitespace(&node.text().collect::<Vec<_>>().join(" "));
        if char_len(&text) < 3 {
            continue;
        }
        if class_has_marker(node.value().attr("class")) {
            continue;
        }
        if has_excluded_ancestor(*node) {
            continue;
        }
        kept.push(text);
    }
    kept.join("\n\n").trim().to_string()
}

fn class_has_marker(class: Option<&str>) -> bool {
    let Some(class) = class else { return false };
    let class = class.to_ascii_lowercase();
    BOILERPLATE_MARKERS.iter().any(|marker| class.contains(marker))
}

fn has_excluded_ancestor(element: ElementRef) -> bool {
    for node in element.ancestors() {
        if let Some(ancestor) = ElementRef::wrap(node) {
            if EXCLUDED_ANCESTORS.contains(&ancestor.value().name()) {
                return true;
            }
            if class_has_marker(ancestor.value().attr("class")) {
                return true;
            }
        }
    }
    false
}

/// Stage 3: scan JSON-LD blocks for Article-typed objects and take the
/// longest `articleBody` beating the current best. Unparsable blocks are
/// skipped, never fatal.
fn json_ld_body(document: &Html, mut best_chars: usize, target_chars: usize) -> Option<String> {
    let mut found = None;
    for script in document.select(&JSON_LD) {
        let raw = script.text().collect::<String>();
        let Ok(data) = serde_json::from_str::<Value>(&raw) else {
            continue;
        };
        let objects = match data {
            Value::Array(items) => items,
            other => vec![other],
        };
        for object in objects {
            if !is_article_type(&object) {
                continue;
            }
            if let Some(body) = object.get("articleBody").and_then(Value::as_str) {
                let body = body.trim();
                if char_len(body) > best_chars {
                    best_chars = char_len(body);
                    found = Some(body.to_string());
                }
            }
        }
        if best_chars >= target_chars {
            break;
        }
    }
    found
}

fn is_article_type(object: &Value) -> bool {
    match object.get("@type") {
        Some(Value::String(t)) => t == "NewsArticle" || t == "Article",
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|t| t == "NewsArticle" || t == "Article"),
        _ => false,
    }
}

fn amp_href(document: &Html) -> Option<String> {
    document
        .select(&AMP_LINK)
        .next()
        .and_then(|el| el.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
}

/// Stage 4 body text from a fetched AMP page: the same paragraph-cleaning
/// rule over a fixed lightweight selector cascade.
pub fn amp_paragraph_text(amp_html: &str) -> String {
    let document = Html::parse_document(amp_html);
    for selector in [&*AMP_ARTICLE_P, &*AMP_MAIN_P, &*AMP_ANY_P] {
        let nodes: Vec<ElementRef> = document.select(selector).collect();
        if !nodes.is_empty() {
            return clean_paragraphs(&nodes);
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_body_selectors;

    fn page_url() -> Url {
        Url::parse("https://example.com/story").unwrap()
    }

    fn extract(html: &str) -> StaticExtract {
        extract_body_static(html, &page_url(), &default_body_selectors(), 800)
    }

    fn paragraphs(html: &str, selector: &str) -> String {
        let document = Html::parse_document(html);
        let selector = Selector::parse(selector).unwrap();
        let nodes: Vec<ElementRef> = document.select(&selector).collect();
        clean_paragraphs(&nodes)
    }

    #[test]
    fn test_clean_paragraphs_joins_in_document_order() {
        let got = paragraphs(
            "<article><p>First paragraph here.</p><p>Second paragraph here.</p></article>",
            "article p",
        );
        assert_eq!(got, "First paragraph here.\n\nSecond paragraph here.");
    }

    #[test]
    fn test_clean_paragraphs_drops_short_texts() {
        let got = paragraphs(
            "<article><p>ok</p><p>A real paragraph of text.</p></article>",
            "article p",
        );
        assert_eq!(got, "A real paragraph of text.");
    }

    #[test]
    fn test_advert_class_is_excluded_even_when_long() {
        let got = paragraphs(
            r#"<article>
                 <p>Real body copy that belongs in the article.</p>
                 <p class="inline-advert-unit">This long promotional text is an ad and must not appear in output.</p>
               </article>"#,
            "article p",
        );
        assert!(got.contains("Real body copy"));
        assert!(!got.contains("promotional text"));
    }

    #[test]
    fn test_marked_and_structural_ancestors_are_excluded() {
        let got = paragraphs(
            r#"<article>
                 <p>Body paragraph.</p>
                 <figure><figcaption><p>A caption under a figure element.</p></figcaption></figure>
                 <aside><p>Sidebar content not part of the story.</p></aside>
                 <div class="related-stories"><p>Read more of our related coverage.</p></div>
               </article>"#,
            "article p",
        );
        assert_eq!(got, "Body paragraph.");
    }

    #[test]
    fn test_json_ld_only_document_yields_article_body() {
        let body = "Structured data body text. ".repeat(12);
        let body = body.trim();
        let html = format!(
            r#"<html><head><script type="application/ld+json">
               {{"@context":"https://schema.org","@type":"Article","articleBody":"{body}"}}
               </script></head><body><div>nothing selectable</div></body></html>"#
        );
        let got = extract(&html);
        assert_eq!(got.text, body);
        assert!(char_len(&got.text) >= 200);
    }

    #[test]
    fn test_unparsable_json_ld_block_is_skipped() {
        let body = "Fallback structured body text. ".repeat(10);
        let body = body.trim();
        let html = format!(
            r#"<html><head>
               <script type="application/ld+json">{{not valid json</script>
               <script type="application/ld+json">{{"@type":"NewsArticle","articleBody":"{body}"}}</script>
               </head><body></body></html>"#
        );
        assert_eq!(extract(&html).text, body);
    }

    #[test]
    fn test_json_ld_array_and_type_list_are_accepted() {
        let body = "Array-wrapped body text for the story. ".repeat(8);
        let body = body.trim();
        let html = format!(
            r#"<html><head><script type="application/ld+json">
               [{{"@type":"WebPage"}},{{"@type":["NewsArticle","Thing"],"articleBody":"{body}"}}]
               </script></head><body></body></html>"#
        );
        assert_eq!(extract(&html).text, body);
    }

    #[test]
    fn test_selector_stage_fills_in_for_short_readability_yield() {
        let paragraph = "A full sentence of article body copy for the selector stage. ";
        let html = format!(
            "<html><body><main><article>{}</article></main></body></html>",
            (0..6)
                .map(|i| format!("<p>{}{}</p>", paragraph, i))
                .collect::<String>()
        );
        let got = extract(&html);
        assert!(got.text.contains("selector stage"));
        assert!(char_len(&got.text) >= 200);
    }

    #[test]
    fn test_amp_href_exposed_only_when_text_is_short() {
        let html = r#"<html><head><link rel="amphtml" href="https://example.com/amp/story"></head>
                      <body><p>Too short.</p></body></html>"#;
        let got = extract(html);
        assert_eq!(got.amp_href.as_deref(), Some("https://example.com/amp/story"));

        let body = format!(
            r#"<html><head><link rel="amphtml" href="https://example.com/amp/story"></head>
               <body><article>{}</article></body></html>"#,
            (0..40)
                .map(|i| format!("<p>Long enough paragraph of body text number {i}.</p>"))
                .collect::<String>()
        );
        let got = extract(&body);
        assert!(char_len(&got.text) >= 800);
        assert_eq!(got.amp_href, None);
    }

    #[test]
    fn test_amp_paragraph_text_uses_lightweight_cascade() {
        let html = r#"<html><body>
            <p>Loose paragraph outside any article element, still body copy.</p>
            <p class="share-tools">Share this story on social media.</p>
        </body></html>"#;
        let got = amp_paragraph_text(html);
        assert!(got.contains("Loose paragraph"));
        assert!(!got.contains("Share this story"));
    }
}
