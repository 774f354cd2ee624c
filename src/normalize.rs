//! Canonical-form URL normalization.
//!
//! Cosmetically distinct URLs pointing at the same resource must normalize
//! to an identical string, since the normalized URL feeds the article
//! fingerprint. Normalization lowercases scheme and host, strips the
//! fragment, trims the trailing slash from the path, and drops tracking
//! query parameters while preserving the order, repeats, and blank values
//! of the remaining pairs.
//!
//! Normalization is best-effort: a string that does not parse as an
//! absolute URL is returned trimmed, never an error. Relative URLs must be
//! resolved against a base before they reach this module.

use std::collections::HashSet;
use url::Url;

/// Normalize an absolute URL into its canonical comparison form.
///
/// # Arguments
///
/// * `raw` - The URL to normalize
/// * `deny` - Query parameter names to drop (tracking parameters)
///
/// # Examples
///
/// ```ignore
/// let deny = default_strip_query_params();
/// assert_eq!(
///     normalize_url("HTTPS://Example.com/news/?utm_source=x#frag", &deny),
///     "https://example.com/news"
/// );
/// ```
pub fn normalize_url(raw: &str, deny: &HashSet<String>) -> String {
    let raw = raw.trim();
    let Ok(parsed) = Url::parse(raw) else {
        return raw.to_string();
    };

    let scheme = parsed.scheme().to_ascii_lowercase();
    let host = parsed
        .host_str()
        .map(|h| h.to_ascii_lowercase())
        .unwrap_or_default();
    let port = match parsed.port() {
        Some(p) => format!(":{p}"),
        None => String::new(),
    };
    // Root path "/" trims to the empty string, so "https://host/" and
    // "https://host" compare equal.
    let path = parsed.path().trim_end_matches('/');

    let query = parsed
        .query_pairs()
        .filter(|(key, _)| !deny.contains(key.as_ref()))
        .map(|(key, value)| {
            format!("{}={}", urlencoding::encode(&key), urlencoding::encode(&value))
        })
        .collect::<Vec<_>>()
        .join("&");

    let mut out = format!("{scheme}://{host}{port}{path}");
    if !query.is_empty() {
        out.push('?');
        out.push_str(&query);
    }
    out
}
