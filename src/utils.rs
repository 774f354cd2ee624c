//! Small string helpers shared across extraction and logging.

/// Collapse runs of whitespace to single spaces and trim the ends.
///
/// DOM text nodes arrive with the source markup's indentation and line
/// breaks; visible text compares and measures correctly only after
/// collapsing.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at `max` characters with an ellipsis and a count
/// of the omitted characters appended. Cuts at character boundaries, so
/// multi-byte titles never split mid-codepoint.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let total = s.chars().count();
    if total <= max {
        return s.to_string();
    }
    let head: String = s.chars().take(max).collect();
    format!("{}…(+{} chars)", head, total - max)
}
