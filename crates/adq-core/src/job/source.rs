//! Source URL checks applied at submit time.

use url::Url;

/// Returns the trimmed URL if it is an absolute http(s) URL with a host.
///
/// # Examples
///
/// - `normalize_source("  https://example.com/watch?v=x ")` → `Some("https://example.com/watch?v=x")`
/// - `normalize_source("ftp://example.com/a")` → `None`
pub fn normalize_source(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = Url::parse(trimmed).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    parsed.host_str().filter(|h| !h.is_empty())?;
    Some(trimmed.to_string())
}

/// Case-insensitive comparison used for duplicate detection.
pub fn same_source(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
