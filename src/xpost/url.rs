//! Post URL canonicalization and ID extraction.

use std::sync::LazyLock;

use regex::Regex;

use super::PostFetchError;

/// Pattern to extract the post ID from a URL.
static POST_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/status/(\d+)").unwrap());

/// Host aliases that all serve the same posts.
static HOST_ALIAS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(www\.|mobile\.)?(twitter\.com|x\.com)").unwrap()
});

/// Extract the numeric post ID from a post URL.
///
/// # Errors
///
/// Returns [`PostFetchError::MalformedUrl`] when the URL has no `/status/<id>`
/// segment (profile URLs, search URLs, and the like).
pub fn extract_post_id(url: &str) -> Result<String, PostFetchError> {
    POST_ID_PATTERN
        .captures(url)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| PostFetchError::MalformedUrl(url.to_string()))
}

/// Rewrite any host alias to the canonical `https://x.com` form.
///
/// URLs on other hosts are returned unchanged.
#[must_use]
pub fn canonicalize_post_url(url: &str) -> String {
    HOST_ALIAS_PATTERN.replace(url, "https://x.com").into_owned()
}
