//! Shared constants used across the application.

/// User agent string for outbound HTTP and rendered-page requests.
///
/// A realistic browser user agent; some upstreams serve reduced or blocked
/// responses to obvious bot agents.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
