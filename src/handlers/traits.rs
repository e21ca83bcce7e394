use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;

/// A page fetched from some source, normalized to Markdown.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Title of the content; handlers always provide one, falling back to
    /// the URL when nothing better exists.
    pub title: String,
    /// Markdown body.
    pub markdown: String,
    /// Canonical URL of the content (may differ from the requested URL).
    pub source_url: String,
}

/// Trait for site-specific URL handlers.
#[async_trait]
pub trait SourceHandler: Send + Sync {
    /// Unique identifier for this handler.
    fn site_id(&self) -> &'static str;

    /// URL patterns this handler matches.
    fn url_patterns(&self) -> &[Regex];

    /// Check if this handler can handle the given URL.
    fn can_handle(&self, url: &str) -> bool {
        self.url_patterns().iter().any(|p| p.is_match(url))
    }

    /// Priority for handler selection (higher = preferred).
    fn priority(&self) -> i32 {
        0
    }

    /// Fetch the URL and normalize it to Markdown.
    ///
    /// # Errors
    ///
    /// Returns an error when the content cannot be retrieved or converted.
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}
