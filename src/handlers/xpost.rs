use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::traits::{FetchedPage, SourceHandler};
use crate::config::Config;
use crate::xpost::url::canonicalize_post_url;
use crate::xpost::XPostClient;

static PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"^https?://(www\.|mobile\.)?(twitter\.com|x\.com)/.+/status/\d+").unwrap(),
    ]
});

/// Handler for X posts and articles; delegates to the extraction pipeline.
pub struct XPostHandler {
    client: XPostClient,
}

impl XPostHandler {
    /// # Errors
    ///
    /// Returns an error if the pipeline's HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: XPostClient::new(config)?,
        })
    }
}

#[async_trait]
impl SourceHandler for XPostHandler {
    fn site_id(&self) -> &'static str {
        "x-post"
    }

    fn url_patterns(&self) -> &[Regex] {
        &PATTERNS
    }

    fn priority(&self) -> i32 {
        100
    }

    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let (title, markdown) = self.client.fetch_post(url).await?;
        Ok(FetchedPage {
            title,
            markdown,
            source_url: canonicalize_post_url(url),
        })
    }
}
