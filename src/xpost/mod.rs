//! Multi-tier extraction of X posts into Markdown.
//!
//! The pipeline: canonicalize the URL, resolve the post and everything it
//! references through the mirror API (quotes and in-text links, bounded
//! depth-first), fall back to a rendered page for the root only when the
//! whole primary pass produced nothing, then compose a single titled
//! Markdown document.

pub mod api;
pub mod article;
pub mod markdown;
pub mod post;
pub mod refs;
pub mod render;
pub mod resolver;
pub mod url;

use anyhow::Result;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;
use api::MirrorClient;
use post::PostRecord;
use render::{ChromiumBackend, DisabledRenderer, RenderingBackend};
use resolver::Resolver;
// `self::` disambiguates the submodule from the `url` crate.
use self::url::{canonicalize_post_url, extract_post_id};

/// Failures surfaced by [`XPostClient::fetch_post`].
///
/// Per-edge upstream failures during graph resolution are logged and
/// swallowed; only these two are the caller's problem.
#[derive(Debug, Error)]
pub enum PostFetchError {
    /// The URL carries no `/status/<id>` segment.
    #[error("URL has no post ID (expected a /status/ link): {0}")]
    MalformedUrl(String),
    /// Neither the mirror API nor the rendered-page fallback produced the
    /// root post.
    #[error("post could not be retrieved from the mirror API or a rendered page: {0}")]
    Unavailable(String),
}

/// Client for the X post extraction pipeline.
pub struct XPostClient {
    mirror: MirrorClient,
    renderer: Box<dyn RenderingBackend>,
    max_depth: usize,
}

impl XPostClient {
    /// Build a client from configuration. The rendering backend is chosen
    /// here: real chromium when the fallback is enabled, otherwise a
    /// backend that never produces data.
    ///
    /// # Errors
    ///
    /// Returns an error if the mirror HTTP client cannot be constructed.
    pub fn new(config: &Config) -> Result<Self> {
        let renderer: Box<dyn RenderingBackend> = if config.browser_fallback_enabled {
            Box::new(ChromiumBackend::new(config))
        } else {
            Box::new(DisabledRenderer)
        };
        Self::with_renderer(config, renderer)
    }

    /// Build a client with an explicit rendering backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the mirror HTTP client cannot be constructed.
    pub fn with_renderer(config: &Config, renderer: Box<dyn RenderingBackend>) -> Result<Self> {
        Ok(Self {
            mirror: MirrorClient::new(config)?,
            renderer,
            max_depth: config.resolve_max_depth,
        })
    }

    /// Fetch a post and everything it references, composed into
    /// `(title, markdown)`.
    ///
    /// # Errors
    ///
    /// [`PostFetchError::MalformedUrl`] when the URL has no post ID;
    /// [`PostFetchError::Unavailable`] when both fetch tiers come back
    /// empty for the root post.
    pub async fn fetch_post(&self, url: &str) -> Result<(String, String), PostFetchError> {
        let canonical = canonicalize_post_url(url);
        extract_post_id(&canonical)?;

        info!(url = %canonical, "Fetching post");

        let resolver = Resolver::new(&self.mirror, self.max_depth);
        let mut records: Vec<PostRecord> = resolver.resolve(&canonical).await;

        if records.is_empty() {
            debug!(url = %canonical, "Primary pass produced nothing, trying rendered page");
            if let Some(record) = self.renderer.fetch(&canonical).await {
                records = vec![record];
            }
        }

        if records.is_empty() {
            return Err(PostFetchError::Unavailable(canonical));
        }

        info!(url = %canonical, records = records.len(), "Post resolved");
        Ok(markdown::compose(&records, &canonical))
    }
}
