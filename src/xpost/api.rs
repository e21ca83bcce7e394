//! Client for the unofficial mirror API used as the primary post source.
//!
//! The mirror serves the same `/<handle>/status/<id>` paths as the social
//! network itself and answers with JSON shaped around a `tweet` key. Every
//! failure mode here (network error, non-success status, malformed body,
//! missing payload) is logged and collapsed to `None`; the graph resolver
//! treats that as "skip this edge".

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use super::article::ArticleBlock;
use crate::config::Config;
use crate::constants::BROWSER_USER_AGENT;

/// Top-level mirror API response.
#[derive(Debug, Deserialize)]
pub struct MirrorResponse {
    pub tweet: Option<MirrorPost>,
}

/// One post as served by the mirror API.
///
/// `quote` and `article` are genuinely optional on the wire; absent nested
/// objects deserialize to `None` rather than scattering null checks through
/// the pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct MirrorPost {
    #[serde(default)]
    pub text: String,
    pub author: Option<MirrorAuthor>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub url: String,
    pub media: Option<MirrorMedia>,
    pub quote: Option<Box<MirrorPost>>,
    pub article: Option<MirrorArticle>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MirrorAuthor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub screen_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MirrorMedia {
    #[serde(default)]
    pub photos: Vec<MirrorPhoto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MirrorPhoto {
    #[serde(default)]
    pub url: String,
}

/// Long-form article payload attached to a post.
#[derive(Debug, Clone, Deserialize)]
pub struct MirrorArticle {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub created_at: String,
    pub content: Option<MirrorArticleContent>,
    pub cover_media: Option<MirrorCoverMedia>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MirrorArticleContent {
    #[serde(default)]
    pub blocks: Vec<ArticleBlock>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MirrorCoverMedia {
    #[serde(default)]
    pub url: String,
}

/// Anything the graph resolver can pull posts from.
///
/// The only production implementation is [`MirrorClient`]; tests substitute
/// an in-memory map to exercise traversal without a network.
#[async_trait]
pub trait PostSource: Send + Sync {
    /// Fetch one post by its canonical URL. `None` means the edge is dead.
    async fn fetch_post(&self, url: &str) -> Option<MirrorPost>;
}

/// HTTP client for the mirror API.
pub struct MirrorClient {
    http: reqwest::Client,
    base_url: String,
}

impl MirrorClient {
    /// Build a client with the configured mirror base URL and timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.mirror_timeout)
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .context("Failed to build mirror API client")?;
        Ok(Self {
            http,
            base_url: config.mirror_api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch one post, rewriting the post URL's host to the mirror base and
    /// preserving the path. Single attempt, no retries.
    pub async fn fetch(&self, post_url: &str) -> Option<MirrorPost> {
        let request_url = match self.request_url(post_url) {
            Ok(url) => url,
            Err(e) => {
                warn!(url = %post_url, error = %e, "Cannot build mirror API request");
                return None;
            }
        };

        debug!(url = %request_url, "Fetching post from mirror API");

        let response = match self.http.get(&request_url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %post_url, error = %e, "Mirror API request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(url = %post_url, status = %response.status(), "Mirror API returned error status");
            return None;
        }

        let body: MirrorResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                warn!(url = %post_url, error = %e, "Mirror API returned malformed JSON");
                return None;
            }
        };

        match body.tweet {
            Some(post) => Some(post),
            None => {
                warn!(url = %post_url, "Mirror API response has no tweet payload");
                None
            }
        }
    }

    fn request_url(&self, post_url: &str) -> Result<String> {
        let parsed =
            Url::parse(post_url).with_context(|| format!("invalid post URL: {post_url}"))?;
        Ok(format!("{}{}", self.base_url, parsed.path()))
    }
}

#[async_trait]
impl PostSource for MirrorClient {
    async fn fetch_post(&self, url: &str) -> Option<MirrorPost> {
        self.fetch(url).await
    }
}
