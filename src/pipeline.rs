//! End-to-end clipping pipeline: dispatch a URL to its handler, enrich the
//! result, register it in Notion.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::Config;
use crate::handlers::{build_registry, HandlerRegistry};
use crate::llm::{self, LlmClient};
use crate::notion::NotionClient;

/// What a successful clip produced.
#[derive(Debug)]
pub struct ClipOutcome {
    pub title: String,
    pub page_url: String,
    pub handler: &'static str,
}

pub struct Pipeline {
    registry: HandlerRegistry,
    notion: NotionClient,
    llm: Option<Arc<LlmClient>>,
    tags_file: PathBuf,
}

impl Pipeline {
    /// # Errors
    ///
    /// Returns an error if any client fails to construct.
    pub fn from_config(config: &Config) -> Result<Self> {
        let llm = LlmClient::from_config(config)?.map(Arc::new);
        if llm.is_none() {
            info!("No OpenAI API key configured; enrichment disabled");
        }

        Ok(Self {
            registry: build_registry(config, llm.clone())?,
            notion: NotionClient::new(config)?,
            llm,
            tags_file: config.tags_file.clone(),
        })
    }

    /// Clip one URL into a Notion page.
    ///
    /// # Errors
    ///
    /// Returns an error if no handler matches, the fetch fails, or the
    /// Notion registration fails. Enrichment failures degrade silently.
    pub async fn process_url(&self, url: &str) -> Result<ClipOutcome> {
        let handler = self
            .registry
            .find_handler(url)
            .with_context(|| format!("No handler matches {url}"))?;

        info!(url = %url, handler = handler.site_id(), "Processing URL");

        let page = handler.fetch(url).await?;
        if page.markdown.trim().is_empty() {
            anyhow::bail!("Fetched empty content from {url}");
        }

        let title = self.finalize_title(page.title).await;
        let tags = self.predict_tags(&page.markdown, &title).await;

        let page_url = self
            .notion
            .register_page(&title, &page.source_url, &page.markdown, &tags)
            .await?;

        info!(
            title = %title,
            page_url = %page_url,
            tags = ?tags,
            "Registered page"
        );

        Ok(ClipOutcome {
            title,
            page_url,
            handler: handler.site_id(),
        })
    }

    /// Translate a predominantly non-Japanese title, keeping the original
    /// in parentheses. Any failure keeps the title as is.
    async fn finalize_title(&self, title: String) -> String {
        let Some(llm) = self.llm.as_deref() else {
            return title;
        };
        if !llm::is_non_japanese_title(&title) {
            return title;
        }

        match llm::translate_title(llm, &title).await {
            Some(translated) => format!("{translated} (原題: {title})"),
            None => title,
        }
    }

    async fn predict_tags(&self, content: &str, title: &str) -> Vec<String> {
        let Some(llm) = self.llm.as_deref() else {
            return Vec::new();
        };

        let available = llm::load_tags_from_file(&self.tags_file).await;
        if available.is_empty() {
            debug!(path = %self.tags_file.display(), "No tag list available; skipping prediction");
            return Vec::new();
        }

        llm::predict_tags(llm, content, title, &available).await
    }
}

/// Parse a URL list file: one URL per line, blank lines and `#` comments
/// skipped.
#[must_use]
pub fn parse_url_list(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}
