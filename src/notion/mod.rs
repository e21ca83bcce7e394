//! Notion database registration.
//!
//! Clipped documents become pages in a database: properties carry the
//! title, source URL and predicted tags, the body carries the Markdown
//! rendered as paragraph blocks.

mod blocks;

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::config::Config;

pub use blocks::{intro_blocks, markdown_to_blocks};

const NOTION_VERSION: &str = "2022-06-28";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// API limit is 100 children per append; stay under it.
const MAX_BLOCKS_PER_REQUEST: usize = 90;

#[derive(Debug, Deserialize)]
struct CreatedPage {
    id: String,
    #[serde(default)]
    url: Option<String>,
}

pub struct NotionClient {
    http: reqwest::Client,
    base_url: String,
    database_id: String,
}

impl NotionClient {
    /// # Errors
    ///
    /// Returns an error if the token is not a valid header value or the
    /// HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.notion_token))
            .context("NOTION_TOKEN is not a valid header value")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert("Notion-Version", HeaderValue::from_static(NOTION_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build Notion HTTP client")?;

        Ok(Self {
            http,
            base_url: config.notion_api_url.trim_end_matches('/').to_string(),
            database_id: config.notion_database_id.clone(),
        })
    }

    /// Create a database page for a clipped document and fill its body.
    ///
    /// The page is created from properties alone, then the intro blocks
    /// and the content blocks are appended in batches.
    ///
    /// # Errors
    ///
    /// Returns an error if any API request fails.
    pub async fn register_page(
        &self,
        title: &str,
        url: &str,
        markdown: &str,
        tags: &[String],
    ) -> Result<String> {
        let page = self.create_page(title, url, tags).await?;
        info!(page_id = %page.id, title = %title, "Created page");

        self.append_children(&page.id, &intro_blocks()).await?;

        let blocks = markdown_to_blocks(markdown);
        let total_batches = blocks.len().div_ceil(MAX_BLOCKS_PER_REQUEST).max(1);
        for (i, batch) in blocks.chunks(MAX_BLOCKS_PER_REQUEST).enumerate() {
            self.append_children(&page.id, batch).await?;
            debug!(batch = i + 1, total = total_batches, "Appended block batch");
        }

        Ok(page.url.unwrap_or_else(|| {
            format!("https://www.notion.so/{}", page.id.replace('-', ""))
        }))
    }

    async fn create_page(&self, title: &str, url: &str, tags: &[String]) -> Result<CreatedPage> {
        let mut properties = json!({
            "タイトル": {
                "title": [{ "text": { "content": title } }]
            },
            "URL": { "url": url }
        });
        if !tags.is_empty() {
            properties["タグ"] = json!({
                "multi_select": tags.iter().map(|tag| json!({ "name": tag })).collect::<Vec<_>>()
            });
        }

        let body = json!({
            "parent": {
                "type": "database_id",
                "database_id": self.database_id
            },
            "properties": properties
        });

        let response = self
            .http
            .post(format!("{}/pages", self.base_url))
            .json(&body)
            .send()
            .await
            .context("Page creation request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Page creation returned {status}: {body}");
        }

        response
            .json()
            .await
            .context("Failed to parse page creation response")
    }

    async fn append_children(&self, page_id: &str, children: &[Value]) -> Result<()> {
        let response = self
            .http
            .patch(format!("{}/blocks/{}/children", self.base_url, page_id))
            .json(&json!({ "children": children }))
            .send()
            .await
            .context("Block append request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Block append returned {status}: {body}");
        }

        Ok(())
    }
}
