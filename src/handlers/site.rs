use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::traits::{FetchedPage, SourceHandler};
use crate::config::Config;

static PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| vec![Regex::new(r"^https?://").unwrap()]);

const SCRAPE_TIMEOUT: Duration = Duration::from_secs(60);
/// Server-side scrape budget, milliseconds.
const SCRAPE_BUDGET_MS: u64 = 30_000;

#[derive(Debug, Serialize)]
struct ScrapeRequest<'a> {
    url: &'a str,
    formats: Vec<&'a str>,
    #[serde(rename = "onlyMainContent")]
    only_main_content: bool,
    timeout: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    headers: Option<ScrapeHeaders>,
}

#[derive(Debug, Serialize)]
struct ScrapeHeaders {
    #[serde(rename = "Cookie")]
    cookie: String,
}

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<ScrapeData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScrapeData {
    #[serde(default)]
    markdown: Option<String>,
    #[serde(default)]
    metadata: Option<ScrapeMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct ScrapeMetadata {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, rename = "ogTitle")]
    og_title: Option<String>,
    #[serde(default, rename = "twitterTitle")]
    twitter_title: Option<String>,
    #[serde(default, rename = "pageTitle")]
    page_title: Option<String>,
    #[serde(default, rename = "dcTitle")]
    dc_title: Option<String>,
}

impl ScrapeMetadata {
    /// First non-blank candidate across the known title fields.
    fn best_title(&self) -> Option<String> {
        [
            self.title.as_deref(),
            self.og_title.as_deref(),
            self.twitter_title.as_deref(),
            self.page_title.as_deref(),
            self.dc_title.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|t| !t.is_empty())
        .map(String::from)
    }
}

/// Entry in a browser-exported JSON cookie file.
#[derive(Debug, Deserialize)]
struct CookieEntry {
    name: String,
    value: String,
}

/// Catch-all handler: converts any page to Markdown through a hosted
/// scrape API. Registered at the lowest priority so site-specific
/// handlers always win.
pub struct GenericSiteHandler {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    cookies_file: Option<PathBuf>,
}

impl GenericSiteHandler {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(SCRAPE_TIMEOUT)
            .build()
            .context("Failed to build scrape HTTP client")?;

        Ok(Self {
            http,
            api_key: config.firecrawl_api_key.clone(),
            base_url: config.firecrawl_api_url.trim_end_matches('/').to_string(),
            cookies_file: config.cookies_file.clone(),
        })
    }

    /// Build a `Cookie` header value from the configured cookie file, if
    /// any. Unreadable or malformed files are logged and skipped.
    async fn cookie_header(&self) -> Option<String> {
        let path = self.cookies_file.as_ref()?;

        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Cookie file not readable");
                return None;
            }
        };

        let entries: Vec<CookieEntry> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cookie file is not valid JSON");
                return None;
            }
        };

        let header = entries
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ");

        if header.is_empty() {
            None
        } else {
            Some(header)
        }
    }
}

#[async_trait]
impl SourceHandler for GenericSiteHandler {
    fn site_id(&self) -> &'static str {
        "generic"
    }

    fn url_patterns(&self) -> &[Regex] {
        &PATTERNS
    }

    fn priority(&self) -> i32 {
        -100
    }

    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let Some(api_key) = self.api_key.as_deref() else {
            anyhow::bail!("FIRECRAWL_API_KEY is not set; cannot scrape {url}");
        };

        let cookie = self.cookie_header().await;
        let request = ScrapeRequest {
            url,
            formats: vec!["markdown"],
            only_main_content: true,
            timeout: SCRAPE_BUDGET_MS,
            headers: cookie.map(|cookie| ScrapeHeaders { cookie }),
        };

        debug!(url = %url, "Scraping page");

        let response = self
            .http
            .post(format!("{}/v2/scrape", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .context("Scrape request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Scrape API returned {status}: {body}");
        }

        let scrape: ScrapeResponse = response
            .json()
            .await
            .context("Failed to parse scrape response")?;

        if let Some(error) = scrape.error {
            anyhow::bail!("Scrape API error: {error}");
        }
        let data = scrape
            .data
            .filter(|_| scrape.success)
            .context("Scrape response carried no data")?;

        let markdown = data
            .markdown
            .filter(|m| !m.is_empty())
            .context("Scrape response carried no markdown")?;

        let title = data
            .metadata
            .as_ref()
            .and_then(ScrapeMetadata::best_title)
            .unwrap_or_else(|| url.to_string());

        Ok(FetchedPage {
            title,
            markdown,
            source_url: url.to_string(),
        })
    }
}
