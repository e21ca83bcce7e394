//! Rendered-page fallback for posts the mirror API cannot serve.
//!
//! A full headless-browser render is expensive and its field extraction is
//! best-effort, so this tier is reserved for the root post after the whole
//! primary pass came back empty. Each invocation owns an isolated browser
//! session: launch, navigate, read, tear down.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures_util::StreamExt;
use scraper::{Html, Selector};
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, warn};

use super::post::{dedup_image_urls, upgrade_image_url, PostKind, PostRecord};
use super::url::extract_post_id;
use crate::config::Config;
use crate::constants::BROWSER_USER_AGENT;

const VIEWPORT_WIDTH: u32 = 1280;
const VIEWPORT_HEIGHT: u32 = 900;

const POST_TEXT_SELECTOR: &str = r#"[data-testid="tweetText"]"#;
const AUTHOR_SELECTOR: &str = r#"[data-testid="User-Name"]"#;
const PHOTO_SELECTOR: &str = r#"[data-testid="tweetPhoto"] img"#;
const TIME_SELECTOR: &str = "time";

/// Capability seam for the rendered-page tier.
///
/// The client is constructed with one of these; when browser automation is
/// switched off the [`DisabledRenderer`] stands in and the fallback simply
/// never produces data.
#[async_trait]
pub trait RenderingBackend: Send + Sync {
    /// Render the post page and extract a minimal record. `None` covers
    /// every failure: launch error, navigation timeout, missing regions.
    async fn fetch(&self, url: &str) -> Option<PostRecord>;
}

/// Backend used when browser automation is disabled by configuration.
pub struct DisabledRenderer;

#[async_trait]
impl RenderingBackend for DisabledRenderer {
    async fn fetch(&self, url: &str) -> Option<PostRecord> {
        debug!(url = %url, "Rendered-page fallback is disabled");
        None
    }
}

/// Headless-chromium rendering backend.
pub struct ChromiumBackend {
    nav_timeout: Duration,
    selector_timeout: Duration,
}

impl ChromiumBackend {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            nav_timeout: config.browser_nav_timeout,
            selector_timeout: config.browser_selector_timeout,
        }
    }

    async fn fetch_inner(&self, url: &str) -> Result<Option<PostRecord>> {
        let browser_config = BrowserConfig::builder()
            .window_size(VIEWPORT_WIDTH, VIEWPORT_HEIGHT)
            .request_timeout(self.nav_timeout)
            .no_sandbox()
            .disable_default_args()
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--mute-audio")
            .arg("--lang=ja-JP")
            .arg(format!("--user-agent={BROWSER_USER_AGENT}"))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {e}"))?;

        let (mut browser, mut handler) = Browser::launch(browser_config)
            .await
            .context("Failed to launch browser")?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {e}");
                }
            }
        });

        // Teardown must run on every exit path, so the page work happens in
        // a helper and its result is only propagated afterwards.
        let result = self.extract_from_page(&browser, url).await;

        if let Err(e) = browser.close().await {
            debug!("Failed to close browser: {e}");
        }
        handler_task.abort();

        result
    }

    async fn extract_from_page(&self, browser: &Browser, url: &str) -> Result<Option<PostRecord>> {
        let page = timeout(self.nav_timeout, browser.new_page(url))
            .await
            .context("Page navigation timed out")?
            .context("Failed to open page")?;

        timeout(self.nav_timeout, page.wait_for_navigation())
            .await
            .context("Page load timed out")?
            .context("Page load failed")?;

        // Post content renders client-side after load; poll for the text
        // region within the configured bound.
        let deadline = Instant::now() + self.selector_timeout;
        loop {
            if page.find_element(POST_TEXT_SELECTOR).await.is_ok() {
                break;
            }
            if Instant::now() >= deadline {
                anyhow::bail!("Timed out waiting for post text to render");
            }
            sleep(Duration::from_millis(250)).await;
        }

        let html = page.content().await.context("Failed to read page HTML")?;

        if let Err(e) = page.close().await {
            debug!("Failed to close page: {e}");
        }

        Ok(parse_rendered_post(&html, url))
    }
}

#[async_trait]
impl RenderingBackend for ChromiumBackend {
    async fn fetch(&self, url: &str) -> Option<PostRecord> {
        debug!(url = %url, "Falling back to rendered-page fetch");
        match self.fetch_inner(url).await {
            Ok(record) => record,
            Err(e) => {
                warn!(url = %url, error = format!("{e:#}"), "Rendered-page fetch failed");
                None
            }
        }
    }
}

/// Extract a minimal post record from rendered page HTML.
///
/// Returns `None` when the main text region is absent. Author and timestamp
/// degrade to empty strings when their regions are missing.
pub(crate) fn parse_rendered_post(html: &str, source_url: &str) -> Option<PostRecord> {
    let id = extract_post_id(source_url).ok()?;
    let document = Html::parse_document(html);

    let text_selector = Selector::parse(POST_TEXT_SELECTOR).ok()?;
    let text_element = document.select(&text_selector).next()?;
    let text = text_element.text().collect::<String>().trim().to_string();

    let (author_name, author_handle) = Selector::parse(AUTHOR_SELECTOR)
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .map(|element| parse_author_block(&element.text().collect::<Vec<_>>().join("\n")))
        })
        .unwrap_or_default();

    let timestamp = Selector::parse(TIME_SELECTOR)
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .and_then(|element| element.value().attr("datetime"))
                .map(str::to_string)
        })
        .unwrap_or_default();

    let images = Selector::parse(PHOTO_SELECTOR)
        .ok()
        .map(|selector| {
            dedup_image_urls(
                document
                    .select(&selector)
                    .filter_map(|img| img.value().attr("src"))
                    .filter(|src| src.contains("pbs.twimg.com"))
                    .map(upgrade_image_url),
            )
        })
        .unwrap_or_default();

    Some(PostRecord {
        id,
        text,
        author_name,
        author_handle,
        timestamp,
        source_url: source_url.to_string(),
        images,
        kind: PostKind::Post,
    })
}

/// Split the author display block: first non-empty line is the display
/// name, first `@`-prefixed token is the handle.
fn parse_author_block(block: &str) -> (String, String) {
    let name = block
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
        .to_string();
    let handle = block
        .split_whitespace()
        .find(|token| token.starts_with('@'))
        .map(|token| token.trim_start_matches('@').to_string())
        .unwrap_or_default();
    (name, handle)
}
