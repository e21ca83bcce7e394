//! Minimal chat-completions client plus the enrichment helpers built on it
//! (tag prediction, title translation, transcript-to-article generation).

mod article;
mod tags;
mod translate;

pub use article::{generate_article, ArticleContext};
pub use tags::{load_tags_from_file, predict_tags};
pub use translate::{is_non_japanese_title, translate_title};

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Chat completion request body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,
}

/// One conversation message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Chat-completions API client.
///
/// Construct with [`LlmClient::from_config`]; it returns `None` when no API
/// key is configured, and every enrichment caller treats that as "feature
/// off" rather than an error.
#[derive(Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl LlmClient {
    /// Build a client from configuration, or `None` when no API key is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        let Some(api_key) = config.openai_api_key.clone() else {
            debug!("No LLM API key configured, enrichment disabled");
            return Ok(None);
        };

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build LLM HTTP client")?;

        Ok(Some(Self {
            http,
            api_key,
            base_url: config.openai_api_url.trim_end_matches('/').to_string(),
            model: config.openai_model.clone(),
        }))
    }

    /// Send one chat completion and return the first choice's content.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, a non-success status, or a
    /// response without choices.
    pub async fn chat(
        &self,
        messages: Vec<Message>,
        max_completion_tokens: Option<u32>,
    ) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            max_completion_tokens,
        };

        let start = std::time::Instant::now();
        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .context("Chat completion request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Chat completion API error");
            anyhow::bail!("Chat completion API returned {status}: {body}");
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("Failed to parse chat completion response")?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .context("Chat completion response had no choices")?;

        debug!(
            model = %self.model,
            duration_ms = start.elapsed().as_millis(),
            "Chat completion finished"
        );

        Ok(content)
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}
