use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to parse {name} as boolean: {value}")]
    ParseBool { name: String, value: String },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Notion
    pub notion_token: String,
    pub notion_database_id: String,
    pub notion_api_url: String,

    // LLM enrichment (disabled when no key is configured)
    pub openai_api_key: Option<String>,
    pub openai_api_url: String,
    pub openai_model: String,

    // Generic site scraping
    pub firecrawl_api_key: Option<String>,
    pub firecrawl_api_url: String,
    pub cookies_file: Option<PathBuf>,

    // X post pipeline
    pub mirror_api_url: String,
    pub mirror_timeout: Duration,
    pub browser_nav_timeout: Duration,
    pub browser_selector_timeout: Duration,
    pub browser_fallback_enabled: bool,
    pub resolve_max_depth: usize,

    // YouTube
    pub yt_dlp_path: String,
    pub subtitle_langs: Vec<String>,

    // Tagging
    pub tags_file: PathBuf,

    // Batch runner
    pub batch_delay: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Notion
            notion_token: required_env("NOTION_TOKEN")?,
            notion_database_id: required_env("NOTION_DATABASE_ID")?,
            notion_api_url: env_or_default("NOTION_API_URL", "https://api.notion.com/v1"),

            // LLM enrichment
            openai_api_key: optional_env("OPENAI_API_KEY"),
            openai_api_url: env_or_default("OPENAI_API_URL", "https://api.openai.com/v1"),
            openai_model: env_or_default("OPENAI_MODEL", "gpt-5-mini"),

            // Generic site scraping
            firecrawl_api_key: optional_env("FIRECRAWL_API_KEY"),
            firecrawl_api_url: env_or_default("FIRECRAWL_API_URL", "https://api.firecrawl.dev"),
            cookies_file: optional_env("COOKIES_FILE").map(PathBuf::from),

            // X post pipeline
            mirror_api_url: env_or_default("X_MIRROR_API_URL", "https://api.fxtwitter.com"),
            mirror_timeout: Duration::from_secs(parse_env_u64("MIRROR_TIMEOUT_SECS", 15)?),
            browser_nav_timeout: Duration::from_secs(parse_env_u64("BROWSER_NAV_TIMEOUT_SECS", 30)?),
            browser_selector_timeout: Duration::from_secs(parse_env_u64(
                "BROWSER_SELECTOR_TIMEOUT_SECS",
                15,
            )?),
            browser_fallback_enabled: parse_env_bool("BROWSER_FALLBACK_ENABLED", true)?,
            resolve_max_depth: parse_env_usize("RESOLVE_MAX_DEPTH", 10)?,

            // YouTube
            yt_dlp_path: env_or_default("YT_DLP_PATH", "yt-dlp"),
            subtitle_langs: parse_lang_list(&env_or_default("SUBTITLE_LANGS", "ja,en")),

            // Tagging
            tags_file: PathBuf::from(env_or_default("TAGS_FILE", "tags.txt")),

            // Batch runner
            batch_delay: Duration::from_secs(parse_env_u64("BATCH_DELAY_SECS", 1)?),
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.notion_token.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "NOTION_TOKEN".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if self.notion_database_id.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "NOTION_DATABASE_ID".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if self.mirror_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "MIRROR_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.browser_nav_timeout.is_zero() || self.browser_selector_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "BROWSER_NAV_TIMEOUT_SECS".to_string(),
                message: "browser timeouts must be at least 1".to_string(),
            });
        }
        if self.subtitle_langs.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "SUBTITLE_LANGS".to_string(),
                message: "must list at least one language".to_string(),
            });
        }
        Ok(())
    }

    /// Configuration for tests: no real endpoints, LLM and browser disabled.
    ///
    /// Tests override individual fields (typically the endpoint URLs, pointed
    /// at a local mock server) via struct update syntax.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            notion_token: "test-token".to_string(),
            notion_database_id: "test-database".to_string(),
            notion_api_url: "http://127.0.0.1:0".to_string(),
            openai_api_key: None,
            openai_api_url: "http://127.0.0.1:0".to_string(),
            openai_model: "gpt-5-mini".to_string(),
            firecrawl_api_key: None,
            firecrawl_api_url: "http://127.0.0.1:0".to_string(),
            cookies_file: None,
            mirror_api_url: "http://127.0.0.1:0".to_string(),
            mirror_timeout: Duration::from_secs(5),
            browser_nav_timeout: Duration::from_secs(5),
            browser_selector_timeout: Duration::from_secs(2),
            browser_fallback_enabled: false,
            resolve_max_depth: 10,
            yt_dlp_path: "yt-dlp".to_string(),
            subtitle_langs: vec!["ja".to_string(), "en".to_string()],
            tags_file: PathBuf::from("tags.txt"),
            batch_delay: Duration::from_millis(0),
        }
    }
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_usize(name: &str, default: usize) -> Result<usize, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::ParseBool {
                name: name.to_string(),
                value: val,
            }),
        },
        _ => Ok(default),
    }
}

fn parse_lang_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .collect()
}
