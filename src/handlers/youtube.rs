use std::collections::BTreeMap;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::traits::{FetchedPage, SourceHandler};
use crate::config::Config;
use crate::llm::{generate_article, ArticleContext, LlmClient};
use crate::subtitles;

static PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"^https?://(www\.)?youtube\.com/watch").unwrap(),
        Regex::new(r"^https?://(www\.)?youtube\.com/shorts/").unwrap(),
        Regex::new(r"^https?://(www\.)?youtube\.com/live/").unwrap(),
        Regex::new(r"^https?://(www\.)?youtube\.com/embed/").unwrap(),
        Regex::new(r"^https?://youtu\.be/").unwrap(),
        Regex::new(r"^https?://m\.youtube\.com/").unwrap(),
    ]
});

/// Subtitle formats in selection order. VTT and SRT get parsed; the rest are
/// a raw-text last resort.
const FORMAT_PREFERENCE: [&str; 6] = ["vtt", "srt", "srv3", "srv2", "srv1", "json3"];

const METADATA_TIMEOUT: Duration = Duration::from_secs(120);
const SUBTITLE_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10);

const MAX_DESCRIPTION_CHARS: usize = 1000;
const MAX_TRANSCRIPT_CHARS: usize = 5000;
/// Transcripts shorter than this are too thin to be worth an article.
const MIN_TRANSCRIPT_CHARS_FOR_ARTICLE: usize = 100;

/// Video metadata from `yt-dlp -J`.
#[derive(Debug, Default, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub view_count: Option<u64>,
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default)]
    pub upload_date: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub webpage_url: Option<String>,
    #[serde(default)]
    pub subtitles: BTreeMap<String, Vec<SubtitleTrack>>,
    #[serde(default)]
    pub automatic_captions: BTreeMap<String, Vec<SubtitleTrack>>,
}

impl VideoInfo {
    fn channel_name(&self) -> Option<&str> {
        self.uploader
            .as_deref()
            .or(self.channel.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// One subtitle track entry from the yt-dlp catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct SubtitleTrack {
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Handler for YouTube videos: metadata plus subtitles via yt-dlp, with an
/// optional model-generated article on top.
pub struct YouTubeHandler {
    http: reqwest::Client,
    yt_dlp_path: String,
    subtitle_langs: Vec<String>,
    llm: Option<Arc<LlmClient>>,
}

impl YouTubeHandler {
    /// # Errors
    ///
    /// Returns an error if the subtitle HTTP client cannot be built.
    pub fn new(config: &Config, llm: Option<Arc<LlmClient>>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(SUBTITLE_DOWNLOAD_TIMEOUT)
            .build()
            .context("Failed to build subtitle HTTP client")?;

        Ok(Self {
            http,
            yt_dlp_path: config.yt_dlp_path.clone(),
            subtitle_langs: config.subtitle_langs.clone(),
            llm,
        })
    }

    /// Run `yt-dlp -J` and parse the metadata JSON.
    async fn fetch_video_info(&self, url: &str) -> Result<VideoInfo> {
        let args = [
            "-4",
            "--no-playlist",
            "-J",
            "--no-download",
            "--no-warnings",
            "--quiet",
            url,
        ];

        debug!(url = %url, "Fetching video metadata");

        let metadata_future = async {
            Command::new(&self.yt_dlp_path)
                .args(args)
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .spawn()
                .context("Failed to spawn yt-dlp")?
                .wait_with_output()
                .await
                .context("Failed to wait for yt-dlp")
        };

        let output = tokio::time::timeout(METADATA_TIMEOUT, metadata_future)
            .await
            .context("yt-dlp metadata fetch timed out")??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp metadata fetch failed: {stderr}");
        }

        serde_json::from_slice(&output.stdout).context("Failed to parse yt-dlp metadata JSON")
    }

    /// Download and parse the best available subtitle track.
    ///
    /// Manual subtitles in any language beat automatic captions; within one
    /// catalog the configured language order wins, then the format order.
    async fn fetch_transcript(&self, info: &VideoInfo) -> Option<String> {
        let selected = select_subtitle_track(&info.subtitles, &self.subtitle_langs)
            .or_else(|| select_subtitle_track(&info.automatic_captions, &self.subtitle_langs))?;

        let (lang, track) = selected;
        let track_url = track.url.as_deref()?;
        let format = track.ext.as_deref().unwrap_or("vtt");

        debug!(lang = %lang, format = %format, "Downloading subtitle track");

        let content = match self.download_subtitle(track_url).await {
            Ok(content) => content,
            Err(e) => {
                warn!(lang = %lang, error = %e, "Subtitle download failed");
                return None;
            }
        };

        let transcript = subtitles::subtitle_to_text(&content, format);
        if transcript.is_empty() {
            None
        } else {
            info!(
                lang = %lang,
                chars = transcript.chars().count(),
                "Fetched transcript"
            );
            Some(transcript)
        }
    }

    async fn download_subtitle(&self, url: &str) -> Result<String> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .context("Subtitle request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("Subtitle request returned {}", response.status());
        }

        response.text().await.context("Failed to read subtitle body")
    }

    /// Generate the embedded article when enrichment is on and the
    /// transcript is substantial enough.
    async fn maybe_generate_article(
        &self,
        info: &VideoInfo,
        transcript: Option<&str>,
        title: &str,
    ) -> Option<String> {
        let llm = self.llm.as_deref()?;
        let transcript = transcript?;
        if transcript.chars().count() <= MIN_TRANSCRIPT_CHARS_FOR_ARTICLE {
            debug!("Transcript too short for article generation");
            return None;
        }

        let context = ArticleContext {
            title: title.to_string(),
            description: info.description.clone(),
            channel: info.channel_name().map(String::from),
            tags: info.tags.clone(),
            duration_secs: info.duration.map(|d| d as u64),
        };

        generate_article(llm, transcript, &context).await
    }
}

#[async_trait]
impl SourceHandler for YouTubeHandler {
    fn site_id(&self) -> &'static str {
        "youtube"
    }

    fn url_patterns(&self) -> &[Regex] {
        &PATTERNS
    }

    fn priority(&self) -> i32 {
        50
    }

    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let info = self.fetch_video_info(url).await?;

        let title = info
            .title
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| url.to_string());

        let transcript = self.fetch_transcript(&info).await;
        let article = self
            .maybe_generate_article(&info, transcript.as_deref(), &title)
            .await;

        let markdown =
            compose_video_markdown(&info, &title, transcript.as_deref(), article.as_deref());
        let source_url = info.webpage_url.clone().unwrap_or_else(|| url.to_string());

        Ok(FetchedPage {
            title,
            markdown,
            source_url,
        })
    }
}

/// Pick a track: configured languages in order, format preference within a
/// language, first track as a last resort, then any language at all.
fn select_subtitle_track<'a>(
    catalog: &'a BTreeMap<String, Vec<SubtitleTrack>>,
    langs: &[String],
) -> Option<(String, &'a SubtitleTrack)> {
    for lang in langs {
        let Some(tracks) = catalog.get(lang) else {
            continue;
        };
        if tracks.is_empty() {
            continue;
        }
        for fmt in FORMAT_PREFERENCE {
            if let Some(track) = tracks.iter().find(|t| t.ext.as_deref() == Some(fmt)) {
                return Some((lang.clone(), track));
            }
        }
        return Some((lang.clone(), &tracks[0]));
    }

    catalog
        .iter()
        .find(|(_, tracks)| !tracks.is_empty())
        .map(|(lang, tracks)| (lang.clone(), &tracks[0]))
}

/// Assemble the Markdown document: optional article, video facts,
/// description, transcript.
fn compose_video_markdown(
    info: &VideoInfo,
    title: &str,
    transcript: Option<&str>,
    article: Option<&str>,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(article) = article {
        parts.push("## 🤖 AI分析記事".to_string());
        parts.push(article.to_string());
        parts.push(String::new());
    }

    parts.push("## 動画情報".to_string());
    parts.push(format!("**タイトル**: {title}"));
    parts.push(format!(
        "**チャンネル**: {}",
        info.channel_name().unwrap_or("不明")
    ));
    parts.push(format!(
        "**公開日**: {}",
        info.upload_date.as_deref().unwrap_or("不明")
    ));
    parts.push(format!(
        "**再生回数**: {}",
        format_count(info.view_count.unwrap_or(0))
    ));
    parts.push(format!(
        "**高評価数**: {}",
        format_count(info.like_count.unwrap_or(0))
    ));

    if let Some(duration) = info.duration {
        let secs = duration as u64;
        if secs > 0 {
            parts.push(format!("**動画の長さ**: {}", format_duration(secs)));
        }
    }

    if !info.tags.is_empty() {
        let tags = info
            .tags
            .iter()
            .take(10)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        parts.push(format!("**タグ**: {tags}"));
    }

    parts.push(String::new());

    if let Some(description) = info.description.as_deref().filter(|d| !d.is_empty()) {
        parts.push("## 説明文".to_string());
        parts.push(description.chars().take(MAX_DESCRIPTION_CHARS).collect());
        if description.chars().count() > MAX_DESCRIPTION_CHARS {
            parts.push("...".to_string());
        }
        parts.push(String::new());
    }

    parts.push("## 字幕・トランスクリプト".to_string());
    match transcript {
        Some(transcript) => {
            if transcript.chars().count() > MAX_TRANSCRIPT_CHARS {
                parts.push(transcript.chars().take(MAX_TRANSCRIPT_CHARS).collect());
                parts.push("\n[字幕が長いため省略されています...]".to_string());
            } else {
                parts.push(transcript.to_string());
            }
        }
        None => parts.push("*字幕が利用できません*".to_string()),
    }

    parts.join("\n")
}

/// 1:23:45-style duration in Japanese units.
fn format_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{hours}時間{minutes}分{seconds}秒")
    } else {
        format!("{minutes}分{seconds}秒")
    }
}

/// Thousands-separated count for display.
fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
