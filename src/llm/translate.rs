use tracing::{debug, warn};

use super::{LlmClient, Message};

/// Share of Japanese characters below which a title counts as non-Japanese.
const JAPANESE_RATIO_THRESHOLD: f64 = 0.2;

/// Heuristic language check: true when fewer than 20% of the characters fall
/// in the Japanese Unicode ranges (above U+3000).
#[must_use]
pub fn is_non_japanese_title(title: &str) -> bool {
    if title.is_empty() {
        return true;
    }

    let total = title.chars().count();
    let japanese = title.chars().filter(|c| *c as u32 > 0x3000).count();

    (japanese as f64) / (total as f64) < JAPANESE_RATIO_THRESHOLD
}

/// Translate a title into Japanese.
///
/// Returns `None` when the title is empty, already contains Japanese text, or
/// the request fails; the caller keeps the original title in every such case.
pub async fn translate_title(llm: &LlmClient, title: &str) -> Option<String> {
    if title.is_empty() {
        return None;
    }

    if title.chars().any(|c| c as u32 > 0x3000) {
        debug!(title = %title, "Title already contains Japanese, skipping translation");
        return None;
    }

    let messages = vec![
        Message::system(
            "あなたは優秀なenからjaへの翻訳者です。与えられたテキストを適切に翻訳してください。\
             翻訳のみを返し、余計な説明は不要です。",
        ),
        Message::user(format!("以下のタイトルを翻訳してください：\n{title}")),
    ];

    match llm.chat(messages, Some(100)).await {
        Ok(reply) => {
            let translated = reply.trim().to_string();
            if translated.is_empty() {
                None
            } else {
                debug!(original = %title, translated = %translated, "Translated title");
                Some(translated)
            }
        }
        Err(e) => {
            warn!(error = %e, "Title translation failed");
            None
        }
    }
}
