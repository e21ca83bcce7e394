use std::path::Path;

use tracing::{debug, warn};

use super::{LlmClient, Message};

const MAX_TAGS: usize = 5;
const MAX_CONTENT_CHARS: usize = 3000;

/// Load the tag allow-list from a file, one tag per line.
///
/// A missing or unreadable file yields an empty list with a warning; tagging
/// is best-effort.
pub async fn load_tags_from_file(path: &Path) -> Vec<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not read tags file, tagging disabled");
            Vec::new()
        }
    }
}

/// Ask the model to pick up to five tags for the content.
///
/// The reply is filtered against `available_tags`; anything the model invents
/// is dropped. Any failure yields an empty list, never an error.
pub async fn predict_tags(
    llm: &LlmClient,
    content: &str,
    title: &str,
    available_tags: &[String],
) -> Vec<String> {
    if available_tags.is_empty() {
        debug!("No available tags, skipping prediction");
        return Vec::new();
    }

    // Keep the request small; the head of the content is enough signal.
    let trimmed_content: String = content.chars().take(MAX_CONTENT_CHARS).collect();
    let tags_str = available_tags.join(", ");

    let messages = vec![
        Message::system(format!(
            "あなたはコンテンツに適したタグを選択する専門家です。\
             以下のタグリストからコンテンツに最も関連するタグを選んでください: {tags_str}"
        )),
        Message::user(format!(
            "タイトル: {title}\n\nコンテンツ: {trimmed_content}\n\n\
             このコンテンツに最適なタグを{MAX_TAGS}個以内で選んでください。\
             タグはカンマ区切りのリストとして返してください。\
             提示されたタグリスト以外のタグは使用しないでください。"
        )),
    ];

    match llm.chat(messages, Some(150)).await {
        Ok(reply) => {
            let predicted = parse_tag_reply(&reply, available_tags);
            debug!(tags = ?predicted, "Predicted tags");
            predicted
        }
        Err(e) => {
            warn!(error = %e, "Tag prediction failed");
            Vec::new()
        }
    }
}

/// Split a comma-separated model reply into tags, keeping only entries from
/// the allow-list and at most [`MAX_TAGS`] of them.
fn parse_tag_reply(reply: &str, available_tags: &[String]) -> Vec<String> {
    reply
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .filter(|tag| available_tags.iter().any(|a| a == tag))
        .take(MAX_TAGS)
        .map(String::from)
        .collect()
}
