//! Composition of resolved post records into one titled Markdown document.
//!
//! Deterministic: the output depends only on the records and their order.

use super::article::render_article;
use super::post::{PostKind, PostRecord};

/// Character budget for the text excerpt in a derived title.
const TITLE_EXCERPT_CHARS: usize = 50;

/// Compose `(title, markdown_body)` from resolved records.
///
/// `ordering` is discovery-ordered with the requested root first;
/// `requested_url` backs up the root's source URL when a record carries
/// none. An empty ordering composes to empty strings (callers surface that
/// as an error before ever rendering).
#[must_use]
pub fn compose(ordering: &[PostRecord], requested_url: &str) -> (String, String) {
    let Some(root) = ordering.first() else {
        return (String::new(), String::new());
    };

    let title = derive_title(root);

    let mut lines: Vec<String> = Vec::new();
    push_record_block(&mut lines, root, requested_url);

    for (index, record) in ordering.iter().enumerate().skip(1) {
        lines.push(String::new());
        lines.push("---".to_string());
        lines.push(String::new());
        if index == 1 {
            lines.push("> 引用元".to_string());
        } else {
            lines.push(format!("> 関連ポスト ({index})"));
        }
        lines.push(String::new());
        push_record_block(&mut lines, record, requested_url);
    }

    (title, lines.join("\n"))
}

fn derive_title(root: &PostRecord) -> String {
    if let PostKind::Article(body) = &root.kind {
        if body.title.is_empty() {
            return format!("Article by @{}", root.author_handle);
        }
        return body.title.clone();
    }

    if root.text.is_empty() {
        return format!("@{} のポスト", root.author_handle);
    }

    let chars: Vec<char> = root.text.chars().collect();
    if chars.len() > TITLE_EXCERPT_CHARS {
        let excerpt: String = chars[..TITLE_EXCERPT_CHARS].iter().collect();
        format!("@{}: {excerpt}...", root.author_handle)
    } else {
        format!("@{}: {}", root.author_handle, root.text)
    }
}

/// Append one record's block: metadata header, divider, body, images.
/// The block never ends with a blank line; separators between records are
/// the composer's job.
fn push_record_block(lines: &mut Vec<String>, record: &PostRecord, requested_url: &str) {
    lines.push(format!(
        "## {} (@{})",
        record.author_name, record.author_handle
    ));
    if !record.timestamp.is_empty() {
        lines.push(format!("**投稿日時**: {}", record.timestamp));
    }
    let source_url = if record.source_url.is_empty() {
        requested_url
    } else {
        &record.source_url
    };
    if !source_url.is_empty() {
        lines.push(format!("**URL**: {source_url}"));
    }
    lines.push(String::new());
    lines.push("---".to_string());
    lines.push(String::new());

    match &record.kind {
        PostKind::Article(body) => {
            let rendered = render_article(&body.blocks, body.cover_image.as_deref());
            if !rendered.is_empty() {
                lines.push(rendered);
            }
        }
        PostKind::Post => {
            if !record.text.is_empty() {
                lines.push(record.text.clone());
            }
        }
    }

    if !record.images.is_empty() {
        lines.push(String::new());
        lines.push("### 添付画像".to_string());
        lines.push(String::new());
        for (i, image) in record.images.iter().enumerate() {
            lines.push(format!("![画像{}]({image})", i + 1));
        }
    }

    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
}
