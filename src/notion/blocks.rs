//! Markdown to Notion block conversion.
//!
//! The API caps rich text at 2000 characters per block, so paragraphs are
//! chunked below that.

use serde_json::{json, Value};

/// Per-block character cap, kept under the API's 2000 limit.
const MAX_TEXT_CHARS: usize = 1990;

/// Lead-in blocks placed before the clipped content on every page.
pub fn intro_blocks() -> Vec<Value> {
    vec![
        paragraph_block("以下、抽出したコンテンツ："),
        json!({
            "object": "block",
            "type": "divider",
            "divider": {}
        }),
    ]
}

/// Split Markdown into paragraph blocks on blank lines, chunking any
/// paragraph longer than the per-block cap.
pub fn markdown_to_blocks(content: &str) -> Vec<Value> {
    let mut blocks = Vec::new();

    for paragraph in content.split("\n\n") {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }

        if paragraph.chars().count() <= MAX_TEXT_CHARS {
            blocks.push(paragraph_block(paragraph));
        } else {
            let chars: Vec<char> = paragraph.chars().collect();
            for chunk in chars.chunks(MAX_TEXT_CHARS) {
                blocks.push(paragraph_block(&chunk.iter().collect::<String>()));
            }
        }
    }

    blocks
}

fn paragraph_block(text: &str) -> Value {
    json!({
        "object": "block",
        "type": "paragraph",
        "paragraph": {
            "rich_text": [{
                "type": "text",
                "text": { "content": text }
            }]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_text(block: &Value) -> &str {
        block["paragraph"]["rich_text"][0]["text"]["content"]
            .as_str()
            .unwrap()
    }

    #[test]
    fn test_markdown_to_blocks_splits_paragraphs() {
        let blocks = markdown_to_blocks("最初の段落\n\n次の段落\n続きの行");

        assert_eq!(blocks.len(), 2);
        assert_eq!(block_text(&blocks[0]), "最初の段落");
        assert_eq!(block_text(&blocks[1]), "次の段落\n続きの行");
    }

    #[test]
    fn test_markdown_to_blocks_skips_blank_paragraphs() {
        let blocks = markdown_to_blocks("a\n\n   \n\n\n\nb");

        assert_eq!(blocks.len(), 2);
        assert_eq!(block_text(&blocks[0]), "a");
        assert_eq!(block_text(&blocks[1]), "b");
    }

    #[test]
    fn test_markdown_to_blocks_empty_input() {
        assert!(markdown_to_blocks("").is_empty());
        assert!(markdown_to_blocks("\n\n\n\n").is_empty());
    }

    #[test]
    fn test_markdown_to_blocks_chunks_long_paragraph() {
        // Multibyte characters: the cap counts characters, not bytes.
        let long = "あ".repeat(2000);
        let blocks = markdown_to_blocks(&long);

        assert_eq!(blocks.len(), 2);
        assert_eq!(block_text(&blocks[0]).chars().count(), 1990);
        assert_eq!(block_text(&blocks[1]).chars().count(), 10);
    }

    #[test]
    fn test_intro_blocks_shape() {
        let blocks = intro_blocks();

        assert_eq!(blocks.len(), 2);
        assert_eq!(block_text(&blocks[0]), "以下、抽出したコンテンツ：");
        assert_eq!(blocks[1]["type"], "divider");
    }
}
