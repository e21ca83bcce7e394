//! Rendering of long-form article blocks into Markdown.
//!
//! Articles arrive as an ordered list of typed blocks with Draft.js-style
//! inline style ranges. Rendering is a pure function of the block list, so
//! article records can stay unrendered until the composer asks for Markdown.

use std::collections::BTreeSet;

use serde::Deserialize;

/// One semantic unit of an article body.
#[derive(Debug, Clone, Deserialize)]
pub struct ArticleBlock {
    #[serde(rename = "type", default)]
    pub kind: BlockKind,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "inlineStyleRanges", default)]
    pub style_ranges: Vec<StyleRange>,
}

/// Block types supported by the article body model.
///
/// Unrecognized wire values degrade to `Unstyled` (a plain paragraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum BlockKind {
    #[serde(rename = "header-one")]
    HeaderOne,
    #[serde(rename = "header-two")]
    HeaderTwo,
    #[serde(rename = "unordered-list-item")]
    UnorderedItem,
    #[serde(rename = "ordered-list-item")]
    OrderedItem,
    #[serde(rename = "blockquote")]
    Blockquote,
    #[serde(rename = "atomic")]
    Atomic,
    #[default]
    #[serde(other)]
    Unstyled,
}

impl BlockKind {
    const fn is_list_item(self) -> bool {
        matches!(self, Self::UnorderedItem | Self::OrderedItem)
    }
}

/// An inline style applied to a character range of a block's text.
#[derive(Debug, Clone, Deserialize)]
pub struct StyleRange {
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub length: usize,
    #[serde(default)]
    pub style: StyleKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum StyleKind {
    #[serde(rename = "BOLD")]
    Bold,
    #[serde(rename = "ITALIC")]
    Italic,
    /// Styles the renderer does not map to Markdown (CODE, UNDERLINE, ...).
    #[default]
    #[serde(other)]
    Other,
}

/// Render an ordered list of article blocks into one Markdown string.
///
/// Consecutive blocks are separated by a blank line, except between two
/// adjacent list items, which pack tightly. The ordered-item counter restarts
/// at 1 for each contiguous run of ordered items. A cover image, when
/// present, is appended once at the end.
#[must_use]
pub fn render_article(blocks: &[ArticleBlock], cover_image: Option<&str>) -> String {
    let mut rendered: Vec<(String, bool)> = Vec::new();
    let mut ordered_counter = 0usize;

    for block in blocks {
        if block.kind == BlockKind::OrderedItem {
            ordered_counter += 1;
        } else {
            ordered_counter = 0;
        }

        let text = render_styled_text(&block.text, &block.style_ranges);
        let line = match block.kind {
            BlockKind::HeaderOne => format!("# {text}"),
            BlockKind::HeaderTwo => format!("## {text}"),
            BlockKind::UnorderedItem => format!("- {text}"),
            BlockKind::OrderedItem => format!("{ordered_counter}. {text}"),
            BlockKind::Blockquote => format!("> {text}"),
            // Media placeholders without text, and empty paragraphs, are
            // dropped rather than rendered as stray blank blocks. They still
            // break list adjacency and reset the ordered counter above.
            BlockKind::Atomic | BlockKind::Unstyled => {
                if text.trim().is_empty() {
                    continue;
                }
                text
            }
        };
        rendered.push((line, block.kind.is_list_item()));
    }

    let mut out = String::new();
    for (i, (line, is_list)) in rendered.iter().enumerate() {
        if i > 0 {
            let prev_is_list = rendered[i - 1].1;
            if *is_list && prev_is_list {
                out.push('\n');
            } else {
                out.push_str("\n\n");
            }
        }
        out.push_str(line);
    }

    if let Some(cover) = cover_image.filter(|c| !c.is_empty()) {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(&format!("![カバー画像]({cover})"));
    }

    out
}

/// Apply inline style ranges to a block's text.
///
/// The text is split into segments at every range boundary; each segment is
/// then wrapped once according to the set of styles covering it. Offsets are
/// character offsets. Zero-length ranges, ranges starting past the end of the
/// text, and unmapped styles are ignored; ranges running past the end clamp.
pub(crate) fn render_styled_text(text: &str, ranges: &[StyleRange]) -> String {
    let chars: Vec<char> = text.chars().collect();
    let usable: Vec<&StyleRange> = ranges
        .iter()
        .filter(|r| r.style != StyleKind::Other && r.length > 0 && r.offset < chars.len())
        .collect();
    if usable.is_empty() {
        return text.to_string();
    }

    let mut cuts: BTreeSet<usize> = BTreeSet::new();
    cuts.insert(0);
    cuts.insert(chars.len());
    for range in &usable {
        cuts.insert(range.offset);
        cuts.insert((range.offset + range.length).min(chars.len()));
    }
    let bounds: Vec<usize> = cuts.into_iter().collect();

    // Segments carrying identical style sets are merged before wrapping so
    // that one logical span never emits back-to-back markers.
    let mut segments: Vec<(String, bool, bool)> = Vec::new();
    for window in bounds.windows(2) {
        let (start, end) = (window[0], window[1]);
        let covered = |style: StyleKind| {
            usable
                .iter()
                .any(|r| r.style == style && r.offset <= start && r.offset + r.length >= end)
        };
        let bold = covered(StyleKind::Bold);
        let italic = covered(StyleKind::Italic);
        let segment: String = chars[start..end].iter().collect();
        match segments.last_mut() {
            Some((prev, prev_bold, prev_italic)) if *prev_bold == bold && *prev_italic == italic => {
                prev.push_str(&segment);
            }
            _ => segments.push((segment, bold, italic)),
        }
    }

    let mut out = String::new();
    for (segment, bold, italic) in segments {
        match (bold, italic) {
            (true, true) => out.push_str(&format!("***{segment}***")),
            (true, false) => out.push_str(&format!("**{segment}**")),
            (false, true) => out.push_str(&format!("*{segment}*")),
            (false, false) => out.push_str(&segment),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(kind: BlockKind, text: &str) -> ArticleBlock {
        ArticleBlock {
            kind,
            text: text.to_string(),
            style_ranges: Vec::new(),
        }
    }

    fn range(offset: usize, length: usize, style: StyleKind) -> StyleRange {
        StyleRange {
            offset,
            length,
            style,
        }
    }

    #[test]
    fn test_heading_then_packed_list() {
        let blocks = vec![
            block(BlockKind::HeaderOne, "Title"),
            block(BlockKind::UnorderedItem, "a"),
            block(BlockKind::UnorderedItem, "b"),
        ];
        assert_eq!(render_article(&blocks, None), "# Title\n\n- a\n- b");
    }

    #[test]
    fn test_block_type_mapping() {
        let blocks = vec![
            block(BlockKind::HeaderTwo, "Section"),
            block(BlockKind::Blockquote, "said someone"),
            block(BlockKind::Unstyled, "plain paragraph"),
        ];
        assert_eq!(
            render_article(&blocks, None),
            "## Section\n\n> said someone\n\nplain paragraph"
        );
    }

    #[test]
    fn test_ordered_counter_resets_per_run() {
        let blocks = vec![
            block(BlockKind::OrderedItem, "one"),
            block(BlockKind::OrderedItem, "two"),
            block(BlockKind::Unstyled, "interlude"),
            block(BlockKind::OrderedItem, "restart"),
        ];
        assert_eq!(
            render_article(&blocks, None),
            "1. one\n2. two\n\ninterlude\n\n1. restart"
        );
    }

    #[test]
    fn test_ordered_counter_not_shared_with_unordered() {
        let blocks = vec![
            block(BlockKind::OrderedItem, "one"),
            block(BlockKind::UnorderedItem, "bullet"),
            block(BlockKind::OrderedItem, "again"),
        ];
        // Mixed list items stay packed, but the counter restarts after the
        // unordered interruption.
        assert_eq!(render_article(&blocks, None), "1. one\n- bullet\n1. again");
    }

    #[test]
    fn test_empty_atomic_dropped_but_breaks_list_run() {
        let blocks = vec![
            block(BlockKind::OrderedItem, "one"),
            block(BlockKind::Atomic, ""),
            block(BlockKind::OrderedItem, "two"),
        ];
        assert_eq!(render_article(&blocks, None), "1. one\n\n1. two");
    }

    #[test]
    fn test_atomic_with_text_renders_plain() {
        let blocks = vec![block(BlockKind::Atomic, "embedded caption")];
        assert_eq!(render_article(&blocks, None), "embedded caption");
    }

    #[test]
    fn test_cover_image_appended_last() {
        let blocks = vec![block(BlockKind::Unstyled, "body")];
        assert_eq!(
            render_article(&blocks, Some("https://pbs.twimg.com/media/abc?name=large")),
            "body\n\n![カバー画像](https://pbs.twimg.com/media/abc?name=large)"
        );
    }

    #[test]
    fn test_cover_image_only() {
        assert_eq!(
            render_article(&[], Some("https://pbs.twimg.com/media/abc")),
            "![カバー画像](https://pbs.twimg.com/media/abc)"
        );
    }

    #[test]
    fn test_styled_text_single_bold_range() {
        let styled = render_styled_text("hello world", &[range(0, 5, StyleKind::Bold)]);
        assert_eq!(styled, "**hello** world");
    }

    #[test]
    fn test_styled_text_ranges_out_of_source_order() {
        let styled = render_styled_text(
            "hello world",
            &[range(6, 5, StyleKind::Italic), range(0, 5, StyleKind::Bold)],
        );
        assert_eq!(styled, "**hello** *world*");
    }

    #[test]
    fn test_styled_text_overlapping_ranges() {
        let styled = render_styled_text(
            "hello world",
            &[range(0, 11, StyleKind::Bold), range(6, 5, StyleKind::Italic)],
        );
        assert_eq!(styled, "**hello *****world***");
    }

    #[test]
    fn test_styled_text_adjacent_same_style_merged() {
        let styled = render_styled_text(
            "hello world",
            &[range(0, 5, StyleKind::Bold), range(5, 6, StyleKind::Bold)],
        );
        assert_eq!(styled, "**hello world**");
    }

    #[test]
    fn test_styled_text_range_clamped_to_text_end() {
        let styled = render_styled_text("short", &[range(0, 100, StyleKind::Bold)]);
        assert_eq!(styled, "**short**");
    }

    #[test]
    fn test_styled_text_ignores_invalid_ranges() {
        let ranges = vec![
            range(50, 5, StyleKind::Bold),
            range(0, 0, StyleKind::Bold),
            range(0, 5, StyleKind::Other),
        ];
        assert_eq!(render_styled_text("hello", &ranges), "hello");
    }

    #[test]
    fn test_styled_text_character_offsets() {
        // Offsets count characters, not bytes.
        let styled = render_styled_text("日本語のテスト", &[range(0, 3, StyleKind::Bold)]);
        assert_eq!(styled, "**日本語**のテスト");
    }

    #[test]
    fn test_block_kind_deserializes_wire_names() {
        let json = r#"{"type": "header-one", "text": "T", "inlineStyleRanges": []}"#;
        let parsed: ArticleBlock = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.kind, BlockKind::HeaderOne);

        let json = r#"{"type": "something-new", "text": "T"}"#;
        let parsed: ArticleBlock = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.kind, BlockKind::Unstyled);
    }

    #[test]
    fn test_style_kind_deserializes_unknown_as_other() {
        let json = r#"{"offset": 0, "length": 4, "style": "STRIKETHROUGH"}"#;
        let parsed: StyleRange = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.style, StyleKind::Other);
    }
}
