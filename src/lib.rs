//! Notion web clipper library.
//!
//! A batch tool that fetches web pages, YouTube videos, and X posts,
//! converts them to Markdown, enriches them with model-predicted tags and
//! translated titles, and registers them in a Notion database.

// Allow raw string hashes for safety - they're harmless and prevent issues if content changes
#![allow(clippy::needless_raw_string_hashes)]

pub mod config;
pub mod constants;
pub mod handlers;
pub mod llm;
pub mod notion;
pub mod pipeline;
pub mod subtitles;
pub mod xpost;
