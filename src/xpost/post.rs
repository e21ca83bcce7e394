//! The normalized post record produced by either fetch tier.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::api::{MirrorPhoto, MirrorPost};
use super::article::ArticleBlock;
use super::url::canonicalize_post_url;

/// Image CDN size parameter, rewritten to request the large variant.
static SIZE_PARAM_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"name=\w+").unwrap());

/// One fetched post, normalized from either the mirror API or a rendered page.
#[derive(Debug, Clone)]
pub struct PostRecord {
    /// Numeric post ID, the de-duplication and cycle-detection key.
    pub id: String,
    /// Plain text body; empty for pure-article posts.
    pub text: String,
    pub author_name: String,
    pub author_handle: String,
    /// Source-provided time string, preserved verbatim.
    pub timestamp: String,
    pub source_url: String,
    /// De-duplicated image URLs, upgraded to the large size variant.
    pub images: Vec<String>,
    pub kind: PostKind,
}

/// Post variant: plain status or long-form article.
#[derive(Debug, Clone)]
pub enum PostKind {
    Post,
    Article(ArticleBody),
}

/// Unrendered article content carried on an article-kind record.
///
/// Rendering to Markdown happens on demand in the composer, never here.
#[derive(Debug, Clone)]
pub struct ArticleBody {
    /// Declared article title; may be empty.
    pub title: String,
    pub blocks: Vec<ArticleBlock>,
    pub cover_image: Option<String>,
}

impl PostRecord {
    /// Normalize a mirror API post into a record.
    ///
    /// `requested_url` backs up the record's source URL when the payload
    /// carries none. For article posts the article's own timestamp, when
    /// present, replaces the post timestamp.
    #[must_use]
    pub fn from_mirror(id: &str, requested_url: &str, post: &MirrorPost) -> Self {
        let (author_name, author_handle) = post
            .author
            .as_ref()
            .map(|a| (a.name.clone(), a.screen_name.clone()))
            .unwrap_or_default();

        let source_url = if post.url.is_empty() {
            canonicalize_post_url(requested_url)
        } else {
            canonicalize_post_url(&post.url)
        };

        let images = post
            .media
            .as_ref()
            .map(|m| collect_photo_urls(&m.photos))
            .unwrap_or_default();

        let mut timestamp = post.created_at.clone();
        let kind = match &post.article {
            Some(article) => {
                if !article.created_at.is_empty() {
                    timestamp = article.created_at.clone();
                }
                PostKind::Article(ArticleBody {
                    title: article.title.clone(),
                    blocks: article
                        .content
                        .as_ref()
                        .map(|c| c.blocks.clone())
                        .unwrap_or_default(),
                    cover_image: article
                        .cover_media
                        .as_ref()
                        .map(|c| upgrade_image_url(&c.url))
                        .filter(|url| !url.is_empty()),
                })
            }
            None => PostKind::Post,
        };

        Self {
            id: id.to_string(),
            text: post.text.clone(),
            author_name,
            author_handle,
            timestamp,
            source_url,
            images,
            kind,
        }
    }

    /// Whether this record is a terminal article node.
    #[must_use]
    pub fn is_article(&self) -> bool {
        matches!(self.kind, PostKind::Article(_))
    }
}

/// Collect photo URLs in order, dropping empties and duplicates, upgrading
/// each to the large size variant.
pub(crate) fn collect_photo_urls(photos: &[MirrorPhoto]) -> Vec<String> {
    dedup_image_urls(photos.iter().map(|p| upgrade_image_url(&p.url)))
}

/// De-duplicate image URLs preserving first-seen order.
pub(crate) fn dedup_image_urls(urls: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter()
        .filter(|url| !url.is_empty())
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Rewrite an image CDN URL to its large size variant.
///
/// Only URLs on the image CDN host carry the size parameter; anything else
/// passes through unchanged.
#[must_use]
pub fn upgrade_image_url(url: &str) -> String {
    if url.contains("pbs.twimg.com") && SIZE_PARAM_PATTERN.is_match(url) {
        SIZE_PARAM_PATTERN.replace(url, "name=large").into_owned()
    } else {
        url.to_string()
    }
}
