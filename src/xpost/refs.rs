//! Extraction of references from one post to other posts.
//!
//! Two origins, surfaced in a fixed order: the structured quote object
//! first (one level; deeper nesting unwinds through the resolver), then
//! every post URL appearing literally in the free text, in order of
//! appearance. No fetching happens here.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::api::MirrorPost;
use super::url::{canonicalize_post_url, extract_post_id};

/// Post URLs embedded in free text, on any host alias.
static POST_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://(?:www\.|mobile\.)?(?:twitter\.com|x\.com)/\w+/status/(\d+)").unwrap()
});

/// A reference to another post: the ID keys the visited set, the URL is
/// what the fetch tier needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRef {
    pub id: String,
    pub url: String,
}

/// Extract this post's outgoing references, quote first.
///
/// A post whose text repeats its own quote URL (the usual shape of a quote
/// post) yields that reference once.
#[must_use]
pub fn extract_references(post: &MirrorPost) -> Vec<PostRef> {
    let mut refs = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    if let Some(quote) = &post.quote {
        match extract_post_id(&quote.url) {
            Ok(id) => {
                seen.insert(id.clone());
                refs.push(PostRef {
                    id,
                    url: canonicalize_post_url(&quote.url),
                });
            }
            Err(_) => {
                debug!(url = %quote.url, "Quote object has no usable post URL, skipping");
            }
        }
    }

    for caps in POST_URL_PATTERN.captures_iter(&post.text) {
        let id = caps[1].to_string();
        if seen.insert(id.clone()) {
            refs.push(PostRef {
                id,
                url: canonicalize_post_url(caps.get(0).map_or("", |m| m.as_str())),
            });
        }
    }

    refs
}
