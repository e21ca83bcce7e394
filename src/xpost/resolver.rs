//! Bounded depth-first resolution of a post and everything it references.
//!
//! The traversal runs on an explicit stack rather than call-stack recursion:
//! the visited set and the depth bound are plain data, and a hostile chain of
//! cross-referencing posts can never blow the stack. Edge failures abandon
//! one branch; they never abort the whole resolution.

use std::collections::HashSet;

use tracing::debug;

use super::api::PostSource;
use super::post::PostRecord;
use super::refs::extract_references;
use super::url::{canonicalize_post_url, extract_post_id};

struct WorkItem {
    url: String,
    depth: usize,
}

/// Depth-first resolver over a [`PostSource`].
pub struct Resolver<'a, S: PostSource> {
    source: &'a S,
    max_depth: usize,
}

impl<'a, S: PostSource> Resolver<'a, S> {
    pub fn new(source: &'a S, max_depth: usize) -> Self {
        Self { source, max_depth }
    }

    /// Resolve the root post and its reachable references in discovery
    /// order: root first, then depth-first, quote edges before in-text link
    /// edges. An empty result means the root itself was unobtainable.
    pub async fn resolve(&self, root_url: &str) -> Vec<PostRecord> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut ordering: Vec<PostRecord> = Vec::new();
        let mut stack = vec![WorkItem {
            url: canonicalize_post_url(root_url),
            depth: 0,
        }];

        while let Some(item) = stack.pop() {
            if item.depth > self.max_depth {
                debug!(url = %item.url, depth = item.depth, "Depth bound reached, abandoning branch");
                continue;
            }

            let Ok(id) = extract_post_id(&item.url) else {
                debug!(url = %item.url, "Reference has no post ID, skipping");
                continue;
            };

            // Check-and-insert before any network call: a post reachable via
            // several edges is fetched exactly once, and cycles cannot spin.
            if !visited.insert(id.clone()) {
                debug!(id = %id, "Post already visited, skipping");
                continue;
            }

            let Some(post) = self.source.fetch_post(&item.url).await else {
                debug!(url = %item.url, depth = item.depth, "Upstream unavailable, abandoning branch");
                continue;
            };

            let record = PostRecord::from_mirror(&id, &item.url, &post);
            let terminal = record.is_article();
            ordering.push(record);

            if terminal {
                debug!(id = %id, "Article posts are terminal, not expanding references");
                continue;
            }

            // Push in reverse so the first-listed reference pops first and
            // the traversal explores it, and its descendants, before any
            // sibling.
            let refs = extract_references(&post);
            for reference in refs.into_iter().rev() {
                stack.push(WorkItem {
                    url: reference.url,
                    depth: item.depth + 1,
                });
            }
        }

        ordering
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::super::api::MirrorPost;
    use super::*;

    /// In-memory post source keyed by post ID.
    struct MapSource {
        posts: HashMap<String, MirrorPost>,
        fetch_count: AtomicUsize,
    }

    impl MapSource {
        fn new(posts: Vec<(&str, &str)>) -> Self {
            Self {
                posts: posts
                    .into_iter()
                    .map(|(id, json)| (id.to_string(), serde_json::from_str(json).unwrap()))
                    .collect(),
                fetch_count: AtomicUsize::new(0),
            }
        }

        fn fetches(&self) -> usize {
            self.fetch_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PostSource for MapSource {
        async fn fetch_post(&self, url: &str) -> Option<MirrorPost> {
            self.fetch_count.fetch_add(1, Ordering::SeqCst);
            let id = extract_post_id(url).ok()?;
            self.posts.get(&id).cloned()
        }
    }

    fn resolve_ids(records: &[PostRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_single_post_no_references() {
        let source = MapSource::new(vec![(
            "1",
            r#"{"text": "alone", "url": "https://x.com/a/status/1"}"#,
        )]);
        let resolver = Resolver::new(&source, 10);
        let records = resolver.resolve("https://x.com/a/status/1").await;
        assert_eq!(resolve_ids(&records), vec!["1"]);
    }

    #[tokio::test]
    async fn test_root_always_first_quote_before_links() {
        let source = MapSource::new(vec![
            (
                "1",
                r#"{
                    "text": "see https://x.com/c/status/3",
                    "url": "https://x.com/a/status/1",
                    "quote": {"text": "q", "url": "https://x.com/b/status/2"}
                }"#,
            ),
            ("2", r#"{"text": "quoted", "url": "https://x.com/b/status/2"}"#),
            ("3", r#"{"text": "linked", "url": "https://x.com/c/status/3"}"#),
        ]);
        let resolver = Resolver::new(&source, 10);
        let records = resolver.resolve("https://x.com/a/status/1").await;
        assert_eq!(resolve_ids(&records), vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_depth_first_descends_through_quote_chain() {
        // 1 quotes 2 and links 4; 2 quotes 3. Depth-first order puts 3
        // before 4.
        let source = MapSource::new(vec![
            (
                "1",
                r#"{
                    "text": "also https://x.com/d/status/4",
                    "url": "https://x.com/a/status/1",
                    "quote": {"text": "q", "url": "https://x.com/b/status/2"}
                }"#,
            ),
            (
                "2",
                r#"{
                    "text": "mid",
                    "url": "https://x.com/b/status/2",
                    "quote": {"text": "q", "url": "https://x.com/c/status/3"}
                }"#,
            ),
            ("3", r#"{"text": "deep", "url": "https://x.com/c/status/3"}"#),
            ("4", r#"{"text": "sibling", "url": "https://x.com/d/status/4"}"#),
        ]);
        let resolver = Resolver::new(&source, 10);
        let records = resolver.resolve("https://x.com/a/status/1").await;
        assert_eq!(resolve_ids(&records), vec!["1", "2", "3", "4"]);
    }

    #[tokio::test]
    async fn test_cycle_does_not_loop() {
        let source = MapSource::new(vec![
            (
                "1",
                r#"{"text": "to https://x.com/b/status/2", "url": "https://x.com/a/status/1"}"#,
            ),
            (
                "2",
                r#"{"text": "back https://x.com/a/status/1", "url": "https://x.com/b/status/2"}"#,
            ),
        ]);
        let resolver = Resolver::new(&source, 10);
        let records = resolver.resolve("https://x.com/a/status/1").await;
        assert_eq!(resolve_ids(&records), vec!["1", "2"]);
        // The cycle edge back to 1 is discarded before any fetch.
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test]
    async fn test_post_reachable_via_quote_and_link_fetched_once() {
        let source = MapSource::new(vec![
            (
                "1",
                r#"{
                    "text": "same https://x.com/b/status/2",
                    "url": "https://x.com/a/status/1",
                    "quote": {"text": "q", "url": "https://x.com/b/status/2"}
                }"#,
            ),
            ("2", r#"{"text": "target", "url": "https://x.com/b/status/2"}"#),
        ]);
        let resolver = Resolver::new(&source, 10);
        let records = resolver.resolve("https://x.com/a/status/1").await;
        assert_eq!(resolve_ids(&records), vec!["1", "2"]);
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test]
    async fn test_infinite_chain_halts_at_depth_bound() {
        // Posts 1..=40 each link to the next; the bound must cut the chain.
        let mut posts = Vec::new();
        let jsons: Vec<(String, String)> = (1..=40)
            .map(|i| {
                (
                    i.to_string(),
                    format!(
                        r#"{{"text": "next https://x.com/u/status/{}", "url": "https://x.com/u/status/{i}"}}"#,
                        i + 1
                    ),
                )
            })
            .collect();
        for (id, json) in &jsons {
            posts.push((id.as_str(), json.as_str()));
        }
        let source = MapSource::new(posts);
        let resolver = Resolver::new(&source, 10);
        let records = resolver.resolve("https://x.com/u/status/1").await;
        // Root at depth 0 plus ten levels below it.
        assert_eq!(records.len(), 11);
        assert_eq!(records.last().unwrap().id, "11");
    }

    #[tokio::test]
    async fn test_dead_edge_abandons_branch_only() {
        // 2 is unavailable; 3 must still resolve.
        let source = MapSource::new(vec![
            (
                "1",
                r#"{
                    "text": "a https://x.com/b/status/2 b https://x.com/c/status/3",
                    "url": "https://x.com/a/status/1"
                }"#,
            ),
            ("3", r#"{"text": "alive", "url": "https://x.com/c/status/3"}"#),
        ]);
        let resolver = Resolver::new(&source, 10);
        let records = resolver.resolve("https://x.com/a/status/1").await;
        assert_eq!(resolve_ids(&records), vec!["1", "3"]);
    }

    #[tokio::test]
    async fn test_article_record_is_terminal() {
        let source = MapSource::new(vec![
            (
                "1",
                r#"{
                    "text": "read https://x.com/b/status/2",
                    "url": "https://x.com/a/status/1"
                }"#,
            ),
            (
                "2",
                r#"{
                    "text": "ignored link https://x.com/c/status/3",
                    "url": "https://x.com/b/status/2",
                    "article": {
                        "title": "Long Form",
                        "content": {"blocks": [{"type": "unstyled", "text": "body"}]}
                    }
                }"#,
            ),
            ("3", r#"{"text": "unreached", "url": "https://x.com/c/status/3"}"#),
        ]);
        let resolver = Resolver::new(&source, 10);
        let records = resolver.resolve("https://x.com/a/status/1").await;
        assert_eq!(resolve_ids(&records), vec!["1", "2"]);
        assert!(records[1].is_article());
    }

    #[tokio::test]
    async fn test_unavailable_root_resolves_empty() {
        let source = MapSource::new(vec![]);
        let resolver = Resolver::new(&source, 10);
        let records = resolver.resolve("https://x.com/a/status/404").await;
        assert!(records.is_empty());
        assert_eq!(source.fetches(), 1);
    }
}
