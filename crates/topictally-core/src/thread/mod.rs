//! Thread builder (spec.md §4.2): turns the remote API's nested reply tree
//! into an in-memory structure with parent lookups, truncation detection,
//! and deleted/blocked/auth-required filtering.

use std::collections::HashMap;

use crate::error::CrawlError;
use crate::model::{LinkCard, MediaItem, Post, ThreadNode, TruncationRecord};
use crate::net::{RawAuthor, RawPost, RawReplyEntry, RawThreadNode};

/// The in-memory tree built from one `get post thread` response
/// (spec.md §4.2).
#[derive(Debug)]
pub struct ThreadTree {
    root: ThreadNode,
    all_posts: Vec<Post>,
    parents: HashMap<String, String>,
    truncated: Vec<TruncationRecord>,
    restricted: Vec<String>,
}

impl ThreadTree {
    /// Build a tree from the root entry returned by the API.
    ///
    /// The root is modeled the same way a reply is (spec.md §3): it may be a
    /// valid post, or a deleted/blocked/auth-required marker if the prompt
    /// post itself is no longer available. Fails with
    /// [`CrawlError::RootUnavailable`] in that second case.
    pub fn build(raw_root: RawReplyEntry) -> Result<Self, CrawlError> {
        let raw_root = match raw_root {
            RawReplyEntry::Post(node) => node,
            RawReplyEntry::Deleted { .. } | RawReplyEntry::Blocked { .. } | RawReplyEntry::AuthRequired { .. } => {
                return Err(CrawlError::RootUnavailable);
            }
        };

        let mut all_posts = Vec::new();
        let mut parents = HashMap::new();
        let mut truncated = Vec::new();
        let mut restricted = Vec::new();

        let root = build_node(
            raw_root,
            None,
            &mut all_posts,
            &mut parents,
            &mut truncated,
            &mut restricted,
        );

        Ok(Self {
            root,
            all_posts,
            parents,
            truncated,
            restricted,
        })
    }

    /// The prompt post (or subtree root, for a follow-up fetch).
    pub fn root_post(&self) -> &Post {
        &self.root.post
    }

    /// Every valid post gathered by this build, in depth-first traversal
    /// order (root first).
    pub fn all_posts(&self) -> &[Post] {
        &self.all_posts
    }

    /// Look up the parent URI of a post, if any.
    pub fn parent(&self, uri: &str) -> Option<&str> {
        self.parents.get(uri).map(String::as_str)
    }

    /// Walk from `uri` up to the root, returning distinct author
    /// identifiers in that order (closest ancestor first).
    pub fn branch_authors(&self, uri: &str) -> Vec<String> {
        let by_uri: HashMap<&str, &Post> =
            self.all_posts.iter().map(|p| (p.uri.as_str(), p)).collect();

        let mut authors = Vec::new();
        let mut seen = std::collections::HashSet::new();
        let mut current = Some(uri.to_string());
        while let Some(cur_uri) = current {
            if let Some(post) = by_uri.get(cur_uri.as_str()) {
                if seen.insert(post.author_id.clone()) {
                    authors.push(post.author_id.clone());
                }
            }
            current = self.parent(&cur_uri).map(str::to_string);
        }
        authors
    }

    /// All posts, depth-first (equivalent to [`Self::all_posts`]; kept as a
    /// separate accessor to match the spec's named contract).
    pub fn flatten(&self) -> &[Post] {
        &self.all_posts
    }

    /// Truncation records gathered while building this tree.
    pub fn truncated_posts(&self) -> &[TruncationRecord] {
        &self.truncated
    }

    /// URIs of nodes that required auth and were not descended into.
    pub fn restricted_posts(&self) -> &[String] {
        &self.restricted
    }
}

fn build_node(
    raw: RawThreadNode,
    parent_uri: Option<&str>,
    all_posts: &mut Vec<Post>,
    parents: &mut HashMap<String, String>,
    truncated: &mut Vec<TruncationRecord>,
    restricted: &mut Vec<String>,
) -> ThreadNode {
    let post = convert_post(raw.post, parent_uri);
    let uri = post.uri.clone();
    let declared = post.reply_count;

    if let Some(parent) = parent_uri {
        parents.insert(uri.clone(), parent.to_string());
    }
    all_posts.push(post.clone());

    let mut children = Vec::new();
    for entry in raw.replies {
        match entry {
            RawReplyEntry::Deleted { uri } => {
                tracing::debug!(uri, "dropped deleted reply");
            }
            RawReplyEntry::Blocked { uri, author } => {
                tracing::debug!(uri, blocked_author = ?author.map(|a: RawAuthor| a.handle), "dropped blocked reply");
            }
            RawReplyEntry::AuthRequired { uri } => {
                tracing::debug!(uri, "reply requires auth, not descending");
                restricted.push(uri);
            }
            RawReplyEntry::Post(child_raw) => {
                let child = build_node(
                    child_raw,
                    Some(uri.as_str()),
                    all_posts,
                    parents,
                    truncated,
                    restricted,
                );
                children.push(child);
            }
        }
    }

    if let Some(declared_count) = declared {
        let delivered_count = children.len() as u64;
        if declared_count > delivered_count {
            truncated.push(TruncationRecord {
                uri: uri.clone(),
                declared_count,
                delivered_count,
            });
        }
    }

    ThreadNode { post, children }
}

fn convert_post(raw: RawPost, parent_uri_hint: Option<&str>) -> Post {
    let parent_uri = raw
        .record
        .parent_uri
        .clone()
        .or_else(|| parent_uri_hint.map(str::to_string));

    Post {
        uri: raw.uri,
        content_hash: raw.cid,
        author_id: raw.author.did,
        author_handle: raw.author.handle,
        text: raw.record.text,
        created_at: raw.record.created_at,
        parent_uri,
        quoted_uri: raw.quoted_uri,
        media: raw
            .record
            .media
            .into_iter()
            .map(|m| MediaItem { alt_text: m.alt })
            .collect(),
        link_card: raw.record.link_card.map(|c| LinkCard {
            uri: c.uri,
            title: c.title,
            description: c.description,
        }),
        reply_count: raw.reply_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::{RawAuthor, RawRecord};

    fn author(did: &str, handle: &str) -> RawAuthor {
        RawAuthor {
            did: did.to_string(),
            handle: handle.to_string(),
        }
    }

    fn raw_post(uri: &str, text: &str, reply_count: Option<u64>) -> RawPost {
        RawPost {
            uri: uri.to_string(),
            cid: format!("cid-{uri}"),
            author: author(&format!("did:plc:{uri}"), &format!("{uri}.bsky.social")),
            record: RawRecord {
                text: text.to_string(),
                created_at: chrono::Utc::now(),
                parent_uri: None,
                media: vec![],
                link_card: None,
            },
            reply_count,
            quoted_uri: None,
        }
    }

    fn leaf(uri: &str, text: &str) -> RawThreadNode {
        RawThreadNode {
            post: raw_post(uri, text, Some(0)),
            replies: vec![],
        }
    }

    #[test]
    fn builds_parent_edges_and_flattens_depth_first() {
        let root = RawThreadNode {
            post: raw_post("root", "what is your comfort show?", Some(2)),
            replies: vec![
                RawReplyEntry::Post(leaf("c1", "Sailor Moon")),
                RawReplyEntry::Post(leaf("c2", "Regular Show")),
            ],
        };

        let tree = ThreadTree::build(RawReplyEntry::Post(root)).unwrap();
        assert_eq!(tree.all_posts().len(), 3);
        assert_eq!(tree.all_posts()[0].uri, "root");
        assert_eq!(tree.parent("c1"), Some("root"));
        assert_eq!(tree.parent("c2"), Some("root"));
        assert!(tree.truncated_posts().is_empty());
    }

    #[test]
    fn drops_deleted_and_blocked_replies_silently() {
        let root = RawThreadNode {
            post: raw_post("root", "prompt", Some(3)),
            replies: vec![
                RawReplyEntry::Post(leaf("c1", "kept")),
                RawReplyEntry::Deleted {
                    uri: "c2".to_string(),
                },
                RawReplyEntry::Blocked {
                    uri: "c3".to_string(),
                    author: None,
                },
            ],
        };

        let tree = ThreadTree::build(RawReplyEntry::Post(root)).unwrap();
        assert_eq!(tree.all_posts().len(), 2);
        // declared 3, delivered 1 valid child -> truncation recorded.
        assert_eq!(tree.truncated_posts().len(), 1);
        assert_eq!(tree.truncated_posts()[0].declared_count, 3);
        assert_eq!(tree.truncated_posts()[0].delivered_count, 1);
    }

    #[test]
    fn auth_required_reply_is_recorded_but_not_descended() {
        let root = RawThreadNode {
            post: raw_post("root", "prompt", Some(1)),
            replies: vec![RawReplyEntry::AuthRequired {
                uri: "gated".to_string(),
            }],
        };

        let tree = ThreadTree::build(RawReplyEntry::Post(root)).unwrap();
        assert_eq!(tree.all_posts().len(), 1);
        assert_eq!(tree.restricted_posts(), &["gated".to_string()]);
    }

    #[test]
    fn truncation_detected_when_declared_exceeds_delivered() {
        let root = RawThreadNode {
            post: raw_post("root", "prompt", Some(10)),
            replies: vec![
                RawReplyEntry::Post(leaf("c1", "a")),
                RawReplyEntry::Post(leaf("c2", "b")),
                RawReplyEntry::Post(leaf("c3", "c")),
            ],
        };

        let tree = ThreadTree::build(RawReplyEntry::Post(root)).unwrap();
        assert_eq!(tree.truncated_posts().len(), 1);
        let record = &tree.truncated_posts()[0];
        assert_eq!(record.uri, "root");
        assert_eq!(record.declared_count, 10);
        assert_eq!(record.delivered_count, 3);
    }

    #[test]
    fn deleted_root_is_rejected_as_root_unavailable() {
        let err = ThreadTree::build(RawReplyEntry::Deleted { uri: "root".to_string() }).unwrap_err();
        assert!(matches!(err, CrawlError::RootUnavailable));
    }

    #[test]
    fn auth_required_root_is_rejected_as_root_unavailable() {
        let err = ThreadTree::build(RawReplyEntry::AuthRequired { uri: "root".to_string() }).unwrap_err();
        assert!(matches!(err, CrawlError::RootUnavailable));
    }

    #[test]
    fn branch_authors_walks_from_leaf_to_root() {
        let root = RawThreadNode {
            post: raw_post("root", "prompt", Some(1)),
            replies: vec![RawReplyEntry::Post(RawThreadNode {
                post: raw_post("mid", "reply", Some(1)),
                replies: vec![RawReplyEntry::Post(leaf("leaf", "deep reply"))],
            })],
        };

        let tree = ThreadTree::build(RawReplyEntry::Post(root)).unwrap();
        let authors = tree.branch_authors("leaf");
        assert_eq!(authors.len(), 3);
        assert_eq!(authors[0], "did:plc:leaf");
        assert_eq!(authors[2], "did:plc:root");
    }
}
