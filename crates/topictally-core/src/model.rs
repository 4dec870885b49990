//! Core data model (spec.md §3): posts, thread nodes, candidates, canonical
//! titles, and the final analysis result.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A single social-media message, immutable after ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Opaque URI identifying this post.
    pub uri: String,
    /// Content hash, as reported or computed by the caller.
    pub content_hash: String,
    /// Author's stable identifier (e.g. a DID).
    pub author_id: String,
    /// Author's display handle.
    pub author_handle: String,
    /// Full text content of the post.
    pub text: String,
    /// Composition timestamp.
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// URI of the parent post, if this is a reply.
    pub parent_uri: Option<String>,
    /// URI of the quoted post, if this post is a quote.
    pub quoted_uri: Option<String>,
    /// Media items attached to the post (each with optional alt text).
    #[serde(default)]
    pub media: Vec<MediaItem>,
    /// An external link card, if the post embeds one.
    pub link_card: Option<LinkCard>,
    /// The server's claim of how many direct replies this post has.
    pub reply_count: Option<u64>,
}

/// An image/video attachment with optional alt text.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MediaItem {
    /// Alt text describing the media, if the author supplied one.
    #[serde(default)]
    pub alt_text: Option<String>,
}

/// An embedded external link card (spec.md §3, §4.4 link-card resolver).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkCard {
    /// The linked URI.
    pub uri: String,
    /// The card's title, as supplied by the platform or an oEmbed resolver.
    pub title: Option<String>,
    /// The card's description.
    pub description: Option<String>,
}

/// A thread node: a post plus its children in the in-memory tree
/// (spec.md §3/§4.2).
#[derive(Debug, Clone)]
pub struct ThreadNode {
    /// The post at this node.
    pub post: Post,
    /// Ordered child nodes (the server's given order is preserved).
    pub children: Vec<ThreadNode>,
}

/// A node whose declared reply count exceeded the children actually
/// delivered by the server (spec.md §3).
#[derive(Debug, Clone, PartialEq)]
pub struct TruncationRecord {
    /// URI of the truncated node.
    pub uri: String,
    /// The server's declared child count.
    pub declared_count: u64,
    /// The number of children actually delivered.
    pub delivered_count: u64,
}

/// A surface string extracted from one post, awaiting normalization
/// (spec.md §3/§4.4).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate {
    /// URI of the post this candidate was extracted from.
    pub post_uri: String,
    /// The raw extracted surface form.
    pub surface: String,
    /// Which extractor produced this candidate.
    pub source: CandidateSource,
}

/// Identifies which extractor (spec.md §4.4) produced a [`Candidate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateSource {
    /// A Title-Case phrase extractor match.
    TitleCase,
    /// A double-quoted span extractor match.
    QuotedSpan,
    /// An ALL-CAPS phrase extractor match.
    AllCaps,
    /// An alt-text fragment extractor match.
    AltText,
    /// A short stand-alone reply extractor match.
    ShortReply,
}

/// A canonical title: the normalized identity of a "topic" within one
/// analysis run (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalTitle(pub String);

impl CanonicalTitle {
    /// Construct a canonical title from an owned surface string.
    pub fn new(title: impl Into<String>) -> Self {
        Self(title.into())
    }

    /// The canonical title's surface form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CanonicalTitle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry in the final tally: a canonical title, its count, and the
/// posts that contributed to it (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TallyEntry {
    /// The canonical title.
    pub title: CanonicalTitle,
    /// Number of contributing posts. Always equal to `posts.len()`.
    pub count: usize,
    /// The contributing posts, in first-seen order.
    pub posts: Vec<Post>,
}

/// A proposed assignment of uncategorized posts to a title the cluster
/// suggester believes they belong to (spec.md §4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSuggestion {
    /// The suggested canonical title.
    pub suggested_title: String,
    /// URIs of the uncategorized posts in this cluster.
    pub post_uris: Vec<String>,
    /// Average per-post match score across the cluster.
    pub average_score: f64,
    /// Which matcher produced this suggestion.
    pub method: SuggestionMethod,
    /// Review state for the user-facing accept/dismiss workflow.
    pub state: SuggestionState,
}

/// Which matcher (spec.md §4.7) produced a [`ClusterSuggestion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionMethod {
    /// Fingerprint token-containment match.
    Fingerprint,
    /// Bigram Jaccard similarity match.
    Ngram,
    /// Normalized Levenshtein edit-distance match.
    Levenshtein,
}

/// Review state for a [`ClusterSuggestion`] (spec.md §4.7 state machine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionState {
    /// Awaiting user review; shown to the caller.
    Pending,
    /// The user accepted the suggestion; every post in the cluster has been
    /// assigned to the suggested title.
    Accepted,
    /// The user dismissed the suggestion; excluded from later passes.
    Dismissed,
}

/// The serialized result of one analysis run (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// The prompt post the thread was anchored on.
    pub root_post: Post,
    /// Tally entries, sorted by count descending, ties by title length
    /// ascending.
    pub tally: Vec<TallyEntry>,
    /// Posts attributed to no canonical title (root excluded).
    pub uncategorized: Vec<Post>,
    /// Total number of posts gathered by the crawler, including the root.
    pub post_count: usize,
    /// Pending cluster suggestions for the uncategorized posts (spec.md §4.7).
    pub cluster_suggestions: Vec<ClusterSuggestion>,
}

impl AnalysisResult {
    /// Look up the tally entry for a canonical title, if any.
    pub fn entry_for(&self, title: &CanonicalTitle) -> Option<&TallyEntry> {
        self.tally.iter().find(|e| &e.title == title)
    }
}

/// An in-progress attribution map: post URI -> set of matched canonical
/// titles. Built incrementally by the attributor (spec.md §4.6) before being
/// collapsed into tally entries.
#[derive(Debug, Clone, Default)]
pub struct AttributionMap {
    inner: HashMap<String, Vec<CanonicalTitle>>,
}

impl AttributionMap {
    /// Construct an empty attribution map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `post_uri` matched `title`.
    pub fn insert(&mut self, post_uri: impl Into<String>, title: CanonicalTitle) {
        self.inner.entry(post_uri.into()).or_default().push(title);
    }

    /// The canonical titles a post matched, if any.
    pub fn titles_for(&self, post_uri: &str) -> &[CanonicalTitle] {
        self.inner
            .get(post_uri)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Whether a post matched no canonical title at all.
    pub fn is_uncategorized(&self, post_uri: &str) -> bool {
        self.titles_for(post_uri).is_empty()
    }
}
