//! Wire types for the remote thread API (spec.md §6).
//!
//! Field names mirror the shape of a typical AT Protocol / Bluesky-style
//! `getPostThread` and `getQuotes` response: a post record nested under
//! `author`/`record`, and a recursive `replies` array whose entries are
//! either another thread node or one of three terminal markers.

use serde::{Deserialize, Serialize};

/// A post record as returned embedded in a thread or quotes response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPost {
    /// Opaque URI identifying the post.
    pub uri: String,
    /// Content hash / CID as reported by the server.
    #[serde(default)]
    pub cid: String,
    /// Author metadata.
    pub author: RawAuthor,
    /// The post record body.
    pub record: RawRecord,
    /// The server's claim of how many direct replies this post has.
    #[serde(rename = "replyCount", default)]
    pub reply_count: Option<u64>,
    /// URI of the quoted post's own embed, if this post quotes another.
    #[serde(rename = "quotedUri", default)]
    pub quoted_uri: Option<String>,
}

/// Author identity embedded in a [`RawPost`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAuthor {
    /// Stable DID-form identifier.
    pub did: String,
    /// Display handle.
    pub handle: String,
}

/// The post body: text, timestamp, optional parent/quote/media/link-card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    /// Full post text.
    pub text: String,
    /// ISO-8601 composition timestamp.
    #[serde(rename = "createdAt")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// URI of the parent post, if this is a reply.
    #[serde(rename = "parentUri", default)]
    pub parent_uri: Option<String>,
    /// Media items attached to the post.
    #[serde(default)]
    pub media: Vec<RawMedia>,
    /// An external link card embed.
    #[serde(rename = "linkCard", default)]
    pub link_card: Option<RawLinkCard>,
}

/// A media attachment with optional alt text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMedia {
    /// Alt text describing the media.
    #[serde(default)]
    pub alt: Option<String>,
}

/// An embedded external link card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLinkCard {
    /// The linked URI.
    pub uri: String,
    /// The card's title (e.g. "YouTube" for an unresolved video embed).
    #[serde(default)]
    pub title: Option<String>,
    /// The card's description.
    #[serde(default)]
    pub description: Option<String>,
}

/// One entry in a thread node's `replies` array: a valid post, or one of
/// three terminal markers that tree building drops (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawReplyEntry {
    /// A valid, recursively-structured thread node.
    Post(RawThreadNode),
    /// The reply was deleted; only its URI survives.
    Deleted {
        /// URI of the deleted post.
        uri: String,
    },
    /// The reply's author blocked the viewer (or vice versa).
    Blocked {
        /// URI of the blocked post.
        uri: String,
        /// Partial author info, if the server includes any.
        #[serde(default)]
        author: Option<RawAuthor>,
    },
    /// The viewer lacks permission to see this reply.
    AuthRequired {
        /// URI of the gated post.
        uri: String,
    },
}

/// The recursive tree-shaped payload returned by "get post thread"
/// (spec.md §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawThreadNode {
    /// The valid post at this node.
    pub post: RawPost,
    /// Child replies, in server-given order.
    #[serde(default)]
    pub replies: Vec<RawReplyEntry>,
}

/// A page of results from the paginated "get quotes" endpoint
/// (spec.md §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotesPage {
    /// Quote posts in this page.
    #[serde(default)]
    pub posts: Vec<RawPost>,
    /// Opaque cursor for the next page, absent on the last page.
    #[serde(default)]
    pub cursor: Option<String>,
}

/// Rate-limit headers cached from the most recent response (spec.md §4.1).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateLimitInfo {
    /// The window's total request budget.
    pub limit: Option<u64>,
    /// Requests remaining in the current window.
    pub remaining: Option<u64>,
    /// Unix epoch seconds at which the window resets.
    pub reset_at: Option<u64>,
    /// The server-reported policy string, if any.
    pub policy: Option<String>,
}

impl RateLimitInfo {
    /// Parse rate-limit headers off a response, per spec.md §6.
    pub fn from_headers(headers: &reqwest::header::HeaderMap) -> Self {
        let get_u64 = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
        };

        Self {
            limit: get_u64("ratelimit-limit"),
            remaining: get_u64("ratelimit-remaining"),
            reset_at: get_u64("ratelimit-reset"),
            policy: headers
                .get("ratelimit-policy")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        }
    }

    /// Seconds to wait, parsed from a 429's `retry-after` header (seconds)
    /// or, lacking that, from the `ratelimit-reset` epoch.
    pub fn retry_after_secs(&self, headers: &reqwest::header::HeaderMap, now_epoch: u64) -> Option<u64> {
        if let Some(secs) = headers
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
        {
            return Some(secs);
        }
        self.reset_at.map(|reset| reset.saturating_sub(now_epoch))
    }
}
