//! Rate-limited access to the remote thread API (spec.md §4.1, §6).

pub mod client;
pub mod rate_limiter;
pub mod types;

pub use client::{HttpThreadApiClient, ThreadApiClient};
pub use rate_limiter::{RateLimiter, RateLimiterConfig};
pub use types::{QuotesPage, RateLimitInfo, RawAuthor, RawLinkCard, RawMedia, RawPost, RawRecord, RawReplyEntry, RawThreadNode};
