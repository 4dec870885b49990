//! `ThreadApiClient`: the remote thread API abstraction (spec.md §6) and its
//! `reqwest`-based HTTP implementation.

use super::rate_limiter::RateLimiter;
use super::types::{QuotesPage, RateLimitInfo, RawReplyEntry};
use crate::error::FetchError;

/// Default base URL for the remote thread API.
const DEFAULT_BASE_URL: &str = "https://public.api.bsky.app/xrpc";

/// Number of times a single logical fetch retries a 429 before giving up
/// (spec.md §4.1 default retry budget).
const DEFAULT_RETRY_BUDGET: u32 = 3;

/// Trait abstracting the two remote endpoints consumed by the crawler
/// (spec.md §6): thread retrieval and paginated quote discovery.
///
/// Implementations must enforce the rate-limiting contract described in
/// spec.md §4.1 internally; callers never see a raw 429.
#[async_trait::async_trait]
pub trait ThreadApiClient: Send + Sync {
    /// Fetch the reply tree rooted at `uri`.
    ///
    /// `depth` bounds how many levels of replies the server returns;
    /// `parent_height` asks for that many ancestor nodes above `uri`. The
    /// root itself is modeled the same way a reply is: it may come back as a
    /// valid post, or as a deleted/blocked/auth-required marker if the
    /// prompt post itself is no longer available.
    async fn get_post_thread(
        &self,
        uri: &str,
        depth: u32,
        parent_height: u32,
    ) -> Result<RawReplyEntry, FetchError>;

    /// Fetch one page of quote posts referencing `uri`.
    ///
    /// `uri` must be in DID-canonical form (spec.md §6, §9 Open Question).
    async fn get_quotes(
        &self,
        uri: &str,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<QuotesPage, FetchError>;

    /// The most recently observed rate-limit headroom, if any response has
    /// been received yet. Used by the crawler to proactively slow down.
    async fn last_rate_limit(&self) -> Option<RateLimitInfo>;
}

/// HTTP implementation of [`ThreadApiClient`] over the remote thread API.
pub struct HttpThreadApiClient {
    client: reqwest::Client,
    base_url: String,
    rate_limiter: RateLimiter,
    retry_budget: u32,
    last_rate_limit: tokio::sync::RwLock<Option<RateLimitInfo>>,
}

impl HttpThreadApiClient {
    /// Construct a client against the default base URL.
    pub fn new(rate_limiter: RateLimiter) -> Self {
        Self::with_base_url(rate_limiter, DEFAULT_BASE_URL.to_string())
    }

    /// Construct a client against a custom base URL (used in tests, with
    /// `wiremock`).
    pub fn with_base_url(rate_limiter: RateLimiter, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            rate_limiter,
            retry_budget: DEFAULT_RETRY_BUDGET,
            last_rate_limit: tokio::sync::RwLock::new(None),
        }
    }

    /// Override the per-request retry budget (default 3).
    pub fn with_retry_budget(mut self, budget: u32) -> Self {
        self.retry_budget = budget;
        self
    }

    async fn get_with_retries(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::Response, FetchError> {
        let mut attempt = 0;
        loop {
            self.rate_limiter.wait_for_slot().await;

            let url = format!("{}{}", self.base_url, path);
            let response = self
                .client
                .get(&url)
                .query(query)
                .send()
                .await
                .map_err(|source| FetchError::Network { source })?;

            let rate_info = RateLimitInfo::from_headers(response.headers());
            tracing::debug!(
                path,
                remaining = ?rate_info.remaining,
                reset_at = ?rate_info.reset_at,
                "thread API response"
            );
            *self.last_rate_limit.write().await = Some(rate_info.clone());

            if response.status().is_success() {
                return Ok(response);
            }

            if response.status().as_u16() == 429 {
                attempt += 1;
                if attempt > self.retry_budget {
                    return Err(FetchError::RateLimitExceeded);
                }
                let now_epoch = chrono::Utc::now().timestamp() as u64;
                let wait_secs = rate_info
                    .retry_after_secs(response.headers(), now_epoch)
                    .unwrap_or(1)
                    .max(1);
                tracing::warn!(wait_secs, attempt, "rate limited, backing off");
                tokio::time::sleep(std::time::Duration::from_secs(wait_secs)).await;
                continue;
            }

            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(FetchError::Http { status, message });
        }
    }
}

#[async_trait::async_trait]
impl ThreadApiClient for HttpThreadApiClient {
    async fn get_post_thread(
        &self,
        uri: &str,
        depth: u32,
        parent_height: u32,
    ) -> Result<RawReplyEntry, FetchError> {
        let query = vec![
            ("uri".to_string(), uri.to_string()),
            ("depth".to_string(), depth.to_string()),
            ("parentHeight".to_string(), parent_height.to_string()),
        ];
        let query: Vec<(&str, String)> = query
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();

        let response = self
            .get_with_retries("/app.bsky.feed.getPostThread", &query)
            .await?;
        response
            .json::<RawReplyEntry>()
            .await
            .map_err(|source| FetchError::Network { source })
    }

    async fn get_quotes(
        &self,
        uri: &str,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<QuotesPage, FetchError> {
        let mut query = vec![
            ("uri".to_string(), uri.to_string()),
            ("limit".to_string(), limit.min(100).to_string()),
        ];
        if let Some(cursor) = cursor {
            query.push(("cursor".to_string(), cursor.to_string()));
        }
        let query: Vec<(&str, String)> = query
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();

        let response = self
            .get_with_retries("/app.bsky.feed.getQuotes", &query)
            .await?;
        response
            .json::<QuotesPage>()
            .await
            .map_err(|source| FetchError::Network { source })
    }

    async fn last_rate_limit(&self) -> Option<RateLimitInfo> {
        self.last_rate_limit.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::rate_limiter::RateLimiterConfig;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_limiter() -> RateLimiter {
        RateLimiter::new(RateLimiterConfig {
            max_requests: 1000,
            window: std::time::Duration::from_secs(1),
            min_delay: std::time::Duration::from_millis(0),
        })
    }

    fn sample_thread_json() -> serde_json::Value {
        serde_json::json!({
            "type": "post",
            "post": {
                "uri": "at://did:plc:root/app.bsky.feed.post/1",
                "cid": "cid1",
                "author": {"did": "did:plc:root", "handle": "asker.bsky.social"},
                "record": {
                    "text": "what is your comfort tv show?",
                    "createdAt": "2024-01-01T00:00:00Z",
                },
                "replyCount": 0,
            },
            "replies": [],
        })
    }

    #[tokio::test]
    async fn get_post_thread_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/app.bsky.feed.getPostThread"))
            .and(query_param("uri", "at://did:plc:root/app.bsky.feed.post/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_thread_json()))
            .mount(&server)
            .await;

        let client = HttpThreadApiClient::with_base_url(fast_limiter(), server.uri());
        let entry = client
            .get_post_thread("at://did:plc:root/app.bsky.feed.post/1", 50, 0)
            .await
            .expect("thread fetch");

        let RawReplyEntry::Post(node) = entry else { panic!("expected a post root") };
        assert_eq!(node.post.author.handle, "asker.bsky.social");
        assert!(node.replies.is_empty());
    }

    #[tokio::test]
    async fn get_post_thread_retries_on_429_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/app.bsky.feed.getPostThread"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/app.bsky.feed.getPostThread"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_thread_json()))
            .mount(&server)
            .await;

        let client = HttpThreadApiClient::with_base_url(fast_limiter(), server.uri());
        let entry = client.get_post_thread("uri", 50, 0).await.expect("should retry then succeed");
        let RawReplyEntry::Post(node) = entry else { panic!("expected a post root") };
        assert_eq!(node.post.uri, "at://did:plc:root/app.bsky.feed.post/1");
    }

    #[tokio::test]
    async fn get_post_thread_exhausts_retry_budget() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/app.bsky.feed.getPostThread"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
            .mount(&server)
            .await;

        let client = HttpThreadApiClient::with_base_url(fast_limiter(), server.uri())
            .with_retry_budget(2);
        let err = client.get_post_thread("uri", 50, 0).await.unwrap_err();
        assert!(matches!(err, FetchError::RateLimitExceeded));
    }

    #[tokio::test]
    async fn get_post_thread_maps_404_to_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/app.bsky.feed.getPostThread"))
            .respond_with(ResponseTemplate::new(404).set_body_string("post not found"))
            .mount(&server)
            .await;

        let client = HttpThreadApiClient::with_base_url(fast_limiter(), server.uri());
        let err = client.get_post_thread("uri", 50, 0).await.unwrap_err();
        match err {
            FetchError::Http { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "post not found");
            }
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn get_post_thread_deserializes_deleted_root_marker() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/app.bsky.feed.getPostThread"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "type": "deleted",
                "uri": "at://did:plc:root/app.bsky.feed.post/1",
            })))
            .mount(&server)
            .await;

        let client = HttpThreadApiClient::with_base_url(fast_limiter(), server.uri());
        let entry = client.get_post_thread("uri", 50, 0).await.expect("thread fetch");
        assert!(matches!(entry, RawReplyEntry::Deleted { uri } if uri == "at://did:plc:root/app.bsky.feed.post/1"));
    }

    #[tokio::test]
    async fn get_quotes_paginates_with_cursor() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/app.bsky.feed.getQuotes"))
            .and(query_param("cursor", "page2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "posts": [],
                "cursor": null,
            })))
            .mount(&server)
            .await;

        let client = HttpThreadApiClient::with_base_url(fast_limiter(), server.uri());
        let page = client
            .get_quotes("uri", Some("page2"), 100)
            .await
            .expect("quotes fetch");
        assert!(page.posts.is_empty());
        assert!(page.cursor.is_none());
    }
}
