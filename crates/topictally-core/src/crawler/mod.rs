//! Recursive crawler (spec.md §4.3): fetches the root thread, re-fetches
//! truncated subtrees, then paginates quote discovery and walks each quote's
//! own subtree and quotes, transitively and bounded by depth.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::CrawlerConfig;
use crate::error::CrawlError;
use crate::model::Post;
use crate::net::{RawReplyEntry, ThreadApiClient};
use crate::thread::ThreadTree;

/// Reply-tree depth requested on the root fetch; large enough in practice
/// that the server's own cap, not this one, determines what comes back.
const ROOT_THREAD_DEPTH: u32 = 1000;

/// Depth requested when re-fetching a subtree for a truncation record or a
/// newly-discovered quote post.
const SUBTREE_DEPTH: u32 = 200;

/// Crawl progress stage (spec.md §6 `onFetchProgress`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlStage {
    /// The initial root thread fetch.
    Thread,
    /// A truncated-subtree follow-up fetch.
    Truncated,
    /// A page of the quotes endpoint.
    Quotes,
    /// A subtree fetch triggered by quote discovery.
    Recursive,
}

/// Crawl the thread rooted at `root_uri`, returning the root post and every
/// post gathered (spec.md §4.3). `on_progress` is invoked after each
/// page/batch with the running total of posts gathered so far.
pub async fn crawl(
    client: Arc<dyn ThreadApiClient>,
    config: &CrawlerConfig,
    root_uri: &str,
    cancel: &CancellationToken,
    mut on_progress: impl FnMut(u64, CrawlStage),
) -> Result<(Post, Vec<Post>), CrawlError> {
    let raw_root = client
        .get_post_thread(root_uri, ROOT_THREAD_DEPTH, 0)
        .await
        .map_err(|source| CrawlError::NoPosts { source })?;

    let tree = ThreadTree::build(raw_root)?;
    let root_post = tree.root_post().clone();

    let mut visited: HashSet<String> = tree.all_posts().iter().map(|p| p.uri.clone()).collect();
    let mut all_posts: Vec<Post> = tree.all_posts().to_vec();
    let mut pending_truncations: Vec<String> = tree.truncated_posts().iter().map(|t| t.uri.clone()).collect();

    on_progress(all_posts.len() as u64, CrawlStage::Thread);

    // Step 3: re-fetch truncated subtrees, recursion-capped.
    let mut level = 0;
    while !pending_truncations.is_empty() && level < config.truncation_recursion_cap {
        if cancel.is_cancelled() {
            return Err(CrawlError::Cancelled);
        }
        let mut next_level = Vec::new();
        for uri in pending_truncations.drain(..) {
            match client.get_post_thread(&uri, SUBTREE_DEPTH, 0).await {
                Ok(raw_subtree) => {
                    let subtree = match ThreadTree::build(raw_subtree) {
                        Ok(t) => t,
                        Err(err) => {
                            tracing::warn!(uri, error = %err, "dropping unbuildable truncation subtree");
                            continue;
                        }
                    };
                    merge_new_posts(&mut visited, &mut all_posts, subtree.all_posts());
                    for record in subtree.truncated_posts() {
                        next_level.push(record.uri.clone());
                    }
                }
                Err(error) => {
                    tracing::warn!(uri, %error, "truncation follow-up fetch failed, skipping");
                }
            }
        }
        level += 1;
        on_progress(all_posts.len() as u64, CrawlStage::Truncated);
        pending_truncations = next_level;
    }

    // Step 4/5: paginate quotes for the root, then transitively for each
    // newly-discovered quote post, bounded by max_depth.
    discover_quotes(
        &client,
        config,
        &root_post.uri,
        0,
        &mut visited,
        &mut all_posts,
        cancel,
        &mut on_progress,
    )
    .await?;

    Ok((root_post, all_posts))
}

fn merge_new_posts(visited: &mut HashSet<String>, all_posts: &mut Vec<Post>, candidates: &[Post]) {
    for post in candidates {
        if visited.insert(post.uri.clone()) {
            all_posts.push(post.clone());
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn discover_quotes(
    client: &Arc<dyn ThreadApiClient>,
    config: &CrawlerConfig,
    uri: &str,
    depth: u32,
    visited: &mut HashSet<String>,
    all_posts: &mut Vec<Post>,
    cancel: &CancellationToken,
    on_progress: &mut impl FnMut(u64, CrawlStage),
) -> Result<(), CrawlError> {
    if depth >= config.max_depth {
        return Ok(());
    }

    let mut cursor: Option<String> = None;
    loop {
        if cancel.is_cancelled() {
            return Err(CrawlError::Cancelled);
        }

        let page = match client
            .get_quotes(uri, cursor.as_deref(), config.quotes_page_size)
            .await
        {
            Ok(page) => page,
            Err(error) => {
                tracing::warn!(uri, %error, "quotes fetch failed, skipping");
                return Ok(());
            }
        };

        let mut new_quote_uris = Vec::new();
        for raw in &page.posts {
            if visited.insert(raw.uri.clone()) {
                new_quote_uris.push(raw.uri.clone());
            }
        }

        // Step 4: fetch each new quote's own subtree, bounded parallelism.
        for batch in new_quote_uris.chunks(config.quote_fetch_concurrency) {
            let trees = fetch_batch(client, batch).await;
            for (subtree_uri, result) in trees {
                match result {
                    Ok(raw_subtree) => match ThreadTree::build(raw_subtree) {
                        Ok(subtree) => merge_new_posts(visited, all_posts, subtree.all_posts()),
                        Err(err) => {
                            tracing::warn!(uri = subtree_uri, error = %err, "dropping unbuildable quote subtree");
                        }
                    },
                    Err(error) => {
                        tracing::warn!(uri = subtree_uri, %error, "quote subtree fetch failed, skipping");
                    }
                }
            }
            on_progress(all_posts.len() as u64, CrawlStage::Recursive);
        }

        // Step 5: recurse into each new quote's own quotes, depth-capped.
        for quote_uri in &new_quote_uris {
            Box::pin(discover_quotes(
                client,
                config,
                quote_uri,
                depth + 1,
                visited,
                all_posts,
                cancel,
                on_progress,
            ))
            .await?;
        }

        on_progress(all_posts.len() as u64, CrawlStage::Quotes);

        match page.cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    Ok(())
}

async fn fetch_batch(
    client: &Arc<dyn ThreadApiClient>,
    uris: &[String],
) -> Vec<(String, Result<RawReplyEntry, crate::error::FetchError>)> {
    let mut set = JoinSet::new();
    for uri in uris {
        let client = client.clone();
        let uri = uri.clone();
        set.spawn(async move {
            let result = client.get_post_thread(&uri, SUBTREE_DEPTH, 0).await;
            (uri, result)
        });
    }

    let mut results = Vec::with_capacity(uris.len());
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(pair) => results.push(pair),
            Err(join_err) => {
                tracing::warn!(error = %join_err, "quote subtree fetch task panicked");
            }
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlerConfig;
    use crate::error::FetchError;
    use crate::net::{QuotesPage, RateLimitInfo, RawAuthor, RawPost, RawRecord, RawThreadNode};
    use std::sync::Mutex;

    struct FakeClient {
        // Each uri maps to a queue of responses; once exhausted, the last
        // response is repeated. Lets a test simulate a truncation re-fetch
        // returning a fuller payload than the first call.
        threads: Mutex<std::collections::HashMap<String, std::collections::VecDeque<RawThreadNode>>>,
        quotes: std::collections::HashMap<String, QuotesPage>,
        quote_calls: Mutex<Vec<String>>,
    }

    impl FakeClient {
        fn single(threads: std::collections::HashMap<String, RawThreadNode>) -> Self {
            Self {
                threads: Mutex::new(
                    threads
                        .into_iter()
                        .map(|(k, v)| (k, std::collections::VecDeque::from(vec![v])))
                        .collect(),
                ),
                quotes: std::collections::HashMap::new(),
                quote_calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl ThreadApiClient for FakeClient {
        async fn get_post_thread(
            &self,
            uri: &str,
            _depth: u32,
            _parent_height: u32,
        ) -> Result<RawReplyEntry, FetchError> {
            let mut threads = self.threads.lock().unwrap();
            let queue = threads
                .get_mut(uri)
                .ok_or_else(|| FetchError::Http { status: 404, message: "not found".to_string() })?;
            let next = if queue.len() > 1 { queue.pop_front() } else { queue.front().cloned() };
            next.map(RawReplyEntry::Post)
                .ok_or_else(|| FetchError::Http { status: 404, message: "not found".to_string() })
        }

        async fn get_quotes(
            &self,
            uri: &str,
            _cursor: Option<&str>,
            _limit: u32,
        ) -> Result<QuotesPage, FetchError> {
            self.quote_calls.lock().unwrap().push(uri.to_string());
            Ok(self.quotes.get(uri).cloned().unwrap_or(QuotesPage { posts: vec![], cursor: None }))
        }

        async fn last_rate_limit(&self) -> Option<RateLimitInfo> {
            None
        }
    }

    fn author(id: &str) -> RawAuthor {
        RawAuthor { did: format!("did:plc:{id}"), handle: format!("{id}.bsky.social") }
    }

    fn raw_post(uri: &str, text: &str) -> RawPost {
        RawPost {
            uri: uri.to_string(),
            cid: format!("cid-{uri}"),
            author: author(uri),
            record: RawRecord {
                text: text.to_string(),
                created_at: chrono::Utc::now(),
                parent_uri: None,
                media: vec![],
                link_card: None,
            },
            reply_count: Some(0),
            quoted_uri: None,
        }
    }

    fn leaf_thread(uri: &str, text: &str) -> RawThreadNode {
        RawThreadNode { post: raw_post(uri, text), replies: vec![] }
    }

    #[tokio::test]
    async fn crawls_root_only_thread() {
        let mut threads = std::collections::HashMap::new();
        threads.insert("root".to_string(), leaf_thread("root", "what's your favorite show"));
        let client = Arc::new(FakeClient::single(threads));

        let config = CrawlerConfig::default();
        let cancel = CancellationToken::new();
        let (root, posts) = crawl(client, &config, "root", &cancel, |_, _| {}).await.unwrap();
        assert_eq!(root.uri, "root");
        assert_eq!(posts.len(), 1);
    }

    #[tokio::test]
    async fn discovers_and_walks_quote_posts() {
        let mut threads = std::collections::HashMap::new();
        threads.insert("root".to_string(), leaf_thread("root", "what's your favorite show"));
        threads.insert("quote1".to_string(), leaf_thread("quote1", "Sailor Moon"));

        let mut client = FakeClient::single(threads);
        client.quotes.insert(
            "root".to_string(),
            QuotesPage { posts: vec![raw_post("quote1", "Sailor Moon")], cursor: None },
        );

        let config = CrawlerConfig::default();
        let cancel = CancellationToken::new();
        let (_, posts) = crawl(Arc::new(client), &config, "root", &cancel, |_, _| {}).await.unwrap();

        assert_eq!(posts.len(), 2);
        assert!(posts.iter().any(|p| p.uri == "quote1"));
    }

    #[tokio::test]
    async fn root_fetch_failure_is_fatal() {
        let client = Arc::new(FakeClient::single(std::collections::HashMap::new()));
        let config = CrawlerConfig::default();
        let cancel = CancellationToken::new();
        let err = crawl(client, &config, "missing-root", &cancel, |_, _| {}).await.unwrap_err();
        assert!(matches!(err, CrawlError::NoPosts { .. }));
    }

    #[tokio::test]
    async fn merges_truncated_subtree_follow_up() {
        let truncated_root = RawThreadNode {
            post: RawPost { reply_count: Some(2), ..raw_post("root", "prompt") },
            replies: vec![crate::net::RawReplyEntry::Post(leaf_thread("c1", "only one delivered"))],
        };
        let fuller_root = RawThreadNode {
            post: RawPost { reply_count: Some(2), ..raw_post("root", "prompt") },
            replies: vec![
                crate::net::RawReplyEntry::Post(leaf_thread("c1", "only one delivered")),
                crate::net::RawReplyEntry::Post(leaf_thread("c2", "the other one")),
            ],
        };

        let client = FakeClient {
            threads: Mutex::new(std::collections::HashMap::from([(
                "root".to_string(),
                std::collections::VecDeque::from(vec![truncated_root, fuller_root]),
            )])),
            quotes: std::collections::HashMap::new(),
            quote_calls: Mutex::new(Vec::new()),
        };

        let config = CrawlerConfig::default();
        let cancel = CancellationToken::new();
        let (_, posts) = crawl(Arc::new(client), &config, "root", &cancel, |_, _| {}).await.unwrap();
        // first fetch delivers 1 of 2 declared children; the truncation
        // follow-up re-fetches "root" and picks up the second child.
        assert_eq!(posts.len(), 2);
        assert!(posts.iter().any(|p| p.uri == "c2"));
    }
}
