//! Top-level orchestration (spec.md §5, §6): wires the crawler, extractor,
//! normalizer, attributor, and suggester into one analysis run.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::attribute;
use crate::config::Config;
use crate::crawler::{self, CrawlStage};
use crate::error::PipelineError;
use crate::extract;
use crate::model::{AnalysisResult, CanonicalTitle, Post};
use crate::net::ThreadApiClient;
use crate::normalize::{self, ValidationClient};
use crate::suggest;

/// Progress stage reported via `on_stage` (spec.md §6 `onStage`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Crawling the thread and its quotes.
    Fetching,
    /// Resolving link-card/oEmbed titles (not yet wired to a resolver).
    Embeds,
    /// Running the normalization policy.
    Validating,
    /// Attributing posts and building the tally.
    Counting,
    /// Running the cluster suggester over uncategorized posts.
    Labeling,
    /// The run finished successfully.
    Complete,
    /// The run failed.
    Error,
}

/// Orchestrates one end-to-end analysis run.
pub struct AnalysisPipeline {
    client: Arc<dyn ThreadApiClient>,
    validation_client: Option<Arc<dyn ValidationClient>>,
    config: Config,
    degrade_on_validation_error: bool,
}

impl AnalysisPipeline {
    /// Construct a pipeline against a thread API client and configuration.
    pub fn new(client: Arc<dyn ThreadApiClient>, config: Config) -> Self {
        Self { client, validation_client: None, config, degrade_on_validation_error: false }
    }

    /// Supply a validation client for the external-catalog policy.
    pub fn with_validation_client(mut self, client: Arc<dyn ValidationClient>) -> Self {
        self.validation_client = Some(client);
        self
    }

    /// If the catalog policy fails, fall back to self-validation instead of
    /// surfacing a pipeline error (spec.md §7 *validation-failed*).
    pub fn degrade_on_validation_error(mut self, degrade: bool) -> Self {
        self.degrade_on_validation_error = degrade;
        self
    }

    /// Run one analysis over the thread rooted at `root_uri`.
    pub async fn run(
        &self,
        root_uri: &str,
        cancel: &CancellationToken,
        mut on_stage: impl FnMut(Stage, Option<String>),
        mut on_fetch_progress: impl FnMut(u64, CrawlStage),
    ) -> Result<AnalysisResult, PipelineError> {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        on_stage(Stage::Fetching, None);
        let (root_post, all_posts) =
            match crawler::crawl(self.client.clone(), &self.config.crawler, root_uri, cancel, &mut on_fetch_progress).await {
                Ok(pair) => pair,
                Err(error) => {
                    on_stage(Stage::Error, Some(error.to_string()));
                    return Err(error.into());
                }
            };

        if cancel.is_cancelled() {
            on_stage(Stage::Error, Some("analysis cancelled".to_string()));
            return Err(PipelineError::Cancelled);
        }

        on_stage(Stage::Embeds, None);
        let candidates = extract_all_candidates(&root_post, &all_posts);

        on_stage(Stage::Validating, None);
        let normalized = match normalize::normalize(
            &self.config,
            &root_post.text,
            &candidates,
            self.validation_client.as_deref(),
        )
        .await
        {
            Ok(titles) => titles,
            Err(error) if self.degrade_on_validation_error => {
                tracing::warn!(%error, "normalization policy failed, degrading to self-validation");
                normalize::merge::substring_merge(normalize::self_validate::run_self_validation(
                    &root_post.text,
                    &candidates,
                ))
            }
            Err(error) => {
                on_stage(Stage::Error, Some(error.to_string()));
                return Err(error.into());
            }
        };

        if cancel.is_cancelled() {
            on_stage(Stage::Error, Some("analysis cancelled".to_string()));
            return Err(PipelineError::Cancelled);
        }

        on_stage(Stage::Counting, None);
        let (tally, uncategorized) = attribute::attribute(&all_posts, &normalized, &root_post.uri);

        on_stage(Stage::Labeling, None);
        let canonical_titles: Vec<CanonicalTitle> = normalized.iter().map(|t| t.canonical.clone()).collect();
        let cluster_suggestions = suggest::suggest(&uncategorized, &canonical_titles, &self.config.suggester);

        on_stage(Stage::Complete, None);

        Ok(AnalysisResult {
            root_post,
            tally,
            uncategorized,
            post_count: all_posts.len(),
            cluster_suggestions,
        })
    }
}

fn extract_all_candidates(root_post: &Post, all_posts: &[Post]) -> Vec<crate::model::Candidate> {
    let by_uri: std::collections::HashMap<&str, &Post> = all_posts.iter().map(|p| (p.uri.as_str(), p)).collect();

    let mut candidates = Vec::new();
    for post in all_posts {
        if post.uri == root_post.uri {
            continue;
        }
        let quoted = post.quoted_uri.as_deref().and_then(|uri| by_uri.get(uri).copied());
        candidates.extend(extract::extract_candidates(post, quoted));
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::net::{QuotesPage, RateLimitInfo, RawAuthor, RawPost, RawRecord, RawReplyEntry, RawThreadNode};

    struct FakeClient;

    #[async_trait::async_trait]
    impl ThreadApiClient for FakeClient {
        async fn get_post_thread(
            &self,
            uri: &str,
            _depth: u32,
            _parent_height: u32,
        ) -> Result<RawReplyEntry, FetchError> {
            Ok(RawReplyEntry::Post(RawThreadNode {
                post: RawPost {
                    uri: uri.to_string(),
                    cid: "cid".to_string(),
                    author: RawAuthor { did: "did:plc:root".to_string(), handle: "asker.bsky.social".to_string() },
                    record: RawRecord {
                        text: "what's your favorite movie".to_string(),
                        created_at: chrono::Utc::now(),
                        parent_uri: None,
                        media: vec![],
                        link_card: None,
                    },
                    reply_count: Some(1),
                    quoted_uri: None,
                },
                replies: vec![crate::net::RawReplyEntry::Post(RawThreadNode {
                    post: RawPost {
                        uri: "reply1".to_string(),
                        cid: "cid2".to_string(),
                        author: RawAuthor { did: "did:plc:reply".to_string(), handle: "fan.bsky.social".to_string() },
                        record: RawRecord {
                            text: "The Matrix".to_string(),
                            created_at: chrono::Utc::now(),
                            parent_uri: None,
                            media: vec![],
                            link_card: None,
                        },
                        reply_count: Some(0),
                        quoted_uri: None,
                    },
                    replies: vec![],
                })],
            }))
        }

        async fn get_quotes(&self, _uri: &str, _cursor: Option<&str>, _limit: u32) -> Result<QuotesPage, FetchError> {
            Ok(QuotesPage { posts: vec![], cursor: None })
        }

        async fn last_rate_limit(&self) -> Option<RateLimitInfo> {
            None
        }
    }

    #[tokio::test]
    async fn end_to_end_self_validation_run() {
        let pipeline = AnalysisPipeline::new(Arc::new(FakeClient), Config::default());
        let cancel = CancellationToken::new();
        let result = pipeline
            .run("root", &cancel, |_, _| {}, |_, _| {})
            .await
            .expect("pipeline run");

        assert_eq!(result.root_post.uri, "root");
        assert_eq!(result.post_count, 2);
        assert_eq!(result.tally.len(), 1);
        assert_eq!(result.tally[0].title.as_str(), "Matrix");
    }

    #[tokio::test]
    async fn cancellation_before_run_short_circuits() {
        let pipeline = AnalysisPipeline::new(Arc::new(FakeClient), Config::default());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = pipeline.run("root", &cancel, |_, _| {}, |_, _| {}).await.unwrap_err();
        assert!(matches!(err, PipelineError::Cancelled));
    }
}
