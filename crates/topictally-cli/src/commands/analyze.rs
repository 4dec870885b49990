//! Implementation of the `topictally analyze` command.
//!
//! Runs one end-to-end analysis against a thread URI and prints the tally,
//! driving the pipeline's stage/progress callbacks to stderr so `--json`
//! output on stdout stays machine-readable.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use topictally_core::config::Config;
use topictally_core::crawler::CrawlStage;
use topictally_core::net::rate_limiter::{RateLimiter, RateLimiterConfig};
use topictally_core::net::HttpThreadApiClient;
use topictally_core::pipeline::{AnalysisPipeline, Stage};

use super::AnalyzeArgs;

/// Execute the `topictally analyze` command.
pub async fn execute(config: &Config, args: AnalyzeArgs) -> anyhow::Result<()> {
    let rate_limiter = RateLimiter::new(RateLimiterConfig {
        max_requests: config.fetcher.max_requests as usize,
        window: Duration::from_millis(config.fetcher.window_ms),
        min_delay: Duration::from_millis(config.fetcher.min_delay_ms),
    });
    let client = Arc::new(
        HttpThreadApiClient::with_base_url(rate_limiter, config.fetcher.base_url.clone())
            .with_retry_budget(config.fetcher.retry_budget),
    );

    let pipeline = AnalysisPipeline::new(client, config.clone());
    let cancel = CancellationToken::new();

    let on_stage = |stage: Stage, detail: Option<String>| {
        if args.json {
            return;
        }
        match detail {
            Some(detail) => eprintln!("[{stage:?}] {detail}"),
            None => eprintln!("[{stage:?}]"),
        }
    };
    let on_fetch_progress = |count: u64, crawl_stage: CrawlStage| {
        if args.json {
            return;
        }
        eprintln!("  fetched {count} posts ({crawl_stage:?})");
    };

    let result = pipeline.run(&args.thread_uri, &cancel, on_stage, on_fetch_progress).await?;

    if args.json {
        println!("{}", serde_json::to_string(&result)?);
        return Ok(());
    }

    println!("Thread: {}", result.root_post.uri);
    println!("Posts gathered: {}", result.post_count);
    println!();
    if result.tally.is_empty() {
        println!("No titles tallied.");
    } else {
        for entry in &result.tally {
            println!("{:<40} {}", entry.title.as_str(), entry.count);
        }
    }

    if !result.cluster_suggestions.is_empty() {
        println!();
        println!("Cluster suggestions (uncategorized posts, pending review):");
        for suggestion in &result.cluster_suggestions {
            println!(
                "  {:<30} {} post(s), score {:.2} ({:?})",
                suggestion.suggested_title,
                suggestion.post_uris.len(),
                suggestion.average_score,
                suggestion.method
            );
        }
    }

    if !result.uncategorized.is_empty() {
        println!();
        println!("{} post(s) left uncategorized.", result.uncategorized.len());
    }

    Ok(())
}
