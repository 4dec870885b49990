//! Default values for all configuration sections.

use super::{CrawlerConfig, FetcherConfig, SuggesterConfig};

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_requests: fetcher_max_requests(),
            window_ms: fetcher_window_ms(),
            min_delay_ms: fetcher_min_delay_ms(),
            retry_budget: fetcher_retry_budget(),
            rate_limit_warn_threshold: fetcher_rate_limit_warn_threshold(),
            base_url: fetcher_base_url(),
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: crawler_max_depth(),
            truncation_recursion_cap: crawler_truncation_recursion_cap(),
            quotes_page_size: crawler_quotes_page_size(),
            quote_fetch_concurrency: crawler_quote_fetch_concurrency(),
        }
    }
}

impl Default for SuggesterConfig {
    fn default() -> Self {
        Self {
            ngram_threshold: suggester_ngram_threshold(),
            levenshtein_threshold: suggester_levenshtein_threshold(),
            min_cluster_score: suggester_min_cluster_score(),
        }
    }
}

pub(super) fn fetcher_max_requests() -> u64 {
    100
}
pub(super) fn fetcher_window_ms() -> u64 {
    300_000
}
pub(super) fn fetcher_min_delay_ms() -> u64 {
    200
}
pub(super) fn fetcher_retry_budget() -> u32 {
    3
}
pub(super) fn fetcher_rate_limit_warn_threshold() -> u64 {
    10
}
pub(super) fn fetcher_base_url() -> String {
    "https://public.api.bsky.app/xrpc".to_string()
}

pub(super) fn crawler_max_depth() -> u32 {
    5
}
pub(super) fn crawler_truncation_recursion_cap() -> u32 {
    5
}
pub(super) fn crawler_quotes_page_size() -> u32 {
    100
}
pub(super) fn crawler_quote_fetch_concurrency() -> usize {
    5
}

pub(super) fn suggester_ngram_threshold() -> f64 {
    0.5
}
pub(super) fn suggester_levenshtein_threshold() -> f64 {
    0.8
}
pub(super) fn suggester_min_cluster_score() -> f64 {
    0.4
}
