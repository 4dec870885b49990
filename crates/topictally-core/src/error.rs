//! Error types for the topictally core library.
//!
//! Each module boundary gets its own error enum so callers can match on
//! exactly the failure modes that boundary can produce. Built with
//! `thiserror` for structured, typed errors, matching the error kinds in
//! spec.md §7.

/// Errors from configuration loading, parsing, and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required configuration field is absent.
    #[error("missing required config field: {field}")]
    MissingField {
        /// The name of the missing field.
        field: String,
    },

    /// A configuration field has an unacceptable value.
    #[error("invalid value for config field '{field}': {message}")]
    InvalidValue {
        /// The name of the invalid field.
        field: String,
        /// A description of why the value is invalid.
        message: String,
    },

    /// The configuration file does not exist at the specified path.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// The path that was searched.
        path: String,
    },

    /// TOML deserialization failed.
    #[error("failed to parse config file: {source}")]
    ParseError {
        /// The underlying TOML parse error.
        #[source]
        source: toml::de::Error,
    },
}

/// Errors from the rate-limited fetcher (spec.md §4.1).
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The per-request retry budget was exhausted while waiting out 429s.
    #[error("rate limit exceeded after exhausting retry budget")]
    RateLimitExceeded,

    /// Transport-level failure reaching the remote API.
    #[error("network error: {source}")]
    Network {
        /// The underlying HTTP client error.
        #[source]
        source: reqwest::Error,
    },

    /// A non-OK, non-429 HTTP response. Carries the server's message verbatim.
    #[error("HTTP {status}: {message}")]
    Http {
        /// The HTTP status code.
        status: u16,
        /// The server-provided error message.
        message: String,
    },

    /// The fetch was aborted by a cancellation handle.
    #[error("fetch cancelled")]
    Cancelled,
}

/// Errors from the recursive crawler (spec.md §4.3).
#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    /// The prompt post itself is deleted, blocked, or requires auth.
    #[error("root post is unavailable (deleted, blocked, or auth-required)")]
    RootUnavailable,

    /// The root thread fetch failed outright; nothing was gathered.
    #[error("failed to fetch any posts from the root thread: {source}")]
    NoPosts {
        /// The fetch failure that caused the crawl to abort.
        #[source]
        source: FetchError,
    },

    /// The crawl was aborted by a cancellation handle.
    #[error("crawl cancelled")]
    Cancelled,

    /// A fetch failure that the crawler could not recover from locally.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Errors from the normalizer's external-catalog validation policy (spec.md §4.5A).
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// The validation catalog endpoint could not be reached.
    #[error("validation catalog unavailable: {source}")]
    CatalogUnavailable {
        /// The underlying fetch failure.
        #[source]
        source: FetchError,
    },

    /// The validation catalog returned an error response.
    #[error("validation catalog error: {message}")]
    CatalogError {
        /// The error message from the catalog service.
        message: String,
    },
}

/// Top-level error type returned by [`crate::pipeline::AnalysisPipeline::run`].
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Thread crawling failed.
    #[error(transparent)]
    Crawl(#[from] CrawlError),

    /// Candidate validation failed and the caller did not opt into
    /// degrading to self-validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The pipeline was aborted by a cancellation handle.
    #[error("analysis cancelled")]
    Cancelled,
}
