//! Configuration for topictally.
//!
//! Three-layer loading, same as the teacher:
//! 1. Built-in defaults
//! 2. TOML config file
//! 3. Environment variable overrides (`TOPICTALLY_` prefix)
//!
//! CLI flag overrides are applied by the binary crate after loading.

mod defaults;
mod env_overrides;
#[cfg(test)]
mod tests;
mod validation;

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration for a topictally run.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Rate-limited fetcher tuning (spec.md §4.1, §6).
    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// Recursive crawler tuning (spec.md §4.3).
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Normalization policy selection (spec.md §4.5).
    #[serde(default)]
    pub normalization: NormalizationConfig,

    /// Cluster suggester thresholds (spec.md §4.7).
    #[serde(default)]
    pub suggester: SuggesterConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetcher: FetcherConfig::default(),
            crawler: CrawlerConfig::default(),
            normalization: NormalizationConfig::default(),
            suggester: SuggesterConfig::default(),
        }
    }
}

/// `[fetcher]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetcherConfig {
    /// Maximum completed requests within `window_ms` (spec.md §4.1).
    #[serde(default = "defaults::fetcher_max_requests")]
    pub max_requests: u64,

    /// The trailing window, in milliseconds, `max_requests` is enforced over.
    #[serde(default = "defaults::fetcher_window_ms")]
    pub window_ms: u64,

    /// Minimum spacing between successive request departures, in milliseconds.
    #[serde(default = "defaults::fetcher_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Retries allowed against a single 429 before failing rate-limit-exceeded.
    #[serde(default = "defaults::fetcher_retry_budget")]
    pub retry_budget: u32,

    /// Remaining-request headroom below which the crawler proactively slows down.
    #[serde(default = "defaults::fetcher_rate_limit_warn_threshold")]
    pub rate_limit_warn_threshold: u64,

    /// Base URL of the remote thread API.
    #[serde(default = "defaults::fetcher_base_url")]
    pub base_url: String,
}

/// `[crawler]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrawlerConfig {
    /// Depth cap for discovering new quote-post subtrees (spec.md §4.3 step 5).
    #[serde(default = "defaults::crawler_max_depth")]
    pub max_depth: u32,

    /// Recursion cap for re-fetching truncated subtrees.
    #[serde(default = "defaults::crawler_truncation_recursion_cap")]
    pub truncation_recursion_cap: u32,

    /// Page size requested from the paginated quotes endpoint (max 100).
    #[serde(default = "defaults::crawler_quotes_page_size")]
    pub quotes_page_size: u32,

    /// Number of quote subtrees fetched concurrently per batch.
    #[serde(default = "defaults::crawler_quote_fetch_concurrency")]
    pub quote_fetch_concurrency: usize,
}

/// `[normalization]` section.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NormalizationConfig {
    /// Which normalization policy to run (spec.md §4.5 A/B/C).
    ///
    /// When absent, the policy is inferred: `custom_list` present selects
    /// `list`; `media_types` present selects `catalog`; neither present
    /// selects `self_validation` (spec.md §6).
    #[serde(default)]
    pub policy: Option<NormalizationPolicy>,

    /// Endpoint for the external catalog validation policy.
    #[serde(default)]
    pub validation_api_url: Option<String>,

    /// Endpoint for resolving unresolved link-card titles via oEmbed.
    #[serde(default)]
    pub oembed_api_url: Option<String>,

    /// Media types that select the external-catalog policy when present.
    #[serde(default)]
    pub media_types: Vec<String>,

    /// User-supplied canonical title list for the list policy.
    #[serde(default)]
    pub custom_list: Vec<CustomListEntry>,
}

/// Which normalization policy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationPolicy {
    /// Policy A: validate candidates against an external catalog.
    Catalog,
    /// Policy B: validate candidates against a user-supplied list.
    List,
    /// Policy C: self-validate using category-word heuristics.
    SelfValidation,
}

/// One entry in `[[normalization.custom_list]]`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CustomListEntry {
    /// The canonical title.
    pub title: String,
    /// Alternate surface forms that should resolve to `title`.
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// `[suggester]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SuggesterConfig {
    /// Minimum bigram Jaccard score accepted by the n-gram matcher.
    #[serde(default = "defaults::suggester_ngram_threshold")]
    pub ngram_threshold: f64,

    /// Minimum normalized edit similarity accepted by the Levenshtein matcher.
    #[serde(default = "defaults::suggester_levenshtein_threshold")]
    pub levenshtein_threshold: f64,

    /// Minimum average per-post score a cluster needs to survive.
    #[serde(default = "defaults::suggester_min_cluster_score")]
    pub min_cluster_score: f64,
}

impl Config {
    /// Load configuration from a TOML file with environment variable overrides.
    ///
    /// 1. Determine config file path (argument > `TOPICTALLY_CONFIG` env var > default)
    /// 2. Parse TOML file (or use defaults if the default path is absent)
    /// 3. Apply environment variable overrides
    pub fn load(config_path: Option<&str>) -> Result<Config, ConfigError> {
        let (path, explicit) = Self::resolve_config_path(config_path);

        let mut config = match std::fs::read_to_string(&path) {
            Ok(contents) => {
                toml::from_str::<Config>(&contents).map_err(|source| ConfigError::ParseError { source })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if explicit {
                    return Err(ConfigError::FileNotFound {
                        path: path.display().to_string(),
                    });
                }
                Config::default()
            }
            Err(_) => {
                return Err(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                });
            }
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration and validate it, collecting every error found.
    pub fn load_and_validate(config_path: Option<&str>) -> Result<Config, Vec<ConfigError>> {
        let config = Config::load(config_path).map_err(|e| vec![e])?;
        config.validate()?;
        Ok(config)
    }

    /// The effective normalization policy: explicit `policy`, or inferred
    /// from which of `custom_list`/`media_types` is populated (spec.md §6).
    pub fn effective_policy(&self) -> NormalizationPolicy {
        if let Some(policy) = self.normalization.policy {
            return policy;
        }
        if !self.normalization.custom_list.is_empty() {
            NormalizationPolicy::List
        } else if !self.normalization.media_types.is_empty() {
            NormalizationPolicy::Catalog
        } else {
            NormalizationPolicy::SelfValidation
        }
    }

    fn resolve_config_path(config_path: Option<&str>) -> (PathBuf, bool) {
        if let Some(path) = config_path {
            return (PathBuf::from(path), true);
        }
        if let Ok(env_path) = env::var("TOPICTALLY_CONFIG") {
            return (PathBuf::from(env_path), true);
        }
        (PathBuf::from("config.toml"), false)
    }
}
