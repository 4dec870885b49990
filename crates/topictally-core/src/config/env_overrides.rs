//! Environment variable overrides, applied after the TOML layer.
//!
//! Variables use the `TOPICTALLY_` prefix with double underscores separating
//! nested keys (e.g. `TOPICTALLY_FETCHER__MAX_REQUESTS`).

use std::env;

use super::{Config, NormalizationPolicy};
use crate::error::ConfigError;

impl Config {
    pub(super) fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = env::var("TOPICTALLY_FETCHER__MAX_REQUESTS") {
            self.fetcher.max_requests = parse_env_u64("TOPICTALLY_FETCHER__MAX_REQUESTS", &val)?;
        }
        if let Ok(val) = env::var("TOPICTALLY_FETCHER__WINDOW_MS") {
            self.fetcher.window_ms = parse_env_u64("TOPICTALLY_FETCHER__WINDOW_MS", &val)?;
        }
        if let Ok(val) = env::var("TOPICTALLY_FETCHER__MIN_DELAY_MS") {
            self.fetcher.min_delay_ms = parse_env_u64("TOPICTALLY_FETCHER__MIN_DELAY_MS", &val)?;
        }
        if let Ok(val) = env::var("TOPICTALLY_FETCHER__RETRY_BUDGET") {
            self.fetcher.retry_budget = parse_env_u32("TOPICTALLY_FETCHER__RETRY_BUDGET", &val)?;
        }
        if let Ok(val) = env::var("TOPICTALLY_FETCHER__RATE_LIMIT_WARN_THRESHOLD") {
            self.fetcher.rate_limit_warn_threshold =
                parse_env_u64("TOPICTALLY_FETCHER__RATE_LIMIT_WARN_THRESHOLD", &val)?;
        }
        if let Ok(val) = env::var("TOPICTALLY_FETCHER__BASE_URL") {
            self.fetcher.base_url = val;
        }

        if let Ok(val) = env::var("TOPICTALLY_CRAWLER__MAX_DEPTH") {
            self.crawler.max_depth = parse_env_u32("TOPICTALLY_CRAWLER__MAX_DEPTH", &val)?;
        }
        if let Ok(val) = env::var("TOPICTALLY_CRAWLER__TRUNCATION_RECURSION_CAP") {
            self.crawler.truncation_recursion_cap =
                parse_env_u32("TOPICTALLY_CRAWLER__TRUNCATION_RECURSION_CAP", &val)?;
        }
        if let Ok(val) = env::var("TOPICTALLY_CRAWLER__QUOTES_PAGE_SIZE") {
            self.crawler.quotes_page_size =
                parse_env_u32("TOPICTALLY_CRAWLER__QUOTES_PAGE_SIZE", &val)?;
        }
        if let Ok(val) = env::var("TOPICTALLY_CRAWLER__QUOTE_FETCH_CONCURRENCY") {
            self.crawler.quote_fetch_concurrency =
                parse_env_usize("TOPICTALLY_CRAWLER__QUOTE_FETCH_CONCURRENCY", &val)?;
        }

        if let Ok(val) = env::var("TOPICTALLY_NORMALIZATION__POLICY") {
            self.normalization.policy = Some(parse_env_policy("TOPICTALLY_NORMALIZATION__POLICY", &val)?);
        }
        if let Ok(val) = env::var("TOPICTALLY_NORMALIZATION__VALIDATION_API_URL") {
            self.normalization.validation_api_url = Some(val);
        }
        if let Ok(val) = env::var("TOPICTALLY_NORMALIZATION__OEMBED_API_URL") {
            self.normalization.oembed_api_url = Some(val);
        }
        if let Ok(val) = env::var("TOPICTALLY_NORMALIZATION__MEDIA_TYPES") {
            self.normalization.media_types = split_csv(&val);
        }

        if let Ok(val) = env::var("TOPICTALLY_SUGGESTER__NGRAM_THRESHOLD") {
            self.suggester.ngram_threshold =
                parse_env_f64("TOPICTALLY_SUGGESTER__NGRAM_THRESHOLD", &val)?;
        }
        if let Ok(val) = env::var("TOPICTALLY_SUGGESTER__LEVENSHTEIN_THRESHOLD") {
            self.suggester.levenshtein_threshold =
                parse_env_f64("TOPICTALLY_SUGGESTER__LEVENSHTEIN_THRESHOLD", &val)?;
        }
        if let Ok(val) = env::var("TOPICTALLY_SUGGESTER__MIN_CLUSTER_SCORE") {
            self.suggester.min_cluster_score =
                parse_env_f64("TOPICTALLY_SUGGESTER__MIN_CLUSTER_SCORE", &val)?;
        }

        Ok(())
    }
}

fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

fn parse_env_u64(var_name: &str, val: &str) -> Result<u64, ConfigError> {
    val.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
        field: var_name.to_string(),
        message: format!("'{val}' is not a valid u64"),
    })
}

fn parse_env_u32(var_name: &str, val: &str) -> Result<u32, ConfigError> {
    val.parse::<u32>().map_err(|_| ConfigError::InvalidValue {
        field: var_name.to_string(),
        message: format!("'{val}' is not a valid u32"),
    })
}

fn parse_env_usize(var_name: &str, val: &str) -> Result<usize, ConfigError> {
    val.parse::<usize>().map_err(|_| ConfigError::InvalidValue {
        field: var_name.to_string(),
        message: format!("'{val}' is not a valid usize"),
    })
}

fn parse_env_f64(var_name: &str, val: &str) -> Result<f64, ConfigError> {
    val.parse::<f64>().map_err(|_| ConfigError::InvalidValue {
        field: var_name.to_string(),
        message: format!("'{val}' is not a valid f64"),
    })
}

fn parse_env_policy(var_name: &str, val: &str) -> Result<NormalizationPolicy, ConfigError> {
    match val {
        "catalog" => Ok(NormalizationPolicy::Catalog),
        "list" => Ok(NormalizationPolicy::List),
        "self_validation" => Ok(NormalizationPolicy::SelfValidation),
        _ => Err(ConfigError::InvalidValue {
            field: var_name.to_string(),
            message: format!("'{val}' must be one of catalog, list, self_validation"),
        }),
    }
}
