//! Config validation: collect every error rather than failing fast.

use super::Config;
use crate::error::ConfigError;

impl Config {
    /// Validate the configuration, returning all errors found.
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();

        if self.fetcher.max_requests == 0 {
            errors.push(ConfigError::InvalidValue {
                field: "fetcher.max_requests".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if self.fetcher.window_ms == 0 {
            errors.push(ConfigError::InvalidValue {
                field: "fetcher.window_ms".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if self.fetcher.base_url.is_empty() {
            errors.push(ConfigError::MissingField {
                field: "fetcher.base_url".to_string(),
            });
        }

        if self.crawler.max_depth == 0 {
            errors.push(ConfigError::InvalidValue {
                field: "crawler.max_depth".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if self.crawler.quotes_page_size == 0 || self.crawler.quotes_page_size > 100 {
            errors.push(ConfigError::InvalidValue {
                field: "crawler.quotes_page_size".to_string(),
                message: "must be between 1 and 100".to_string(),
            });
        }
        if self.crawler.quote_fetch_concurrency == 0 {
            errors.push(ConfigError::InvalidValue {
                field: "crawler.quote_fetch_concurrency".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        if !self.normalization.custom_list.is_empty() && !self.normalization.media_types.is_empty()
        {
            errors.push(ConfigError::InvalidValue {
                field: "normalization".to_string(),
                message: "at most one of custom_list or media_types may be set".to_string(),
            });
        }

        check_unit_range(
            &mut errors,
            "suggester.ngram_threshold",
            self.suggester.ngram_threshold,
        );
        check_unit_range(
            &mut errors,
            "suggester.levenshtein_threshold",
            self.suggester.levenshtein_threshold,
        );
        check_unit_range(
            &mut errors,
            "suggester.min_cluster_score",
            self.suggester.min_cluster_score,
        );

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn check_unit_range(errors: &mut Vec<ConfigError>, field: &str, value: f64) {
    if !(0.0..=1.0).contains(&value) {
        errors.push(ConfigError::InvalidValue {
            field: field.to_string(),
            message: "must be between 0.0 and 1.0".to_string(),
        });
    }
}
