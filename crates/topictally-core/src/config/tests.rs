use std::env;
use std::sync::Mutex;

use super::*;
use crate::error::ConfigError;

// Environment variable tests mutate process-global state; serialize them.
static ENV_LOCK: Mutex<()> = Mutex::new(());

#[test]
fn defaults_match_spec() {
    let config = Config::default();
    assert_eq!(config.fetcher.max_requests, 100);
    assert_eq!(config.fetcher.window_ms, 300_000);
    assert_eq!(config.fetcher.min_delay_ms, 200);
    assert_eq!(config.fetcher.retry_budget, 3);
    assert_eq!(config.crawler.max_depth, 5);
    assert_eq!(config.crawler.truncation_recursion_cap, 5);
    assert_eq!(config.crawler.quotes_page_size, 100);
    assert_eq!(config.suggester.ngram_threshold, 0.5);
    assert_eq!(config.suggester.levenshtein_threshold, 0.8);
    assert_eq!(config.suggester.min_cluster_score, 0.4);
}

#[test]
fn load_valid_toml() {
    let toml_str = r#"
[fetcher]
max_requests = 50
base_url = "https://example.test/xrpc"

[crawler]
max_depth = 3

[suggester]
ngram_threshold = 0.6
"#;
    let config: Config = toml::from_str(toml_str).expect("valid TOML");
    assert_eq!(config.fetcher.max_requests, 50);
    assert_eq!(config.fetcher.base_url, "https://example.test/xrpc");
    assert_eq!(config.crawler.max_depth, 3);
    assert_eq!(config.suggester.ngram_threshold, 0.6);
    // untouched fields keep their defaults
    assert_eq!(config.fetcher.min_delay_ms, 200);
}

#[test]
fn missing_sections_use_defaults() {
    let toml_str = "[fetcher]\nmax_requests = 10\n";
    let config: Config = toml::from_str(toml_str).expect("valid TOML");
    assert_eq!(config.crawler.max_depth, 5);
    assert_eq!(config.suggester.min_cluster_score, 0.4);
}

#[test]
fn effective_policy_defaults_to_self_validation() {
    let config = Config::default();
    assert_eq!(config.effective_policy(), NormalizationPolicy::SelfValidation);
}

#[test]
fn effective_policy_infers_list_from_custom_list() {
    let mut config = Config::default();
    config.normalization.custom_list.push(CustomListEntry {
        title: "Sailor Moon".to_string(),
        aliases: vec![],
    });
    assert_eq!(config.effective_policy(), NormalizationPolicy::List);
}

#[test]
fn effective_policy_infers_catalog_from_media_types() {
    let mut config = Config::default();
    config.normalization.media_types.push("movie".to_string());
    assert_eq!(config.effective_policy(), NormalizationPolicy::Catalog);
}

#[test]
fn effective_policy_explicit_overrides_inference() {
    let mut config = Config::default();
    config.normalization.media_types.push("movie".to_string());
    config.normalization.policy = Some(NormalizationPolicy::SelfValidation);
    assert_eq!(config.effective_policy(), NormalizationPolicy::SelfValidation);
}

#[test]
fn env_var_override_numeric() {
    let _guard = ENV_LOCK.lock().unwrap();
    env::set_var("TOPICTALLY_FETCHER__MAX_REQUESTS", "250");
    let mut config = Config::default();
    config.apply_env_overrides().expect("env override");
    assert_eq!(config.fetcher.max_requests, 250);
    env::remove_var("TOPICTALLY_FETCHER__MAX_REQUESTS");
}

#[test]
fn env_var_override_string() {
    let _guard = ENV_LOCK.lock().unwrap();
    env::set_var("TOPICTALLY_FETCHER__BASE_URL", "https://override.test/xrpc");
    let mut config = Config::default();
    config.apply_env_overrides().expect("env override");
    assert_eq!(config.fetcher.base_url, "https://override.test/xrpc");
    env::remove_var("TOPICTALLY_FETCHER__BASE_URL");
}

#[test]
fn env_var_override_policy() {
    let _guard = ENV_LOCK.lock().unwrap();
    env::set_var("TOPICTALLY_NORMALIZATION__POLICY", "catalog");
    let mut config = Config::default();
    config.apply_env_overrides().expect("env override");
    assert_eq!(config.normalization.policy, Some(NormalizationPolicy::Catalog));
    env::remove_var("TOPICTALLY_NORMALIZATION__POLICY");
}

#[test]
fn env_var_invalid_numeric_returns_error() {
    let _guard = ENV_LOCK.lock().unwrap();
    env::set_var("TOPICTALLY_FETCHER__MAX_REQUESTS", "not_a_number");
    let mut config = Config::default();
    let err = config.apply_env_overrides().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { field, .. } if field == "TOPICTALLY_FETCHER__MAX_REQUESTS"));
    env::remove_var("TOPICTALLY_FETCHER__MAX_REQUESTS");
}

#[test]
fn validate_zero_max_requests_fails() {
    let mut config = Config::default();
    config.fetcher.max_requests = 0;
    let errors = config.validate().unwrap_err();
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::InvalidValue { field, .. } if field == "fetcher.max_requests")));
}

#[test]
fn validate_threshold_out_of_range_fails() {
    let mut config = Config::default();
    config.suggester.ngram_threshold = 1.5;
    let errors = config.validate().unwrap_err();
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::InvalidValue { field, .. } if field == "suggester.ngram_threshold")));
}

#[test]
fn validate_conflicting_normalization_sources_fails() {
    let mut config = Config::default();
    config.normalization.media_types.push("movie".to_string());
    config.normalization.custom_list.push(CustomListEntry {
        title: "Sailor Moon".to_string(),
        aliases: vec![],
    });
    let errors = config.validate().unwrap_err();
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::InvalidValue { field, .. } if field == "normalization")));
}

#[test]
fn validate_returns_multiple_errors() {
    let mut config = Config::default();
    config.fetcher.max_requests = 0;
    config.crawler.max_depth = 0;
    config.suggester.min_cluster_score = 2.0;
    let errors = config.validate().unwrap_err();
    assert!(errors.len() >= 3, "expected at least 3 errors, got {errors:?}");
}

#[test]
fn validate_valid_config_passes() {
    let config = Config::default();
    assert!(config.validate().is_ok());
}

#[test]
fn config_file_not_found_explicit_path() {
    let result = Config::load(Some("/nonexistent/path/config.toml"));
    assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
}

#[test]
fn config_file_loads_from_tempfile() {
    use std::io::Write;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "[fetcher]\nmax_requests = 42\n").unwrap();
    let path = file.path().to_str().unwrap();
    let config = Config::load(Some(path)).expect("load from tempfile");
    assert_eq!(config.fetcher.max_requests, 42);
}

#[test]
fn custom_list_toml_roundtrip() {
    let toml_str = r#"
[[normalization.custom_list]]
title = "Sailor Moon"
aliases = ["sailormoon", "smc"]
"#;
    let config: Config = toml::from_str(toml_str).expect("valid TOML");
    assert_eq!(config.normalization.custom_list.len(), 1);
    assert_eq!(config.normalization.custom_list[0].title, "Sailor Moon");
    assert_eq!(config.normalization.custom_list[0].aliases.len(), 2);
}
