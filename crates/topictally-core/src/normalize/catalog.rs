//! Policy A: external catalog validation (spec.md §4.5A, §6).

use std::collections::HashMap;

use crate::error::ValidationError;
use crate::model::{Candidate, CanonicalTitle};

use super::NormalizedTitle;

/// Confidence level returned by the validation catalog for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// One candidate's validation result (spec.md §6).
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub title: String,
    pub normalized_title: String,
    pub valid: bool,
    pub confidence: Confidence,
    pub media_type: Option<String>,
}

/// Caller-supplied external catalog (spec.md §6 "Validation service").
#[async_trait::async_trait]
pub trait ValidationClient: Send + Sync {
    /// Validate a batch of raw candidate surface strings.
    async fn validate_batch(
        &self,
        candidates: &[String],
        media_type_hint: Option<&str>,
    ) -> Result<Vec<ValidationResult>, ValidationError>;
}

/// Run policy A: batch every distinct candidate surface through the catalog,
/// drop invalid/low-confidence results, group survivors by canonical title.
pub async fn run_catalog_policy(
    candidates: &[Candidate],
    media_type_hint: Option<&str>,
    client: &dyn ValidationClient,
) -> Result<Vec<NormalizedTitle>, ValidationError> {
    let mut distinct: Vec<String> = Vec::new();
    for c in candidates {
        if !distinct.contains(&c.surface) {
            distinct.push(c.surface.clone());
        }
    }
    if distinct.is_empty() {
        return Ok(Vec::new());
    }

    let results = client.validate_batch(&distinct, media_type_hint).await?;
    let by_surface: HashMap<&str, &ValidationResult> =
        results.iter().map(|r| (r.title.as_str(), r)).collect();

    let mut groups: HashMap<String, NormalizedTitle> = HashMap::new();
    for candidate in candidates {
        let Some(result) = by_surface.get(candidate.surface.as_str()) else {
            continue;
        };
        if !result.valid || result.confidence == Confidence::Low {
            continue;
        }
        let entry = groups
            .entry(result.normalized_title.clone())
            .or_insert_with(|| NormalizedTitle {
                canonical: CanonicalTitle::new(result.normalized_title.clone()),
                aliases: Vec::new(),
                ambiguous: false,
                posts: Vec::new(),
            });
        if !entry.aliases.contains(&candidate.surface) {
            entry.aliases.push(candidate.surface.clone());
        }
        if !entry.posts.contains(&candidate.post_uri) {
            entry.posts.push(candidate.post_uri.clone());
        }
    }

    Ok(groups.into_values().collect())
}
