//! Normalizer & validator (spec.md §4.5): three interchangeable policies
//! that turn raw candidate surfaces into a canonical title set, followed by
//! a policy-independent substring merge.

pub mod catalog;
pub mod fingerprint;
pub mod list;
pub mod merge;
pub mod self_validate;

pub use catalog::{Confidence, ValidationClient, ValidationResult};

use crate::config::{Config, NormalizationPolicy};
use crate::error::ValidationError;
use crate::model::{Candidate, CanonicalTitle};

/// A canonical title together with its alternate surface forms and the
/// posts that contributed a surviving candidate, prior to attribution
/// (spec.md §4.5, §4.6).
#[derive(Debug, Clone)]
pub struct NormalizedTitle {
    /// The title's canonical surface form.
    pub canonical: CanonicalTitle,
    /// Other surface forms (aliases) that resolve to this title.
    pub aliases: Vec<String>,
    /// Whether this title needs corroborating context before attribution
    /// credits a post to it (spec.md §4.5B ambiguity guard).
    pub ambiguous: bool,
    /// Post URIs that contributed at least one surviving candidate.
    pub posts: Vec<String>,
}

/// Run the effective normalization policy over `candidates`, then apply
/// the substring merge (spec.md §4.5 "After either policy, run
/// substring-merge").
pub async fn normalize(
    config: &Config,
    root_post_text: &str,
    candidates: &[Candidate],
    validation_client: Option<&dyn ValidationClient>,
) -> Result<Vec<NormalizedTitle>, ValidationError> {
    let titles = match config.effective_policy() {
        NormalizationPolicy::Catalog => {
            let client = validation_client.ok_or_else(|| ValidationError::CatalogError {
                message: "catalog policy selected but no validation client was configured".to_string(),
            })?;
            let hint = media_type_hint(&config.normalization.media_types);
            catalog::run_catalog_policy(candidates, hint.as_deref(), client).await?
        }
        NormalizationPolicy::List => list::run_list_policy(&config.normalization.custom_list, candidates),
        NormalizationPolicy::SelfValidation => self_validate::run_self_validation(root_post_text, candidates),
    };
    Ok(merge::substring_merge(titles))
}

fn media_type_hint(media_types: &[String]) -> Option<String> {
    match media_types.len() {
        0 => None,
        1 => Some(media_types[0].clone()),
        _ => Some("unknown".to_string()),
    }
}
