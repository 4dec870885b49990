//! Cluster suggester (spec.md §4.7): groups posts that went uncategorized
//! into candidate titles they probably meant, via a fingerprint → n-gram →
//! Levenshtein cascade.

use std::collections::HashMap;

use crate::config::SuggesterConfig;
use crate::model::{CanonicalTitle, ClusterSuggestion, Post, SuggestionMethod, SuggestionState};
use crate::normalize::fingerprint::{bigrams, fingerprint_contains};

/// Titles shorter than this many characters skip the n-gram stage (spec.md
/// §4.7 step 2: "for titles of length >= 6").
const NGRAM_MIN_TITLE_LEN: usize = 6;

struct PerPostMatch<'a> {
    title: &'a CanonicalTitle,
    score: f64,
    method: SuggestionMethod,
}

/// Suggest clusters for `uncategorized` posts against `canonical_titles`
/// (spec.md §4.7).
pub fn suggest(
    uncategorized: &[Post],
    canonical_titles: &[CanonicalTitle],
    config: &SuggesterConfig,
) -> Vec<ClusterSuggestion> {
    let mut by_title: HashMap<String, (&CanonicalTitle, Vec<String>, Vec<f64>, SuggestionMethod)> = HashMap::new();

    for post in uncategorized {
        let Some(best) = best_match_for_post(&post.text, canonical_titles, config) else {
            continue;
        };
        let entry = by_title
            .entry(best.title.0.clone())
            .or_insert_with(|| (best.title, Vec::new(), Vec::new(), best.method));
        entry.1.push(post.uri.clone());
        entry.2.push(best.score);
    }

    let mut suggestions: Vec<ClusterSuggestion> = by_title
        .into_values()
        .map(|(title, post_uris, scores, method)| {
            let average_score = scores.iter().sum::<f64>() / scores.len() as f64;
            ClusterSuggestion {
                suggested_title: title.0.clone(),
                post_uris,
                average_score,
                method,
                state: SuggestionState::Pending,
            }
        })
        .filter(|s| s.average_score >= config.min_cluster_score)
        .collect();

    suggestions.sort_by(|a, b| {
        b.post_uris
            .len()
            .cmp(&a.post_uris.len())
            .then(b.average_score.partial_cmp(&a.average_score).unwrap_or(std::cmp::Ordering::Equal))
    });

    suggestions
}

fn best_match_for_post<'a>(
    post_text: &str,
    titles: &'a [CanonicalTitle],
    config: &SuggesterConfig,
) -> Option<PerPostMatch<'a>> {
    // Step 1: fingerprint containment, first match wins with score 1; ties
    // broken toward the more specific (longer) title.
    let containment_matches: Vec<&CanonicalTitle> = titles
        .iter()
        .filter(|t| fingerprint_contains(post_text, t.as_str()))
        .collect();
    if let Some(title) = containment_matches.into_iter().max_by_key(|t| t.as_str().len()) {
        return Some(PerPostMatch { title, score: 1.0, method: SuggestionMethod::Fingerprint });
    }

    // Step 2: n-gram Jaccard over titles of length >= 6.
    let post_bigrams = bigrams(post_text);
    if !post_bigrams.is_empty() {
        let mut best: Option<(&CanonicalTitle, f64)> = None;
        for title in titles {
            if title.as_str().chars().count() < NGRAM_MIN_TITLE_LEN {
                continue;
            }
            let title_bigrams = bigrams(title.as_str());
            let score = jaccard(&post_bigrams, &title_bigrams);
            if score >= config.ngram_threshold && best.as_ref().map_or(true, |(_, b)| score > *b) {
                best = Some((title, score));
            }
        }
        if let Some((title, score)) = best {
            return Some(PerPostMatch { title, score, method: SuggestionMethod::Ngram });
        }
    }

    // Step 3: normalized edit similarity.
    let mut best: Option<(&CanonicalTitle, f64)> = None;
    let post_lower = post_text.to_lowercase();
    for title in titles {
        let title_lower = title.as_str().to_lowercase();
        let max_len = post_lower.chars().count().max(title_lower.chars().count());
        if max_len == 0 {
            continue;
        }
        let distance = strsim::levenshtein(&post_lower, &title_lower);
        let score = 1.0 - (distance as f64 / max_len as f64);
        if score >= config.levenshtein_threshold && best.as_ref().map_or(true, |(_, b)| score > *b) {
            best = Some((title, score));
        }
    }
    best.map(|(title, score)| PerPostMatch { title, score, method: SuggestionMethod::Levenshtein })
}

fn jaccard(a: &std::collections::BTreeSet<(String, String)>, b: &std::collections::BTreeSet<(String, String)>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}
