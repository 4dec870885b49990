//! Title fingerprinting and normalization primitives shared by every policy
//! and by the cluster suggester (spec.md §3, §4.7).

use std::collections::BTreeSet;

/// Stop words dropped when fingerprinting or self-validating a title.
const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "of", "in", "on", "at", "to", "for", "with", "is", "it", "its",
    "this", "that", "my", "your", "his", "her",
];

/// Leading articles stripped when computing a title's normalized form.
const ARTICLES: &[&str] = &["the", "a", "an"];

/// Lowercase, strip punctuation, tokenize, drop stop words, dedup and sort
/// tokens: the order-independent identity used for title containment checks
/// (spec.md §3 "Canonical title", §8 fingerprint laws).
pub fn fingerprint(text: &str) -> String {
    let tokens: BTreeSet<String> = tokenize(text)
        .into_iter()
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .collect();
    tokens.into_iter().collect::<Vec<_>>().join(" ")
}

/// Whether every content token of `sub` appears in `full`'s fingerprint.
pub fn fingerprint_contains(full: &str, sub: &str) -> bool {
    let full_tokens: BTreeSet<&str> = fingerprint(full).split(' ').filter(|s| !s.is_empty()).collect();
    let sub_tokens: Vec<&str> = fingerprint(sub).split(' ').filter(|s| !s.is_empty()).collect();
    !sub_tokens.is_empty() && sub_tokens.iter().all(|t| full_tokens.contains(t))
}

/// Bigram set over a string's lowercased tokens, for n-gram Jaccard scoring.
pub fn bigrams(text: &str) -> BTreeSet<(String, String)> {
    let tokens = tokenize(text);
    tokens
        .windows(2)
        .map(|w| (w[0].clone(), w[1].clone()))
        .collect()
}

/// Lowercase, punctuation-stripped, article-stripped representative form
/// used to group candidates that refer to the same title (spec.md §4.5C).
pub fn normalized_form(text: &str) -> String {
    let tokens = tokenize(text);
    let mut tokens = tokens.as_slice();
    if let Some(first) = tokens.first() {
        if ARTICLES.contains(&first.as_str()) {
            tokens = &tokens[1..];
        }
    }
    tokens.join(" ")
}

/// Lowercase alphanumeric tokens, punctuation dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}
