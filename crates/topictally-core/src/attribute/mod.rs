//! Counter & attributor (spec.md §4.6): maps each post to the canonical
//! titles it explicitly names, then folds that into a ranked tally.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::model::{AttributionMap, CanonicalTitle, Post, TallyEntry};
use crate::normalize::merge::contains_word_boundary;
use crate::normalize::NormalizedTitle;

/// Context words whose presence in a post corroborates an ambiguous
/// common-word title (spec.md §4.5B ambiguity guard).
const CONTEXT_WORDS: &[&str] = &["movie", "show", "series", "album", "song", "film", "tv"];

fn numbered_list_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d+[.)]\s").unwrap())
}

/// Whether `original_text` gives enough context to trust an ambiguous
/// common-word-collision title (spec.md §4.5B): a numbered-list marker, a
/// hashtag, a music/show context word, or the title's own Title-Case
/// appearance in the text.
fn has_ambiguity_context(original_text: &str, canonical: &str) -> bool {
    if numbered_list_re().is_match(original_text) {
        return true;
    }
    if original_text.contains('#') {
        return true;
    }
    let lower = original_text.to_lowercase();
    if CONTEXT_WORDS.iter().any(|w| lower.contains(w)) {
        return true;
    }
    original_text.contains(canonical)
}

/// Single-word titles that need a hand-curated disambiguation phrase set
/// (spec.md §4.6 step 3, §9 "Phrase table"). Each entry: the bare word, and
/// the multi-word phrases that "cover" an occurrence of it.
const PHRASE_TABLE: &[(&str, &[&str])] = &[
    // "red" alone is too common a word to trust; only count it when every
    // occurrence is inside one of these known titles.
    ("red", &["red october", "for red", "red dragon"]),
];

/// A colon-subtitled title's pre-colon prefix becomes its own search term
/// only if it's at least this many words or this many characters
/// (spec.md §4.6 step 1).
const COLON_PREFIX_MIN_WORDS: usize = 2;
const COLON_PREFIX_MIN_CHARS: usize = 10;

/// Attribute every post (except the root) to the canonical titles it
/// explicitly names, then build the ranked tally (spec.md §4.6).
///
/// Returns `(tally, uncategorized)`. `posts` must include the root post as
/// its first entry; `root_uri` identifies it so it is excluded from both
/// outputs.
pub fn attribute(posts: &[Post], titles: &[NormalizedTitle], root_uri: &str) -> (Vec<TallyEntry>, Vec<Post>) {
    let mut map = AttributionMap::new();
    let mut first_seen: HashMap<String, usize> = HashMap::new();
    let mut uncategorized = Vec::new();

    for (order, post) in posts.iter().filter(|p| p.uri != root_uri).enumerate() {
        let matched = matched_titles_for_post(post, titles);
        if matched.is_empty() {
            uncategorized.push(post.clone());
            continue;
        }
        for idx in matched {
            let title = &titles[idx];
            first_seen.entry(title.canonical.0.clone()).or_insert(order);
            map.insert(post.uri.clone(), title.canonical.clone());
        }
    }

    let tally = build_tally(posts, &map, &first_seen);
    (tally, uncategorized)
}

fn build_tally(posts: &[Post], map: &AttributionMap, first_seen: &HashMap<String, usize>) -> Vec<TallyEntry> {
    let mut by_title: HashMap<String, (CanonicalTitle, Vec<Post>)> = HashMap::new();
    for post in posts {
        for title in map.titles_for(&post.uri) {
            by_title
                .entry(title.0.clone())
                .or_insert_with(|| (title.clone(), Vec::new()))
                .1
                .push(post.clone());
        }
    }

    let mut tally: Vec<TallyEntry> = by_title
        .into_values()
        .map(|(title, posts)| TallyEntry { count: posts.len(), title, posts })
        .collect();

    tally.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| {
                let a_seen = first_seen.get(&a.title.0).copied().unwrap_or(usize::MAX);
                let b_seen = first_seen.get(&b.title.0).copied().unwrap_or(usize::MAX);
                a_seen.cmp(&b_seen)
            })
            .then_with(|| a.title.as_str().len().cmp(&b.title.as_str().len()))
    });
    tally
}

/// Step 1-3 of the per-post attribution algorithm: compute the matched set
/// of title indices, apply same-post generalization, then the phrase-table
/// guard.
fn matched_titles_for_post(post: &Post, titles: &[NormalizedTitle]) -> Vec<usize> {
    let normalized_text = normalize_text(&post.text);

    // Step 1: for each title, find the longest search term that matches.
    // `is_own_term` records whether that term is the title's own canonical
    // form rather than a synthesized stand-in (the colon-prefix addition in
    // `search_terms_for`), so step 2 can tell a title's real identity apart
    // from a borrowed prefix that happens to equal another title entirely.
    let mut matches: Vec<(usize, String, bool)> = Vec::new();
    for (idx, title) in titles.iter().enumerate() {
        let own_canonical = normalize_text(title.canonical.as_str());
        let mut best: Option<String> = None;
        for term in search_terms_for(title) {
            let term_normalized = normalize_text(&term);
            if term_normalized.is_empty() {
                continue;
            }
            if contains_word_boundary(&normalized_text, &term_normalized)
                && best.as_ref().map_or(true, |b| term_normalized.len() > b.len())
            {
                best = Some(term_normalized);
            }
        }
        if let Some(term) = best {
            let is_own_term = term == own_canonical;
            matches.push((idx, term, is_own_term));
        }
    }

    // Step 2: same-post generalization — drop a title subsumed by another
    // matched title's longer, containing search term, plus a narrower guard:
    // if this title only matched via a synthesized colon-prefix stand-in
    // (not its own canonical form) and another title's own canonical is
    // exactly that stand-in, the stand-in is that other title's real
    // identity, not evidence for this one.
    let subsumed: std::collections::HashSet<usize> = matches
        .iter()
        .filter(|(idx, term, is_own_term)| {
            matches.iter().any(|(other_idx, other_term, other_is_own_term)| {
                other_idx != idx
                    && ((other_term.len() > term.len() && other_term.contains(term.as_str()))
                        || (!is_own_term && *other_is_own_term && other_term == term))
            })
        })
        .map(|(idx, _, _)| *idx)
        .collect();
    matches.retain(|(idx, _, _)| !subsumed.contains(idx));

    // Step 3: phrase-table guard for single-word titles.
    matches.retain(|(idx, _, _)| !phrase_table_should_drop(titles[*idx].canonical.as_str(), &normalized_text));

    // Ambiguity guard (spec.md §4.5B): an ambiguous list-policy title needs
    // corroborating context before it counts for this post.
    matches.retain(|(idx, _, _)| {
        !titles[*idx].ambiguous || has_ambiguity_context(&post.text, titles[*idx].canonical.as_str())
    });

    matches.into_iter().map(|(idx, _, _)| idx).collect()
}

/// Normalize `&` to "and" and lowercase, per spec.md §4.6 step 1.
fn normalize_text(text: &str) -> String {
    text.replace('&', "and").to_lowercase()
}

/// Search terms for a title: its canonical form, its aliases, and — for a
/// colon-subtitled title whose prefix is long enough — the pre-colon
/// prefix (spec.md §4.6 step 1).
fn search_terms_for(title: &NormalizedTitle) -> Vec<String> {
    let mut terms = vec![title.canonical.0.clone()];
    terms.extend(title.aliases.iter().cloned());

    if let Some((prefix, _suffix)) = title.canonical.0.split_once(':') {
        let prefix = prefix.trim();
        if prefix.split_whitespace().count() >= COLON_PREFIX_MIN_WORDS || prefix.chars().count() >= COLON_PREFIX_MIN_CHARS {
            terms.push(prefix.to_string());
        }
    }
    terms
}

fn phrase_table_should_drop(canonical: &str, normalized_text: &str) -> bool {
    let lower = canonical.to_lowercase();
    if lower.split_whitespace().count() != 1 {
        return false;
    }
    let Some((_, phrases)) = PHRASE_TABLE.iter().find(|(word, _)| *word == lower) else {
        return false;
    };

    let mut remaining = normalized_text.to_string();
    for phrase in *phrases {
        remaining = remove_word_boundary_occurrences(&remaining, phrase);
    }
    !word_boundary_regex(&lower).is_match(&remaining)
}

fn remove_word_boundary_occurrences(text: &str, term: &str) -> String {
    word_boundary_regex(term).replace_all(text, " ").to_string()
}

fn word_boundary_regex(term: &str) -> Regex {
    Regex::new(&format!(r"\b{}\b", regex::escape(term))).expect("word-boundary pattern is always valid")
}
