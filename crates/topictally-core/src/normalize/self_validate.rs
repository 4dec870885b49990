//! Policy C: self-validation (spec.md §4.5C). No external truth source —
//! infer the category from the root post's prompt, then group surviving
//! candidates by their normalized form.

use std::collections::HashMap;

use crate::model::Candidate;

use super::fingerprint::normalized_form;
use super::NormalizedTitle;

/// Adjectives that can precede the category noun in a prompt like
/// "what's your favorite go-to movie".
const QUALIFIER_ADJECTIVES: &[&str] = &[
    "favorite", "favourite", "go-to", "worst", "best", "top", "least", "all-time", "current",
    "guilty", "pleasure",
];

/// Function words that end the category-word scan.
const FUNCTION_WORDS: &[&str] = &[
    "of", "to", "for", "and", "or", "is", "was", "that", "this", "right", "now", "you",
];

/// Generic adjectives, discourse markers, directions, demonyms, and short
/// generic nouns: candidates made up entirely of these tokens are dropped
/// since they're never a real title on their own.
const STOP_SET: &[&str] = &[
    "good", "bad", "great", "best", "worst", "new", "old", "big", "small", "cool", "nice",
    "honestly", "literally", "actually", "basically", "tbh", "imo", "imho",
    "up", "down", "left", "right", "north", "south", "east", "west",
    "american", "british", "japanese", "french", "german", "canadian",
    "show", "movie", "film", "book", "game", "song", "album", "thing", "one", "stuff",
];

/// Trailing intensifier/filler words that don't change a title's identity
/// ("sailor moon again" names the same show as "Sailor Moon"). Stripped
/// from the end of a candidate's grouping key only, never from its surface.
const TRAILING_FILLER_WORDS: &[&str] =
    &["again", "too", "also", "really", "honestly", "literally", "actually", "fr", "ngl"];

/// Leading pronoun-led filler a short, otherwise-unremarkable reply
/// sometimes wraps around the real title ("I love Friends" names
/// "Friends"), mirroring the title-case extractor's own `NOISE` phrases for
/// these same openers. Stripped from the candidate's surface before it's
/// grouped, so it lines up with a title-case candidate for the bare title
/// pulled from the same post.
const LEADING_FILLER_PREFIXES: &[&str] =
    &["i love ", "i like ", "i think ", "i guess ", "i know ", "i am ", "my favorite ", "my pick "];

fn strip_leading_filler(surface: &str) -> &str {
    let lower = surface.to_lowercase();
    for prefix in LEADING_FILLER_PREFIXES {
        if let Some(rest) = lower.strip_prefix(prefix) {
            return surface[surface.len() - rest.len()..].trim_start();
        }
    }
    surface
}

/// Run policy C over `candidates`, inferring the category from
/// `root_post_text`.
pub fn run_self_validation(root_post_text: &str, candidates: &[Candidate]) -> Vec<NormalizedTitle> {
    let category_words = category_words(root_post_text);

    let mut groups: HashMap<String, GroupAccumulator> = HashMap::new();
    for candidate in candidates {
        let surface = strip_leading_filler(&candidate.surface);
        if !is_valid_candidate(surface, &category_words) {
            continue;
        }
        let key = grouping_key(surface);
        if key.is_empty() {
            continue;
        }
        let acc = groups.entry(key).or_default();
        *acc.surface_counts.entry(surface.to_string()).or_insert(0) += 1;
        if !acc.posts.contains(&candidate.post_uri) {
            acc.posts.push(candidate.post_uri.clone());
        }
    }

    groups
        .into_values()
        .map(|acc| {
            let canonical = representative_surface(&acc.surface_counts);
            NormalizedTitle {
                canonical: crate::model::CanonicalTitle::new(canonical),
                aliases: acc.surface_counts.into_keys().collect(),
                ambiguous: false,
                posts: acc.posts,
            }
        })
        .collect()
}

#[derive(Default)]
struct GroupAccumulator {
    surface_counts: HashMap<String, u32>,
    posts: Vec<String>,
}

fn is_valid_candidate(surface: &str, category_words: &[String]) -> bool {
    let word_count = surface.split_whitespace().count();
    if word_count == 0 || word_count > 5 {
        return false;
    }
    let normalized = normalized_form(surface);
    if normalized.chars().count() < 3 {
        return false;
    }
    if matches_category_word(&normalized, category_words) {
        return false;
    }
    let tokens: Vec<&str> = normalized.split(' ').filter(|t| !t.is_empty()).collect();
    if !tokens.is_empty() && tokens.iter().all(|t| STOP_SET.contains(t)) {
        return false;
    }
    true
}

/// The grouping key for a candidate surface: its normalized form with any
/// trailing filler word repeatedly stripped.
fn grouping_key(surface: &str) -> String {
    let mut form = normalized_form(surface);
    loop {
        let Some(last_space) = form.rfind(' ') else { break };
        let last_word = &form[last_space + 1..];
        if TRAILING_FILLER_WORDS.contains(&last_word) {
            form.truncate(last_space);
        } else {
            break;
        }
    }
    form
}

fn matches_category_word(normalized: &str, category_words: &[String]) -> bool {
    category_words.iter().any(|w| {
        normalized == w
            || normalized == format!("{w}s")
            || format!("{normalized}s") == *w
            || (w.ends_with('y') && normalized == format!("{}ies", &w[..w.len() - 1]))
    })
}

/// Extract the prompt's category words: the first one-to-three content
/// words after "your" and any qualifier adjectives, stopping at a function
/// word.
fn category_words(prompt: &str) -> Vec<String> {
    let tokens: Vec<String> = prompt
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric() && c != '-').to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();

    let Some(your_idx) = tokens.iter().position(|t| t == "your") else {
        return Vec::new();
    };

    let mut idx = your_idx + 1;
    while idx < tokens.len() && QUALIFIER_ADJECTIVES.contains(&tokens[idx].as_str()) {
        idx += 1;
    }

    let mut words = Vec::new();
    while idx < tokens.len() && words.len() < 3 {
        let word = &tokens[idx];
        if FUNCTION_WORDS.contains(&word.as_str()) {
            break;
        }
        words.push(word.clone());
        idx += 1;
    }
    words
}

/// Most-common Title-Cased, article-stripped surface form in the group;
/// ties broken by shortest length.
fn representative_surface(surface_counts: &HashMap<String, u32>) -> String {
    let mut best: Option<(&str, u32)> = None;
    for (surface, count) in surface_counts {
        best = match best {
            None => Some((surface, *count)),
            Some((best_surface, best_count)) => {
                if *count > best_count
                    || (*count == best_count && surface.len() < best_surface.len())
                {
                    Some((surface, *count))
                } else {
                    Some((best_surface, best_count))
                }
            }
        };
    }
    let surface = best.map(|(s, _)| s).unwrap_or("");
    title_case_strip_article(surface)
}

fn title_case_strip_article(surface: &str) -> String {
    let words: Vec<&str> = surface.split_whitespace().collect();
    let words = match words.first() {
        Some(w) if matches!(w.to_lowercase().as_str(), "the" | "a" | "an") => &words[1..],
        _ => &words[..],
    };
    words
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
