//! Short stand-alone reply extractor (spec.md §4.4).
//!
//! Raises recall on terse single-word/phrase answers ("FooBar") that don't
//! happen to be Title-Case.

use regex::Regex;
use std::sync::OnceLock;

fn handle_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@\w+").unwrap())
}

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://\S+").unwrap())
}

fn hashtag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#\w+").unwrap())
}

/// Strip emoji, hashtags, handles, URLs, and most punctuation, then keep the
/// cleaned text if it's a 2-80 char, <=8 word reply.
pub fn extract(text: &str) -> Option<String> {
    let without_urls = url_re().replace_all(text, "");
    let without_handles = handle_re().replace_all(&without_urls, "");
    let without_hashtags = hashtag_re().replace_all(&without_handles, "");

    let cleaned: String = without_hashtags
        .chars()
        .filter(|c| !is_emoji(*c))
        .map(|c| if is_most_punctuation(c) { ' ' } else { c })
        .collect();

    let cleaned: String = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    let len = cleaned.chars().count();
    if !(2..=80).contains(&len) {
        return None;
    }
    let word_count = cleaned.split_whitespace().count();
    if word_count == 0 || word_count > 8 {
        return None;
    }

    Some(cleaned)
}

fn is_emoji(c: char) -> bool {
    matches!(c as u32,
        0x1F300..=0x1FAFF | 0x2600..=0x27BF | 0x1F1E6..=0x1F1FF
    )
}

/// Punctuation stripped during cleanup. Apostrophes are kept so contractions
/// stay intact.
fn is_most_punctuation(c: char) -> bool {
    c.is_ascii_punctuation() && c != '\''
}
