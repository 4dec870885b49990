//! Title-Case phrase extractor (spec.md §4.4).

/// Lowercase connectives allowed inside a Title-Case phrase without
/// breaking it.
const CONNECTIVES: &[&str] = &[
    "for", "from", "with", "the", "and", "of", "a", "an", "in", "on", "at", "to", "is", "or",
    "not", "no", "it", "its", "my", "his", "her", "as", "so", "but", "by", "&", "vs.", "v.",
];

/// Pronoun-led fragments and generic phrases that look Title-Case but carry
/// no title identity. A hand-maintained literal set, per spec.md §9.
const NOISE: &[&str] = &[
    "I Am", "I Love", "I Like", "I Think", "I Guess", "I Know", "My Favorite", "My Pick",
    "Good Movie", "Good Show", "Great Movie", "Great Show", "Hot Take", "No Idea", "Not Sure",
    "So True", "Same Here", "Me Too",
];

fn is_title_case_word(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) if c.is_uppercase() => chars.clone().any(|c| c.is_lowercase())
            || word.chars().filter(|c| c.is_alphabetic()).count() <= 1,
        _ => false,
    }
}

fn is_connective(word: &str) -> bool {
    CONNECTIVES.contains(&word.to_lowercase().as_str())
}

/// Extract Title-Case phrases, allowing interior lowercase connectives,
/// separated by whitespace, `: `, or `- `. A trailing `:` or `-` on a word is
/// kept (it is a separator, not noise) so e.g. "Top Gun: Maverick" survives
/// as one phrase.
pub fn extract(text: &str) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();

    let mut phrases = Vec::new();
    let mut current: Vec<String> = Vec::new();

    let flush = |current: &mut Vec<String>, phrases: &mut Vec<String>| {
        while matches!(current.last(), Some(w) if is_connective(trim_separator(w))) {
            current.pop();
        }
        while matches!(current.last(), Some(w) if w.ends_with(':') || w.ends_with('-')) {
            current.pop();
        }
        if current.len() >= 2 || (current.len() == 1 && is_title_case_word(trim_separator(&current[0])))
        {
            let phrase = current.join(" ");
            if !NOISE.contains(&phrase.as_str())
                && current.iter().any(|w| is_title_case_word(trim_separator(w)))
            {
                phrases.push(phrase);
            }
        }
        current.clear();
    };

    for raw_word in words {
        let (core, suffix) = split_trailing_separator(raw_word);
        let cleaned = core.trim_matches(|c: char| !c.is_alphanumeric() && c != '&');
        if cleaned.is_empty() {
            flush(&mut current, &mut phrases);
            continue;
        }
        if is_title_case_word(cleaned) {
            current.push(format!("{cleaned}{suffix}"));
        } else if is_connective(cleaned) && !current.is_empty() {
            current.push(format!("{cleaned}{suffix}"));
        } else {
            flush(&mut current, &mut phrases);
        }
    }
    flush(&mut current, &mut phrases);

    phrases
}

fn trim_separator(word: &str) -> &str {
    word.trim_end_matches(':').trim_end_matches('-')
}

/// Split a `:`/`-` separator off the end of a raw whitespace-delimited token
/// (e.g. "Gun:" -> ("Gun", ":")), leaving other trailing punctuation alone.
fn split_trailing_separator(word: &str) -> (&str, &str) {
    if let Some(stripped) = word.strip_suffix(':') {
        (stripped, ":")
    } else if let Some(stripped) = word.strip_suffix('-') {
        (stripped, "-")
    } else {
        (word, "")
    }
}
