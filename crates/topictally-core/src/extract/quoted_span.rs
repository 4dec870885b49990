//! Quoted-span extractor (spec.md §4.4): text between matched double quotes.

/// Spans that look like quotes but carry no title identity. A hand-maintained
/// literal set, per spec.md §9.
const QUOTED_NOISE: &[&str] = &[
    "movie", "film", "show", "that one", "this one", "the one", "it", "that", "this",
];

/// Extract double-quoted spans of 2-60 characters, filtering the noise set.
pub fn extract(text: &str) -> Vec<String> {
    let mut spans = Vec::new();
    let mut chars = text.char_indices().peekable();
    let mut open: Option<usize> = None;

    while let Some((idx, ch)) = chars.next() {
        if is_quote_char(ch) {
            match open {
                None => open = Some(idx + ch.len_utf8()),
                Some(start) => {
                    let span = &text[start..idx];
                    if is_acceptable(span) {
                        spans.push(span.trim().to_string());
                    }
                    open = None;
                }
            }
        }
    }

    spans
}

fn is_quote_char(c: char) -> bool {
    matches!(c, '"' | '\u{201C}' | '\u{201D}')
}

fn is_acceptable(span: &str) -> bool {
    let len = span.chars().count();
    if !(2..=60).contains(&len) {
        return false;
    }
    !QUOTED_NOISE.contains(&span.to_lowercase().as_str())
}
