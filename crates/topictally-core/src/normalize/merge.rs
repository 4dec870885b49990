//! Substring merge (spec.md §4.5, §8 substring-merge laws): fold a shorter
//! canonical title into a longer one when the shorter is a word-bounded
//! substring of the longer, unless the remainder looks like a sequel marker.

use super::NormalizedTitle;

/// Words that introduce a sequel/installment suffix and therefore block a
/// substring merge even though the shorter title is textually contained.
const SEQUEL_WORDS: &[&str] = &["part", "chapter", "episode", "volume"];

/// Merge `titles` in place: sort by descending surface length, then redirect
/// each shorter title into the first longer title that contains it, summing
/// counts and union-ing contributing posts.
pub fn substring_merge(mut titles: Vec<NormalizedTitle>) -> Vec<NormalizedTitle> {
    titles.sort_by(|a, b| b.canonical.as_str().len().cmp(&a.canonical.as_str().len()));

    let mut merged: Vec<NormalizedTitle> = Vec::new();
    'outer: for title in titles {
        for target in merged.iter_mut() {
            if should_merge(target.canonical.as_str(), title.canonical.as_str()) {
                merge_into(target, title);
                continue 'outer;
            }
        }
        merged.push(title);
    }
    merged
}

fn merge_into(target: &mut NormalizedTitle, source: NormalizedTitle) {
    for alias in source.aliases {
        if !target.aliases.contains(&alias) {
            target.aliases.push(alias);
        }
    }
    if !target.aliases.contains(&source.canonical.0) {
        target.aliases.push(source.canonical.0);
    }
    for post in source.posts {
        if !target.posts.contains(&post) {
            target.posts.push(post);
        }
    }
    target.ambiguous = target.ambiguous || source.ambiguous;
}

/// Whether `shorter` should be merged into `longer`: `shorter` must occur in
/// `longer` at a word boundary, and the text immediately following that
/// occurrence must not look like a sequel marker (spec.md §4.5 sequel
/// exemptions: leading colon, Roman numeral, digit, or Part/Chapter/
/// Episode/Volume prefix).
pub fn should_merge(longer: &str, shorter: &str) -> bool {
    if shorter.len() >= longer.len() || shorter.is_empty() {
        return false;
    }
    let longer_lower = longer.to_lowercase();
    let shorter_lower = shorter.to_lowercase();

    let Some(start) = find_word_boundary_match(&longer_lower, &shorter_lower) else {
        return false;
    };
    let end = start + shorter_lower.len();
    let remainder = longer_lower[end..].trim_start();

    !is_sequel_marker(remainder)
}

/// Whether `needle` occurs anywhere in `haystack` at a word boundary.
/// Shared with the attributor's per-post search-term matching (spec.md
/// §4.6 step 1).
pub(crate) fn contains_word_boundary(haystack: &str, needle: &str) -> bool {
    find_word_boundary_match(haystack, needle).is_some()
}

fn find_word_boundary_match(haystack: &str, needle: &str) -> Option<usize> {
    let bytes = haystack.as_bytes();
    let mut search_from = 0;
    while let Some(rel) = haystack[search_from..].find(needle) {
        let start = search_from + rel;
        let end = start + needle.len();
        let before_ok = start == 0 || !is_word_char(bytes[start - 1]);
        let after_ok = end == bytes.len() || !is_word_char(bytes[end]);
        if before_ok && after_ok {
            return Some(start);
        }
        search_from = start + 1;
        if search_from >= haystack.len() {
            break;
        }
    }
    None
}

fn is_word_char(b: u8) -> bool {
    b.is_ascii_alphanumeric()
}

fn is_sequel_marker(remainder: &str) -> bool {
    if remainder.is_empty() {
        return false;
    }
    if let Some(stripped) = remainder.strip_prefix(':') {
        let _ = stripped;
        return true;
    }
    let first_word = remainder.split_whitespace().next().unwrap_or("");
    if is_roman_numeral(first_word) || first_word.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return true;
    }
    SEQUEL_WORDS.contains(&first_word.trim_end_matches([':', '.']).to_lowercase().as_str())
}

fn is_roman_numeral(word: &str) -> bool {
    let w = word.trim_end_matches([':', '.']);
    !w.is_empty() && w.chars().all(|c| "IVXLCDMivxlcdm".contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CanonicalTitle;

    fn title(name: &str, posts: &[&str]) -> NormalizedTitle {
        NormalizedTitle {
            canonical: CanonicalTitle::new(name),
            aliases: Vec::new(),
            ambiguous: false,
            posts: posts.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn merges_plain_prefix_substring() {
        let titles = vec![
            title("The Hunt for Red October", &["p1"]),
            title("Red October", &["p2"]),
        ];
        let merged = substring_merge(titles);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].posts.len(), 2);
        assert!(merged[0].aliases.contains(&"Red October".to_string()));
    }

    #[test]
    fn does_not_merge_colon_sequel() {
        let titles = vec![
            title("Top Gun: Maverick", &["p1"]),
            title("Top Gun", &["p2"]),
        ];
        let merged = substring_merge(titles);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn does_not_merge_roman_numeral_sequel() {
        let titles = vec![
            title("Rocky IV", &["p1"]),
            title("Rocky", &["p2"]),
        ];
        let merged = substring_merge(titles);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn does_not_merge_part_sequel() {
        let titles = vec![
            title("Kill Bill Part 2", &["p1"]),
            title("Kill Bill", &["p2"]),
        ];
        let merged = substring_merge(titles);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn merges_hyphenated_extension_not_a_listed_sequel_marker() {
        let titles = vec![
            title("Spider-Man", &["p1"]),
            title("Spider", &["p2"]),
        ];
        let merged = substring_merge(titles);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].posts.len(), 2);
    }

    #[test]
    fn requires_word_boundary_not_just_substring() {
        let titles = vec![
            title("Supernatural", &["p1"]),
            title("Natural", &["p2"]),
        ];
        let merged = substring_merge(titles);
        assert_eq!(merged.len(), 2);
    }
}
