//! ALL-CAPS phrase extractor (spec.md §4.4).

/// Extract phrases of two or more consecutive all-caps tokens.
pub fn extract(text: &str) -> Vec<String> {
    let mut phrases = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    let flush = |current: &mut Vec<&str>, phrases: &mut Vec<String>| {
        if current.len() >= 2 {
            phrases.push(current.join(" "));
        }
        current.clear();
    };

    for raw_word in text.split_whitespace() {
        let word = raw_word.trim_matches(|c: char| !c.is_alphanumeric());
        if is_all_caps_token(word) {
            current.push(word);
        } else {
            flush(&mut current, &mut phrases);
        }
    }
    flush(&mut current, &mut phrases);

    phrases
}

fn is_all_caps_token(word: &str) -> bool {
    let letters: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();
    !letters.is_empty() && letters.iter().all(|c| c.is_uppercase())
}
