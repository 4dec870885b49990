//! Policy B: user-supplied canonical title list (spec.md §4.5B).
//!
//! The list itself *is* the canonical title set: every configured title
//! becomes a [`NormalizedTitle`], matched here against candidate surfaces by
//! exact (case-insensitive) comparison against the title or one of its
//! aliases. Titles whose normalized form is short enough to collide with
//! ordinary conversation are flagged `ambiguous`; the attributor uses that
//! flag to require extra surrounding context before crediting a match
//! (spec.md §4.6, §9 "Attribution is a function, not a fold").

use crate::config::CustomListEntry;
use crate::model::Candidate;

use super::fingerprint::normalized_form;
use super::NormalizedTitle;

/// A normalized form this short needs corroborating context to count,
/// since it's likely to appear in ordinary conversation unrelated to the
/// title it names.
const AMBIGUITY_LENGTH_THRESHOLD: usize = 4;

/// Run policy B: build one [`NormalizedTitle`] per configured entry and
/// attach every candidate whose surface exactly matches the title or an
/// alias.
pub fn run_list_policy(entries: &[CustomListEntry], candidates: &[Candidate]) -> Vec<NormalizedTitle> {
    entries
        .iter()
        .map(|entry| {
            let mut posts = Vec::new();
            for candidate in candidates {
                if matches_entry(entry, &candidate.surface) && !posts.contains(&candidate.post_uri) {
                    posts.push(candidate.post_uri.clone());
                }
            }
            NormalizedTitle {
                canonical: crate::model::CanonicalTitle::new(entry.title.clone()),
                aliases: entry.aliases.clone(),
                ambiguous: is_ambiguous(&entry.title),
                posts,
            }
        })
        .collect()
}

fn matches_entry(entry: &CustomListEntry, surface: &str) -> bool {
    surface.eq_ignore_ascii_case(&entry.title)
        || entry.aliases.iter().any(|a| surface.eq_ignore_ascii_case(a))
}

fn is_ambiguous(title: &str) -> bool {
    normalized_form(title).len() <= AMBIGUITY_LENGTH_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CandidateSource;

    fn candidate(uri: &str, surface: &str) -> Candidate {
        Candidate {
            post_uri: uri.to_string(),
            surface: surface.to_string(),
            source: CandidateSource::TitleCase,
        }
    }

    #[test]
    fn matches_title_and_alias_case_insensitively() {
        let entries = vec![CustomListEntry {
            title: "Sailor Moon".to_string(),
            aliases: vec!["SM".to_string()],
        }];
        let candidates = vec![candidate("p1", "sailor moon"), candidate("p2", "SM")];
        let groups = run_list_policy(&entries, &candidates);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].posts.len(), 2);
    }

    #[test]
    fn flags_short_titles_as_ambiguous() {
        let entries = vec![CustomListEntry {
            title: "Loki".to_string(),
            aliases: vec![],
        }];
        let groups = run_list_policy(&entries, &[]);
        assert!(groups[0].ambiguous);
    }

    #[test]
    fn does_not_flag_longer_titles_as_ambiguous() {
        let entries = vec![CustomListEntry {
            title: "The Hunt for Red October".to_string(),
            aliases: vec![],
        }];
        let groups = run_list_policy(&entries, &[]);
        assert!(!groups[0].ambiguous);
    }

    #[test]
    fn unmatched_entries_get_empty_post_list() {
        let entries = vec![CustomListEntry {
            title: "Unseen Show".to_string(),
            aliases: vec![],
        }];
        let groups = run_list_policy(&entries, &[candidate("p1", "something else")]);
        assert!(groups[0].posts.is_empty());
    }
}
