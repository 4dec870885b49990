//! Candidate extractor (spec.md §4.4): five independent extractors applied
//! over a post's text, its alt texts, and (if it quotes another post) that
//! post's text and alt texts.

mod all_caps;
mod alt_text;
mod quoted_span;
mod short_reply;
mod title_case;

use crate::model::{Candidate, CandidateSource, Post};

/// Extract every candidate surface string for `post`, including its quoted
/// post's text and alt texts when `quoted` is supplied.
pub fn extract_candidates(post: &Post, quoted: Option<&Post>) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    let text_sources: Vec<&str> = std::iter::once(post.text.as_str())
        .chain(quoted.map(|q| q.text.as_str()))
        .collect();

    for text in &text_sources {
        for phrase in title_case::extract(text) {
            candidates.push(Candidate {
                post_uri: post.uri.clone(),
                surface: phrase,
                source: CandidateSource::TitleCase,
            });
        }
        for span in quoted_span::extract(text) {
            candidates.push(Candidate {
                post_uri: post.uri.clone(),
                surface: span,
                source: CandidateSource::QuotedSpan,
            });
        }
        for phrase in all_caps::extract(text) {
            candidates.push(Candidate {
                post_uri: post.uri.clone(),
                surface: phrase,
                source: CandidateSource::AllCaps,
            });
        }
    }

    let alt_sources = post
        .media
        .iter()
        .chain(quoted.map(|q| q.media.iter()).into_iter().flatten());
    for media in alt_sources {
        if let Some(alt) = &media.alt_text {
            if let Some(fragment) = alt_text::extract(alt) {
                candidates.push(Candidate {
                    post_uri: post.uri.clone(),
                    surface: fragment,
                    source: CandidateSource::AltText,
                });
            }
        }
    }

    if let Some(reply) = short_reply::extract(&post.text) {
        candidates.push(Candidate {
            post_uri: post.uri.clone(),
            surface: reply,
            source: CandidateSource::ShortReply,
        });
    }

    candidates
}
