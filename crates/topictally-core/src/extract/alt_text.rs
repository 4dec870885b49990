//! Alt-text fragment extractor (spec.md §4.4).
//!
//! Operates directly on a media item's alt text rather than scanning for an
//! inline `[image alt: …]` marker, since this model carries alt text as a
//! structured field (see `model::MediaItem`).

/// Accept an alt text as a candidate fragment if it is short enough.
pub fn extract(alt_text: &str) -> Option<String> {
    let trimmed = alt_text.trim();
    if trimmed.is_empty() || trimmed.chars().count() > 60 {
        return None;
    }
    if trimmed.split_whitespace().count() > 8 {
        return None;
    }
    Some(trimmed.to_string())
}
