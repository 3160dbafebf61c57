//! Query-term selection for search probes.

use std::collections::HashSet;

use chanwatch_core::ContentItem;

/// Filler words dropped before a title word can become a query term.
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "gif", "gifs", "sticker", "stickers",
];

/// Title words shorter than this carry too little signal to search for.
const MIN_KEYWORD_CHARS: usize = 4;

/// Words taken from a title for a generic keyword search.
pub const KEYWORD_QUERY_WORDS: usize = 3;

/// Lowercased title words, stop words and short words removed, first-seen
/// order, no repeats.
#[must_use]
pub fn title_keywords(title: &str) -> Vec<String> {
    let lowered = title.to_lowercase();
    let mut seen = HashSet::new();
    lowered
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| w.chars().count() >= MIN_KEYWORD_CHARS)
        .filter(|w| !STOP_WORDS.contains(w))
        .filter(|w| seen.insert(*w))
        .map(str::to_owned)
        .collect()
}

/// Up to `max` terms for probing one item: its tags, else its title
/// keywords, else the channel id.
#[must_use]
pub fn query_terms(item: &ContentItem, channel_id: &str, max: usize) -> Vec<String> {
    let max = max.max(1);
    if !item.tags.is_empty() {
        return item.tags.iter().take(max).cloned().collect();
    }
    let keywords = title_keywords(&item.title);
    if !keywords.is_empty() {
        return keywords.into_iter().take(max).collect();
    }
    vec![channel_id.to_owned()]
}

/// A short generic search phrase built from the item's title, used by the
/// fallback scorer's search-hit check.
#[must_use]
pub fn keyword_query(title: &str) -> Option<String> {
    let words = title_keywords(title);
    if words.is_empty() {
        return None;
    }
    Some(
        words
            .into_iter()
            .take(KEYWORD_QUERY_WORDS)
            .collect::<Vec<_>>()
            .join(" "),
    )
}
