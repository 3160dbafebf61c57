//! Extracts a channel username from the many URL shapes operators paste in.

use std::sync::LazyLock;

use regex::Regex;

/// First path segments that belong to the platform, not to a channel.
const RESERVED_PATHS: &[&str] = &[
    "explore",
    "search",
    "trending",
    "reactions",
    "artists",
    "stickers",
    "clips",
    "upload",
    "gifs",
];

/// Leading slug words in item URLs that are never usernames.
const ITEM_SLUG_SKIP: &[&str] = &["gifs", "gif", "stickers", "clips"];

static SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://(www\.)?").expect("valid scheme regex"));
static ITEM_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)giphy\.com/gifs/([^/?#]+)").expect("valid item url regex"));
static CHANNEL_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)giphy\.com/(?:channel/|@)([^/?#]+)").expect("valid channel url regex")
});
static REVERSED_CHANNEL_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)giphy\.com/([^/?#]+)/channel").expect("valid reversed channel regex")
});
static DIRECT_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)giphy\.com/([^/?#]+)$").expect("valid direct url regex"));
static BARE_USERNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@?([A-Za-z0-9_.\-]+)$").expect("valid username regex"));

/// Parses a bare username or a channel/item URL into a channel id.
///
/// Returns `None` for empty input, reserved platform paths, and anything
/// that does not look like a channel reference.
#[must_use]
pub fn parse_channel_ref(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let without_scheme = SCHEME.replace(trimmed, "");
    let url = without_scheme.trim_end_matches('/');

    if let Some(caps) = ITEM_URL.captures(url) {
        let slug = &caps[1];
        let mut parts = slug.split('-');
        if let (Some(first), Some(_)) = (parts.next(), parts.next()) {
            if !ITEM_SLUG_SKIP.contains(&first.to_lowercase().as_str()) {
                return clean_identifier(first);
            }
        }
    }

    for pattern in [&*CHANNEL_URL, &*REVERSED_CHANNEL_URL] {
        if let Some(caps) = pattern.captures(url) {
            return clean_identifier(&caps[1]);
        }
    }

    if let Some(caps) = DIRECT_URL.captures(url) {
        let identifier = &caps[1];
        if is_reserved(identifier) {
            return None;
        }
        return clean_identifier(identifier);
    }

    if url.contains('/') || url.to_lowercase().contains("giphy.com") {
        return None;
    }

    let caps = BARE_USERNAME.captures(url)?;
    let identifier = &caps[1];
    if is_reserved(identifier) {
        return None;
    }
    clean_identifier(identifier)
}

fn is_reserved(identifier: &str) -> bool {
    RESERVED_PATHS.contains(&identifier.to_lowercase().as_str())
}

fn clean_identifier(raw: &str) -> Option<String> {
    let cleaned = raw.trim_end_matches('_');
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_username_passes_through() {
        assert_eq!(parse_channel_ref("opendroids"), Some("opendroids".into()));
        assert_eq!(parse_channel_ref("  @opendroids "), Some("opendroids".into()));
    }

    #[test]
    fn channel_urls_in_all_shapes() {
        for url in [
            "https://giphy.com/channel/OpenDroids",
            "https://www.giphy.com/@OpenDroids/",
            "giphy.com/OpenDroids/channel",
            "https://giphy.com/OpenDroids",
            "https://giphy.com/channel/OpenDroids/stickers",
        ] {
            assert_eq!(parse_channel_ref(url), Some("OpenDroids".into()), "{url}");
        }
    }

    #[test]
    fn trailing_underscore_is_stripped() {
        assert_eq!(
            parse_channel_ref("https://giphy.com/channel/robo_"),
            Some("robo".into())
        );
        assert_eq!(parse_channel_ref("robo__"), Some("robo".into()));
    }

    #[test]
    fn item_url_yields_leading_slug_segment() {
        assert_eq!(
            parse_channel_ref("https://giphy.com/gifs/OpenDroids-robot-dance-AbC123xyz"),
            Some("OpenDroids".into())
        );
    }

    #[test]
    fn reserved_paths_and_empty_input_are_rejected() {
        assert_eq!(parse_channel_ref(""), None);
        assert_eq!(parse_channel_ref("   "), None);
        assert_eq!(parse_channel_ref("https://giphy.com/trending"), None);
        assert_eq!(parse_channel_ref("https://giphy.com/explore/"), None);
        assert_eq!(parse_channel_ref("stickers"), None);
        assert_eq!(parse_channel_ref("https://giphy.com/gifs/stickers-ab12"), None);
    }

    #[test]
    fn unrelated_urls_are_rejected() {
        assert_eq!(parse_channel_ref("https://example.com/a/b"), None);
        assert_eq!(parse_channel_ref("two words"), None);
    }
}
