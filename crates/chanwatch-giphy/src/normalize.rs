//! Conversion from GIPHY wire types to [`chanwatch_core::ContentItem`].

use chanwatch_core::{normalize_tags, ContentItem};
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::types::{GiphyGif, RawTag};

const IMPORT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Owner username of a GIF, preferring the nested `user` record.
#[must_use]
pub fn owner_of(gif: &GiphyGif) -> &str {
    gif.user
        .as_ref()
        .map(|u| u.username.as_str())
        .filter(|u| !u.is_empty())
        .unwrap_or(gif.username.as_str())
}

#[must_use]
pub fn normalize_gif(gif: GiphyGif) -> ContentItem {
    let channel_id = owner_of(&gif).to_owned();
    let latest_view_count = gif
        .views
        .as_ref()
        .and_then(|v| v.value())
        .filter(|v| *v >= 0)
        .unwrap_or(0);
    let uploaded_at = gif.import_datetime.as_deref().and_then(parse_giphy_datetime);

    ContentItem {
        id: gif.id,
        channel_id,
        title: gif.title,
        tags: normalize_tags(gif.tags.into_iter().filter_map(RawTag::into_text)),
        latest_view_count,
        url: gif.url,
        uploaded_at,
    }
}

/// Parses GIPHY's `"%Y-%m-%d %H:%M:%S"` timestamps; the all-zero sentinel
/// and anything unparseable yield `None`.
#[must_use]
pub fn parse_giphy_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with("0000") {
        return None;
    }
    NaiveDateTime::parse_from_str(raw, IMPORT_DATETIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gif(value: serde_json::Value) -> GiphyGif {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn nested_user_wins_over_top_level_username() {
        let g = gif(json!({"id": "a", "username": "old", "user": {"username": "robo"}}));
        assert_eq!(owner_of(&g), "robo");

        let anon = gif(json!({"id": "b", "username": "", "user": {"username": ""}}));
        assert_eq!(owner_of(&anon), "");
    }

    #[test]
    fn normalizes_tags_views_and_upload_time() {
        let item = normalize_gif(gif(json!({
            "id": "xyz",
            "title": "Robot Dance GIF",
            "url": "https://giphy.com/gifs/robo-dance-xyz",
            "username": "robo",
            "tags": ["#Robot", "robot", "dance"],
            "views": 42,
            "import_datetime": "2026-01-05 10:30:00"
        })));
        assert_eq!(item.channel_id, "robo");
        assert_eq!(item.tags, vec!["Robot", "dance"]);
        assert_eq!(item.latest_view_count, 42);
        assert_eq!(
            item.uploaded_at.map(|t| t.to_rfc3339()),
            Some("2026-01-05T10:30:00+00:00".to_string())
        );
    }

    #[test]
    fn zero_datetime_sentinel_is_absent() {
        assert!(parse_giphy_datetime("0000-00-00 00:00:00").is_none());
        assert!(parse_giphy_datetime("yesterday").is_none());
    }
}
