//! GIPHY API response types for `/gifs/search`, `/gifs/trending`, and
//! `/gifs/{id}`.
//!
//! ## Observed shape
//!
//! ### Owner
//! Uploads by a channel carry both a top-level `username` and a nested
//! `user.username`. Anonymous uploads have `username: ""` and no `user`.
//! The nested value is preferred when both are present.
//!
//! ### Tags
//! Usually absent from search results. The detail endpoint returns them as
//! an array of strings, but some responses use objects with a `text` or
//! `name` field. Both shapes are accepted.
//!
//! ### Views
//! Only present on some responses, as an integer or a numeric string.
//!
//! ### `import_datetime`
//! `"%Y-%m-%d %H:%M:%S"` in UTC; `"0000-00-00 00:00:00"` when unknown.
//!
//! ### Detail of a missing item
//! Either a 404 or a 200 whose `data` is an empty object or array.

use serde::Deserialize;

/// Envelope shared by the list endpoints.
#[derive(Debug, Deserialize)]
pub struct GiphyListResponse {
    #[serde(default)]
    pub data: Vec<GiphyGif>,
    #[serde(default)]
    pub pagination: Option<GiphyPagination>,
    #[serde(default)]
    pub meta: Option<GiphyMeta>,
}

/// Envelope for `/gifs/{id}`; `data` is checked for emptiness before it is
/// decoded as a [`GiphyGif`].
#[derive(Debug, Deserialize)]
pub struct GiphyDetailResponse {
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub meta: Option<GiphyMeta>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct GiphyPagination {
    #[serde(default)]
    pub total_count: i64,
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GiphyMeta {
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub msg: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GiphyGif {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub user: Option<GiphyUser>,
    #[serde(default)]
    pub tags: Vec<RawTag>,
    #[serde(default)]
    pub views: Option<RawCount>,
    #[serde(default)]
    pub import_datetime: Option<String>,
    #[serde(default)]
    pub trending_datetime: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GiphyUser {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub display_name: String,
}

/// A tag as either a bare string or an object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawTag {
    Text(String),
    Object {
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        name: Option<String>,
    },
}

impl RawTag {
    #[must_use]
    pub fn into_text(self) -> Option<String> {
        match self {
            RawTag::Text(s) => Some(s),
            RawTag::Object { text, name } => text.or(name),
        }
    }
}

/// A counter serialized as either a number or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawCount {
    Number(i64),
    Text(String),
}

impl RawCount {
    #[must_use]
    pub fn value(&self) -> Option<i64> {
        match self {
            RawCount::Number(n) => Some(*n),
            RawCount::Text(s) => s.trim().replace(',', "").parse().ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn gif_accepts_both_tag_shapes_and_string_views() {
        let gif: GiphyGif = serde_json::from_value(json!({
            "id": "abc",
            "title": "Robot Dance GIF",
            "username": "robo",
            "tags": ["dance", {"text": "robot"}, {"name": "bot"}],
            "views": "1,204"
        }))
        .unwrap();
        let tags: Vec<_> = gif.tags.into_iter().filter_map(RawTag::into_text).collect();
        assert_eq!(tags, vec!["dance", "robot", "bot"]);
        assert_eq!(gif.views.and_then(|v| v.value()), Some(1_204));
    }

    #[test]
    fn list_response_tolerates_missing_pagination() {
        let resp: GiphyListResponse = serde_json::from_value(json!({
            "data": [{"id": "a"}]
        }))
        .unwrap();
        assert_eq!(resp.data.len(), 1);
        assert!(resp.pagination.is_none());
    }
}
