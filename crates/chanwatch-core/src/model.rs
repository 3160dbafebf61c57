//! Domain records shared by the probe, trend analyzer, decision engine, and
//! the storage and transport adapters.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A content-publishing account on the external platform.
///
/// Created on first probe and re-evaluated on every cycle; never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub exists: bool,
    pub item_count: i64,
    pub aggregate_views: i64,
    pub last_evaluated: Option<DateTime<Utc>>,
    pub last_status: Option<ChannelStatus>,
    /// `false` when every listing tier failed for reasons other than
    /// "not found", so `exists`/`item_count` carry no signal this cycle.
    #[serde(default = "default_true")]
    pub listing_reachable: bool,
}

fn default_true() -> bool {
    true
}

impl Channel {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            exists: false,
            item_count: 0,
            aggregate_views: 0,
            last_evaluated: None,
            last_status: None,
            listing_reachable: true,
        }
    }

    /// True when the listing was reachable and reported nothing at all.
    #[must_use]
    pub fn has_no_presence(&self) -> bool {
        self.listing_reachable
            && (!self.exists || (self.item_count == 0 && self.aggregate_views == 0))
    }
}

/// One published item. `channel_id` is a back-reference to the owning
/// channel's username, not an ownership edge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub channel_id: String,
    pub title: String,
    /// Ordered, deduplicated (case-insensitive) tag list.
    pub tags: Vec<String>,
    pub latest_view_count: i64,
    pub url: String,
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl ContentItem {
    #[must_use]
    pub fn new(id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            channel_id: channel_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = normalize_tags(tags.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_views(mut self, views: i64) -> Self {
        self.latest_view_count = views;
        self
    }
}

/// Strips `#` prefixes and surrounding whitespace, drops blanks, and removes
/// case-insensitive duplicates while keeping first-seen order.
pub fn normalize_tags<I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    raw.into_iter()
        .map(|t| t.replace('#', "").trim().to_owned())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.to_lowercase()))
        .collect()
}

/// One recorded view-count observation. At most one per `(item_id, date)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSnapshot {
    pub item_id: String,
    pub date: NaiveDate,
    pub view_count: i64,
    pub recorded_at: DateTime<Utc>,
}

impl ViewSnapshot {
    /// Snapshot keyed by the UTC calendar date of `recorded_at`.
    #[must_use]
    pub fn new(item_id: impl Into<String>, view_count: i64, recorded_at: DateTime<Utc>) -> Self {
        Self {
            item_id: item_id.into(),
            date: recorded_at.date_naive(),
            view_count,
            recorded_at,
        }
    }
}

/// Summed channel views for one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub total_views: i64,
    pub items_recorded: i64,
}

/// Single-slot "last observed" totals for a channel, used as a baseline when
/// no persisted history exists yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedObservation {
    pub channel_id: String,
    pub total_views: i64,
    pub item_count: i64,
    pub observed_at: DateTime<Utc>,
}

/// Outcome of probing one search query. Produced and consumed within a
/// single evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub query: String,
    pub found: bool,
    pub matched_item_id: Option<String>,
    /// 1-based rank of the match within the scanned results.
    pub position: Option<u64>,
    pub pages_scanned: u32,
    pub total_results_available: i64,
}

impl ProbeResult {
    #[must_use]
    pub fn not_found(query: impl Into<String>, pages_scanned: u32, total: i64) -> Self {
        Self {
            query: query.into(),
            found: false,
            matched_item_id: None,
            position: None,
            pages_scanned,
            total_results_available: total,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelStatus {
    Unknown,
    Banned,
    ShadowBanned,
    Working,
}

impl ChannelStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Banned => "BANNED",
            Self::ShadowBanned => "SHADOW_BANNED",
            Self::Working => "WORKING",
        }
    }

    /// Parses the persisted form; unrecognized values map to `Unknown`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "BANNED" => Self::Banned,
            "SHADOW_BANNED" => Self::ShadowBanned,
            "WORKING" => Self::Working,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final output of one evaluation. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationVerdict {
    pub status: ChannelStatus,
    /// Ordered explanation, one entry per rule that contributed.
    pub reasons: Vec<String>,
    /// Composite score; set only when the fallback scorer decided.
    pub score: Option<i32>,
}

impl ClassificationVerdict {
    #[must_use]
    pub fn new(status: ChannelStatus, reasons: Vec<String>) -> Self {
        Self {
            status,
            reasons,
            score: None,
        }
    }
}
