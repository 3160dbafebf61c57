//! Persistence contracts: per-item daily view snapshots plus the channel and
//! item records written after each evaluation.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::model::{CachedObservation, Channel, ContentItem, HistoryPoint, ViewSnapshot};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("stored record is invalid: {0}")]
    Corrupt(String),
}

/// Time-indexed view counts. `record_snapshot` is an upsert on
/// `(item_id, date)`; the last write for a date wins.
pub trait SnapshotStore: Send + Sync {
    fn record_snapshot(
        &self,
        snapshot: &ViewSnapshot,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Most recent snapshot recorded at or before `at`.
    fn snapshot_at_or_before(
        &self,
        item_id: &str,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<Option<ViewSnapshot>, StoreError>> + Send;

    fn cached_observation(
        &self,
        channel_id: &str,
    ) -> impl Future<Output = Result<Option<CachedObservation>, StoreError>> + Send;

    fn set_cached_observation(
        &self,
        observation: &CachedObservation,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Tracked channels and their items.
pub trait ChannelStore: Send + Sync {
    fn upsert_channel(
        &self,
        channel: &Channel,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn get_channel(
        &self,
        channel_id: &str,
    ) -> impl Future<Output = Result<Option<Channel>, StoreError>> + Send;

    /// All tracked channels ordered by id.
    fn list_channels(&self) -> impl Future<Output = Result<Vec<Channel>, StoreError>> + Send;

    fn upsert_items(
        &self,
        items: &[ContentItem],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn channel_items(
        &self,
        channel_id: &str,
    ) -> impl Future<Output = Result<Vec<ContentItem>, StoreError>> + Send;

    /// Per-date summed views across the channel's items for the `days`
    /// calendar dates ending at `until` (inclusive), oldest first. Dates
    /// without any snapshot are omitted.
    fn channel_view_history(
        &self,
        channel_id: &str,
        days: u32,
        until: NaiveDate,
    ) -> impl Future<Output = Result<Vec<HistoryPoint>, StoreError>> + Send;
}
