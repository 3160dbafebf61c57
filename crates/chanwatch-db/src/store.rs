//! [`SnapshotStore`] and [`ChannelStore`] over a SQLite pool.

use chanwatch_core::{
    CachedObservation, Channel, ChannelStore, ContentItem, HistoryPoint, SnapshotStore,
    StoreError, ViewSnapshot,
};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;

use crate::{channels, observations, snapshots};

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl SnapshotStore for SqliteStore {
    async fn record_snapshot(&self, snapshot: &ViewSnapshot) -> Result<(), StoreError> {
        snapshots::record_snapshot(&self.pool, snapshot)
            .await
            .map_err(StoreError::from)
    }

    async fn snapshot_at_or_before(
        &self,
        item_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<ViewSnapshot>, StoreError> {
        let row = snapshots::get_snapshot_at_or_before(&self.pool, item_id, at).await?;
        Ok(row.map(ViewSnapshot::from))
    }

    async fn cached_observation(
        &self,
        channel_id: &str,
    ) -> Result<Option<CachedObservation>, StoreError> {
        let row = observations::get_cached_observation(&self.pool, channel_id).await?;
        Ok(row.map(CachedObservation::from))
    }

    async fn set_cached_observation(
        &self,
        observation: &CachedObservation,
    ) -> Result<(), StoreError> {
        observations::set_cached_observation(&self.pool, observation)
            .await
            .map_err(StoreError::from)
    }
}

impl ChannelStore for SqliteStore {
    async fn upsert_channel(&self, channel: &Channel) -> Result<(), StoreError> {
        channels::upsert_channel(&self.pool, channel)
            .await
            .map_err(StoreError::from)
    }

    async fn get_channel(&self, channel_id: &str) -> Result<Option<Channel>, StoreError> {
        let row = channels::get_channel(&self.pool, channel_id).await?;
        Ok(row.map(Channel::from))
    }

    async fn list_channels(&self) -> Result<Vec<Channel>, StoreError> {
        let rows = channels::list_channels(&self.pool).await?;
        Ok(rows.into_iter().map(Channel::from).collect())
    }

    async fn upsert_items(&self, items: &[ContentItem]) -> Result<(), StoreError> {
        channels::upsert_items(&self.pool, items)
            .await
            .map_err(StoreError::from)
    }

    async fn channel_items(&self, channel_id: &str) -> Result<Vec<ContentItem>, StoreError> {
        let rows = channels::list_channel_items(&self.pool, channel_id).await?;
        rows.into_iter()
            .map(|row| ContentItem::try_from(row).map_err(StoreError::from))
            .collect()
    }

    async fn channel_view_history(
        &self,
        channel_id: &str,
        days: u32,
        until: NaiveDate,
    ) -> Result<Vec<HistoryPoint>, StoreError> {
        let rows = channels::channel_view_history(&self.pool, channel_id, days, until).await?;
        Ok(rows.into_iter().map(HistoryPoint::from).collect())
    }
}
