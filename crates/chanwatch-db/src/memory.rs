//! In-process store with the same semantics as [`crate::SqliteStore`], used by
//! engine tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use chanwatch_core::{
    CachedObservation, Channel, ChannelStore, ContentItem, HistoryPoint, SnapshotStore,
    StoreError, ViewSnapshot,
};
use chrono::{DateTime, Days, NaiveDate, Utc};

#[derive(Debug, Default)]
struct Inner {
    snapshots: BTreeMap<(String, NaiveDate), ViewSnapshot>,
    observations: HashMap<String, CachedObservation>,
    channels: BTreeMap<String, Channel>,
    items: BTreeMap<String, ContentItem>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with [`StoreError::Backend`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Total snapshot rows held, across all items and dates.
    #[must_use]
    pub fn snapshot_count(&self) -> usize {
        self.inner.lock().map_or(0, |inner| inner.snapshots.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("store marked unavailable".to_string()));
        }
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }
}

impl SnapshotStore for MemoryStore {
    async fn record_snapshot(&self, snapshot: &ViewSnapshot) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        inner.snapshots.insert(
            (snapshot.item_id.clone(), snapshot.date),
            snapshot.clone(),
        );
        Ok(())
    }

    async fn snapshot_at_or_before(
        &self,
        item_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<ViewSnapshot>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .snapshots
            .values()
            .filter(|s| s.item_id == item_id && s.recorded_at <= at)
            .max_by_key(|s| s.recorded_at)
            .cloned())
    }

    async fn cached_observation(
        &self,
        channel_id: &str,
    ) -> Result<Option<CachedObservation>, StoreError> {
        Ok(self.lock()?.observations.get(channel_id).cloned())
    }

    async fn set_cached_observation(
        &self,
        observation: &CachedObservation,
    ) -> Result<(), StoreError> {
        self.lock()?
            .observations
            .insert(observation.channel_id.clone(), observation.clone());
        Ok(())
    }
}

impl ChannelStore for MemoryStore {
    async fn upsert_channel(&self, channel: &Channel) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let merged = match inner.channels.get(&channel.id) {
            Some(existing) => Channel {
                last_status: channel.last_status.or(existing.last_status),
                last_evaluated: channel.last_evaluated.or(existing.last_evaluated),
                ..channel.clone()
            },
            None => channel.clone(),
        };
        inner.channels.insert(channel.id.clone(), merged);
        Ok(())
    }

    async fn get_channel(&self, channel_id: &str) -> Result<Option<Channel>, StoreError> {
        Ok(self.lock()?.channels.get(channel_id).cloned())
    }

    async fn list_channels(&self) -> Result<Vec<Channel>, StoreError> {
        Ok(self.lock()?.channels.values().cloned().collect())
    }

    async fn upsert_items(&self, items: &[ContentItem]) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        for item in items {
            let merged = match inner.items.get(&item.id) {
                Some(existing) => ContentItem {
                    channel_id: existing.channel_id.clone(),
                    uploaded_at: item.uploaded_at.or(existing.uploaded_at),
                    ..item.clone()
                },
                None => item.clone(),
            };
            inner.items.insert(item.id.clone(), merged);
        }
        Ok(())
    }

    async fn channel_items(&self, channel_id: &str) -> Result<Vec<ContentItem>, StoreError> {
        Ok(self
            .lock()?
            .items
            .values()
            .filter(|i| i.channel_id == channel_id)
            .cloned()
            .collect())
    }

    async fn channel_view_history(
        &self,
        channel_id: &str,
        days: u32,
        until: NaiveDate,
    ) -> Result<Vec<HistoryPoint>, StoreError> {
        let inner = self.lock()?;
        let span = u64::from(days.max(1) - 1);
        let from = until.checked_sub_days(Days::new(span)).unwrap_or(NaiveDate::MIN);

        let mut by_date: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();
        for snap in inner.snapshots.values() {
            if snap.date < from || snap.date > until {
                continue;
            }
            let owned = inner
                .items
                .get(&snap.item_id)
                .is_some_and(|i| i.channel_id == channel_id);
            if owned {
                let entry = by_date.entry(snap.date).or_default();
                entry.0 += snap.view_count;
                entry.1 += 1;
            }
        }

        Ok(by_date
            .into_iter()
            .map(|(date, (total_views, items_recorded))| HistoryPoint {
                date,
                total_views,
                items_recorded,
            })
            .collect())
    }
}
