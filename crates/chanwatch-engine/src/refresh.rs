//! Daily snapshot refresh across every tracked channel, and the per-date
//! view history read back from it.

use chanwatch_core::{
    ChannelStore, ContentItem, ContentSource, HistoryPoint, SnapshotStore, StoreError,
    ViewSnapshot,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::evaluator::Evaluator;

pub const DEFAULT_HISTORY_DAYS: u32 = 30;
pub const MAX_HISTORY_DAYS: u32 = 365;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    pub channels: usize,
    pub items_refreshed: usize,
    pub snapshots_recorded: usize,
    /// Item detail calls or snapshot writes that failed.
    pub failures: usize,
}

impl<C, S> Evaluator<C, S>
where
    C: ContentSource,
    S: SnapshotStore + ChannelStore,
{
    /// Refreshes view counts for every stored item of every tracked channel
    /// and records today's snapshot for each. Per-item failures are counted,
    /// not returned.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] only if the tracked channels cannot be listed.
    pub async fn refresh_all_channels(
        &self,
        now: DateTime<Utc>,
    ) -> Result<RefreshSummary, StoreError> {
        let channels = self.store().list_channels().await?;
        let mut summary = RefreshSummary {
            channels: channels.len(),
            ..RefreshSummary::default()
        };

        for channel in &channels {
            let items = match self.store().channel_items(&channel.id).await {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!(channel = %channel.id, error = %e, "failed to load items for refresh");
                    summary.failures += 1;
                    continue;
                }
            };
            if items.is_empty() {
                continue;
            }
            self.refresh_channel(&channel.id, items, now, &mut summary)
                .await;
        }

        tracing::info!(
            channels = summary.channels,
            items = summary.items_refreshed,
            snapshots = summary.snapshots_recorded,
            failures = summary.failures,
            "snapshot refresh complete"
        );
        Ok(summary)
    }

    async fn refresh_channel(
        &self,
        channel_id: &str,
        items: Vec<ContentItem>,
        now: DateTime<Utc>,
        summary: &mut RefreshSummary,
    ) {
        let refreshed = self.refresh_items(channel_id, items).await;
        let mut fresh = Vec::with_capacity(refreshed.len());
        for (item, ok) in refreshed {
            if ok {
                fresh.push(item);
            } else {
                summary.failures += 1;
            }
        }
        if fresh.is_empty() {
            tracing::warn!(channel = %channel_id, "no item views refreshed");
            return;
        }
        summary.items_refreshed += fresh.len();

        for item in &fresh {
            let snapshot = ViewSnapshot::new(item.id.clone(), item.latest_view_count, now);
            match self.store().record_snapshot(&snapshot).await {
                Ok(()) => summary.snapshots_recorded += 1,
                Err(e) => {
                    tracing::warn!(item = %item.id, error = %e, "snapshot not recorded");
                    summary.failures += 1;
                }
            }
        }
        if let Err(e) = self.store().upsert_items(&fresh).await {
            tracing::warn!(channel = %channel_id, error = %e, "failed to update item view counts");
        }
    }

    /// Summed views per date for the `days` dates ending at `until`.
    /// `days` is clamped to `1..=365`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the history cannot be read.
    pub async fn channel_history(
        &self,
        channel_id: &str,
        days: u32,
        until: NaiveDate,
    ) -> Result<Vec<HistoryPoint>, StoreError> {
        self.store()
            .channel_view_history(channel_id, days.clamp(1, MAX_HISTORY_DAYS), until)
            .await
    }
}
