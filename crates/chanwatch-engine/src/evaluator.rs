//! The evaluation driver: list, refresh, probe, analyze, classify, persist.

use chanwatch_core::{
    CachedObservation, Channel, ChannelStatus, ChannelStore, ClassificationVerdict, ContentItem,
    ContentSource, SnapshotStore, ViewSnapshot,
};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::decision::{classify, requires_fallback, CANCELLED_REASON};
use crate::fallback::{score_fallback, FallbackScore};
use crate::probe::{probe_channel_visibility, VisibilityReport};
use crate::settings::EngineSettings;
use crate::trend::{analyze_view_trend, TrendResult};

/// Everything gathered during one evaluation, for callers that want more
/// than the verdict.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelEvaluation {
    pub channel: Channel,
    pub verdict: ClassificationVerdict,
    /// `None` when the evaluation stopped at the existence check.
    pub visibility: Option<VisibilityReport>,
    pub trend: Option<TrendResult>,
    pub fallback: Option<FallbackScore>,
    /// Items whose view count was refreshed from the source this cycle.
    pub items_refreshed: usize,
}

enum Listing {
    Items(Vec<ContentItem>),
    Missing,
    Unreachable,
}

/// Ties a content source and a store together behind
/// [`Evaluator::evaluate_channel`].
pub struct Evaluator<C, S> {
    source: C,
    store: S,
    settings: EngineSettings,
    cancel: CancellationToken,
}

impl<C, S> Evaluator<C, S>
where
    C: ContentSource,
    S: SnapshotStore + ChannelStore,
{
    #[must_use]
    pub fn new(source: C, store: S, settings: EngineSettings) -> Self {
        Self {
            source,
            store,
            settings,
            cancel: CancellationToken::new(),
        }
    }

    /// Probes started after `token` is cancelled finish immediately with no
    /// result; in-flight ones are dropped. An evaluation that sees the token
    /// cancelled returns UNKNOWN and records nothing.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn source(&self) -> &C {
        &self.source
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Evaluates `channel_id` now and returns only the verdict.
    pub async fn evaluate_channel(&self, channel_id: &str) -> ClassificationVerdict {
        self.evaluate(channel_id).await.verdict
    }

    pub async fn evaluate(&self, channel_id: &str) -> ChannelEvaluation {
        self.evaluate_at(channel_id, Utc::now()).await
    }

    /// Runs one full evaluation as of `now`. Never fails; every source or
    /// store failure degrades into the verdict's reasons.
    pub async fn evaluate_at(&self, channel_id: &str, now: DateTime<Utc>) -> ChannelEvaluation {
        let channel_id = channel_id.trim();
        let mut channel = Channel::new(channel_id);
        let mut notes = Vec::new();

        let items = match self.list_items(channel_id).await {
            Listing::Items(items) => {
                channel.exists = true;
                items
            }
            Listing::Missing => Vec::new(),
            Listing::Unreachable => {
                channel.listing_reachable = false;
                let stored = self.stored_items(channel_id).await;
                if !stored.is_empty() {
                    notes.push(format!(
                        "channel listing unavailable, using {} stored items",
                        stored.len()
                    ));
                }
                channel.exists = !stored.is_empty();
                stored
            }
        };
        channel.item_count = i64::try_from(items.len()).unwrap_or(i64::MAX);
        channel.aggregate_views = items.iter().map(|i| i.latest_view_count).sum();

        if channel.has_no_presence() {
            let verdict = classify(
                &channel,
                &VisibilityReport::default(),
                &TrendResult::no_history(0),
                None,
            );
            self.persist(&mut channel, &verdict, &[], now).await;
            return ChannelEvaluation {
                channel,
                verdict,
                visibility: None,
                trend: None,
                fallback: None,
                items_refreshed: 0,
            };
        }

        let refreshed = self.refresh_items(channel_id, items).await;
        let fresh: Vec<ContentItem> = refreshed
            .iter()
            .filter(|(_, ok)| *ok)
            .map(|(item, _)| item.clone())
            .collect();
        let items: Vec<ContentItem> = refreshed.into_iter().map(|(item, _)| item).collect();
        channel.aggregate_views = items.iter().map(|i| i.latest_view_count).sum();

        let probe = probe_channel_visibility(
            &self.source,
            channel_id,
            &items,
            &self.settings,
            &self.cancel,
        );
        let trend = async {
            if items.is_empty() {
                TrendResult::unavailable(0, "channel listing unavailable")
            } else if fresh.is_empty() {
                TrendResult::unavailable(
                    channel.aggregate_views,
                    "item view counts unavailable",
                )
            } else {
                analyze_view_trend(
                    &self.store,
                    channel_id,
                    &fresh,
                    now,
                    &self.settings.thresholds,
                )
                .await
            }
        };
        let (visibility, trend) = tokio::join!(probe, trend);
        if self.cancel.is_cancelled() {
            return Self::cancelled(channel, Some(visibility), Some(trend), None, fresh.len());
        }

        let fallback = if requires_fallback(&channel, &visibility, &trend) {
            Some(
                score_fallback(&self.source, &items, now, &self.settings, &self.cancel).await,
            )
        } else {
            None
        };
        if self.cancel.is_cancelled() {
            return Self::cancelled(channel, Some(visibility), Some(trend), fallback, fresh.len());
        }

        let mut verdict = classify(&channel, &visibility, &trend, fallback.as_ref());
        if !notes.is_empty() {
            notes.append(&mut verdict.reasons);
            verdict.reasons = notes;
        }

        self.persist(&mut channel, &verdict, &items, now).await;
        self.record_observations(channel_id, &fresh, now).await;

        tracing::info!(
            channel = %channel_id,
            status = %verdict.status,
            items = items.len(),
            refreshed = fresh.len(),
            "channel evaluated"
        );

        ChannelEvaluation {
            channel,
            verdict,
            visibility: Some(visibility),
            trend: Some(trend),
            fallback,
            items_refreshed: fresh.len(),
        }
    }

    /// Signals gathered after cancellation are incomplete: nothing is
    /// persisted and the verdict stays UNKNOWN.
    fn cancelled(
        channel: Channel,
        visibility: Option<VisibilityReport>,
        trend: Option<TrendResult>,
        fallback: Option<FallbackScore>,
        items_refreshed: usize,
    ) -> ChannelEvaluation {
        tracing::warn!(channel = %channel.id, "evaluation cancelled, verdict not recorded");
        ChannelEvaluation {
            channel,
            verdict: ClassificationVerdict::new(
                ChannelStatus::Unknown,
                vec![CANCELLED_REASON.to_string()],
            ),
            visibility,
            trend,
            fallback,
            items_refreshed,
        }
    }

    async fn list_items(&self, channel_id: &str) -> Listing {
        match self.source.list_channel_items(channel_id).await {
            Ok(items) if items.is_empty() => Listing::Missing,
            Ok(items) => Listing::Items(items),
            Err(e) if e.is_not_found() => Listing::Missing,
            Err(e) => {
                tracing::warn!(channel = %channel_id, error = %e, "channel listing failed");
                Listing::Unreachable
            }
        }
    }

    async fn stored_items(&self, channel_id: &str) -> Vec<ContentItem> {
        self.store
            .channel_items(channel_id)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(channel = %channel_id, error = %e, "failed to load stored items");
                Vec::new()
            })
    }

    /// Fetches item detail for every item with bounded concurrency. The flag
    /// marks items whose view count came back fresh.
    pub(crate) async fn refresh_items(
        &self,
        channel_id: &str,
        items: Vec<ContentItem>,
    ) -> Vec<(ContentItem, bool)> {
        let workers = self.settings.limits.workers.max(1);
        let timeout = self.settings.detail_timeout;
        stream::iter(items)
            .map(|item| async move {
                let fetched =
                    tokio::time::timeout(timeout, self.source.get_item_detail(&item.id)).await;
                let (mut item, fresh) = match fetched {
                    Ok(Ok(detail)) => (merge_detail(item, detail), true),
                    Ok(Err(e)) => {
                        tracing::debug!(item = %item.id, error = %e, "item detail unavailable");
                        (item, false)
                    }
                    Err(_) => {
                        tracing::debug!(item = %item.id, "item detail timed out");
                        (item, false)
                    }
                };
                channel_id.clone_into(&mut item.channel_id);
                (item, fresh)
            })
            .buffered(workers)
            .boxed()
            .collect()
            .await
    }

    async fn persist(
        &self,
        channel: &mut Channel,
        verdict: &ClassificationVerdict,
        items: &[ContentItem],
        now: DateTime<Utc>,
    ) {
        channel.last_status = Some(verdict.status);
        channel.last_evaluated = Some(now);
        if let Err(e) = self.store.upsert_channel(channel).await {
            tracing::warn!(channel = %channel.id, error = %e, "failed to persist channel");
            return;
        }
        if items.is_empty() || verdict.status == ChannelStatus::Banned {
            return;
        }
        if let Err(e) = self.store.upsert_items(items).await {
            tracing::warn!(channel = %channel.id, error = %e, "failed to persist items");
        }
    }

    /// Today's snapshots plus the single-slot observation. Runs after the
    /// trend has been computed so today's values never serve as baseline.
    async fn record_observations(&self, channel_id: &str, fresh: &[ContentItem], now: DateTime<Utc>) {
        if fresh.is_empty() {
            return;
        }
        let mut failed = 0usize;
        for item in fresh {
            let snapshot = ViewSnapshot::new(item.id.clone(), item.latest_view_count, now);
            if let Err(e) = self.store.record_snapshot(&snapshot).await {
                failed += 1;
                tracing::debug!(item = %item.id, error = %e, "snapshot not recorded");
            }
        }
        if failed > 0 {
            tracing::warn!(channel = %channel_id, failed, "some snapshots were not recorded");
        }

        let observation = CachedObservation {
            channel_id: channel_id.to_owned(),
            total_views: fresh.iter().map(|i| i.latest_view_count).sum(),
            item_count: i64::try_from(fresh.len()).unwrap_or(i64::MAX),
            observed_at: now,
        };
        if let Err(e) = self.store.set_cached_observation(&observation).await {
            tracing::warn!(channel = %channel_id, error = %e, "failed to cache observation");
        }
    }
}

/// Takes the fresh view count from `detail`, filling any fields the listing
/// left empty.
fn merge_detail(mut item: ContentItem, detail: ContentItem) -> ContentItem {
    item.latest_view_count = detail.latest_view_count;
    if item.tags.is_empty() {
        item.tags = detail.tags;
    }
    if item.title.is_empty() {
        item.title = detail.title;
    }
    if item.url.is_empty() {
        item.url = detail.url;
    }
    if item.uploaded_at.is_none() {
        item.uploaded_at = detail.uploaded_at;
    }
    item
}
