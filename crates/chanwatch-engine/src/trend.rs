//! View-count trend over the 24h/48h windows.

use std::fmt;

use chanwatch_core::{ContentItem, SnapshotStore, StoreError, TrendThresholds};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;

/// Concurrent snapshot lookups per window.
const LOOKUP_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendKind {
    Significant,
    /// Views went down. Normal churn, not suppression.
    Fluctuating,
    /// Between negligible and significant without reaching the growth
    /// ratio; treated as negligible.
    Moderate,
    Negligible,
    Stagnant,
    NoHistory,
    /// The snapshot store or the item view counts could not be read.
    Unavailable,
}

impl TrendKind {
    /// Kinds that count as evidence the channel is reaching viewers.
    #[must_use]
    pub fn is_working_signal(self) -> bool {
        matches!(self, Self::Significant | Self::Fluctuating)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Significant => "significant",
            Self::Fluctuating => "fluctuating",
            Self::Moderate => "moderate",
            Self::Negligible => "negligible",
            Self::Stagnant => "stagnant",
            Self::NoHistory => "no_history",
            Self::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for TrendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the baseline total came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineWindow {
    Hours24,
    Hours48,
    CachedObservation,
    None,
}

impl BaselineWindow {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Hours24 => "24h",
            Self::Hours48 => "48h",
            Self::CachedObservation => "last observation",
            Self::None => "none",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendResult {
    pub today_total: i64,
    pub baseline_total: Option<i64>,
    pub baseline_window: BaselineWindow,
    pub delta: Option<i64>,
    pub trend: TrendKind,
    /// Items that had a snapshot inside the baseline window.
    pub baseline_items: usize,
    /// Why the trend is unavailable, when it is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TrendResult {
    #[must_use]
    pub fn no_history(today_total: i64) -> Self {
        Self {
            today_total,
            baseline_total: None,
            baseline_window: BaselineWindow::None,
            delta: None,
            trend: TrendKind::NoHistory,
            baseline_items: 0,
            error: None,
        }
    }

    #[must_use]
    pub fn unavailable(today_total: i64, reason: impl Into<String>) -> Self {
        Self {
            trend: TrendKind::Unavailable,
            error: Some(reason.into()),
            ..Self::no_history(today_total)
        }
    }

    /// `delta` compares only the items behind `baseline`; `today_total`
    /// stays the full sum for display.
    fn with_baseline(today_total: i64, baseline: Baseline, thresholds: &TrendThresholds) -> Self {
        let delta = baseline.today - baseline.total;
        Self {
            today_total,
            baseline_total: Some(baseline.total),
            baseline_window: baseline.window,
            delta: Some(delta),
            trend: classify_delta(delta, baseline.total, thresholds),
            baseline_items: baseline.items,
            error: None,
        }
    }

    /// One-line explanation suitable for a verdict reason.
    #[must_use]
    pub fn describe(&self) -> String {
        match (self.trend, self.delta, self.baseline_total) {
            (TrendKind::Unavailable, _, _) => format!(
                "view trend unavailable: {}",
                self.error.as_deref().unwrap_or("unknown error")
            ),
            (TrendKind::NoHistory, _, _) => {
                format!("no baseline views to compare against {}", self.today_total)
            }
            (kind, Some(delta), Some(baseline)) => format!(
                "views {delta:+} over {} ({} -> {}): {kind}",
                self.baseline_window.label(),
                baseline,
                baseline + delta
            ),
            (kind, _, _) => format!("view trend {kind}"),
        }
    }
}

/// Scale-aware magnitude classification of a view delta.
///
/// Large baselines use a relative threshold so a handful of organic views on
/// a million-view channel does not read as growth. Small baselines escalate a
/// moderate delta only when it is a meaningful share of the baseline.
#[must_use]
pub fn classify_delta(delta: i64, baseline: i64, thresholds: &TrendThresholds) -> TrendKind {
    if delta < 0 {
        return TrendKind::Fluctuating;
    }
    if delta == 0 {
        return TrendKind::Stagnant;
    }

    let ratio = growth_ratio(delta, baseline);
    if baseline >= thresholds.large_baseline {
        if delta >= thresholds.significant_delta
            || ratio.is_some_and(|r| r >= thresholds.large_growth_ratio)
        {
            TrendKind::Significant
        } else if delta <= thresholds.negligible_delta {
            TrendKind::Negligible
        } else {
            TrendKind::Moderate
        }
    } else if delta >= thresholds.significant_delta {
        TrendKind::Significant
    } else if delta <= thresholds.negligible_delta {
        TrendKind::Negligible
    } else {
        match ratio {
            // Any growth past the negligible band on an empty baseline.
            None => TrendKind::Significant,
            Some(r) if r >= thresholds.small_growth_ratio => TrendKind::Significant,
            Some(_) => TrendKind::Moderate,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn growth_ratio(delta: i64, baseline: i64) -> Option<f64> {
    (baseline > 0).then(|| delta as f64 / baseline as f64)
}

/// Baseline views for the items that had one, paired with today's views
/// for those same items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Baseline {
    total: i64,
    today: i64,
    items: usize,
    window: BaselineWindow,
}

/// Compares today's views against the nearest stored baseline, item for
/// item: items without a baseline value (new uploads, failed refreshes) are
/// left out of the delta.
///
/// The 24h window is tried first. When it shows no growth but the 48h
/// window does, the 48h result is used, catching channels whose views move
/// slower than daily. With no snapshot in the 24h window the channel's
/// cached observation serves as baseline, if it is at least
/// `min_observation_age` old and covers the same number of items. Must run
/// before today's snapshots are written.
pub async fn analyze_view_trend<S: SnapshotStore>(
    store: &S,
    channel_id: &str,
    items: &[ContentItem],
    now: DateTime<Utc>,
    thresholds: &TrendThresholds,
) -> TrendResult {
    let today_total: i64 = items.iter().map(|i| i.latest_view_count).sum();

    match compute_trend(store, channel_id, items, now, thresholds, today_total).await {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(channel = %channel_id, error = %e, "snapshot store unavailable for trend");
            TrendResult::unavailable(today_total, e.to_string())
        }
    }
}

async fn compute_trend<S: SnapshotStore>(
    store: &S,
    channel_id: &str,
    items: &[ContentItem],
    now: DateTime<Utc>,
    thresholds: &TrendThresholds,
    today_total: i64,
) -> Result<TrendResult, StoreError> {
    // A snapshot at or before now-48h is also at or before now-24h, so an
    // empty 24h window means an empty 48h window.
    let primary_at = window_start(now, thresholds.primary_window);
    let Some(primary) = baseline_at(store, items, primary_at, BaselineWindow::Hours24).await?
    else {
        return cached_trend(store, channel_id, items, now, thresholds, today_total).await;
    };

    let result = TrendResult::with_baseline(today_total, primary, thresholds);
    if result.trend.is_working_signal() {
        return Ok(result);
    }
    let secondary_at = window_start(now, thresholds.secondary_window);
    if let Some(older) = baseline_at(store, items, secondary_at, BaselineWindow::Hours48).await? {
        let longer = TrendResult::with_baseline(today_total, older, thresholds);
        if longer.trend == TrendKind::Significant {
            return Ok(longer);
        }
    }
    Ok(result)
}

/// The single-slot observation holds a channel total, not per-item values,
/// so it is only comparable when the item count matches.
async fn cached_trend<S: SnapshotStore>(
    store: &S,
    channel_id: &str,
    items: &[ContentItem],
    now: DateTime<Utc>,
    thresholds: &TrendThresholds,
    today_total: i64,
) -> Result<TrendResult, StoreError> {
    let min_age = chrono::Duration::from_std(thresholds.min_observation_age)
        .unwrap_or_else(|_| chrono::Duration::zero());
    let item_count = i64::try_from(items.len()).unwrap_or(i64::MAX);

    match store.cached_observation(channel_id).await? {
        Some(obs) if now - obs.observed_at >= min_age && obs.item_count == item_count => {
            let baseline = Baseline {
                total: obs.total_views,
                today: today_total,
                items: items.len(),
                window: BaselineWindow::CachedObservation,
            };
            Ok(TrendResult::with_baseline(today_total, baseline, thresholds))
        }
        Some(obs) if obs.item_count != item_count => {
            tracing::debug!(
                channel = %channel_id,
                cached = obs.item_count,
                current = item_count,
                "cached observation covers a different item set"
            );
            Ok(TrendResult::no_history(today_total))
        }
        _ => Ok(TrendResult::no_history(today_total)),
    }
}

fn window_start(now: DateTime<Utc>, window: std::time::Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(window).map_or(now, |w| now - w)
}

/// Summed views at `at` for items that have a snapshot at or before it,
/// alongside today's views for the same items. `None` when no item has one.
async fn baseline_at<S: SnapshotStore>(
    store: &S,
    items: &[ContentItem],
    at: DateTime<Utc>,
    window: BaselineWindow,
) -> Result<Option<Baseline>, StoreError> {
    let lookups: Vec<Result<(i64, Option<i64>), StoreError>> = stream::iter(items)
        .map(|item| async move {
            store
                .snapshot_at_or_before(&item.id, at)
                .await
                .map(|snap| (item.latest_view_count, snap.map(|s| s.view_count)))
        })
        .buffer_unordered(LOOKUP_CONCURRENCY)
        .boxed()
        .collect()
        .await;

    let mut baseline = Baseline {
        total: 0,
        today: 0,
        items: 0,
        window,
    };
    for lookup in lookups {
        if let (today, Some(then)) = lookup? {
            baseline.total += then;
            baseline.today += today;
            baseline.items += 1;
        }
    }
    Ok((baseline.items > 0).then_some(baseline))
}

#[cfg(test)]
#[path = "trend_test.rs"]
mod tests;
