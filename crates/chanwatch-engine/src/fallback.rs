//! Composite score from cheaper signals, consulted only when the probe or
//! the trend data could not be gathered at all.

use chanwatch_core::{ChannelStatus, ContentItem, ContentSource, FallbackWeights};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::pacing::Pacer;
use crate::settings::EngineSettings;
use crate::terms::keyword_query;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadActivity {
    Active,
    Moderate,
    Inactive,
}

/// Generic keyword searches that surfaced the item they were built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KeywordHits {
    pub hits: usize,
    pub tested: usize,
}

impl KeywordHits {
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn rate_pct(&self) -> f64 {
        if self.tested == 0 {
            0.0
        } else {
            self.hits as f64 * 100.0 / self.tested as f64
        }
    }
}

/// The signals that could be gathered. `None` means the signal itself was
/// unavailable, not negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FallbackSignals {
    pub activity: Option<UploadActivity>,
    pub trending: Option<bool>,
    pub keyword_hits: Option<KeywordHits>,
}

impl FallbackSignals {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.activity.is_none() && self.trending.is_none() && self.keyword_hits.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FallbackScore {
    pub score: i32,
    pub signals: FallbackSignals,
    /// One line per signal that was gathered.
    pub notes: Vec<String>,
    #[serde(skip)]
    working_score: i32,
    #[serde(skip)]
    shadow_banned_score: i32,
}

impl FallbackScore {
    #[must_use]
    pub fn has_signal(&self) -> bool {
        !self.signals.is_empty()
    }

    /// Status the score maps to under the weights it was computed with.
    #[must_use]
    pub fn status(&self) -> ChannelStatus {
        if self.score >= self.working_score {
            ChannelStatus::Working
        } else if self.score <= self.shadow_banned_score {
            ChannelStatus::ShadowBanned
        } else {
            ChannelStatus::Unknown
        }
    }
}

/// Classifies upload recency from the items' upload timestamps. `None` when
/// no item carries one.
#[must_use]
pub fn upload_activity(
    items: &[ContentItem],
    now: DateTime<Utc>,
    weights: &FallbackWeights,
) -> Option<UploadActivity> {
    let ages: Vec<i64> = items
        .iter()
        .filter_map(|i| i.uploaded_at)
        .map(|at| (now - at).num_days())
        .collect();
    let newest = ages.iter().copied().min()?;

    let recent = ages.iter().filter(|&&d| d <= weights.recent_days).count();
    #[allow(clippy::cast_precision_loss)]
    let recent_pct = recent as f64 * 100.0 / ages.len() as f64;

    Some(
        if recent_pct >= weights.recent_share_pct || newest <= weights.recent_days {
            UploadActivity::Active
        } else if newest > weights.stale_days {
            UploadActivity::Inactive
        } else {
            UploadActivity::Moderate
        },
    )
}

/// Pure scoring over already-gathered signals.
#[must_use]
pub fn combine(signals: FallbackSignals, weights: &FallbackWeights) -> FallbackScore {
    let mut score = 0;
    let mut notes = Vec::new();

    if let Some(activity) = signals.activity {
        if activity == UploadActivity::Active {
            score += weights.active_uploads;
            notes.push(format!("recent uploads (+{})", weights.active_uploads));
        } else {
            notes.push(format!(
                "upload activity {} (+0)",
                match activity {
                    UploadActivity::Moderate => "moderate",
                    _ => "inactive",
                }
            ));
        }
    }

    if let Some(trending) = signals.trending {
        if trending {
            score += weights.trending;
            notes.push(format!("item on trending (+{})", weights.trending));
        } else {
            notes.push("no items on trending (+0)".to_string());
        }
    }

    if let Some(hits) = signals.keyword_hits {
        let rate = hits.rate_pct();
        if rate >= weights.good_search_rate_pct {
            score += weights.good_search_rate;
            notes.push(format!(
                "keyword search found {} of {} items (+{})",
                hits.hits, hits.tested, weights.good_search_rate
            ));
        } else if hits.hits == 0 {
            score += weights.zero_search_rate;
            notes.push(format!(
                "keyword search found none of {} items ({})",
                hits.tested, weights.zero_search_rate
            ));
        } else {
            notes.push(format!(
                "keyword search found {} of {} items (+0)",
                hits.hits, hits.tested
            ));
        }
    }

    FallbackScore {
        score,
        signals,
        notes,
        working_score: weights.working_score,
        shadow_banned_score: weights.shadow_banned_score,
    }
}

/// Gathers every fallback signal and scores them. Source failures leave the
/// corresponding signal unset, as does cancellation of `cancel`.
pub async fn score_fallback<C: ContentSource>(
    source: &C,
    items: &[ContentItem],
    now: DateTime<Utc>,
    settings: &EngineSettings,
    cancel: &CancellationToken,
) -> FallbackScore {
    let weights = &settings.weights;
    let signals = FallbackSignals {
        activity: upload_activity(items, now, weights),
        trending: trending_membership(source, items, settings, cancel).await,
        keyword_hits: keyword_hit_rate(source, items, settings, cancel).await,
    };
    combine(signals, weights)
}

async fn trending_membership<C: ContentSource>(
    source: &C,
    items: &[ContentItem],
    settings: &EngineSettings,
    cancel: &CancellationToken,
) -> Option<bool> {
    if items.is_empty() || cancel.is_cancelled() {
        return None;
    }
    let weights = &settings.weights;
    let fetched = tokio::select! {
        biased;
        () = cancel.cancelled() => return None,
        fetched = tokio::time::timeout(
            settings.search_timeout,
            source.trending(weights.trending_limit),
        ) => fetched,
    };
    let trending = match fetched {
        Ok(Ok(trending)) => trending,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "trending listing failed");
            return None;
        }
        Err(_) => {
            tracing::warn!("trending listing timed out");
            return None;
        }
    };
    Some(
        items
            .iter()
            .take(weights.trending_items_checked)
            .any(|item| trending.iter().any(|t| t.id == item.id)),
    )
}

/// Searches a title-keyword phrase per item and checks whether the item
/// itself comes back. Items without usable keywords or whose search failed
/// are not counted as tested.
async fn keyword_hit_rate<C: ContentSource>(
    source: &C,
    items: &[ContentItem],
    settings: &EngineSettings,
    cancel: &CancellationToken,
) -> Option<KeywordHits> {
    let weights = &settings.weights;
    let mut pacer = Pacer::new(settings.inter_request_delay);
    let mut hits = KeywordHits { hits: 0, tested: 0 };

    let candidates = items
        .iter()
        .filter_map(|item| keyword_query(&item.title).map(|q| (item, q)))
        .take(weights.keyword_items_checked);
    for (item, query) in candidates {
        if cancel.is_cancelled() {
            return None;
        }
        pacer.wait().await;
        let fetched = tokio::select! {
            biased;
            () = cancel.cancelled() => return None,
            fetched = tokio::time::timeout(
                settings.search_timeout,
                source.search(&query, 0, weights.keyword_search_limit),
            ) => fetched,
        };
        match fetched {
            Ok(Ok(page)) => {
                hits.tested += 1;
                if page.items.iter().any(|r| r.id == item.id) {
                    hits.hits += 1;
                }
            }
            Ok(Err(e)) => {
                tracing::warn!(item = %item.id, query = %query, error = %e, "keyword search failed");
            }
            Err(_) => {
                tracing::warn!(item = %item.id, query = %query, "keyword search timed out");
            }
        }
    }

    (hits.tested > 0).then_some(hits)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-05-10T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn uploaded(id: &str, days_ago: i64) -> ContentItem {
        let mut item = ContentItem::new(id, "robo");
        item.uploaded_at = Some(now() - Duration::days(days_ago));
        item
    }

    #[test]
    fn activity_follows_newest_upload_and_recent_share() {
        let w = FallbackWeights::default();
        assert_eq!(
            upload_activity(&[uploaded("a", 3), uploaded("b", 400)], now(), &w),
            Some(UploadActivity::Active)
        );
        assert_eq!(
            upload_activity(&[uploaded("a", 90), uploaded("b", 120)], now(), &w),
            Some(UploadActivity::Moderate)
        );
        assert_eq!(
            upload_activity(&[uploaded("a", 200)], now(), &w),
            Some(UploadActivity::Inactive)
        );
        assert_eq!(
            upload_activity(&[ContentItem::new("a", "robo")], now(), &w),
            None
        );
    }

    #[test]
    fn active_and_trending_reach_working_score() {
        let w = FallbackWeights::default();
        let scored = combine(
            FallbackSignals {
                activity: Some(UploadActivity::Active),
                trending: Some(true),
                keyword_hits: None,
            },
            &w,
        );
        assert_eq!(scored.score, 55);
        assert_eq!(scored.notes.len(), 2);
        assert_eq!(scored.status(), ChannelStatus::Working);
    }

    #[test]
    fn zero_keyword_hits_pull_score_negative() {
        let w = FallbackWeights::default();
        let scored = combine(
            FallbackSignals {
                activity: Some(UploadActivity::Inactive),
                trending: Some(false),
                keyword_hits: Some(KeywordHits { hits: 0, tested: 5 }),
            },
            &w,
        );
        assert_eq!(scored.score, -20);
        assert_eq!(scored.status(), ChannelStatus::ShadowBanned);
    }

    #[test]
    fn good_keyword_rate_adds_weight() {
        let w = FallbackWeights::default();
        let scored = combine(
            FallbackSignals {
                keyword_hits: Some(KeywordHits { hits: 2, tested: 5 }),
                ..FallbackSignals::default()
            },
            &w,
        );
        assert_eq!(scored.score, 25);
        assert_eq!(scored.status(), ChannelStatus::Unknown);
    }

    #[test]
    fn no_signals_is_empty() {
        let scored = combine(FallbackSignals::default(), &FallbackWeights::default());
        assert!(!scored.has_signal());
        assert_eq!(scored.score, 0);
    }
}
