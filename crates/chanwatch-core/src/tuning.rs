//! Heuristic thresholds for the probe, trend analyzer, and fallback scorer.
//!
//! None of these have ground truth behind them; they are operator-tunable
//! knobs, grouped so callers can override a whole family via struct update
//! syntax (`TrendThresholds { negligible_delta: 25, ..Default::default() }`).

use std::time::Duration;

/// Results requested per search page.
pub const SEARCH_PAGE_SIZE: u32 = 100;
/// Deepest result offset scanned per query (2,400 + one 100-item page).
pub const SEARCH_DEPTH: u32 = 2_500;
/// Query terms tried per item before giving up on it.
pub const MAX_TERMS_PER_ITEM: usize = 5;
pub const DEFAULT_SAMPLE_SIZE: usize = 12;
pub const MIN_SAMPLE_SIZE: usize = 10;
pub const MAX_SAMPLE_SIZE: usize = 15;
pub const DEFAULT_PROBE_WORKERS: usize = 10;
pub const MIN_PROBE_WORKERS: usize = 8;
pub const MAX_PROBE_WORKERS: usize = 15;
/// Owner-id fuzzy match tolerance in characters.
pub const FUZZY_LENGTH_TOLERANCE: usize = 2;

pub const LARGE_BASELINE_VIEWS: i64 = 100_000;
pub const SIGNIFICANT_DELTA: i64 = 1_000;
pub const NEGLIGIBLE_DELTA: i64 = 50;
/// 0.1% growth on a large baseline is significant.
pub const LARGE_BASELINE_GROWTH_RATIO: f64 = 0.001;
/// 5% growth escalates a moderate delta on a small baseline.
pub const SMALL_BASELINE_GROWTH_RATIO: f64 = 0.05;

pub const PRIMARY_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);
pub const SECONDARY_WINDOW: Duration = Duration::from_secs(48 * 60 * 60);
/// A cached observation younger than this is not a usable baseline.
pub const MIN_OBSERVATION_AGE: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeLimits {
    pub sample_size: usize,
    pub workers: usize,
    pub terms_per_item: usize,
    pub page_size: u32,
    pub search_depth: u32,
    pub fuzzy_length_tolerance: usize,
}

impl Default for ProbeLimits {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            workers: DEFAULT_PROBE_WORKERS,
            terms_per_item: MAX_TERMS_PER_ITEM,
            page_size: SEARCH_PAGE_SIZE,
            search_depth: SEARCH_DEPTH,
            fuzzy_length_tolerance: FUZZY_LENGTH_TOLERANCE,
        }
    }
}

impl ProbeLimits {
    /// Clamps sample size and worker count into their supported ranges.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            sample_size: self.sample_size.clamp(MIN_SAMPLE_SIZE, MAX_SAMPLE_SIZE),
            workers: self.workers.clamp(MIN_PROBE_WORKERS, MAX_PROBE_WORKERS),
            terms_per_item: self.terms_per_item.max(1),
            page_size: self.page_size.max(1),
            ..self
        }
    }

    /// Offset of the last page that still falls inside the search depth.
    #[must_use]
    pub fn max_offset(&self) -> u32 {
        self.search_depth.saturating_sub(self.page_size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendThresholds {
    pub large_baseline: i64,
    pub significant_delta: i64,
    pub negligible_delta: i64,
    pub large_growth_ratio: f64,
    pub small_growth_ratio: f64,
    pub primary_window: Duration,
    pub secondary_window: Duration,
    pub min_observation_age: Duration,
}

impl Default for TrendThresholds {
    fn default() -> Self {
        Self {
            large_baseline: LARGE_BASELINE_VIEWS,
            significant_delta: SIGNIFICANT_DELTA,
            negligible_delta: NEGLIGIBLE_DELTA,
            large_growth_ratio: LARGE_BASELINE_GROWTH_RATIO,
            small_growth_ratio: SMALL_BASELINE_GROWTH_RATIO,
            primary_window: PRIMARY_WINDOW,
            secondary_window: SECONDARY_WINDOW,
            min_observation_age: MIN_OBSERVATION_AGE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackWeights {
    pub active_uploads: i32,
    pub trending: i32,
    pub good_search_rate: i32,
    pub zero_search_rate: i32,
    /// Hit rate (percent) at or above which search visibility counts as good.
    pub good_search_rate_pct: f64,
    pub working_score: i32,
    pub shadow_banned_score: i32,
    pub recent_days: i64,
    pub stale_days: i64,
    /// Share (percent) of recent uploads that marks a channel active.
    pub recent_share_pct: f64,
    pub trending_limit: u32,
    pub trending_items_checked: usize,
    pub keyword_items_checked: usize,
    pub keyword_search_limit: u32,
}

impl Default for FallbackWeights {
    fn default() -> Self {
        Self {
            active_uploads: 30,
            trending: 25,
            good_search_rate: 25,
            zero_search_rate: -20,
            good_search_rate_pct: 40.0,
            working_score: 50,
            shadow_banned_score: 0,
            recent_days: 30,
            stale_days: 180,
            recent_share_pct: 30.0,
            trending_limit: 50,
            trending_items_checked: 20,
            keyword_items_checked: 5,
            keyword_search_limit: 25,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_probe_limits_scan_twenty_five_pages() {
        let limits = ProbeLimits::default();
        assert_eq!(limits.max_offset(), 2_400);
        assert_eq!(limits.search_depth / limits.page_size, 25);
    }

    #[test]
    fn clamped_pulls_workers_and_sample_into_range() {
        let limits = ProbeLimits {
            sample_size: 100,
            workers: 1,
            ..ProbeLimits::default()
        }
        .clamped();
        assert_eq!(limits.sample_size, MAX_SAMPLE_SIZE);
        assert_eq!(limits.workers, MIN_PROBE_WORKERS);
    }
}
