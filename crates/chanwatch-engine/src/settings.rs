use std::time::Duration;

use chanwatch_core::{AppConfig, FallbackWeights, ProbeLimits, TrendThresholds};

/// Everything the engine needs besides its source and store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub limits: ProbeLimits,
    pub thresholds: TrendThresholds,
    pub weights: FallbackWeights,
    pub search_timeout: Duration,
    pub detail_timeout: Duration,
    pub inter_request_delay: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            limits: ProbeLimits::default(),
            thresholds: TrendThresholds::default(),
            weights: FallbackWeights::default(),
            search_timeout: Duration::from_secs(10),
            detail_timeout: Duration::from_secs(5),
            inter_request_delay: Duration::from_millis(300),
        }
    }
}

impl EngineSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            limits: config.probe.clamped(),
            search_timeout: config.source.search_timeout(),
            detail_timeout: config.source.detail_timeout(),
            inter_request_delay: config.source.inter_request_delay(),
            ..Self::default()
        }
    }
}
