//! Channel visibility classification: search probing, view-trend analysis,
//! and the rule table that turns both into a verdict.

pub mod decision;
pub mod evaluator;
pub mod fallback;
pub mod pacing;
pub mod probe;
pub mod refresh;
mod settings;
pub mod terms;
pub mod trend;

pub use decision::{classify, requires_fallback};
pub use evaluator::{ChannelEvaluation, Evaluator};
pub use fallback::{FallbackScore, FallbackSignals, KeywordHits, UploadActivity};
pub use probe::{probe_channel_visibility, VisibilityReport};
pub use refresh::{RefreshSummary, DEFAULT_HISTORY_DAYS, MAX_HISTORY_DAYS};
pub use settings::EngineSettings;
pub use trend::{analyze_view_trend, classify_delta, BaselineWindow, TrendKind, TrendResult};
