//! Shared domain types, configuration, and the adapter contracts for the
//! chanwatch channel-visibility classifier.

pub mod app_config;
pub mod channel_ref;
pub mod config;
pub mod model;
pub mod ownership;
pub mod source;
pub mod store;
pub mod tuning;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, SourceSettings};
pub use channel_ref::parse_channel_ref;
pub use config::{load_app_config, load_app_config_from_env};
pub use model::{
    normalize_tags, CachedObservation, Channel, ChannelStatus, ClassificationVerdict, ContentItem,
    HistoryPoint, ProbeResult, ViewSnapshot,
};
pub use ownership::{match_owner, OwnerMatch};
pub use source::{ContentSource, SearchPage, SourceError};
pub use store::{ChannelStore, SnapshotStore, StoreError};
pub use tuning::{FallbackWeights, ProbeLimits, TrendThresholds};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
