//! Contract for the platform the probe talks to, plus the failure taxonomy
//! every adapter maps its transport errors into.

use std::future::Future;

use thiserror::Error;

use crate::model::ContentItem;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Timeout, connection reset, 5xx. Falls through to the next tier.
    #[error("transient source failure: {0}")]
    Transient(String),

    #[error("rate limited by source (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    /// A legitimate "no signal", not a failure.
    #[error("not found: {0}")]
    NotFound(String),

    /// The offending item or query is skipped.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl SourceError {
    /// Whether a later attempt (or the next tier) may succeed.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::RateLimited { .. })
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// One page of search results together with the total the source reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    pub items: Vec<ContentItem>,
    pub total_count: i64,
}

/// Read-only access to the content platform.
///
/// Implementations must be cheap to share across concurrent probes; the
/// engine calls these methods from many in-flight futures at once.
pub trait ContentSource: Send + Sync {
    /// Every item published by `channel_id`. An empty `Ok` and
    /// `Err(SourceError::NotFound)` both mean the channel has nothing.
    fn list_channel_items(
        &self,
        channel_id: &str,
    ) -> impl Future<Output = Result<Vec<ContentItem>, SourceError>> + Send;

    fn get_item_detail(
        &self,
        item_id: &str,
    ) -> impl Future<Output = Result<ContentItem, SourceError>> + Send;

    /// One page of public search results for `query`.
    fn search(
        &self,
        query: &str,
        offset: u32,
        limit: u32,
    ) -> impl Future<Output = Result<SearchPage, SourceError>> + Send;

    /// Items currently on the platform's trending surface.
    fn trending(
        &self,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<ContentItem>, SourceError>> + Send;
}
