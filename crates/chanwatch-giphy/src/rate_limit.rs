//! Retry with exponential back-off and jitter for GIPHY requests.
//!
//! Transient failures (timeouts, connection errors, 5xx, 429) are retried;
//! everything else is returned immediately so the caller can fall through
//! to its next data-source tier.

use std::future::Future;
use std::time::Duration;

use crate::error::GiphyError;

const MAX_DELAY_MS: u64 = 60_000;

/// Returns `true` for errors worth retrying after a back-off delay.
pub(crate) fn is_retriable(err: &GiphyError) -> bool {
    match err {
        GiphyError::Http(e) => {
            e.is_timeout()
                || e.is_connect()
                || e.is_request()
                || e.status().is_some_and(|s| s.is_server_error())
        }
        GiphyError::RateLimited { .. } => true,
        GiphyError::UnexpectedStatus { status, .. } => *status >= 500,
        GiphyError::NotFound { .. }
        | GiphyError::Deserialize { .. }
        | GiphyError::InvalidUrl { .. }
        | GiphyError::Config(_) => false,
    }
}

/// Delay before retry number `attempt` (1-based), honouring a server-sent
/// `Retry-After` when it is longer than the computed back-off.
pub(crate) fn backoff_delay_ms(err: &GiphyError, attempt: u32, backoff_base_ms: u64) -> u64 {
    let computed = backoff_base_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(10));
    let floor = match err {
        GiphyError::RateLimited {
            retry_after_secs: Some(secs),
        } => secs.saturating_mul(1_000),
        _ => 0,
    };
    computed.max(floor).min(MAX_DELAY_MS)
}

/// Runs `operation` with up to `max_retries` additional attempts on transient
/// errors. Delays grow as `backoff_base_ms * 2^(attempt-1)` with ±25% jitter,
/// capped at 60 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, GiphyError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GiphyError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let capped = backoff_delay_ms(&err, attempt, backoff_base_ms);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient GIPHY error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
