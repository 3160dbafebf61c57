//! Soft pacing for one logical request stream.

use std::time::Duration;

use tokio::time::Instant;

/// Enforces a minimum gap between consecutive requests of a single stream.
///
/// Not a concurrency limit: each stream (one query term's pagination, one
/// fallback check) owns its own pacer.
#[derive(Debug)]
pub struct Pacer {
    min_gap: Duration,
    last: Option<Instant>,
}

impl Pacer {
    #[must_use]
    pub fn new(min_gap: Duration) -> Self {
        Self {
            min_gap,
            last: None,
        }
    }

    /// Sleeps until `min_gap` has passed since the previous call returned.
    pub async fn wait(&mut self) {
        if let Some(last) = self.last {
            let ready = last + self.min_gap;
            if ready > Instant::now() {
                tokio::time::sleep_until(ready).await;
            }
        }
        self.last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_request_is_not_delayed() {
        let mut pacer = Pacer::new(Duration::from_secs(5));
        let start = Instant::now();
        pacer.wait().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn consecutive_requests_keep_the_gap() {
        let mut pacer = Pacer::new(Duration::from_millis(40));
        pacer.wait().await;
        let start = Instant::now();
        pacer.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(35));
    }
}
