//! Background job scheduler.
//!
//! Registers the daily snapshot refresh that keeps every tracked channel's
//! view history current between evaluations.

use std::sync::Arc;

use chrono::Utc;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::api::ServerEvaluator;

/// Builds and starts the background job scheduler.
///
/// The returned handle must be kept alive for the lifetime of the process;
/// dropping it stops the jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// `refresh_cron` is not a valid schedule, or the scheduler fails to start.
pub async fn build_scheduler(
    evaluator: Arc<ServerEvaluator>,
    refresh_cron: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_refresh_job(&scheduler, evaluator, refresh_cron).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the snapshot refresh on `refresh_cron` (default `0 0 2 * * *`,
/// daily at 02:00 UTC).
async fn register_refresh_job(
    scheduler: &JobScheduler,
    evaluator: Arc<ServerEvaluator>,
    refresh_cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(refresh_cron, move |_uuid, _lock| {
        let evaluator = Arc::clone(&evaluator);

        Box::pin(async move {
            tracing::info!("scheduler: starting snapshot refresh");
            run_refresh_job(&evaluator).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %refresh_cron, "scheduler: snapshot refresh registered");
    Ok(())
}

async fn run_refresh_job(evaluator: &ServerEvaluator) {
    match evaluator.refresh_all_channels(Utc::now()).await {
        Ok(summary) => {
            tracing::info!(
                channels = summary.channels,
                items = summary.items_refreshed,
                snapshots = summary.snapshots_recorded,
                failures = summary.failures,
                "scheduler: snapshot refresh complete"
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "scheduler: failed to list tracked channels");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_evaluator;

    #[tokio::test(flavor = "multi_thread")]
    async fn rejects_an_invalid_refresh_schedule() {
        let pool = chanwatch_db::connect_in_memory().await.expect("pool");
        let evaluator = test_evaluator(pool, "http://127.0.0.1:9");
        assert!(build_scheduler(evaluator, "not-a-cron").await.is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn starts_with_the_default_refresh_schedule() {
        let pool = chanwatch_db::connect_in_memory().await.expect("pool");
        let evaluator = test_evaluator(pool, "http://127.0.0.1:9");
        assert!(build_scheduler(evaluator, "0 0 2 * * *").await.is_ok());
    }

    #[tokio::test]
    async fn refresh_job_tolerates_an_empty_store() {
        let pool = chanwatch_db::connect_in_memory().await.expect("pool");
        let evaluator = test_evaluator(pool, "http://127.0.0.1:9");
        run_refresh_job(&evaluator).await;
        let summary = evaluator
            .refresh_all_channels(Utc::now())
            .await
            .expect("summary");
        assert_eq!(summary.channels, 0);
    }
}
