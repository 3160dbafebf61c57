//! Snapshot refresh and view-history commands.

use chanwatch_core::{ChannelStore, HistoryPoint};
use chanwatch_db::SqliteStore;
use chrono::Utc;

use crate::{resolve_channel, CliEvaluator};

/// Refresh every tracked channel's item views and record today's snapshots.
///
/// # Errors
///
/// Returns an error if the tracked channels cannot be listed.
pub(crate) async fn run_refresh(evaluator: &CliEvaluator) -> anyhow::Result<()> {
    tracing::info!("refreshing tracked channels");
    let summary = evaluator.refresh_all_channels(Utc::now()).await?;
    if summary.failures > 0 {
        tracing::warn!(failures = summary.failures, "some item refreshes failed");
    }
    println!(
        "refreshed {} items across {} channels; {} snapshots recorded, {} failures",
        summary.items_refreshed, summary.channels, summary.snapshots_recorded, summary.failures
    );
    Ok(())
}

/// Print summed daily views for a channel over the last `days` days.
///
/// # Errors
///
/// Returns an error if the channel reference cannot be parsed or the history
/// query fails.
pub(crate) async fn run_history(
    store: &SqliteStore,
    input: &str,
    days: u32,
    json: bool,
) -> anyhow::Result<()> {
    let channel_id = resolve_channel(input)?;
    let days = days.clamp(1, chanwatch_engine::MAX_HISTORY_DAYS);
    let history = store
        .channel_view_history(&channel_id, days, Utc::now().date_naive())
        .await?;
    tracing::info!(channel = %channel_id, days, points = history.len(), "loaded view history");

    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }
    if history.is_empty() {
        println!("no view history for {channel_id}; run `evaluate` or `refresh` first");
        return Ok(());
    }
    print!("{}", render_history(&history));
    Ok(())
}

pub(crate) fn render_history(history: &[HistoryPoint]) -> String {
    use std::fmt::Write as _;

    let mut out = format!("{:<12}{:>14}{:>8}{:>12}\n", "DATE", "VIEWS", "ITEMS", "CHANGE");
    let mut previous: Option<i64> = None;
    for point in history {
        let change = previous.map_or_else(
            || "-".to_string(),
            |prev| format!("{:+}", point.total_views - prev),
        );
        let _ = writeln!(
            out,
            "{:<12}{:>14}{:>8}{:>12}",
            point.date.format("%Y-%m-%d"),
            point.total_views,
            point.items_recorded,
            change
        );
        previous = Some(point.total_views);
    }
    out
}
