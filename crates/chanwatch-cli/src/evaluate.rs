use chanwatch_core::ChannelStatus;
use chanwatch_engine::ChannelEvaluation;

use crate::{resolve_channel, CliEvaluator};

/// Evaluate one channel and print the verdict with its reasons.
///
/// # Errors
///
/// Returns an error if the channel reference cannot be parsed or the JSON
/// output cannot be serialized. Source and store failures never fail the
/// command; they surface as reasons on the verdict.
pub(crate) async fn run_evaluate(
    evaluator: &CliEvaluator,
    input: &str,
    json: bool,
) -> anyhow::Result<()> {
    let channel_id = resolve_channel(input)?;
    tracing::info!(channel = %channel_id, "evaluating channel");
    let evaluation = evaluator.evaluate(&channel_id).await;
    if evaluation.verdict.status == ChannelStatus::Unknown {
        tracing::warn!(
            channel = %channel_id,
            reasons = ?evaluation.verdict.reasons,
            "evaluation could not reach a verdict"
        );
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&evaluation)?);
    } else {
        print!("{}", render_evaluation(&evaluation));
    }
    Ok(())
}

pub(crate) fn render_evaluation(evaluation: &ChannelEvaluation) -> String {
    use std::fmt::Write as _;

    let channel = &evaluation.channel;
    let verdict = &evaluation.verdict;
    let mut out = String::new();
    let _ = writeln!(out, "Channel: {}", channel.id);
    let _ = writeln!(out, "Status:  {}", verdict.status);
    if let Some(score) = verdict.score {
        let _ = writeln!(out, "Score:   {score}");
    }
    let _ = writeln!(
        out,
        "Items:   {} ({} refreshed), {} total views",
        channel.item_count, evaluation.items_refreshed, channel.aggregate_views
    );
    let _ = writeln!(out, "Reasons:");
    for reason in &verdict.reasons {
        let _ = writeln!(out, "  - {reason}");
    }
    out
}
