//! Priority-ordered verdict rules. Pure: no I/O, never panics.
//!
//! 1. No presence (listing reachable, nothing published) -> BANNED
//! 2. Visible in search -> WORKING
//! 3. Views growing or fluctuating -> WORKING
//! 4. Probe or trend data unavailable -> fallback score, or UNKNOWN
//! 5. No baseline yet -> UNKNOWN
//! 6. Stagnant, negligible or moderate growth -> SHADOW_BANNED

use chanwatch_core::{Channel, ChannelStatus, ClassificationVerdict};

use crate::fallback::FallbackScore;
use crate::probe::VisibilityReport;
use crate::trend::{TrendKind, TrendResult};

pub const NO_PRESENCE_REASON: &str = "no items or views found";
pub const INSUFFICIENT_DATA_REASON: &str = "insufficient data";
pub const NO_HISTORY_REASON: &str = "need another observation to compare";
pub const CANCELLED_REASON: &str = "evaluation cancelled";

/// Whether the fallback scorer has to run for rules 2-6 to reach a verdict.
#[must_use]
pub fn requires_fallback(
    channel: &Channel,
    visibility: &VisibilityReport,
    trend: &TrendResult,
) -> bool {
    if channel.has_no_presence() || visibility.visible || trend.trend.is_working_signal() {
        return false;
    }
    !visibility.available || trend.trend == TrendKind::Unavailable
}

#[must_use]
pub fn classify(
    channel: &Channel,
    visibility: &VisibilityReport,
    trend: &TrendResult,
    fallback: Option<&FallbackScore>,
) -> ClassificationVerdict {
    if channel.has_no_presence() {
        return ClassificationVerdict::new(
            ChannelStatus::Banned,
            vec![NO_PRESENCE_REASON.to_string()],
        );
    }

    let mut reasons = Vec::new();

    if visibility.visible {
        reasons.push(visibility.summary());
        if let Some(hit) = visibility.first_match() {
            reasons.push(match (hit.position, hit.matched_item_id.as_deref()) {
                (Some(pos), Some(id)) => format!(
                    "query '{}' returned item {id} at position {pos} of {}",
                    hit.query, hit.total_results_available
                ),
                _ => format!("query '{}' returned a channel item", hit.query),
            });
        }
        return ClassificationVerdict::new(ChannelStatus::Working, reasons);
    }

    if visibility.available {
        reasons.push(format!("not found in search: {}", visibility.summary()));
    } else {
        reasons.push("search probe unavailable".to_string());
    }

    if trend.trend.is_working_signal() {
        reasons.push(trend.describe());
        return ClassificationVerdict::new(ChannelStatus::Working, reasons);
    }

    if !visibility.available || trend.trend == TrendKind::Unavailable {
        if trend.trend == TrendKind::Unavailable {
            reasons.push(trend.describe());
        }
        return match fallback.filter(|f| f.has_signal()) {
            Some(scored) => fallback_verdict(reasons, scored),
            None => {
                reasons.push(INSUFFICIENT_DATA_REASON.to_string());
                ClassificationVerdict::new(ChannelStatus::Unknown, reasons)
            }
        };
    }

    if trend.trend == TrendKind::NoHistory {
        reasons.push(NO_HISTORY_REASON.to_string());
        return ClassificationVerdict::new(ChannelStatus::Unknown, reasons);
    }

    reasons.push(trend.describe());
    ClassificationVerdict::new(ChannelStatus::ShadowBanned, reasons)
}

fn fallback_verdict(mut reasons: Vec<String>, scored: &FallbackScore) -> ClassificationVerdict {
    reasons.extend(scored.notes.iter().cloned());
    reasons.push(format!("fallback score {}", scored.score));
    ClassificationVerdict {
        status: scored.status(),
        reasons,
        score: Some(scored.score),
    }
}

#[cfg(test)]
#[path = "decision_test.rs"]
mod tests;
