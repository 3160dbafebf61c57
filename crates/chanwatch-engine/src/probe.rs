//! Visibility probe: is any item of a channel discoverable through public
//! search?
//!
//! Each sampled item gets a probe group of up to `terms_per_item` query
//! terms scanned concurrently. The first term in a group to surface a result
//! owned by the channel wins and cancels its siblings through the group's
//! [`CancellationToken`]; groups for other items are unaffected. A shared
//! semaphore bounds the number of search calls in flight across all groups.

use chanwatch_core::{match_owner, ContentItem, ContentSource, ProbeResult};
use futures::stream::{self, FuturesUnordered, StreamExt};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::pacing::Pacer;
use crate::settings::EngineSettings;
use crate::terms::query_terms;

/// Channel-level outcome of a probe run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VisibilityReport {
    /// True iff at least one sampled item was found.
    pub visible: bool,
    pub found_count: usize,
    pub tested_count: usize,
    /// False when not a single search call succeeded, so "not visible"
    /// carries no signal.
    pub available: bool,
    pub failed_queries: usize,
    pub results: Vec<ProbeResult>,
}

impl VisibilityReport {
    /// The first query that found the channel, in report order.
    #[must_use]
    pub fn first_match(&self) -> Option<&ProbeResult> {
        self.results.iter().find(|r| r.found)
    }

    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "found in search for {} of {} sampled items",
            self.found_count, self.tested_count
        )
    }
}

struct ProbeContext<'a, C> {
    source: &'a C,
    permits: Semaphore,
    settings: &'a EngineSettings,
}

#[derive(Debug, Default)]
struct ItemProbe {
    visible: bool,
    completed: usize,
    failed: usize,
    results: Vec<ProbeResult>,
}

struct TermScan {
    result: ProbeResult,
    /// At least one page came back.
    completed: bool,
}

/// Probes up to `sample_size` items of `channel_id`. Never fails: source
/// errors and timeouts count as "no result" for the query involved.
///
/// With no items at all, a single group probing the channel id itself runs.
pub async fn probe_channel_visibility<C: ContentSource>(
    source: &C,
    channel_id: &str,
    items: &[ContentItem],
    settings: &EngineSettings,
    cancel: &CancellationToken,
) -> VisibilityReport {
    let limits = settings.limits;
    let workers = limits.workers.max(1);

    let mut groups: Vec<(Option<String>, Vec<String>)> = sample_items(items, limits.sample_size)
        .into_iter()
        .map(|item| {
            (
                Some(item.id.clone()),
                query_terms(item, channel_id, limits.terms_per_item),
            )
        })
        .collect();
    if groups.is_empty() {
        groups.push((None, vec![channel_id.to_owned()]));
    }

    let ctx = ProbeContext {
        source,
        permits: Semaphore::new(workers),
        settings,
    };

    let probes: Vec<ItemProbe> = stream::iter(groups)
        .map(|(item_id, terms)| probe_item(&ctx, channel_id, item_id, terms, cancel))
        .buffered(workers)
        .collect()
        .await;

    let mut report = VisibilityReport {
        tested_count: probes.len(),
        ..VisibilityReport::default()
    };
    for probe in probes {
        if probe.visible {
            report.found_count += 1;
        }
        if probe.completed > 0 {
            report.available = true;
        }
        report.failed_queries += probe.failed;
        report.results.extend(probe.results);
    }
    report.visible = report.found_count > 0;

    tracing::debug!(
        channel = %channel_id,
        found = report.found_count,
        tested = report.tested_count,
        failed_queries = report.failed_queries,
        "visibility probe finished"
    );
    report
}

/// Tagged items first, original order otherwise.
fn sample_items(items: &[ContentItem], sample_size: usize) -> Vec<&ContentItem> {
    let (tagged, untagged): (Vec<&ContentItem>, Vec<&ContentItem>) =
        items.iter().partition(|item| !item.tags.is_empty());
    tagged.into_iter().chain(untagged).take(sample_size).collect()
}

async fn probe_item<C: ContentSource>(
    ctx: &ProbeContext<'_, C>,
    channel_id: &str,
    item_id: Option<String>,
    terms: Vec<String>,
    parent: &CancellationToken,
) -> ItemProbe {
    let group = parent.child_token();

    let mut pending: FuturesUnordered<_> = terms
        .iter()
        .map(|term| {
            let group = &group;
            async move {
                tokio::select! {
                    biased;
                    () = group.cancelled() => None,
                    scan = scan_term(ctx, channel_id, term) => Some(scan),
                }
            }
        })
        .collect();

    let mut probe = ItemProbe::default();
    while let Some(next) = pending.next().await {
        let Some(scan) = next else {
            continue;
        };
        if scan.completed {
            probe.completed += 1;
        } else {
            probe.failed += 1;
        }
        let found = scan.result.found;
        probe.results.push(scan.result);
        if found && !probe.visible {
            probe.visible = true;
            group.cancel();
            tracing::debug!(
                channel = %channel_id,
                item = item_id.as_deref().unwrap_or("-"),
                "item visible, cancelling sibling queries"
            );
        }
    }
    probe
}

/// Pages through results for `term` until an owned result shows up, the
/// results run out, or the depth budget is spent.
async fn scan_term<C: ContentSource>(
    ctx: &ProbeContext<'_, C>,
    channel_id: &str,
    term: &str,
) -> TermScan {
    let limits = ctx.settings.limits;
    let page_len = usize::try_from(limits.page_size).unwrap_or(usize::MAX);
    let mut pacer = Pacer::new(ctx.settings.inter_request_delay);
    let mut offset = 0u32;
    let mut pages = 0u32;
    let mut total = 0i64;

    loop {
        pacer.wait().await;
        let outcome = {
            let Ok(_permit) = ctx.permits.acquire().await else {
                break;
            };
            tokio::time::timeout(
                ctx.settings.search_timeout,
                ctx.source.search(term, offset, limits.page_size),
            )
            .await
        };

        let page = match outcome {
            Ok(Ok(page)) => page,
            Ok(Err(e)) => {
                tracing::warn!(channel = %channel_id, query = %term, offset, error = %e, "search probe failed");
                break;
            }
            Err(_) => {
                tracing::warn!(channel = %channel_id, query = %term, offset, "search probe timed out");
                break;
            }
        };
        pages += 1;
        total = total.max(page.total_count);

        let hit = page.items.iter().enumerate().find(|(_, item)| {
            match_owner(&item.channel_id, channel_id, limits.fuzzy_length_tolerance).is_some()
        });
        if let Some((index, item)) = hit {
            let position = u64::from(offset) + u64::try_from(index).unwrap_or(u64::MAX) + 1;
            tracing::debug!(
                channel = %channel_id,
                query = %term,
                position,
                total,
                "search hit"
            );
            return TermScan {
                result: ProbeResult {
                    query: term.to_owned(),
                    found: true,
                    matched_item_id: Some(item.id.clone()),
                    position: Some(position),
                    pages_scanned: pages,
                    total_results_available: total,
                },
                completed: true,
            };
        }

        let next = offset.saturating_add(limits.page_size);
        if page.items.len() < page_len || i64::from(next) >= total || next > limits.max_offset() {
            break;
        }
        offset = next;
    }

    TermScan {
        result: ProbeResult::not_found(term, pages, total),
        completed: pages > 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_prefers_tagged_items() {
        let items = vec![
            ContentItem::new("a", "robo"),
            ContentItem::new("b", "robo").with_tags(["robots"]),
            ContentItem::new("c", "robo"),
        ];
        let ids: Vec<&str> = sample_items(&items, 2).iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn summary_reads_counts() {
        let report = VisibilityReport {
            found_count: 2,
            tested_count: 12,
            ..VisibilityReport::default()
        };
        assert_eq!(report.summary(), "found in search for 2 of 12 sampled items");
    }
}
