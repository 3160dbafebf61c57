mod common;

use chanwatch_core::{Channel, ChannelStore, ContentItem, SnapshotStore};
use chanwatch_db::MemoryStore;
use chanwatch_engine::Evaluator;
use chrono::{DateTime, Duration, Utc};

use common::{test_settings, FakeSource};

fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

async fn tracked_store(items: &[ContentItem]) -> MemoryStore {
    let store = MemoryStore::new();
    let mut channel = Channel::new("robo");
    channel.exists = true;
    store.upsert_channel(&channel).await.unwrap();
    store.upsert_items(items).await.unwrap();
    store
}

#[tokio::test]
async fn refresh_records_todays_snapshot_per_item() {
    let items = vec![
        ContentItem::new("a", "robo").with_views(100),
        ContentItem::new("b", "robo").with_views(50),
    ];
    let store = tracked_store(&items).await;
    let source = FakeSource::new()
        .with_items(items)
        .with_detail_views("a", 130)
        .with_detail_views("b", 55);
    let evaluator = Evaluator::new(source, store, test_settings());

    let now = at("2026-05-10T02:00:00Z");
    let summary = evaluator.refresh_all_channels(now).await.unwrap();

    assert_eq!(summary.channels, 1);
    assert_eq!(summary.items_refreshed, 2);
    assert_eq!(summary.snapshots_recorded, 2);
    assert_eq!(summary.failures, 0);

    let snap = evaluator
        .store()
        .snapshot_at_or_before("a", now)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snap.view_count, 130);

    let stored = evaluator.store().channel_items("robo").await.unwrap();
    let a = stored.iter().find(|i| i.id == "a").unwrap();
    assert_eq!(a.latest_view_count, 130);
}

#[tokio::test]
async fn refresh_counts_failed_details() {
    let items = vec![ContentItem::new("a", "robo").with_views(100)];
    let store = tracked_store(&items).await;
    let source = FakeSource::new().with_items(items).with_failing_details();
    let evaluator = Evaluator::new(source, store, test_settings());

    let summary = evaluator
        .refresh_all_channels(at("2026-05-10T02:00:00Z"))
        .await
        .unwrap();

    assert_eq!(summary.items_refreshed, 0);
    assert_eq!(summary.failures, 1);
    assert_eq!(evaluator.store().snapshot_count(), 0);
}

#[tokio::test]
async fn unavailable_store_fails_the_refresh() {
    let store = MemoryStore::new();
    store.set_unavailable(true);
    let evaluator = Evaluator::new(FakeSource::new(), store, test_settings());

    assert!(evaluator
        .refresh_all_channels(at("2026-05-10T02:00:00Z"))
        .await
        .is_err());
}

#[tokio::test]
async fn history_sums_views_per_day() {
    let items = vec![
        ContentItem::new("a", "robo").with_views(100),
        ContentItem::new("b", "robo").with_views(50),
    ];
    let store = tracked_store(&items).await;
    let source = FakeSource::new()
        .with_items(items)
        .with_detail_views("a", 130)
        .with_detail_views("b", 55);
    let evaluator = Evaluator::new(source, store, test_settings());

    let day_two = at("2026-05-10T02:00:00Z");
    evaluator
        .refresh_all_channels(day_two - Duration::days(1))
        .await
        .unwrap();
    evaluator.refresh_all_channels(day_two).await.unwrap();

    let history = evaluator
        .channel_history("robo", 30, day_two.date_naive())
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].total_views, 185);
    assert_eq!(history[1].items_recorded, 2);
    assert!(history[0].date < history[1].date);
}
