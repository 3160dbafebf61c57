//! Database operations for `channels` and `items`, plus the per-date view
//! history graph built from `view_history`.

use chanwatch_core::{Channel, ChannelStatus, ContentItem, HistoryPoint};
use chrono::{DateTime, Days, NaiveDate, Utc};
use sqlx::SqlitePool;

use crate::{timestamp_text, DbError};

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `channels` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChannelRow {
    pub id: String,
    pub channel_exists: bool,
    pub item_count: i64,
    pub aggregate_views: i64,
    pub listing_reachable: bool,
    pub last_status: Option<String>,
    pub last_evaluated: Option<DateTime<Utc>>,
}

impl From<ChannelRow> for Channel {
    fn from(row: ChannelRow) -> Self {
        Self {
            id: row.id,
            exists: row.channel_exists,
            item_count: row.item_count,
            aggregate_views: row.aggregate_views,
            last_evaluated: row.last_evaluated,
            last_status: row.last_status.as_deref().map(ChannelStatus::parse),
            listing_reachable: row.listing_reachable,
        }
    }
}

/// A row from the `items` table. `tags` holds a JSON array.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ItemRow {
    pub id: String,
    pub channel_id: String,
    pub title: String,
    pub tags: String,
    pub latest_view_count: i64,
    pub url: String,
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl TryFrom<ItemRow> for ContentItem {
    type Error = DbError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let tags: Vec<String> = serde_json::from_str(&row.tags).map_err(|e| DbError::Tags {
            item_id: row.id.clone(),
            source: e,
        })?;
        Ok(Self {
            id: row.id,
            channel_id: row.channel_id,
            title: row.title,
            tags,
            latest_view_count: row.latest_view_count,
            url: row.url,
            uploaded_at: row.uploaded_at,
        })
    }
}

/// One point of the per-date history graph.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HistoryRow {
    pub recorded_date: NaiveDate,
    pub total_views: i64,
    pub items_recorded: i64,
}

impl From<HistoryRow> for HistoryPoint {
    fn from(row: HistoryRow) -> Self {
        Self {
            date: row.recorded_date,
            total_views: row.total_views,
            items_recorded: row.items_recorded,
        }
    }
}

// ---------------------------------------------------------------------------
// channels
// ---------------------------------------------------------------------------

/// Inserts or refreshes a channel row with the latest evaluation outcome.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails.
pub async fn upsert_channel(pool: &SqlitePool, channel: &Channel) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO channels \
             (id, channel_exists, item_count, aggregate_views, listing_reachable, \
              last_status, last_evaluated) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
         ON CONFLICT (id) DO UPDATE SET \
             channel_exists = excluded.channel_exists, \
             item_count = excluded.item_count, \
             aggregate_views = excluded.aggregate_views, \
             listing_reachable = excluded.listing_reachable, \
             last_status = COALESCE(excluded.last_status, channels.last_status), \
             last_evaluated = COALESCE(excluded.last_evaluated, channels.last_evaluated), \
             updated_at = CURRENT_TIMESTAMP",
    )
    .bind(&channel.id)
    .bind(channel.exists)
    .bind(channel.item_count)
    .bind(channel.aggregate_views)
    .bind(channel.listing_reachable)
    .bind(channel.last_status.map(ChannelStatus::as_str))
    .bind(channel.last_evaluated.map(timestamp_text))
    .execute(pool)
    .await?;
    Ok(())
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_channel(pool: &SqlitePool, channel_id: &str) -> Result<Option<ChannelRow>, DbError> {
    let row = sqlx::query_as::<_, ChannelRow>(
        "SELECT id, channel_exists, item_count, aggregate_views, listing_reachable, \
                last_status, last_evaluated \
         FROM channels WHERE id = ?1",
    )
    .bind(channel_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// All tracked channels ordered by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_channels(pool: &SqlitePool) -> Result<Vec<ChannelRow>, DbError> {
    let rows = sqlx::query_as::<_, ChannelRow>(
        "SELECT id, channel_exists, item_count, aggregate_views, listing_reachable, \
                last_status, last_evaluated \
         FROM channels ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// items
// ---------------------------------------------------------------------------

/// Upserts items in one transaction. Only `latest_view_count`, tags, and
/// descriptive fields change on conflict; `channel_id` is fixed at insert.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; nothing is written then.
pub async fn upsert_items(pool: &SqlitePool, items: &[ContentItem]) -> Result<(), DbError> {
    if items.is_empty() {
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    for item in items {
        let tags = serde_json::to_string(&item.tags).map_err(|e| DbError::Tags {
            item_id: item.id.clone(),
            source: e,
        })?;
        sqlx::query(
            "INSERT INTO items \
                 (id, channel_id, title, tags, latest_view_count, url, uploaded_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
             ON CONFLICT (id) DO UPDATE SET \
                 title = excluded.title, \
                 tags = excluded.tags, \
                 latest_view_count = excluded.latest_view_count, \
                 url = excluded.url, \
                 uploaded_at = COALESCE(excluded.uploaded_at, items.uploaded_at), \
                 updated_at = CURRENT_TIMESTAMP",
        )
        .bind(&item.id)
        .bind(&item.channel_id)
        .bind(&item.title)
        .bind(tags)
        .bind(item.latest_view_count)
        .bind(&item.url)
        .bind(item.uploaded_at.map(timestamp_text))
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_channel_items(
    pool: &SqlitePool,
    channel_id: &str,
) -> Result<Vec<ItemRow>, DbError> {
    let rows = sqlx::query_as::<_, ItemRow>(
        "SELECT id, channel_id, title, tags, latest_view_count, url, uploaded_at \
         FROM items WHERE channel_id = ?1 ORDER BY id",
    )
    .bind(channel_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// history graph
// ---------------------------------------------------------------------------

/// Summed views per recorded date for the `days` dates ending at `until`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn channel_view_history(
    pool: &SqlitePool,
    channel_id: &str,
    days: u32,
    until: NaiveDate,
) -> Result<Vec<HistoryRow>, DbError> {
    let span = u64::from(days.max(1) - 1);
    let from = until.checked_sub_days(Days::new(span)).unwrap_or(NaiveDate::MIN);

    let rows = sqlx::query_as::<_, HistoryRow>(
        "SELECT vh.recorded_date AS recorded_date, \
                SUM(vh.view_count) AS total_views, \
                COUNT(*) AS items_recorded \
         FROM view_history vh \
         JOIN items i ON i.id = vh.item_id \
         WHERE i.channel_id = ?1 AND vh.recorded_date >= ?2 AND vh.recorded_date <= ?3 \
         GROUP BY vh.recorded_date \
         ORDER BY vh.recorded_date",
    )
    .bind(channel_id)
    .bind(from)
    .bind(until)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
