//! Database operations for `view_history`.

use chanwatch_core::ViewSnapshot;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;

use crate::{timestamp_text, DbError};

/// A row from the `view_history` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SnapshotRow {
    pub item_id: String,
    pub recorded_date: NaiveDate,
    pub view_count: i64,
    pub recorded_at: DateTime<Utc>,
}

impl From<SnapshotRow> for ViewSnapshot {
    fn from(row: SnapshotRow) -> Self {
        Self {
            item_id: row.item_id,
            date: row.recorded_date,
            view_count: row.view_count,
            recorded_at: row.recorded_at,
        }
    }
}

/// Upserts the snapshot for `(item_id, date)`; a second write on the same
/// date replaces the first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails.
pub async fn record_snapshot(pool: &SqlitePool, snapshot: &ViewSnapshot) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO view_history (item_id, recorded_date, view_count, recorded_at) \
         VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT (item_id, recorded_date) DO UPDATE SET \
             view_count = excluded.view_count, \
             recorded_at = excluded.recorded_at",
    )
    .bind(&snapshot.item_id)
    .bind(snapshot.date)
    .bind(snapshot.view_count)
    .bind(timestamp_text(snapshot.recorded_at))
    .execute(pool)
    .await?;
    Ok(())
}

/// Latest snapshot for `item_id` recorded at or before `at`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_snapshot_at_or_before(
    pool: &SqlitePool,
    item_id: &str,
    at: DateTime<Utc>,
) -> Result<Option<SnapshotRow>, DbError> {
    let row = sqlx::query_as::<_, SnapshotRow>(
        "SELECT item_id, recorded_date, view_count, recorded_at \
         FROM view_history \
         WHERE item_id = ?1 AND recorded_at <= ?2 \
         ORDER BY recorded_at DESC \
         LIMIT 1",
    )
    .bind(item_id)
    .bind(timestamp_text(at))
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Number of rows stored for `(item_id, date)`; at most one.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_snapshots_for_date(
    pool: &SqlitePool,
    item_id: &str,
    date: NaiveDate,
) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM view_history WHERE item_id = ?1 AND recorded_date = ?2",
    )
    .bind(item_id)
    .bind(date)
    .fetch_one(pool)
    .await?;
    Ok(count)
}
