//! Database operations for `channel_observations`, the single-slot baseline
//! used before a channel has any persisted history.

use chanwatch_core::CachedObservation;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::{timestamp_text, DbError};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ObservationRow {
    pub channel_id: String,
    pub total_views: i64,
    pub item_count: i64,
    pub observed_at: DateTime<Utc>,
}

impl From<ObservationRow> for CachedObservation {
    fn from(row: ObservationRow) -> Self {
        Self {
            channel_id: row.channel_id,
            total_views: row.total_views,
            item_count: row.item_count,
            observed_at: row.observed_at,
        }
    }
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_cached_observation(
    pool: &SqlitePool,
    channel_id: &str,
) -> Result<Option<ObservationRow>, DbError> {
    let row = sqlx::query_as::<_, ObservationRow>(
        "SELECT channel_id, total_views, item_count, observed_at \
         FROM channel_observations WHERE channel_id = ?1",
    )
    .bind(channel_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Replaces the cached observation for the channel.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails.
pub async fn set_cached_observation(
    pool: &SqlitePool,
    observation: &CachedObservation,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO channel_observations (channel_id, total_views, item_count, observed_at) \
         VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT (channel_id) DO UPDATE SET \
             total_views = excluded.total_views, \
             item_count = excluded.item_count, \
             observed_at = excluded.observed_at",
    )
    .bind(&observation.channel_id)
    .bind(observation.total_views)
    .bind(observation.item_count)
    .bind(timestamp_text(observation.observed_at))
    .execute(pool)
    .await?;
    Ok(())
}
