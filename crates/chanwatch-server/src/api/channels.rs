use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chanwatch_core::{Channel, ChannelStore, HistoryPoint};
use chanwatch_engine::{ChannelEvaluation, DEFAULT_HISTORY_DAYS, MAX_HISTORY_DAYS};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_store_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct CheckRequest {
    pub channel: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct HistoryQuery {
    pub days: Option<u32>,
}

#[derive(Debug, Serialize)]
pub(super) struct HistoryData {
    channel_id: String,
    days: u32,
    points: Vec<HistoryPoint>,
}

pub(super) fn normalize_days(days: Option<u32>) -> u32 {
    days.unwrap_or(DEFAULT_HISTORY_DAYS).clamp(1, MAX_HISTORY_DAYS)
}

/// Runs a full evaluation for one channel. Upstream failures never fail the
/// request; they surface as reasons on the verdict.
pub(super) async fn check_channel(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CheckRequest>,
) -> Result<Json<ApiResponse<ChannelEvaluation>>, ApiError> {
    let Some(channel_id) = chanwatch_core::parse_channel_ref(&body.channel) else {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            format!("could not read a channel name from '{}'", body.channel),
        ));
    };

    tracing::info!(channel = %channel_id, "api: evaluating channel");
    let evaluation = state.evaluator.evaluate(&channel_id).await;

    Ok(Json(ApiResponse {
        data: evaluation,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_channels(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<Channel>>>, ApiError> {
    let channels = state
        .evaluator
        .store()
        .list_channels()
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: channels,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_channel(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(channel_id): Path<String>,
) -> Result<Json<ApiResponse<Channel>>, ApiError> {
    let channel = find_channel(&state, &req_id, &channel_id).await?;

    Ok(Json(ApiResponse {
        data: channel,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn channel_history(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(channel_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<HistoryData>>, ApiError> {
    let channel = find_channel(&state, &req_id, &channel_id).await?;
    let days = normalize_days(query.days);

    let points = state
        .evaluator
        .channel_history(&channel.id, days, Utc::now().date_naive())
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: HistoryData {
            channel_id: channel.id,
            days,
            points,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

async fn find_channel(
    state: &AppState,
    req_id: &RequestId,
    channel_id: &str,
) -> Result<Channel, ApiError> {
    state
        .evaluator
        .store()
        .get_channel(channel_id)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?
        .ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "not_found",
                format!("channel '{channel_id}' is not tracked"),
            )
        })
}
