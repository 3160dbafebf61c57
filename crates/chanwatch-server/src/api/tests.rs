use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::Request;
use chanwatch_core::{Channel, ChannelStore, ContentItem, SnapshotStore, ViewSnapshot};
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::channels::normalize_days;
use super::*;
use crate::test_support::test_state;

const UNUSED_UPSTREAM: &str = "http://127.0.0.1:9";

async fn body_json(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&body).expect("json parse")
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).expect("request")
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

#[test]
fn normalize_days_applies_defaults_and_bounds() {
    assert_eq!(normalize_days(None), 30);
    assert_eq!(normalize_days(Some(0)), 1);
    assert_eq!(normalize_days(Some(1_000)), 365);
    assert_eq!(normalize_days(Some(7)), 7);
}

#[test]
fn api_error_codes_map_to_statuses() {
    let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let response = ApiError::new("req-1", "not_found", "missing").into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = ApiError::new("req-1", "internal_error", "boom").into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn health_reports_ok_and_echoes_request_id() {
    let state = test_state(UNUSED_UPSTREAM).await;
    let app = build_app(state, AuthState::disabled(), default_rate_limit_state());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .header("x-request-id", "req-health-1")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("req-health-1")
    );
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["database"], "ok");
    assert_eq!(json["meta"]["request_id"], "req-health-1");
}

#[tokio::test]
async fn protected_routes_require_a_valid_bearer_token() {
    let state = test_state(UNUSED_UPSTREAM).await;
    let auth = AuthState::from_keys(&["secret".to_string()], false).expect("auth");
    let app = build_app(state, auth, default_rate_limit_state());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/channels")
                .header("x-request-id", "req-denied-1")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "unauthorized");
    assert_eq!(json["meta"]["request_id"], "req-denied-1");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/channels")
                .header("authorization", "Bearer secret")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get_request("/api/v1/health"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_are_rate_limited() {
    let state = test_state(UNUSED_UPSTREAM).await;
    let app = build_app(
        state,
        AuthState::disabled(),
        RateLimitState::new(1, Duration::from_secs(60)),
    );

    let first = app
        .clone()
        .oneshot(get_request("/api/v1/channels"))
        .await
        .expect("response");
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(get_request("/api/v1/channels"))
        .await
        .expect("response");
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(second).await["error"]["code"], "rate_limited");
}

#[tokio::test]
async fn check_rejects_an_unreadable_channel_reference() {
    let state = test_state(UNUSED_UPSTREAM).await;
    let app = build_app(state, AuthState::disabled(), default_rate_limit_state());

    let response = app
        .oneshot(post_json(
            "/api/v1/channels/check",
            &json!({"channel": "   "}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "validation_error");
    assert!(json["meta"]["request_id"].is_string());
}

#[tokio::test]
async fn check_marks_a_channel_without_uploads_banned_and_tracks_it() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [],
            "pagination": {"total_count": 0, "count": 0, "offset": 0},
            "meta": {"status": 200, "msg": "OK"}
        })))
        .mount(&server)
        .await;

    let state = test_state(&server.uri()).await;
    let app = build_app(state, AuthState::disabled(), default_rate_limit_state());

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/channels/check",
            &json!({"channel": "https://giphy.com/channel/ghostchan"}),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["channel"]["id"], "ghostchan");
    assert_eq!(json["data"]["verdict"]["status"], "BANNED");
    assert_eq!(
        json["data"]["verdict"]["reasons"][0],
        "no items or views found"
    );

    let response = app
        .oneshot(get_request("/api/v1/channels"))
        .await
        .expect("response");
    let json = body_json(response).await;
    let channels = json["data"].as_array().expect("data array");
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0]["id"], "ghostchan");
    assert_eq!(channels[0]["last_status"], "BANNED");
}

#[tokio::test]
async fn get_channel_returns_404_for_untracked_channel() {
    let state = test_state(UNUSED_UPSTREAM).await;
    let app = build_app(state, AuthState::disabled(), default_rate_limit_state());

    let response = app
        .clone()
        .oneshot(get_request("/api/v1/channels/nobody"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(get_request("/api/v1/channels/nobody/history"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["code"], "not_found");
}

#[tokio::test]
async fn history_sums_recorded_views_per_day() {
    let state = test_state(UNUSED_UPSTREAM).await;
    let store = state.evaluator.store();

    let mut channel = Channel::new("robo");
    channel.exists = true;
    channel.item_count = 2;
    store.upsert_channel(&channel).await.expect("channel");
    store
        .upsert_items(&[
            ContentItem::new("g1", "robo").with_views(150),
            ContentItem::new("g2", "robo").with_views(250),
        ])
        .await
        .expect("items");

    let now = Utc::now();
    let yesterday = now - chrono::Duration::days(1);
    for (item, views, at) in [
        ("g1", 100, yesterday),
        ("g2", 200, yesterday),
        ("g1", 150, now),
        ("g2", 250, now),
    ] {
        store
            .record_snapshot(&ViewSnapshot::new(item, views, at))
            .await
            .expect("snapshot");
    }

    let app = build_app(state, AuthState::disabled(), default_rate_limit_state());

    let response = app
        .clone()
        .oneshot(get_request("/api/v1/channels/robo/history?days=7"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["channel_id"], "robo");
    assert_eq!(json["data"]["days"], 7);
    let points = json["data"]["points"].as_array().expect("points");
    assert_eq!(points.len(), 2);
    assert_eq!(points[0]["total_views"], 300);
    assert_eq!(points[1]["total_views"], 400);
    assert_eq!(points[1]["items_recorded"], 2);

    let response = app
        .oneshot(get_request("/api/v1/channels/robo/history?days=0"))
        .await
        .expect("response");
    let json = body_json(response).await;
    assert_eq!(json["data"]["days"], 1);
    assert_eq!(json["data"]["points"].as_array().map(Vec::len), Some(1));
}
