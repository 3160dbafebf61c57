//! Request id, bearer auth, and rate limiting for the HTTP front-end.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::api::ApiError;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request id stored as a request extension by [`request_id`].
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    fn of(req: &Request) -> String {
        req.extensions()
            .get::<Self>()
            .map_or_else(String::new, |id| id.0.clone())
    }
}

/// Accepted bearer tokens. `None` turns auth off.
#[derive(Debug, Clone)]
pub struct AuthState {
    tokens: Option<Arc<HashSet<String>>>,
}

impl AuthState {
    /// Builds auth from the configured `CHANWATCH_API_KEYS` tokens. An empty
    /// list disables auth in development and fails startup anywhere else.
    ///
    /// # Errors
    ///
    /// Returns an error when no keys are configured outside development.
    pub fn from_keys(keys: &[String], is_development: bool) -> anyhow::Result<Self> {
        let tokens: HashSet<String> = keys
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(ToOwned::to_owned)
            .collect();

        match (tokens.is_empty(), is_development) {
            (false, _) => Ok(Self {
                tokens: Some(Arc::new(tokens)),
            }),
            (true, true) => {
                tracing::warn!("CHANWATCH_API_KEYS not set; bearer auth disabled in development");
                Ok(Self::disabled())
            }
            (true, false) => anyhow::bail!(
                "CHANWATCH_API_KEYS is required outside development; provide comma-separated bearer tokens"
            ),
        }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self { tokens: None }
    }

    fn allows(&self, header: Option<&HeaderValue>) -> bool {
        match &self.tokens {
            None => true,
            Some(tokens) => bearer_token(header).is_some_and(|t| tokens.contains(t)),
        }
    }
}

/// Fixed-window limiter shared by every protected route.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    /// Window start and requests admitted in it.
    current: Arc<Mutex<(Instant, usize)>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            current: Arc::new(Mutex::new((Instant::now(), 0))),
        }
    }

    fn admit(&self) -> bool {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        let (started, count) = &mut *current;
        if started.elapsed() >= self.window {
            *started = Instant::now();
            *count = 0;
        }
        if *count >= self.max_requests {
            return false;
        }
        *count += 1;
        true
    }
}

/// Reuses an incoming `x-request-id` or assigns a `UUIDv4`, and echoes it on
/// the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);
    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}

pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if auth.allows(req.headers().get(AUTHORIZATION)) {
        return next.run(req).await;
    }
    ApiError::new(
        RequestId::of(&req),
        "unauthorized",
        "missing or invalid bearer token",
    )
    .into_response()
}

pub async fn enforce_rate_limit(
    State(limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    if limit.admit() {
        return next.run(req).await;
    }
    tracing::debug!("rate limit exceeded");
    ApiError::new(RequestId::of(&req), "rate_limited", "rate limit exceeded").into_response()
}

fn bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
