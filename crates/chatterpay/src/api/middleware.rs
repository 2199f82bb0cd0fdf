//! Rate limiting and other middleware.

use crate::error::AppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{
    num::NonZeroU32,
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{debug, info, warn};

/// Global rate limiter (not keyed by IP).
pub type GlobalLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Rate limiter state shared across requests.
#[derive(Clone)]
pub struct RateLimitState {
    /// Global rate limiter for all `/api` requests
    pub global: Arc<GlobalLimiter>,
}

impl RateLimitState {
    /// Allow `max_requests` per `window`, replenished evenly across the window.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        let burst = NonZeroU32::new(max_requests).unwrap_or(NonZeroU32::MIN);
        let period = window / burst.get();
        let quota = Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst);

        Self {
            global: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Create a permissive rate limiter for testing.
    pub fn permissive() -> Self {
        Self::new(10_000, Duration::from_secs(1))
    }
}

/// Rate limiting middleware.
///
/// Checks the global rate limit and returns 429 Too Many Requests if exceeded.
pub async fn rate_limit_middleware(
    State(rate_limit): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if rate_limit.global.check().is_err() {
        warn!("Global rate limit exceeded");
        return Err(AppError::RateLimitExceeded);
    }

    debug!("Rate limit check passed");
    Ok(next.run(request).await)
}

/// Which part of the relay a request path belongs to.
pub fn surface(path: &str) -> &'static str {
    match path {
        "/webhook" | "/status" => "twilio",
        "/" | "/health" => "service",
        p if p == "/api" || p.starts_with("/api/") => "api",
        _ => "static",
    }
}

/// Request log tagged with the relay surface.
///
/// Twilio callbacks that are not acknowledged with 2xx get redelivered, so
/// those are always logged at `warn`.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let surface = surface(request.uri().path());
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match (surface, response.status()) {
        ("twilio", s) if !s.is_success() => {
            warn!(surface, %method, path = %path, status, elapsed_ms, "Twilio callback not acknowledged")
        }
        (_, s) if s.is_server_error() => {
            warn!(surface, %method, path = %path, status, elapsed_ms, "Request failed")
        }
        (_, s) if s.is_client_error() => {
            info!(surface, %method, path = %path, status, elapsed_ms, "Request rejected")
        }
        _ => debug!(surface, %method, path = %path, status, elapsed_ms, "Request handled"),
    }

    response
}
