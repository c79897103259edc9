//! Fixed-window rate limiter
//!
//! Shares the cache key-value store. Counter reads are best-effort: a
//! failing store disables the limiter for the request (fail open) rather
//! than degrading availability.

use crate::api::types::{actor_from_headers, AppState};
use crate::cache::CacheStore;
use crate::error::ApiError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Fixed-window request counter
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CacheStore>,
    max_requests: u64,
    window: Duration,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CacheStore>, max_requests: u64, window: Duration) -> Self {
        Self {
            store,
            max_requests,
            window,
        }
    }

    /// Returns false when the caller has exhausted the window
    pub async fn check(&self, caller: &str) -> bool {
        let key = format!("ratelimit:{}", caller);
        match self.store.incr_window(&key, self.window).await {
            Ok(count) => count <= self.max_requests,
            Err(e) => {
                // Store down: the optimization is silently disabled
                debug!(error = %e, "rate limit store unavailable, failing open");
                true
            }
        }
    }
}

/// Axum middleware enforcing the limiter when configured
pub async fn rate_limit_layer(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let limiter = match &state.limiter {
        Some(limiter) => limiter.clone(),
        None => return next.run(req).await,
    };

    let caller = actor_from_headers(req.headers());
    if !limiter.check(&caller).await {
        return ApiError::RateLimited("Too many requests, retry later".to_string())
            .into_response();
    }

    next.run(req).await
}
