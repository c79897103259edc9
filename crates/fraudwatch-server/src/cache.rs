//! Response cache
//!
//! Wraps GET-only read paths. The key is the configured prefix plus the
//! request path plus the canonicalized (sorted) query string; hits return
//! the stored body without invoking the handler, misses store successful
//! JSON responses asynchronously with the configured TTL. Mutation handlers
//! invalidate by key pattern after a successful write. A failing cache
//! backend degrades to pass-through; it never fails or delays a request.

use crate::api::types::AppState;
use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Cache backend error
#[derive(Error, Debug)]
#[error("cache backend error: {0}")]
pub struct CacheError(pub String);

pub type CacheResult<T> = Result<T, CacheError>;

/// Key-value backend shared by the response cache and the rate limiter
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch a value, `None` on miss or expiry
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Store a value with a TTL
    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()>;

    /// Remove every key starting with the prefix, returning the count
    async fn delete_prefix(&self, prefix: &str) -> CacheResult<u64>;

    /// Increment a fixed-window counter, returning the new count
    async fn incr_window(&self, key: &str, window: Duration) -> CacheResult<u64>;
}

struct CacheEntry {
    value: String,
    cached_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_valid(&self) -> bool {
        self.cached_at.elapsed() < self.ttl
    }
}

/// In-memory cache backend
#[derive(Clone, Default)]
pub struct MemoryCacheStore {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    counters: Arc<RwLock<HashMap<String, (u64, Instant)>>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (non-expired) entries
    pub async fn len(&self) -> usize {
        self.entries
            .read()
            .await
            .values()
            .filter(|e| e.is_valid())
            .count()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|e| e.is_valid())
            .map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
        self.entries.write().await.insert(
            key.to_string(),
            CacheEntry {
                value,
                cached_at: Instant::now(),
                ttl,
            },
        );
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> CacheResult<u64> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok((before - entries.len()) as u64)
    }

    async fn incr_window(&self, key: &str, window: Duration) -> CacheResult<u64> {
        let mut counters = self.counters.write().await;
        let now = Instant::now();
        let entry = counters.entry(key.to_string()).or_insert((0, now));
        if now.duration_since(entry.1) >= window {
            *entry = (0, now);
        }
        entry.0 += 1;
        Ok(entry.0)
    }
}

/// Response cache over a [`CacheStore`]
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    enabled: bool,
    prefix: String,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn CacheStore>, enabled: bool, prefix: String, ttl: Duration) -> Self {
        Self {
            store,
            enabled,
            prefix,
            ttl,
        }
    }

    /// Disabled cache for wiring without the optimization
    pub fn disabled() -> Self {
        Self::new(
            Arc::new(MemoryCacheStore::new()),
            false,
            String::new(),
            Duration::from_secs(0),
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Build the cache key for a request path and raw query string
    pub fn key(&self, path: &str, query: Option<&str>) -> String {
        let mut key = format!("{}:{}", self.prefix, path);
        if let Some(query) = query {
            if !query.is_empty() {
                let mut pairs: Vec<&str> = query.split('&').filter(|p| !p.is_empty()).collect();
                pairs.sort_unstable();
                key.push(':');
                key.push_str(&pairs.join("&"));
            }
        }
        key
    }

    /// Look up a cached body; backend failures degrade to a miss
    pub async fn lookup(&self, key: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }
        match self.store.get(key).await {
            Ok(hit) => hit,
            Err(e) => {
                debug!(error = %e, "cache lookup failed, passing through");
                None
            }
        }
    }

    /// Store a response body without blocking the caller
    pub fn store_async(&self, key: String, body: String) {
        if !self.enabled {
            return;
        }
        let store = self.store.clone();
        let ttl = self.ttl;
        tokio::spawn(async move {
            if let Err(e) = store.set(&key, body, ttl).await {
                warn!(error = %e, "failed to cache response");
            }
        });
    }

    /// Invalidate every entry for a resource family (by path prefix)
    pub async fn invalidate(&self, path_prefix: &str) {
        if !self.enabled {
            return;
        }
        let prefix = format!("{}:{}", self.prefix, path_prefix);
        match self.store.delete_prefix(&prefix).await {
            Ok(removed) if removed > 0 => {
                debug!(prefix = %prefix, removed, "invalidated cache entries")
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, prefix = %prefix, "cache invalidation failed"),
        }
    }

    /// Shared backend for the rate limiter
    pub fn store(&self) -> Arc<dyn CacheStore> {
        self.store.clone()
    }
}

/// Axum middleware caching successful GET responses under `/api/`
pub async fn response_cache_layer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    if req.method() != Method::GET || !req.uri().path().starts_with("/api/") {
        return next.run(req).await;
    }
    let cache = state.cache.clone();
    if !cache.is_enabled() {
        return next.run(req).await;
    }

    let key = cache.key(req.uri().path(), req.uri().query());

    if let Some(body) = cache.lookup(&key).await {
        return Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response());
    }

    let response = next.run(req).await;
    if !response.status().is_success() {
        return response;
    }

    // Buffer the body so it can be cached and replayed
    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    if let Ok(text) = std::str::from_utf8(&bytes) {
        cache.store_async(key, text.to_string());
    }

    Response::from_parts(parts, Body::from(bytes))
}
