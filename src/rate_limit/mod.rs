//! Fixed-window rate limiting keyed by client address.
//!
//! Windows are tracked per key in process memory, so limits apply per
//! instance rather than across a fleet.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dashmap::DashMap;

use crate::api::handlers::ErrorResponse;
use crate::config::RateLimitConfig;

#[derive(Debug, Clone)]
struct Bucket {
    count: u64,
    window_start: Instant,
}

pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: DashMap<String, Bucket>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: DashMap::new(),
        }
    }

    /// Count one request against `key`. Returns false once the key has used
    /// up its allowance for the current window.
    pub fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut bucket = self.buckets.entry(key.to_string()).or_insert(Bucket {
            count: 0,
            window_start: now,
        });

        if now.duration_since(bucket.window_start).as_secs() >= self.config.window_secs {
            bucket.count = 0;
            bucket.window_start = now;
        }

        if bucket.count >= self.config.max_requests {
            false
        } else {
            bucket.count += 1;
            true
        }
    }

    /// Drop buckets whose window has lapsed so idle clients do not
    /// accumulate forever. Meant to run from a periodic task.
    pub fn purge_expired(&self) {
        let window = Duration::from_secs(self.config.window_secs);
        let now = Instant::now();
        self.buckets
            .retain(|_, bucket| now.duration_since(bucket.window_start) < window);
    }

    #[cfg(test)]
    fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

/// Enforce the per-client allowance before the request reaches a handler.
///
/// The key is the first hop of `X-Forwarded-For` when present, then
/// `X-Real-Ip`, then a shared `"unknown"` bucket for direct connections
/// carrying neither.
pub async fn rate_limit_middleware(
    limiter: Arc<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(&request);

    if !limiter.check(&key) {
        tracing::warn!("Rate limit exceeded for {key}");
        let body = ErrorResponse {
            error: "Rate limit exceeded, try again later".to_string(),
        };
        return (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    }

    next.run(request).await
}

fn client_key(request: &Request) -> String {
    let headers = request.headers();

    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
