//! Per-route request budgets taken from Discord's rate-limit headers.
//!
//! Every response carries `X-RateLimit-Remaining` and
//! `X-RateLimit-Reset-After` for the route it answered. Once a route's budget
//! is spent, the next request on it waits for the reset instead of running
//! into a 429.

use std::time::{Duration, Instant};

use {dashmap::DashMap, reqwest::header::HeaderMap, tracing::debug};

pub(crate) const REMAINING: &str = "x-ratelimit-remaining";
pub(crate) const RESET_AFTER: &str = "x-ratelimit-reset-after";

/// Longest reset window honoured; anything larger is treated as this.
const MAX_RESET_AFTER_SECS: f64 = 60.0;

#[derive(Debug, Clone, Copy)]
struct Bucket {
    remaining: u64,
    reset_at: Instant,
}

/// Budgets keyed by request path. Message routes are per channel, so
/// concurrent channel walks only throttle themselves.
#[derive(Debug, Default)]
pub(crate) struct RateLimiter {
    buckets: DashMap<String, Bucket>,
}

impl RateLimiter {
    /// Wait until `route` has budget left, then reserve one request.
    pub(crate) async fn acquire(&self, route: &str) {
        while let Some(delay) = self.reserve(route, Instant::now()) {
            debug!(route, delay_ms = delay.as_millis() as u64, "route budget spent, waiting for reset");
            tokio::time::sleep(delay).await;
        }
    }

    /// Reserve one request, or return how long to wait for the reset.
    ///
    /// Unknown routes and routes whose window already reset go through
    /// immediately.
    fn reserve(&self, route: &str, now: Instant) -> Option<Duration> {
        let mut bucket = self.buckets.get_mut(route)?;
        if now >= bucket.reset_at {
            return None;
        }
        if bucket.remaining > 0 {
            bucket.remaining -= 1;
            return None;
        }
        Some(bucket.reset_at - now)
    }

    /// Record the budget reported by a response on `route`.
    pub(crate) fn update(&self, route: &str, headers: &HeaderMap, now: Instant) {
        let remaining = header_value(headers, REMAINING).and_then(|v| v.parse::<u64>().ok());
        let reset_after = header_value(headers, RESET_AFTER)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .map(|secs| secs.min(MAX_RESET_AFTER_SECS));

        let (Some(remaining), Some(reset_after)) = (remaining, reset_after) else {
            return;
        };
        self.buckets.insert(route.to_string(), Bucket {
            remaining,
            reset_at: now + Duration::from_secs_f64(reset_after),
        });
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
}
