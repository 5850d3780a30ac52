// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Sliding-window rate limiting for form submissions.
//!
//! Each submission kind gets its own [`SlidingWindowLimiter`] with its own
//! quota and counters, keyed on the caller identity derived from forwarding
//! headers. The pipeline only sees the [`RateLimiter`] trait, wrapped in a
//! [`RateGate`] that admits everything when no limiter is configured.

use crate::config::RateLimitConfig;
use crate::error::LimiterError;
use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Identity used when no forwarding header is present.
pub const UNKNOWN_CALLER: &str = "unknown";

/// Outcome of a single rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    /// Whether the caller may proceed
    pub allowed: bool,
    /// Quota for the window
    pub limit: u32,
    /// Requests left in the window
    pub remaining: u32,
    /// When the current window ends
    pub reset_at: DateTime<Utc>,
}

/// Per-caller admission check backed by some counter store.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Count one request for `key` and decide whether it may proceed.
    async fn check(&self, key: &str) -> Result<RateLimitDecision, LimiterError>;
}

/// Result of passing through a [`RateGate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// No limiter configured
    Unchecked,
    /// Limiter consulted and allowed the request
    Allowed(RateLimitDecision),
    /// Limiter consulted and denied the request
    Denied(RateLimitDecision),
}

/// The "maybe rate-limited" step: a no-op when the limiter is absent.
#[derive(Clone, Default)]
pub struct RateGate {
    limiter: Option<Arc<dyn RateLimiter>>,
}

impl RateGate {
    pub fn new(limiter: Option<Arc<dyn RateLimiter>>) -> Self {
        Self { limiter }
    }

    /// A gate that admits every caller.
    pub fn disabled() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn is_enabled(&self) -> bool {
        self.limiter.is_some()
    }

    /// Consult the limiter, if any, for `identity`.
    pub async fn admit(&self, identity: &str) -> Result<Admission, LimiterError> {
        let Some(limiter) = &self.limiter else {
            return Ok(Admission::Unchecked);
        };
        let decision = limiter.check(identity).await?;
        Ok(if decision.allowed {
            Admission::Allowed(decision)
        } else {
            Admission::Denied(decision)
        })
    }
}

/// One gate per submission kind.
#[derive(Clone, Default)]
pub struct RateGates {
    pub contact: RateGate,
    pub careers: RateGate,
    pub report: RateGate,
}

impl RateGates {
    /// Gates that admit everything.
    pub fn disabled() -> Self {
        Self::default()
    }
}

/// The in-process limiters behind [`RateGates`], kept for periodic cleanup.
#[derive(Clone)]
pub struct KindLimiters {
    pub contact: Arc<SlidingWindowLimiter>,
    pub careers: Arc<SlidingWindowLimiter>,
    pub report: Arc<SlidingWindowLimiter>,
}

impl KindLimiters {
    /// Build independent limiters from config, or `None` when disabled.
    pub fn from_config(config: &RateLimitConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let window = config.window_duration();
        Some(Self {
            contact: Arc::new(SlidingWindowLimiter::new(
                "ratelimit:contact",
                config.contact_per_window,
                window,
            )),
            careers: Arc::new(SlidingWindowLimiter::new(
                "ratelimit:careers",
                config.careers_per_window,
                window,
            )),
            report: Arc::new(SlidingWindowLimiter::new(
                "ratelimit:report",
                config.report_per_window,
                window,
            )),
        })
    }

    pub fn gates(&self) -> RateGates {
        let gate = |limiter: &Arc<SlidingWindowLimiter>| {
            RateGate::new(Some(limiter.clone() as Arc<dyn RateLimiter>))
        };
        RateGates {
            contact: gate(&self.contact),
            careers: gate(&self.careers),
            report: gate(&self.report),
        }
    }

    pub async fn cleanup(&self) {
        self.contact.cleanup().await;
        self.careers.cleanup().await;
        self.report.cleanup().await;
    }
}

/// Derive the caller identity from forwarding headers.
///
/// First entry of `x-forwarded-for`, else `x-real-ip`, else
/// [`UNKNOWN_CALLER`].
pub fn client_identity(headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
    };

    if let Some(forwarded) = header("x-forwarded-for") {
        let first = forwarded.split(',').next().unwrap_or(forwarded).trim();
        if !first.is_empty() {
            return first.to_string();
        }
    }

    if let Some(real_ip) = header("x-real-ip") {
        return real_ip.to_string();
    }

    UNKNOWN_CALLER.to_string()
}

/// Counters for one caller across the current and previous windows.
#[derive(Debug)]
struct WindowCounter {
    /// Index of the current window (epoch millis / window millis)
    window: i64,
    /// Requests counted in the current window
    current: u32,
    /// Requests counted in the previous window
    previous: u32,
}

impl WindowCounter {
    /// Roll the counter forward so that `window` is current.
    fn advance(&mut self, window: i64) {
        if window == self.window {
            return;
        }
        self.previous = if window == self.window + 1 {
            self.current
        } else {
            0
        };
        self.current = 0;
        self.window = window;
    }

    /// Approximate count over the trailing window ending at `offset_ms`
    /// into the current window.
    fn weighted(&self, offset_ms: i64, window_ms: i64) -> f64 {
        let unelapsed = 1.0 - offset_ms as f64 / window_ms as f64;
        self.previous as f64 * unelapsed + self.current as f64
    }
}

/// In-process sliding-window counter.
///
/// Approximates a true sliding log by weighting the previous fixed window by
/// the fraction of it still inside the trailing window. Denied requests are
/// not counted.
pub struct SlidingWindowLimiter {
    /// Label for logs (one limiter per submission kind)
    prefix: String,
    /// Requests allowed per window
    limit: u32,
    /// Window length in milliseconds
    window_ms: i64,
    /// Per-caller counters
    counters: Arc<RwLock<HashMap<String, WindowCounter>>>,
}

impl SlidingWindowLimiter {
    /// Create a limiter allowing `limit` requests per `window`.
    pub fn new(prefix: impl Into<String>, limit: u32, window: Duration) -> Self {
        Self {
            prefix: prefix.into(),
            limit,
            window_ms: (window.as_millis() as i64).max(1),
            counters: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    #[cfg(test)]
    fn limit(&self) -> u32 {
        self.limit
    }

    /// Check `key` as of `now`.
    pub async fn check_at(&self, key: &str, now: DateTime<Utc>) -> RateLimitDecision {
        let now_ms = now.timestamp_millis();
        let window = now_ms.div_euclid(self.window_ms);
        let offset = now_ms.rem_euclid(self.window_ms);
        let reset_at = Utc
            .timestamp_millis_opt((window + 1) * self.window_ms)
            .single()
            .unwrap_or(now);

        let mut counters = self.counters.write().await;
        let counter = counters.entry(key.to_string()).or_insert(WindowCounter {
            window,
            current: 0,
            previous: 0,
        });
        counter.advance(window);

        let used = counter.weighted(offset, self.window_ms);
        if used + 1.0 > self.limit as f64 {
            debug!(prefix = %self.prefix, key, used, limit = self.limit, "Sliding window exhausted");
            return RateLimitDecision {
                allowed: false,
                limit: self.limit,
                remaining: 0,
                reset_at,
            };
        }

        counter.current += 1;
        let remaining = (self.limit as f64 - used - 1.0).floor().max(0.0) as u32;
        RateLimitDecision {
            allowed: true,
            limit: self.limit,
            remaining,
            reset_at,
        }
    }

    /// Drop counters that no longer influence any decision.
    pub async fn cleanup(&self) {
        self.cleanup_at(Utc::now()).await;
    }

    async fn cleanup_at(&self, now: DateTime<Utc>) {
        let window = now.timestamp_millis().div_euclid(self.window_ms);
        let mut counters = self.counters.write().await;
        let before = counters.len();
        counters.retain(|_, counter| counter.window + 1 >= window);
        debug!(prefix = %self.prefix, dropped = before - counters.len(), "Rate limiter cleanup");
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.counters.read().await.len()
    }
}

#[async_trait]
impl RateLimiter for SlidingWindowLimiter {
    async fn check(&self, key: &str) -> Result<RateLimitDecision, LimiterError> {
        Ok(self.check_at(key, Utc::now()).await)
    }
}
