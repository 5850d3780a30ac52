// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Recording stand-ins for the store, mailer and rate limiter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lead_capture::{
    error::{LimiterError, NotifyError, StoreError},
    limiter::{RateLimitDecision, RateLimiter},
    notify::{Mailer, OutgoingEmail},
    store::{StoredRecord, SubmissionStore},
    submission::Submission,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Store that keeps every submission it was asked to create.
#[derive(Default)]
pub struct RecordingStore {
    created: Mutex<Vec<Submission>>,
    fail: bool,
    delay: Option<Duration>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every write fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// A store that takes `delay` before answering.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn created(&self) -> Vec<Submission> {
        self.created.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.created.lock().unwrap().len()
    }
}

#[async_trait]
impl SubmissionStore for RecordingStore {
    async fn create(&self, submission: &Submission) -> Result<StoredRecord, StoreError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(StoreError::Backend("database unavailable".to_string()));
        }
        let mut created = self.created.lock().unwrap();
        created.push(submission.clone());
        Ok(StoredRecord {
            id: format!("rec-{}", created.len()),
            created_at: Utc::now(),
        })
    }
}

/// Mailer that records every message instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    attempts: AtomicUsize,
    fail: bool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose provider rejects every message.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// Delivery attempts, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotifyError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(NotifyError::Rejected {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// Limiter that returns a fixed decision and counts lookups per key.
pub struct FixedLimiter {
    decision: Option<RateLimitDecision>,
    keys: Mutex<Vec<String>>,
}

impl FixedLimiter {
    pub fn allowing(limit: u32, remaining: u32) -> Self {
        Self::deciding(true, limit, remaining, Utc::now() + chrono::Duration::hours(1))
    }

    pub fn denying(limit: u32, reset_at: DateTime<Utc>) -> Self {
        Self::deciding(false, limit, 0, reset_at)
    }

    fn deciding(allowed: bool, limit: u32, remaining: u32, reset_at: DateTime<Utc>) -> Self {
        Self {
            decision: Some(RateLimitDecision {
                allowed,
                limit,
                remaining,
                reset_at,
            }),
            keys: Mutex::new(Vec::new()),
        }
    }

    /// A limiter whose backend is unreachable.
    pub fn broken() -> Self {
        Self {
            decision: None,
            keys: Mutex::new(Vec::new()),
        }
    }

    /// Keys checked so far, in order.
    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }
}

#[async_trait]
impl RateLimiter for FixedLimiter {
    async fn check(&self, key: &str) -> Result<RateLimitDecision, LimiterError> {
        self.keys.lock().unwrap().push(key.to_string());
        self.decision
            .ok_or_else(|| LimiterError::Backend("counter store unreachable".to_string()))
    }
}
