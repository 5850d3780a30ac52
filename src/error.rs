// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types for the collaborators behind the submission pipeline.
//!
//! None of these ever reach a caller: the pipeline logs them and reports an
//! opaque internal failure instead.

use std::time::Duration;
use thiserror::Error;

/// Persistence failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Record serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Email delivery failure.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Email transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Email provider rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Rate limiter backend failure.
#[derive(Debug, Error)]
pub enum LimiterError {
    #[error("Rate limiter backend error: {0}")]
    Backend(String),
}

/// A failed pipeline step.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    RateLimiter(#[from] LimiterError),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error(transparent)]
    Notification(#[from] NotifyError),

    #[error("{step} step timed out after {after:?}")]
    Timeout { step: &'static str, after: Duration },
}

impl PipelineError {
    /// Name of the step that failed, for logs and metrics.
    pub fn step(&self) -> &'static str {
        match self {
            Self::RateLimiter(_) => "rate_check",
            Self::Storage(_) => "persist",
            Self::Notification(_) => "notify",
            Self::Timeout { step, .. } => step,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, PipelineError>;
