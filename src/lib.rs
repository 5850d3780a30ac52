// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Lead Capture
//!
//! This crate handles the lead-capture forms of a marketing site (contact,
//! careers, report download). Every submission runs through one pipeline:
//!
//! - Per-caller sliding-window rate limit (skipped when disabled)
//! - Field validation collecting every violation
//! - Persistence of the typed record
//! - Confirmation email to the submitter
//!
//! Each form is exposed both as a JSON route and as a form action.

pub mod actions;
pub mod config;
pub mod error;
pub mod handlers;
pub mod limiter;
pub mod metrics;
pub mod notify;
pub mod pipeline;
pub mod store;
pub mod submission;
pub mod validator;

pub use config::Config;
pub use limiter::{RateGate, RateLimitDecision, RateLimiter};
pub use pipeline::{Pipeline, PipelineOutcome, SubmissionSchema};
pub use validator::{FieldError, RawInput};
