// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! The submission pipeline: rate check, validate, persist, notify, respond.
//!
//! One generic [`Pipeline`] serves every submission kind; the kind-specific
//! parts (field schema, stored record, confirmation email) come from its
//! [`SubmissionSchema`] parameter. Steps run strictly in sequence and nothing
//! is retried. A persisted record is kept even when its confirmation email
//! fails, but the caller still sees an internal failure.

use crate::error::{PipelineError, Result};
use crate::limiter::{Admission, RateGate};
use crate::metrics::SubmissionMetrics;
use crate::notify::{EmailTemplates, Mailer, OutgoingEmail};
use crate::store::{StoredRecord, SubmissionStore};
use crate::submission::{Submission, SubmissionKind};
use crate::validator::{FieldError, RawInput};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Kind-specific behaviour plugged into the generic pipeline.
pub trait SubmissionSchema: Sized + Send + Sync + 'static {
    /// Which form this schema belongs to
    const KIND: SubmissionKind;

    /// Message returned alongside an accepted submission
    const ACCEPTED_MESSAGE: &'static str;

    /// Fields that may be omitted
    const OPTIONAL_FIELDS: &'static [&'static str] = &[];

    /// Validate raw input into a typed record, or report every violation.
    fn validate(raw: &RawInput) -> std::result::Result<Self, Vec<FieldError>>;

    /// The record as handed to the store.
    fn to_submission(&self) -> Submission;

    /// The confirmation email for this record.
    fn confirmation(&self, stored: &StoredRecord, templates: &EmailTemplates) -> OutgoingEmail;
}

/// Terminal outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Record persisted and confirmation email sent
    Accepted { id: String },
    /// One or more field violations
    Rejected { errors: Vec<FieldError> },
    /// Caller is over quota
    RateLimited {
        limit: u32,
        remaining: u32,
        reset_at: DateTime<Utc>,
    },
    /// Some collaborator failed; details are only logged
    InternalFailure,
}

impl PipelineOutcome {
    /// Stable label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Accepted { .. } => "accepted",
            Self::Rejected { .. } => "rejected",
            Self::RateLimited { .. } => "rate_limited",
            Self::InternalFailure => "internal_failure",
        }
    }
}

/// Collaborators shared by every pipeline instance.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn SubmissionStore>,
    pub mailer: Arc<dyn Mailer>,
    pub templates: Arc<EmailTemplates>,
}

/// Submission pipeline for one kind.
pub struct Pipeline<S> {
    gate: RateGate,
    collaborators: Collaborators,
    step_timeout: Option<Duration>,
    metrics: Option<SubmissionMetrics>,
    _schema: PhantomData<fn() -> S>,
}

impl<S: SubmissionSchema> Pipeline<S> {
    pub fn new(collaborators: Collaborators, gate: RateGate) -> Self {
        Self {
            gate,
            collaborators,
            step_timeout: None,
            metrics: None,
            _schema: PhantomData,
        }
    }

    /// Bound each network step; a timeout counts as that step failing.
    pub fn with_step_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.step_timeout = timeout;
        self
    }

    pub fn with_metrics(mut self, metrics: SubmissionMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Run the pipeline for one submission from `identity`.
    pub async fn submit(&self, identity: &str, raw: &RawInput) -> PipelineOutcome {
        let outcome = match self.run(identity, raw).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(
                    kind = %S::KIND,
                    step = err.step(),
                    error = %err,
                    "Submission failed"
                );
                PipelineOutcome::InternalFailure
            }
        };

        if let Some(metrics) = &self.metrics {
            metrics.observe(S::KIND, &outcome);
        }
        outcome
    }

    async fn run(&self, identity: &str, raw: &RawInput) -> Result<PipelineOutcome> {
        match bounded("rate_check", self.step_timeout, self.gate.admit(identity)).await? {
            Admission::Denied(decision) => {
                warn!(
                    kind = %S::KIND,
                    ip = %identity,
                    limit = decision.limit,
                    remaining = decision.remaining,
                    reset = %decision.reset_at,
                    "Rate limit exceeded"
                );
                return Ok(PipelineOutcome::RateLimited {
                    limit: decision.limit,
                    remaining: decision.remaining,
                    reset_at: decision.reset_at,
                });
            }
            Admission::Allowed(decision) => {
                debug!(kind = %S::KIND, ip = %identity, remaining = decision.remaining, "Rate check passed");
            }
            Admission::Unchecked => {}
        }

        let record = match S::validate(raw) {
            Ok(record) => record,
            Err(errors) => {
                debug!(kind = %S::KIND, errors = ?errors, "Submission rejected");
                return Ok(PipelineOutcome::Rejected { errors });
            }
        };

        let submission = record.to_submission();
        let stored = bounded(
            "persist",
            self.step_timeout,
            self.collaborators.store.create(&submission),
        )
        .await?;

        let email = record.confirmation(&stored, &self.collaborators.templates);
        if let Err(err) = bounded(
            "notify",
            self.step_timeout,
            self.collaborators.mailer.send(&email),
        )
        .await
        {
            warn!(kind = %S::KIND, id = %stored.id, "Record persisted without confirmation email");
            return Err(err);
        }

        info!(
            kind = %S::KIND,
            id = %stored.id,
            email = %submission.email(),
            "Submission accepted"
        );
        Ok(PipelineOutcome::Accepted { id: stored.id })
    }
}

/// Await `fut`, converting its error and an elapsed `limit` into a
/// [`PipelineError`].
async fn bounded<T, E, F>(step: &'static str, limit: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, E>>,
    E: Into<PipelineError>,
{
    match limit {
        Some(after) => tokio::time::timeout(after, fut)
            .await
            .map_err(|_| PipelineError::Timeout { step, after })?
            .map_err(Into::into),
        None => fut.await.map_err(Into::into),
    }
}
