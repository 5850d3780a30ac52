// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus counters for pipeline outcomes.

use crate::pipeline::PipelineOutcome;
use crate::submission::SubmissionKind;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Submission outcome counter, labelled by kind and outcome.
#[derive(Clone)]
pub struct SubmissionMetrics {
    submissions: IntCounterVec,
}

impl SubmissionMetrics {
    /// Create the counters and register them with `registry`.
    pub fn register(registry: &Registry) -> prometheus::Result<Self> {
        let submissions = IntCounterVec::new(
            Opts::new(
                "lead_capture_submissions_total",
                "Form submissions by kind and pipeline outcome",
            ),
            &["kind", "outcome"],
        )?;
        registry.register(Box::new(submissions.clone()))?;
        Ok(Self { submissions })
    }

    pub fn observe(&self, kind: SubmissionKind, outcome: &PipelineOutcome) {
        self.submissions
            .with_label_values(&[kind.as_str(), outcome.label()])
            .inc();
    }

    #[cfg(test)]
    fn count(&self, kind: SubmissionKind, outcome: &str) -> u64 {
        self.submissions
            .with_label_values(&[kind.as_str(), outcome])
            .get()
    }
}

/// Render every metric in `registry` in the Prometheus text format.
pub fn render(registry: &Registry) -> prometheus::Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
