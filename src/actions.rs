// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Form actions: the same pipelines driven by form-encoded field sets.
//!
//! Instead of a status code, callers get a tagged [`ActionResult`]. The
//! `submit_action` function is the in-process entry point; the axum handlers
//! expose it at `/actions/*` and always answer 200.

use crate::handlers::{
    AppState, SubmissionResponse, INTERNAL_ERROR_MESSAGE, RATE_LIMITED_MESSAGE,
    VALIDATION_FAILED_MESSAGE,
};
use crate::limiter::client_identity;
use crate::pipeline::{Pipeline, PipelineOutcome, SubmissionSchema};
use crate::validator::{FieldError, RawInput};
use axum::{extract::State, http::HeaderMap, Form, Json};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::sync::Arc;

/// Tagged result of a form action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionResult {
    Accepted {
        message: &'static str,
        id: String,
    },
    Rejected {
        message: &'static str,
        errors: Vec<FieldError>,
    },
    RateLimited {
        message: &'static str,
        limit: u32,
        remaining: u32,
        /// Unix epoch milliseconds
        reset: i64,
    },
    InternalFailure {
        message: &'static str,
    },
}

impl ActionResult {
    /// Translate a pipeline outcome for the schema's form.
    pub fn from_outcome<S: SubmissionSchema>(outcome: PipelineOutcome) -> Self {
        match outcome {
            PipelineOutcome::Accepted { id } => Self::Accepted {
                message: S::ACCEPTED_MESSAGE,
                id,
            },
            PipelineOutcome::Rejected { errors } => Self::Rejected {
                message: VALIDATION_FAILED_MESSAGE,
                errors,
            },
            PipelineOutcome::RateLimited {
                limit,
                remaining,
                reset_at,
            } => Self::RateLimited {
                message: RATE_LIMITED_MESSAGE,
                limit,
                remaining,
                reset: reset_at.timestamp_millis(),
            },
            PipelineOutcome::InternalFailure => Self::InternalFailure {
                message: INTERNAL_ERROR_MESSAGE,
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

impl From<&ActionResult> for SubmissionResponse {
    fn from(result: &ActionResult) -> Self {
        match result {
            ActionResult::Accepted { message, id } => Self {
                success: true,
                message: Some(message.to_string()),
                id: Some(id.clone()),
                ..Self::default()
            },
            ActionResult::Rejected { message, errors } => Self {
                errors: Some(errors.clone()),
                ..Self::failure(message)
            },
            ActionResult::RateLimited {
                message,
                limit,
                remaining,
                reset,
            } => Self {
                limit: Some(*limit),
                remaining: Some(*remaining),
                reset: Some(*reset),
                ..Self::failure(message)
            },
            ActionResult::InternalFailure { message } => Self::failure(message),
        }
    }
}

impl Serialize for ActionResult {
    fn serialize<Se: Serializer>(&self, serializer: Se) -> Result<Se::Ok, Se::Error> {
        SubmissionResponse::from(self).serialize(serializer)
    }
}

/// Turn form pairs into a field set for schema `S`.
///
/// The first value of a repeated field wins. An empty value for a field the
/// schema declares optional counts as omitted.
pub fn form_input<S: SubmissionSchema>(fields: Vec<(String, String)>) -> RawInput {
    let mut raw = RawInput::new();
    for (name, value) in fields {
        if raw.contains_key(&name) {
            continue;
        }
        if value.is_empty() && S::OPTIONAL_FIELDS.contains(&name.as_str()) {
            continue;
        }
        raw.insert(name, Value::String(value));
    }
    raw
}

/// Run a form submission through `pipeline`.
pub async fn submit_action<S: SubmissionSchema>(
    pipeline: &Pipeline<S>,
    headers: &HeaderMap,
    fields: Vec<(String, String)>,
) -> ActionResult {
    let raw = form_input::<S>(fields);
    let identity = client_identity(headers);
    ActionResult::from_outcome::<S>(pipeline.submit(&identity, &raw).await)
}

/// `POST /actions/contact`
pub async fn contact_action(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(fields): Form<Vec<(String, String)>>,
) -> Json<ActionResult> {
    Json(submit_action(&state.contact, &headers, fields).await)
}

/// `POST /actions/careers`
pub async fn careers_action(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(fields): Form<Vec<(String, String)>>,
) -> Json<ActionResult> {
    Json(submit_action(&state.careers, &headers, fields).await)
}

/// `POST /actions/report`
pub async fn report_action(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(fields): Form<Vec<(String, String)>>,
) -> Json<ActionResult> {
    Json(submit_action(&state.report, &headers, fields).await)
}
