// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the lead-capture service.
//!
//! Each JSON route is a thin wrapper: derive the caller identity, hand the
//! body to the kind's pipeline and map the outcome to a status code.

use crate::actions;
use crate::config::Config;
use crate::limiter::{client_identity, RateGates};
use crate::metrics::{self, SubmissionMetrics};
use crate::pipeline::{Collaborators, Pipeline, PipelineOutcome, SubmissionSchema};
use crate::submission::{CareerApplication, ContactSubmission, ReportDownloadRequest};
use crate::validator::{FieldError, RawInput};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use prometheus::Registry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

pub const RATE_LIMITED_MESSAGE: &str = "Too many requests. Please try again later.";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";
pub const VALIDATION_FAILED_MESSAGE: &str = "Validation failed";

/// Shared application state.
pub struct AppState {
    pub contact: Pipeline<ContactSubmission>,
    pub careers: Pipeline<CareerApplication>,
    pub report: Pipeline<ReportDownloadRequest>,
    pub registry: Registry,
    pub config: Config,
}

impl AppState {
    /// Wire one pipeline per kind around shared collaborators.
    pub fn new(
        config: Config,
        collaborators: Collaborators,
        gates: RateGates,
    ) -> prometheus::Result<Self> {
        let registry = Registry::new();
        let metrics = SubmissionMetrics::register(&registry)?;
        let timeout = config.pipeline.step_timeout();

        Ok(Self {
            contact: Pipeline::new(collaborators.clone(), gates.contact)
                .with_step_timeout(timeout)
                .with_metrics(metrics.clone()),
            careers: Pipeline::new(collaborators.clone(), gates.careers)
                .with_step_timeout(timeout)
                .with_metrics(metrics.clone()),
            report: Pipeline::new(collaborators, gates.report)
                .with_step_timeout(timeout)
                .with_metrics(metrics),
            registry,
            config,
        })
    }
}

/// Response body shared by JSON routes and form actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
    /// Window reset as Unix epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset: Option<i64>,
}

impl SubmissionResponse {
    pub(crate) fn failure(message: &str) -> Self {
        Self {
            success: false,
            message: Some(message.to_string()),
            ..Self::default()
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "lead-capture",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Prometheus scrape endpoint.
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match metrics::render(&state.registry) {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "Failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `POST /api/contact`
pub async fn submit_contact(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    submit_json(&state.contact, &headers, &body).await
}

/// `POST /api/careers`
pub async fn submit_careers(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    submit_json(&state.careers, &headers, &body).await
}

/// `POST /api/report`
pub async fn submit_report(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    submit_json(&state.report, &headers, &body).await
}

async fn submit_json<S: SubmissionSchema>(
    pipeline: &Pipeline<S>,
    headers: &HeaderMap,
    body: &[u8],
) -> Response {
    let raw = json_input(body);
    let identity = client_identity(headers);
    outcome_response::<S>(pipeline.submit(&identity, &raw).await)
}

/// Parse a request body as a field set.
///
/// Anything other than a JSON object becomes an empty field set, so the
/// caller sees every required field reported as missing.
pub fn json_input(body: &[u8]) -> RawInput {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            debug!(body_type = ?other, "Request body is not a JSON object");
            RawInput::new()
        }
        Err(err) => {
            debug!(error = %err, "Request body is not valid JSON");
            RawInput::new()
        }
    }
}

/// Map a pipeline outcome to its HTTP response.
pub fn outcome_response<S: SubmissionSchema>(outcome: PipelineOutcome) -> Response {
    match outcome {
        PipelineOutcome::Accepted { id } => (
            StatusCode::CREATED,
            Json(SubmissionResponse {
                success: true,
                message: Some(S::ACCEPTED_MESSAGE.to_string()),
                id: Some(id),
                ..Default::default()
            }),
        )
            .into_response(),
        PipelineOutcome::Rejected { errors } => (
            StatusCode::BAD_REQUEST,
            Json(SubmissionResponse {
                errors: Some(errors),
                ..Default::default()
            }),
        )
            .into_response(),
        PipelineOutcome::RateLimited {
            limit,
            remaining,
            reset_at,
        } => {
            let reset = reset_at.timestamp_millis();
            let retry_after = (reset_at - Utc::now()).num_seconds().max(0);
            (
                StatusCode::TOO_MANY_REQUESTS,
                [
                    ("Retry-After", retry_after.to_string()),
                    ("X-RateLimit-Limit", limit.to_string()),
                    ("X-RateLimit-Remaining", remaining.to_string()),
                    ("X-RateLimit-Reset", reset.to_string()),
                ],
                Json(SubmissionResponse {
                    limit: Some(limit),
                    remaining: Some(remaining),
                    reset: Some(reset),
                    ..SubmissionResponse::failure(RATE_LIMITED_MESSAGE)
                }),
            )
                .into_response()
        }
        PipelineOutcome::InternalFailure => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(SubmissionResponse::failure(INTERNAL_ERROR_MESSAGE)),
        )
            .into_response(),
    }
}

/// CORS origin policy; a `*` entry allows any origin.
fn allow_origin(configured: &[String]) -> AllowOrigin {
    if configured.iter().any(|o| o.trim() == "*") {
        return AllowOrigin::any();
    }
    let origins: Vec<HeaderValue> = configured
        .iter()
        .filter_map(|o| o.trim().parse().ok())
        .collect();
    AllowOrigin::list(origins)
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allow_origin(&state.config.allowed_origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let mut app = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/api/contact", post(submit_contact))
        .route("/api/careers", post(submit_careers))
        .route("/api/report", post(submit_report))
        .route("/actions/contact", post(actions::contact_action))
        .route("/actions/careers", post(actions::careers_action))
        .route("/actions/report", post(actions::report_action));

    if state.config.metrics.enabled {
        app = app.route(&state.config.metrics.path, get(metrics_handler));
    }

    app.layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
