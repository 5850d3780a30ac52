// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Integration tests driving the HTTP router.

mod harness;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{TimeZone, Utc};
use harness::{
    fakes::{FixedLimiter, RecordingMailer, RecordingStore},
    TestBed,
};
use lead_capture::{
    config::{Config, RateLimitConfig},
    handlers::router,
    limiter::{KindLimiters, RateGate, RateGates, RateLimiter},
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn contact_body() -> Value {
    json!({
        "name": "Ada Lovelace",
        "email": "ada@example.com",
        "message": "I would like to know more about your services.",
    })
}

#[tokio::test]
async fn test_health() {
    let bed = TestBed::new();
    let app = router(bed.app_state(RateGates::disabled()));

    for path in ["/health", "/healthz"] {
        let response = send(&app, Request::get(path).body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "lead-capture");
    }
}

#[tokio::test]
async fn test_contact_created() {
    let bed = TestBed::new();
    let app = router(bed.app_state(RateGates::disabled()));

    let response = send(&app, post_json("/api/contact", contact_body())).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        json_body(response).await,
        json!({
            "success": true,
            "message": "Contact form submitted successfully",
            "id": "rec-1",
        })
    );
    assert_eq!(bed.store.calls(), 1);
    assert_eq!(bed.mailer.sent().len(), 1);
}

#[tokio::test]
async fn test_careers_and_report_messages() {
    let bed = TestBed::new();
    let app = router(bed.app_state(RateGates::disabled()));

    let response = send(
        &app,
        post_json(
            "/api/careers",
            json!({
                "name": "Grace Hopper",
                "email": "grace@example.com",
                "position": "Engineer",
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        json_body(response).await["message"],
        "Application submitted successfully"
    );

    let response = send(
        &app,
        post_json("/api/report", json!({ "email": "reader@example.com" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        json_body(response).await["message"],
        "Report download link sent to your email"
    );
}

#[tokio::test]
async fn test_validation_failure() {
    let bed = TestBed::new();
    let app = router(bed.app_state(RateGates::disabled()));

    let response = send(
        &app,
        post_json("/api/contact", json!({ "name": "A", "email": "ada@example.com" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({
            "success": false,
            "errors": [
                { "field": "name", "message": "Name must be at least 2 characters" },
                { "field": "message", "message": "Required" },
            ],
        })
    );
    assert_eq!(bed.store.calls(), 0);
}

#[tokio::test]
async fn test_non_object_body_is_empty_input() {
    let bed = TestBed::new();
    let app = router(bed.app_state(RateGates::disabled()));

    let response = send(&app, post_json("/api/report", json!(["reader@example.com"]))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["errors"][0]["field"], "email");
    assert_eq!(body["errors"][0]["message"], "Required");
}

#[tokio::test]
async fn test_rate_limited_response() {
    let bed = TestBed::new();
    let reset_at = Utc::now() + chrono::Duration::minutes(30);
    let limiter = Arc::new(FixedLimiter::denying(10, reset_at));
    let gates = RateGates {
        contact: RateGate::new(Some(limiter.clone() as Arc<dyn RateLimiter>)),
        ..RateGates::disabled()
    };
    let app = router(bed.app_state(gates));

    let response = send(&app, post_json("/api/contact", contact_body())).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()["x-ratelimit-limit"], "10");
    assert_eq!(response.headers()["x-ratelimit-remaining"], "0");
    let retry_after: i64 = response.headers()["retry-after"]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1_700..=1_800).contains(&retry_after));

    assert_eq!(
        json_body(response).await,
        json!({
            "success": false,
            "message": "Too many requests. Please try again later.",
            "limit": 10,
            "remaining": 0,
            "reset": reset_at.timestamp_millis(),
        })
    );
    assert_eq!(limiter.keys(), vec!["203.0.113.7".to_string()]);
    assert_eq!(bed.store.calls(), 0);

    // Other kinds have their own gates.
    let response = send(
        &app,
        post_json("/api/report", json!({ "email": "reader@example.com" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_careers_quota_per_caller() {
    let bed = TestBed::new();
    let limiters = KindLimiters::from_config(&RateLimitConfig::default()).unwrap();
    let app = router(bed.app_state(limiters.gates()));

    let application = json!({
        "name": "Grace Hopper",
        "email": "grace@example.com",
        "position": "Engineer",
    });

    for _ in 0..5 {
        let response = send(&app, post_json("/api/careers", application.clone())).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = send(&app, post_json("/api/careers", application.clone())).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json_body(response).await["limit"], 5);

    // The contact quota is counted separately.
    let response = send(&app, post_json("/api/contact", contact_body())).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // So is every other caller.
    let mut request = post_json("/api/careers", application);
    request
        .headers_mut()
        .insert("x-forwarded-for", "198.51.100.4".parse().unwrap());
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_notify_failure_is_internal_error() {
    let bed = TestBed::with(RecordingStore::new(), RecordingMailer::failing());
    let app = router(bed.app_state(RateGates::disabled()));

    let response = send(
        &app,
        post_json("/api/report", json!({ "email": "reader@example.com" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        json!({ "success": false, "message": "Internal server error" })
    );
    assert_eq!(bed.store.calls(), 1);
}

#[tokio::test]
async fn test_contact_action() {
    let bed = TestBed::new();
    let app = router(bed.app_state(RateGates::disabled()));

    let response = send(
        &app,
        post_form(
            "/actions/contact",
            "name=Ada+Lovelace&email=ada%40example.com&message=Tell+me+more+please",
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({
            "success": true,
            "message": "Contact form submitted successfully",
            "id": "rec-1",
        })
    );
}

#[tokio::test]
async fn test_careers_action_empty_message() {
    let bed = TestBed::new();
    let app = router(bed.app_state(RateGates::disabled()));

    let response = send(
        &app,
        post_form(
            "/actions/careers",
            "name=Grace&email=grace%40example.com&position=Engineer&message=",
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["success"], true);
}

#[tokio::test]
async fn test_report_action_rejected() {
    let bed = TestBed::new();
    let app = router(bed.app_state(RateGates::disabled()));

    let response = send(&app, post_form("/actions/report", "email=not-an-email")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({
            "success": false,
            "message": "Validation failed",
            "errors": [{ "field": "email", "message": "Invalid email address" }],
        })
    );
}

#[tokio::test]
async fn test_report_action_rate_limited() {
    let bed = TestBed::new();
    let reset_at = Utc.timestamp_millis_opt(1_700_003_600_000).unwrap();
    let gates = RateGates {
        report: RateGate::new(Some(
            Arc::new(FixedLimiter::denying(20, reset_at)) as Arc<dyn RateLimiter>
        )),
        ..RateGates::disabled()
    };
    let app = router(bed.app_state(gates));

    let response = send(&app, post_form("/actions/report", "email=reader%40example.com")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["limit"], 20);
    assert_eq!(body["reset"], 1_700_003_600_000_i64);
}

#[tokio::test]
async fn test_metrics_count_outcomes() {
    let bed = TestBed::new();
    let app = router(bed.app_state(RateGates::disabled()));

    send(&app, post_json("/api/contact", contact_body())).await;
    send(&app, post_json("/api/contact", json!({}))).await;

    let response = send(&app, Request::get("/metrics").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains(r#"lead_capture_submissions_total{kind="contact",outcome="accepted"} 1"#));
    assert!(text.contains(r#"lead_capture_submissions_total{kind="contact",outcome="rejected"} 1"#));
}

#[tokio::test]
async fn test_metrics_route_can_be_disabled() {
    let bed = TestBed::new();
    let mut config = Config::default();
    config.metrics.enabled = false;
    let app = router(bed.app_state_with(config, RateGates::disabled()));

    let response = send(&app, Request::get("/metrics").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_wildcard_origin() {
    let bed = TestBed::new();
    let mut config = Config::default();
    config.allowed_origins = vec!["*".to_string()];
    let app = router(bed.app_state_with(config, RateGates::disabled()));

    let mut request = post_json("/api/contact", contact_body());
    request
        .headers_mut()
        .insert(header::ORIGIN, "https://partner.example.net".parse().unwrap());
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let bed = TestBed::new();
    let app = router(bed.app_state(RateGates::disabled()));

    let mut request = post_json("/api/contact", contact_body());
    request
        .headers_mut()
        .insert(header::ORIGIN, "http://localhost:3000".parse().unwrap());
    let response = send(&app, request).await;
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
}
