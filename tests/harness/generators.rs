// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Submission payload generators.

use lead_capture::validator::RawInput;
use serde_json::{json, Value};

/// Turn a JSON object literal into a field set.
pub fn raw(value: Value) -> RawInput {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

pub fn contact() -> RawInput {
    raw(json!({
        "name": "Ada Lovelace",
        "email": "ada@example.com",
        "message": "I would like to know more about your services.",
    }))
}

pub fn career() -> RawInput {
    raw(json!({
        "name": "Grace Hopper",
        "email": "grace@example.com",
        "position": "Compiler Engineer",
        "message": "Please find my portfolio attached.",
    }))
}

pub fn report() -> RawInput {
    raw(json!({ "email": "reader@example.com" }))
}

/// Addresses the email rule accepts.
pub fn valid_emails() -> Vec<&'static str> {
    vec![
        "a@b.co",
        "first.last@example.com",
        "user+tag@sub.example.org",
        "x_y-z@domain-name.io",
        "O'Brien@example.ie",
    ]
}

/// Addresses the email rule rejects.
pub fn invalid_emails() -> Vec<&'static str> {
    vec![
        "",
        "plainaddress",
        "@example.com",
        "user@",
        "user@example",
        "user@@example.com",
        ".user@example.com",
        "user.@example.com",
        "us..er@example.com",
        "user@example.c",
        "user name@example.com",
        " ada@example.com",
    ]
}
