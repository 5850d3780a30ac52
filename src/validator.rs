// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Field validation for raw form submissions.
//!
//! Raw input is an untyped JSON object exactly as the client sent it.
//! Values are checked as submitted: nothing is trimmed, normalized or
//! case-folded, and every violation is collected before returning.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Untyped key-value input as submitted by a client.
pub type RawInput = serde_json::Map<String, Value>;

/// Message for a missing required field.
pub const REQUIRED: &str = "Required";

/// Message for a malformed email address.
pub const INVALID_EMAIL: &str = "Invalid email address";

/// A single field-level violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Name of the offending field
    pub field: String,
    /// Human-readable reason
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Reads typed fields out of a [`RawInput`], accumulating every violation.
///
/// Each accessor returns `None` after recording an error, so callers read all
/// fields first and then call [`FieldReader::finish`].
pub struct FieldReader<'a> {
    raw: &'a RawInput,
    errors: Vec<FieldError>,
}

impl<'a> FieldReader<'a> {
    pub fn new(raw: &'a RawInput) -> Self {
        Self {
            raw,
            errors: Vec::new(),
        }
    }

    /// A required string of at least `min_chars` characters.
    pub fn required(&mut self, field: &str, min_chars: usize, too_short: &str) -> Option<String> {
        let value = self.string(field)?;
        if value.chars().count() < min_chars {
            self.errors.push(FieldError::new(field, too_short));
            return None;
        }
        Some(value)
    }

    /// A required, syntactically valid email address.
    pub fn email(&mut self, field: &str) -> Option<String> {
        let value = self.string(field)?;
        if !is_valid_email(&value) {
            self.errors.push(FieldError::new(field, INVALID_EMAIL));
            return None;
        }
        Some(value)
    }

    /// An optional string of any length.
    ///
    /// Omission yields `Some(None)`. An explicit `null` is a type error, not
    /// an omission.
    pub fn optional(&mut self, field: &str) -> Option<Option<String>> {
        match self.raw.get(field) {
            None => Some(None),
            Some(Value::String(s)) => Some(Some(s.clone())),
            Some(other) => {
                self.type_error(field, other);
                None
            }
        }
    }

    /// Finish reading, returning either the built record or every error seen.
    ///
    /// `build` only runs when no error was recorded, at which point every
    /// accessor returned `Some`.
    pub fn finish<T>(self, build: impl FnOnce() -> Option<T>) -> Result<T, Vec<FieldError>> {
        if !self.errors.is_empty() {
            debug!(errors = self.errors.len(), "Validation failed");
            return Err(self.errors);
        }
        build().ok_or(self.errors)
    }

    fn string(&mut self, field: &str) -> Option<String> {
        match self.raw.get(field) {
            None => {
                self.errors.push(FieldError::new(field, REQUIRED));
                None
            }
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                self.type_error(field, other);
                None
            }
        }
    }

    fn type_error(&mut self, field: &str, value: &Value) {
        self.errors.push(FieldError::new(
            field,
            format!("Expected string, received {}", json_type_name(value)),
        ));
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Check an address against the accepted grammar.
///
/// `local@label.label.tld`: ASCII only, the local part drawn from
/// letters, digits and `_ ' + - .`, no leading dot, no `..` anywhere,
/// domain labels starting alphanumeric and a top-level label of two or more
/// letters. Internationalized domains are rejected.
pub fn is_valid_email(address: &str) -> bool {
    if !address.is_ascii() || address.starts_with('.') || address.contains("..") {
        return false;
    }

    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };

    let local_ok = local
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'\'' | b'+' | b'-' | b'.'));
    let local_end_ok = local
        .bytes()
        .last()
        .is_some_and(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'+' | b'-'));
    if !local_ok || !local_end_ok {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    let Some((tld, rest)) = labels.split_last() else {
        return false;
    };
    if rest.is_empty() || tld.len() < 2 || !tld.bytes().all(|b| b.is_ascii_alphabetic()) {
        return false;
    }

    rest.iter().all(|label| {
        label
            .bytes()
            .next()
            .is_some_and(|b| b.is_ascii_alphanumeric())
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
    })
}
