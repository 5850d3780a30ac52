// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! The three submission kinds and their field schemas.

use crate::notify::{EmailTemplates, OutgoingEmail};
use crate::pipeline::SubmissionSchema;
use crate::store::StoredRecord;
use crate::validator::{FieldError, FieldReader, RawInput};
use serde::{Deserialize, Serialize};

/// Which form a submission came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    Contact,
    Career,
    Report,
}

impl SubmissionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contact => "contact",
            Self::Career => "career",
            Self::Report => "report",
        }
    }
}

impl std::fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message sent through the contact form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// A job application from the careers page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerApplication {
    pub name: String,
    pub email: String,
    pub position: String,
    pub message: Option<String>,
}

/// A request for the report download link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDownloadRequest {
    pub email: String,
}

/// Any validated submission, as handed to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Submission {
    Contact(ContactSubmission),
    Career(CareerApplication),
    Report(ReportDownloadRequest),
}

impl Submission {
    pub fn kind(&self) -> SubmissionKind {
        match self {
            Self::Contact(_) => SubmissionKind::Contact,
            Self::Career(_) => SubmissionKind::Career,
            Self::Report(_) => SubmissionKind::Report,
        }
    }

    /// Address the confirmation email goes to.
    pub fn email(&self) -> &str {
        match self {
            Self::Contact(c) => &c.email,
            Self::Career(c) => &c.email,
            Self::Report(r) => &r.email,
        }
    }
}

const NAME_TOO_SHORT: &str = "Name must be at least 2 characters";
const MESSAGE_TOO_SHORT: &str = "Message must be at least 10 characters";
const POSITION_TOO_SHORT: &str = "Position must be at least 2 characters";

impl SubmissionSchema for ContactSubmission {
    const KIND: SubmissionKind = SubmissionKind::Contact;
    const ACCEPTED_MESSAGE: &'static str = "Contact form submitted successfully";

    fn validate(raw: &RawInput) -> Result<Self, Vec<FieldError>> {
        let mut reader = FieldReader::new(raw);
        let name = reader.required("name", 2, NAME_TOO_SHORT);
        let email = reader.email("email");
        let message = reader.required("message", 10, MESSAGE_TOO_SHORT);
        reader.finish(|| {
            Some(Self {
                name: name?,
                email: email?,
                message: message?,
            })
        })
    }

    fn to_submission(&self) -> Submission {
        Submission::Contact(self.clone())
    }

    fn confirmation(&self, _stored: &StoredRecord, templates: &EmailTemplates) -> OutgoingEmail {
        OutgoingEmail {
            to: self.email.clone(),
            subject: "Thank you for contacting us".to_string(),
            html: templates.contact_confirmation(&self.name),
        }
    }
}

impl SubmissionSchema for CareerApplication {
    const KIND: SubmissionKind = SubmissionKind::Career;
    const ACCEPTED_MESSAGE: &'static str = "Application submitted successfully";
    const OPTIONAL_FIELDS: &'static [&'static str] = &["message"];

    fn validate(raw: &RawInput) -> Result<Self, Vec<FieldError>> {
        let mut reader = FieldReader::new(raw);
        let name = reader.required("name", 2, NAME_TOO_SHORT);
        let email = reader.email("email");
        let position = reader.required("position", 2, POSITION_TOO_SHORT);
        let message = reader.optional("message");
        reader.finish(|| {
            Some(Self {
                name: name?,
                email: email?,
                position: position?,
                message: message?,
            })
        })
    }

    fn to_submission(&self) -> Submission {
        Submission::Career(self.clone())
    }

    fn confirmation(&self, _stored: &StoredRecord, templates: &EmailTemplates) -> OutgoingEmail {
        OutgoingEmail {
            to: self.email.clone(),
            subject: "Career Application Received".to_string(),
            html: templates.career_application(&self.name, &self.position),
        }
    }
}

impl SubmissionSchema for ReportDownloadRequest {
    const KIND: SubmissionKind = SubmissionKind::Report;
    const ACCEPTED_MESSAGE: &'static str = "Report download link sent to your email";

    fn validate(raw: &RawInput) -> Result<Self, Vec<FieldError>> {
        let mut reader = FieldReader::new(raw);
        let email = reader.email("email");
        reader.finish(|| Some(Self { email: email? }))
    }

    fn to_submission(&self) -> Submission {
        Submission::Report(self.clone())
    }

    fn confirmation(&self, _stored: &StoredRecord, templates: &EmailTemplates) -> OutgoingEmail {
        OutgoingEmail {
            to: self.email.clone(),
            subject: "Your Report is Ready".to_string(),
            html: templates.report_download(),
        }
    }
}
