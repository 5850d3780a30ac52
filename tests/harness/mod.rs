// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test harness for the lead-capture pipeline.
//!
//! Provides recording fakes for every collaborator and generators for
//! submission payloads, so tests can observe exactly which steps ran.

#![allow(dead_code)]

pub mod fakes;
pub mod generators;

use fakes::{FixedLimiter, RecordingMailer, RecordingStore};
use lead_capture::{
    config::{Config, SiteConfig},
    handlers::AppState,
    limiter::{RateGate, RateGates, RateLimiter},
    notify::EmailTemplates,
    pipeline::{Collaborators, Pipeline, SubmissionSchema},
};
use std::sync::Arc;

/// Fakes wired together, ready to build pipelines or app state from.
pub struct TestBed {
    pub store: Arc<RecordingStore>,
    pub mailer: Arc<RecordingMailer>,
    pub templates: Arc<EmailTemplates>,
}

impl TestBed {
    pub fn new() -> Self {
        Self::with(RecordingStore::new(), RecordingMailer::new())
    }

    pub fn with(store: RecordingStore, mailer: RecordingMailer) -> Self {
        let templates = EmailTemplates::new(&SiteConfig {
            app_url: "https://cius.example.com".to_string(),
            brand: "CIUS".to_string(),
        })
        .expect("valid site url");
        Self {
            store: Arc::new(store),
            mailer: Arc::new(mailer),
            templates: Arc::new(templates),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            store: self.store.clone(),
            mailer: self.mailer.clone(),
            templates: self.templates.clone(),
        }
    }

    /// A pipeline with no rate limiter.
    pub fn pipeline<S: SubmissionSchema>(&self) -> Pipeline<S> {
        Pipeline::new(self.collaborators(), RateGate::disabled())
    }

    /// A pipeline gated by `limiter`.
    pub fn limited_pipeline<S: SubmissionSchema>(&self, limiter: Arc<FixedLimiter>) -> Pipeline<S> {
        Pipeline::new(
            self.collaborators(),
            RateGate::new(Some(limiter as Arc<dyn RateLimiter>)),
        )
    }

    /// Application state with the given gates and default config.
    pub fn app_state(&self, gates: RateGates) -> Arc<AppState> {
        self.app_state_with(Config::default(), gates)
    }

    pub fn app_state_with(&self, config: Config, gates: RateGates) -> Arc<AppState> {
        Arc::new(AppState::new(config, self.collaborators(), gates).expect("fresh registry"))
    }
}
