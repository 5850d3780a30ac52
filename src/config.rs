// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the lead-capture service.
//!
//! Values are layered: built-in defaults, then an optional
//! `lead-capture.{toml,yaml,json}` file, then `LEAD_CAPTURE__*` environment
//! variables (`__` separates nested keys, e.g. `LEAD_CAPTURE__EMAIL__API_KEY`).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable naming an alternative config file (without extension).
pub const CONFIG_FILE_ENV: &str = "LEAD_CAPTURE_CONFIG";

/// Configuration for the lead-capture service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Origins allowed to post forms cross-origin
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Outbound email configuration
    #[serde(default)]
    pub email: EmailConfig,

    /// Public site details used by email templates
    #[serde(default)]
    pub site: SiteConfig,

    /// Persistence configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Submission pipeline configuration
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Per-kind sliding-window quotas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// When false no limiter is constructed and the rate check is skipped
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Length of the sliding window in seconds (default: 3600)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Contact submissions per window per caller (default: 10)
    #[serde(default = "default_contact_per_window")]
    pub contact_per_window: u32,

    /// Career applications per window per caller (default: 5)
    #[serde(default = "default_careers_per_window")]
    pub careers_per_window: u32,

    /// Report requests per window per caller (default: 20)
    #[serde(default = "default_report_per_window")]
    pub report_per_window: u32,

    /// How often stale counters are dropped, in seconds (default: 60)
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

/// Email provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Base URL of the Resend-compatible HTTP API
    #[serde(default = "default_email_api_url")]
    pub api_url: String,

    /// API key; required to start the server
    #[serde(default)]
    pub api_key: Option<String>,

    /// Sender mailbox
    #[serde(default = "default_email_from")]
    pub from: String,

    /// Optional Reply-To mailbox
    #[serde(default)]
    pub reply_to: Option<String>,
}

/// Public site configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Public base URL of the marketing site
    #[serde(default = "default_app_url")]
    pub app_url: String,

    /// Brand name used in email sign-offs
    #[serde(default = "default_brand")]
    pub brand: String,
}

/// Persistence configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Append records to this JSON-lines file; in-memory when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Upper bound for each network step in milliseconds; 0 disables
    #[serde(default = "default_step_timeout_ms")]
    pub step_timeout_ms: u64,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

fn default_window_secs() -> u64 {
    3600
}

fn default_contact_per_window() -> u32 {
    10
}

fn default_careers_per_window() -> u32 {
    5
}

fn default_report_per_window() -> u32 {
    20
}

fn default_cleanup_interval_secs() -> u64 {
    60
}

fn default_email_api_url() -> String {
    "https://api.resend.com".to_string()
}

fn default_email_from() -> String {
    "CIUS <noreply@cius.com>".to_string()
}

fn default_app_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_brand() -> String {
    "CIUS".to_string()
}

fn default_step_timeout_ms() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            allowed_origins: default_allowed_origins(),
            rate_limit: RateLimitConfig::default(),
            email: EmailConfig::default(),
            site: SiteConfig::default(),
            store: StoreConfig::default(),
            pipeline: PipelineConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            window_secs: default_window_secs(),
            contact_per_window: default_contact_per_window(),
            careers_per_window: default_careers_per_window(),
            report_per_window: default_report_per_window(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_url: default_email_api_url(),
            api_key: None,
            from: default_email_from(),
            reply_to: None,
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            app_url: default_app_url(),
            brand: default_brand(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            step_timeout_ms: default_step_timeout_ms(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl Config {
    /// Load configuration from the optional config file and the environment.
    pub fn load() -> Result<Self, config::ConfigError> {
        let file = std::env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| "lead-capture".to_string());

        config::Config::builder()
            .add_source(config::File::with_name(&file).required(false))
            .add_source(
                config::Environment::with_prefix("LEAD_CAPTURE")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("allowed_origins")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

impl RateLimitConfig {
    /// Get the sliding window duration
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Get the cleanup interval
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs.max(1))
    }
}

impl PipelineConfig {
    /// Per-step timeout, or `None` when disabled.
    pub fn step_timeout(&self) -> Option<Duration> {
        (self.step_timeout_ms > 0).then(|| Duration::from_millis(self.step_timeout_ms))
    }
}
