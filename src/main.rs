// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Lead Capture Service
//!
//! Serves the contact, careers and report-download forms of the marketing
//! site. Each submission is rate checked, validated, stored and confirmed by
//! email before the caller gets an answer.
//!
//! ## Configuration
//!
//! Settings come from an optional file named by `LEAD_CAPTURE_CONFIG`, then
//! from `LEAD_CAPTURE__*` environment variables (a `.env` file is honoured):
//!
//! - `LEAD_CAPTURE__BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `LEAD_CAPTURE__EMAIL__API_KEY`: Email provider key (required)
//! - `LEAD_CAPTURE__SITE__APP_URL`: Public site URL used in email links
//! - `LEAD_CAPTURE__STORE__PATH`: Append-only submission log (default: memory)
//! - `LEAD_CAPTURE__RATE_LIMIT__ENABLED`: Toggle per-caller quotas

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lead_capture::{
    config::Config,
    handlers::{router, AppState},
    limiter::{KindLimiters, RateGates},
    notify::{EmailTemplates, ResendMailer},
    pipeline::Collaborators,
    store::{JsonlStore, MemoryStore, SubmissionStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = Config::load().context("failed to load configuration")?;
    info!(
        bind_addr = %config.bind_addr,
        rate_limit = config.rate_limit.enabled,
        window_secs = config.rate_limit.window_secs,
        store = ?config.store.path,
        "Starting lead capture service"
    );

    let api_key = config
        .email
        .api_key
        .clone()
        .context("email.api_key is not set (LEAD_CAPTURE__EMAIL__API_KEY)")?;
    let templates = EmailTemplates::new(&config.site).context("site.app_url is not a valid URL")?;

    let store: Arc<dyn SubmissionStore> = match &config.store.path {
        Some(path) => Arc::new(
            JsonlStore::open(path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?,
        ),
        None => {
            warn!("No store path configured, submissions are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let collaborators = Collaborators {
        store,
        mailer: Arc::new(ResendMailer::new(&config.email, api_key)),
        templates: Arc::new(templates),
    };

    let limiters = KindLimiters::from_config(&config.rate_limit);
    let gates = match &limiters {
        Some(limiters) => limiters.gates(),
        None => {
            warn!("Rate limiting disabled");
            RateGates::disabled()
        }
    };

    let state = Arc::new(AppState::new(config.clone(), collaborators, gates)?);

    // Spawn cleanup task
    if let Some(limiters) = limiters {
        let every = config.rate_limit.cleanup_interval();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                limiters.cleanup().await;
            }
        });
    }

    let app = router(state);

    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
