// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Confirmation emails: templates and delivery.

use crate::config::{EmailConfig, SiteConfig};
use crate::error::NotifyError;
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;
use url::Url;

/// A rendered message ready to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Outbound email delivery.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send `email`; an error means delivery was not confirmed.
    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotifyError>;
}

/// Request body for the Resend `POST /emails` endpoint.
#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

/// Mailer backed by the Resend HTTP API.
pub struct ResendMailer {
    endpoint: String,
    api_key: String,
    from: String,
    reply_to: Option<String>,
    client: reqwest::Client,
}

impl ResendMailer {
    /// Create a mailer for the given provider settings.
    pub fn new(config: &EmailConfig, api_key: String) -> Self {
        Self {
            endpoint: format!("{}/emails", config.api_url.trim_end_matches('/')),
            api_key,
            from: config.from.clone(),
            reply_to: config.reply_to.clone(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&SendEmailRequest {
                from: &self.from,
                to: [&email.to],
                subject: &email.subject,
                html: &email.html,
                reply_to: self.reply_to.as_deref(),
            })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(to = %email.to, subject = %email.subject, "Email accepted by provider");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// HTML bodies for the three confirmation emails.
#[derive(Debug, Clone)]
pub struct EmailTemplates {
    brand: String,
    report_url: Url,
}

impl EmailTemplates {
    /// Build templates for a site; the report link is `<app_url>/downloads/report.pdf`.
    pub fn new(site: &SiteConfig) -> Result<Self, url::ParseError> {
        let mut base = Url::parse(&site.app_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            brand: site.brand.clone(),
            report_url: base.join("downloads/report.pdf")?,
        })
    }

    #[cfg(test)]
    fn report_url(&self) -> &Url {
        &self.report_url
    }

    pub fn contact_confirmation(&self, name: &str) -> String {
        self.layout(
            "Thank you for contacting us!",
            &format!(
                "<p>Dear {},</p>\n          \
                 <p>We have received your message and our team will get back to you shortly.</p>",
                escape_html(name)
            ),
            &format!("{} Team", self.brand),
        )
    }

    pub fn career_application(&self, name: &str, position: &str) -> String {
        self.layout(
            "Career Application Received",
            &format!(
                "<p>Dear {},</p>\n          \
                 <p>Thank you for applying for the <strong>{}</strong> position at {}.</p>\n          \
                 <p>Our HR team will review your application and contact you soon.</p>",
                escape_html(name),
                escape_html(position),
                escape_html(&self.brand)
            ),
            &format!("{} HR Team", self.brand),
        )
    }

    pub fn report_download(&self) -> String {
        self.layout(
            "Download Your Report",
            &format!(
                "<p>Thank you for your interest in our report.</p>\n          \
                 <p>Click the link below to download:</p>\n          \
                 <a href=\"{}\" style=\"display: inline-block; padding: 12px 24px; background: #0066cc; \
                 color: white; text-decoration: none; border-radius: 4px; margin: 20px 0;\">\n            \
                 Download Report\n          </a>",
                escape_html(self.report_url.as_str())
            ),
            &format!("{} Team", self.brand),
        )
    }

    fn layout(&self, heading: &str, body: &str, signature: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
  </head>
  <body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
      <h2 style="color: #0066cc;">{heading}</h2>
      {body}
      <p>Best regards,<br>{signature}</p>
    </div>
  </body>
</html>
"#,
            signature = escape_html(signature)
        )
    }
}

/// Escape text for interpolation into HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
