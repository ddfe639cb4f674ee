use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

use super::records::NewItem;
use super::reporter::DigestReport;
use crate::api::HttpClient;
use crate::core::config::{EmailBackend, EmailConfig};
use crate::core::error::{MonitorError, MonitorResult};

const SENDGRID_URL: &str = "https://api.sendgrid.com/v3/mail/send";

#[derive(Debug, Clone, PartialEq)]
pub struct Email {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Delivery backend for digest emails.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    fn name(&self) -> &'static str;
    async fn send(&self, email: &Email) -> MonitorResult<()>;
}

/// SendGrid v3 transactional API.
pub struct SendGridMailer {
    client: HttpClient,
    api_key: Option<String>,
    url: String,
}

impl SendGridMailer {
    pub fn new(client: HttpClient, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            url: SENDGRID_URL.to_string(),
        }
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }
}

#[async_trait]
impl Mailer for SendGridMailer {
    fn name(&self) -> &'static str {
        "sendgrid"
    }

    async fn send(&self, email: &Email) -> MonitorResult<()> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| MonitorError::Mail("SENDGRID_API_KEY is not set".to_string()))?;

        let payload = json!({
            "personalizations": [{ "to": [{ "email": email.to }] }],
            "from": { "email": email.from },
            "subject": email.subject,
            "content": [
                { "type": "text/plain", "value": email.text },
                { "type": "text/html", "value": email.html }
            ]
        });

        let (status, body) = self.client.post_json(&self.url, api_key, &payload).await?;
        if !(200..300).contains(&status) {
            return Err(MonitorError::Mail(format!("SendGrid returned {status}: {body}")));
        }

        Ok(())
    }
}

/// Writes the digest to the log instead of sending it.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, email: &Email) -> MonitorResult<()> {
        tracing::info!(
            "📧 [dry-run] To: {} | Subject: {}\n{}",
            email.to,
            email.subject,
            email.text
        );
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotifyOutcome {
    pub success: bool,
    pub message: String,
}

pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    config: EmailConfig,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>, config: EmailConfig) -> Self {
        Self { mailer, config }
    }

    /// Pick the backend named in the config.
    pub fn from_config(config: &EmailConfig, client: &HttpClient) -> Self {
        let mailer: Arc<dyn Mailer> = match config.backend {
            EmailBackend::SendGrid => Arc::new(SendGridMailer::new(
                client.clone(),
                config.sendgrid_api_key.clone(),
            )),
            EmailBackend::Log => Arc::new(LogMailer),
        };
        Self::new(mailer, config.clone())
    }

    pub fn backend_name(&self) -> &'static str {
        self.mailer.name()
    }

    /// Send one digest for `items`. Never errors; the outcome says what happened.
    pub async fn notify(&self, items: &[NewItem]) -> NotifyOutcome {
        if items.is_empty() {
            return NotifyOutcome {
                success: false,
                message: "No new items to notify about".to_string(),
            };
        }

        let report = DigestReport::generate(items, Utc::now());
        let email = Email {
            from: self.config.from.clone(),
            to: self.config.to.clone(),
            subject: report.subject(&self.config.subject_prefix),
            text: report.to_text(),
            html: report.to_html(),
        };

        match self.mailer.send(&email).await {
            Ok(()) => {
                tracing::info!(
                    "📧 Digest sent via {} to {}: {}",
                    self.mailer.name(),
                    email.to,
                    email.subject
                );
                NotifyOutcome {
                    success: true,
                    message: format!("Sent digest with {} items", report.total()),
                }
            }
            Err(e) => {
                tracing::error!("❌ Failed to send digest via {}: {}", self.mailer.name(), e);
                NotifyOutcome {
                    success: false,
                    message: e.to_string(),
                }
            }
        }
    }
}
