//! Notification transport abstraction
//!
//! Provides a unified interface over the outbound channels:
//! - Email (SendGrid v3 mail send, one multi-recipient message)
//! - SMS (HTTP SMS gateway, one message per recipient)
//!
//! The transport is an opaque capability from the workflow's point of view;
//! the approval fan-out in [`approval`] decides who gets notified.

pub mod approval;

pub use approval::ApprovalNotifier;

use crate::config::NotificationConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Trait for outbound notification dispatch
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a single multi-recipient HTML email
    async fn send_email(&self, to: &[String], subject: &str, html_body: &str) -> Result<()>;

    /// Send an SMS message to one recipient
    async fn send_sms(&self, to: &str, message: &str) -> Result<()>;
}

/// HTTP-backed notification client
pub struct NotificationClient {
    client: reqwest::Client,
    config: NotificationConfig,
}

#[derive(Serialize)]
struct MailSendRequest {
    personalizations: Vec<Personalization>,
    from: EmailAddress,
    subject: String,
    content: Vec<MailContent>,
}

#[derive(Serialize)]
struct Personalization {
    to: Vec<EmailAddress>,
}

#[derive(Serialize)]
struct EmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Serialize)]
struct MailContent {
    #[serde(rename = "type")]
    content_type: String,
    value: String,
}

#[derive(Serialize)]
struct SmsSendRequest {
    from: String,
    to: String,
    message: String,
}

impl NotificationClient {
    /// Create a new notification client
    pub fn new(config: NotificationConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Notification {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, config })
    }

    fn sendgrid_key(&self) -> Result<&str> {
        self.config
            .sendgrid_api_key
            .as_deref()
            .ok_or_else(|| AppError::Configuration {
                message: "SendGrid API key not configured".to_string(),
            })
    }
}

#[async_trait]
impl Notifier for NotificationClient {
    async fn send_email(&self, to: &[String], subject: &str, html_body: &str) -> Result<()> {
        let url = format!("{}/v3/mail/send", self.config.sendgrid_api_base);

        let request = MailSendRequest {
            personalizations: vec![Personalization {
                to: to
                    .iter()
                    .map(|email| EmailAddress {
                        email: email.clone(),
                        name: None,
                    })
                    .collect(),
            }],
            from: EmailAddress {
                email: self.config.from_email.clone(),
                name: Some(self.config.from_name.clone()),
            },
            subject: subject.to_string(),
            content: vec![MailContent {
                content_type: "text/html".to_string(),
                value: html_body.to_string(),
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.sendgrid_key()?))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Notification {
                message: format!("Email request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Notification {
                message: format!("Email API error {}: {}", status, body),
            });
        }

        tracing::debug!(recipients = to.len(), "Email dispatched");
        Ok(())
    }

    async fn send_sms(&self, to: &str, message: &str) -> Result<()> {
        let base = self
            .config
            .sms_api_base
            .as_deref()
            .ok_or_else(|| AppError::Configuration {
                message: "SMS gateway not configured".to_string(),
            })?;
        let url = format!("{}/messages", base);

        let request = SmsSendRequest {
            from: self.config.sms_from_number.clone(),
            to: to.to_string(),
            message: message.to_string(),
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(ref key) = self.config.sms_api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = builder.send().await.map_err(|e| AppError::Notification {
            message: format!("SMS request failed: {}", e),
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Notification {
                message: format!("SMS API error {}: {}", status, body),
            });
        }

        tracing::debug!(to = %to, "SMS dispatched");
        Ok(())
    }
}
