//! Brevo transactional-email provider.

use super::{EmailContent, EmailProvider, SentEmail};
use crate::error::{NotificationError, NotificationResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

/// Brevo API configuration.
#[derive(Debug, Clone)]
pub struct BrevoConfig {
    /// Brevo API key.
    pub api_key: String,
    /// Sender email address.
    pub from_email: String,
    /// Sender name.
    pub from_name: String,
    /// API base URL (defaults to production).
    pub api_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl BrevoConfig {
    pub fn new(api_key: String, from_email: String, from_name: String) -> Self {
        Self {
            api_key,
            from_email,
            from_name,
            api_url: "https://api.brevo.com/v3".to_string(),
            timeout_secs: 10,
        }
    }

    /// Load configuration from environment variables:
    /// - `BREVO_API_KEY` (required)
    /// - `BREVO_FROM_EMAIL` (required)
    /// - `BREVO_FROM_NAME` (optional, defaults to "Review Alerts")
    pub fn from_env() -> NotificationResult<Self> {
        let api_key = std::env::var("BREVO_API_KEY")
            .map_err(|_| NotificationError::ConfigError("BREVO_API_KEY not set".to_string()))?;
        let from_email = std::env::var("BREVO_FROM_EMAIL")
            .map_err(|_| NotificationError::ConfigError("BREVO_FROM_EMAIL not set".to_string()))?;
        let from_name =
            std::env::var("BREVO_FROM_NAME").unwrap_or_else(|_| "Review Alerts".to_string());

        Ok(Self::new(api_key, from_email, from_name))
    }
}

/// Brevo email provider.
pub struct BrevoProvider {
    config: BrevoConfig,
    client: Client,
}

impl BrevoProvider {
    pub fn new(config: BrevoConfig) -> NotificationResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn from_env() -> NotificationResult<Self> {
        Self::new(BrevoConfig::from_env()?)
    }
}

// Brevo API request/response structures

#[derive(Debug, Serialize)]
struct BrevoRequest {
    sender: BrevoContact,
    to: Vec<BrevoContact>,
    subject: String,
    #[serde(rename = "textContent")]
    text_content: String,
}

#[derive(Debug, Serialize)]
struct BrevoContact {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BrevoResponse {
    #[serde(rename = "messageId")]
    message_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BrevoError {
    code: Option<String>,
    message: Option<String>,
}

#[async_trait]
impl EmailProvider for BrevoProvider {
    async fn send(&self, email: &EmailContent) -> NotificationResult<SentEmail> {
        let request = BrevoRequest {
            sender: BrevoContact {
                email: self.config.from_email.clone(),
                name: Some(self.config.from_name.clone()),
            },
            to: vec![BrevoContact {
                email: email.to_email.clone(),
                name: if email.to_name.is_empty() {
                    None
                } else {
                    Some(email.to_name.clone())
                },
            }],
            subject: email.subject.clone(),
            text_content: email.text_body.clone(),
        };

        debug!(
            to = %email.to_email,
            subject = %email.subject,
            "Sending email via Brevo"
        );

        let response = self
            .client
            .post(format!("{}/smtp/email", self.config.api_url))
            .header("api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();

        if status.is_success() {
            let body: BrevoResponse = response.json().await.unwrap_or(BrevoResponse {
                message_id: None,
            });

            info!(
                to = %email.to_email,
                message_id = ?body.message_id,
                "Email sent successfully via Brevo"
            );

            Ok(SentEmail {
                message_id: body.message_id,
                accepted: true,
            })
        } else {
            let error_body = response.text().await.unwrap_or_default();
            error!(
                to = %email.to_email,
                status = %status,
                error = %error_body,
                "Failed to send email via Brevo"
            );

            let error_message =
                if let Ok(brevo_error) = serde_json::from_str::<BrevoError>(&error_body) {
                    format!(
                        "{}: {}",
                        brevo_error.code.unwrap_or_else(|| "unknown".to_string()),
                        brevo_error.message.unwrap_or_default()
                    )
                } else {
                    error_body
                };

            Err(NotificationError::ProviderError(format!(
                "Brevo error ({}): {}",
                status, error_message
            )))
        }
    }

    fn name(&self) -> &'static str {
        "Brevo"
    }

    async fn health_check(&self) -> NotificationResult<bool> {
        // Brevo has no dedicated health endpoint; check the API key format.
        if self.config.api_key.starts_with("xkeysib-") {
            Ok(true)
        } else {
            Err(NotificationError::ConfigError(
                "Invalid Brevo API key format".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brevo_config_new() {
        let config = BrevoConfig::new(
            "xkeysib-test".to_string(),
            "alerts@example.com".to_string(),
            "Review Alerts".to_string(),
        );

        assert_eq!(config.api_url, "https://api.brevo.com/v3");
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn test_request_wire_format() {
        let request = BrevoRequest {
            sender: BrevoContact {
                email: "alerts@example.com".to_string(),
                name: Some("Review Alerts".to_string()),
            },
            to: vec![BrevoContact {
                email: "owner@y.com".to_string(),
                name: None,
            }],
            subject: "Negative Review Alert".to_string(),
            text_content: "body".to_string(),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["textContent"], "body");
        assert_eq!(value["to"][0]["email"], "owner@y.com");
        // Absent names are omitted, not serialized as null.
        assert!(value["to"][0].get("name").is_none());
    }
}
