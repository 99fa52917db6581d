//! Email provider implementations.
//!
//! The `EmailProvider` trait is the capability boundary for transactional
//! email: the processor only ever talks to this trait, so vendors and test
//! doubles are interchangeable.

mod brevo;
mod smtp;

pub use brevo::{BrevoConfig, BrevoProvider};
pub use smtp::{SmtpConfig, SmtpProvider};

use crate::error::NotificationResult;
use async_trait::async_trait;

/// Result of a dispatch: provider-specific message ID when available.
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub message_id: Option<String>,
    pub accepted: bool,
}

/// A rendered email ready for dispatch.
#[derive(Debug, Clone, Default)]
pub struct EmailContent {
    /// Recipient email address.
    pub to_email: String,
    /// Recipient display name.
    pub to_name: String,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub text_body: String,
}

/// Trait for email sending providers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Dispatch an email. Failure must surface as an error so the worker's
    /// retry policy engages.
    async fn send(&self, email: &EmailContent) -> NotificationResult<SentEmail>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;

    /// Whether the provider looks usable (credentials present, etc.).
    async fn health_check(&self) -> NotificationResult<bool>;
}
