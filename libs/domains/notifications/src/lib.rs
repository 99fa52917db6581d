//! Notifications Domain
//!
//! Email alerting for the review pipeline. The one email this system sends
//! is the negative-review alert, queued by the review worker and delivered
//! by the email worker.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  Review Worker  │  ← queues alert jobs on negative sentiment
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │   Redis Stream  │  ← emails:jobs queue
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │  Email Worker   │  ← consumes and renders jobs
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │ Email Provider  │  ← Brevo HTTP API, or SMTP for local dev
//! └─────────────────┘
//! ```

pub mod error;
pub mod models;
pub mod processor;
pub mod providers;
pub mod streams;
pub mod templates;

pub use error::{NotificationError, NotificationResult};
pub use models::{EmailJob, NEGATIVE_REVIEW_SUBJECT};
pub use processor::EmailProcessor;
pub use providers::{BrevoProvider, EmailContent, EmailProvider, SentEmail, SmtpProvider};
pub use streams::EmailStream;
pub use templates::{ReviewAlertData, TemplateEngine};
