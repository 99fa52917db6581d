//! Data models for the notifications domain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stream_worker::{RetryPolicy, StreamJob};
use uuid::Uuid;

/// Subject line for negative-review alerts.
pub const NEGATIVE_REVIEW_SUBJECT: &str = "Negative Review Alert";

/// An email job queued for the email worker.
///
/// Opaque on the wire; only the email worker interprets the fields. Every
/// field that describes the review is optional, and the template substitutes
/// placeholders for anything absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailJob {
    /// Unique job identifier (kept across retries).
    pub id: Uuid,
    /// Recipient email address.
    pub to: String,
    /// Reviewer name, used in the rendered body.
    pub name: Option<String>,
    /// Email subject line.
    pub subject: String,
    /// Review rating (1-5).
    pub rating: Option<i16>,
    /// Review comment text.
    pub text: Option<String>,
    /// Computed sentiment label.
    pub sentiment: Option<String>,
    /// Extracted topic tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Number of failed attempts so far.
    #[serde(default)]
    pub retry_count: u32,
    /// Job creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl EmailJob {
    /// Build a negative-review alert addressed to a space owner.
    pub fn negative_review_alert(
        to: impl Into<String>,
        name: Option<String>,
        rating: Option<i16>,
        text: Option<String>,
        sentiment: Option<String>,
        tags: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            to: to.into(),
            name,
            subject: NEGATIVE_REVIEW_SUBJECT.to_string(),
            rating,
            text,
            sentiment,
            tags,
            retry_count: 0,
            created_at: Utc::now(),
        }
    }
}

impl StreamJob for EmailJob {
    fn job_id(&self) -> String {
        self.id.to_string()
    }

    fn retry_count(&self) -> u32 {
        self.retry_count
    }

    fn with_retry(&self) -> Self {
        Self {
            id: self.id, // Keep the same ID across retries
            retry_count: self.retry_count + 1,
            ..self.clone()
        }
    }

    /// Email delivery: up to 3 attempts, fixed 10 seconds between them.
    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(3, 10_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stream_worker::Backoff;

    #[test]
    fn test_negative_review_alert_subject() {
        let job = EmailJob::negative_review_alert(
            "owner@y.com",
            Some("Ann".to_string()),
            Some(1),
            Some("terrible packaging".to_string()),
            Some("negative".to_string()),
            vec!["packaging".to_string()],
        );

        assert_eq!(job.subject, "Negative Review Alert");
        assert_eq!(job.to, "owner@y.com");
        assert_eq!(job.retry_count, 0);
    }

    #[test]
    fn test_retry_policy_is_fixed_ten_seconds() {
        let job = EmailJob::negative_review_alert("owner@y.com", None, None, None, None, vec![]);
        let policy = job.retry_policy();

        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.backoff, Backoff::Fixed { delay_ms: 10_000 });
    }

    #[test]
    fn test_retry_keeps_id() {
        let job = EmailJob::negative_review_alert("owner@y.com", None, None, None, None, vec![]);
        let retried = job.with_retry();

        assert_eq!(retried.id, job.id);
        assert_eq!(retried.retry_count, 1);
    }

    #[test]
    fn test_wire_format_field_names() {
        let job = EmailJob::negative_review_alert(
            "owner@y.com",
            Some("Ann".to_string()),
            Some(2),
            None,
            Some("negative".to_string()),
            vec!["price".to_string()],
        );

        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["to"], "owner@y.com");
        assert_eq!(value["subject"], "Negative Review Alert");
        assert_eq!(value["rating"], 2);
        assert!(value["text"].is_null());
        assert_eq!(value["tags"][0], "price");
    }

    #[test]
    fn test_decodes_without_optional_defaults() {
        // Jobs written by older producers may omit retry_count and tags.
        let json = r#"{
            "id": "3fa5f3f8-4bd5-4d5f-8a3f-111111111111",
            "to": "owner@y.com",
            "name": null,
            "subject": "Negative Review Alert",
            "rating": null,
            "text": null,
            "sentiment": null,
            "created_at": "2026-01-01T00:00:00Z"
        }"#;

        let job: EmailJob = serde_json::from_str(json).unwrap();
        assert_eq!(job.retry_count, 0);
        assert!(job.tags.is_empty());
    }
}
