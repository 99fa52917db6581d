//! Stream models for review processing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stream_worker::{RetryPolicy, StreamJob};
use uuid::Uuid;

/// A review submission queued for background processing.
///
/// Immutable once enqueued; duplicate submissions are legal and produce
/// duplicate reviews. Retries keep the same id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewJob {
    /// Unique job identifier.
    pub id: Uuid,
    /// Space the review was submitted to.
    pub space_id: Uuid,
    /// Reviewer name.
    pub name: String,
    /// Reviewer email.
    pub email: String,
    /// Rating, 1-5.
    pub rating: i16,
    /// Optional review text; drives classification when present.
    pub text: Option<String>,
    /// Number of failed attempts so far.
    #[serde(default)]
    pub retry_count: u32,
    /// Job creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl ReviewJob {
    pub fn new(
        space_id: Uuid,
        name: impl Into<String>,
        email: impl Into<String>,
        rating: i16,
        text: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            space_id,
            name: name.into(),
            email: email.into(),
            rating,
            text,
            retry_count: 0,
            created_at: Utc::now(),
        }
    }
}

impl StreamJob for ReviewJob {
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

    /// Review processing: 3 attempts with exponential backoff (1s doubling
    /// up to 30s). The only retryable step is the store write.
    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::exponential(3, 1000, 30_000)
    }
}
