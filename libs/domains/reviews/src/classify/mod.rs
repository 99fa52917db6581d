//! Text-classification capability.
//!
//! The `Classifier` trait is the boundary to the remote inference service:
//! sentiment polarity plus zero-shot topic tags. Both operations are
//! fallible and latency-bearing; the review worker degrades to "no
//! classification" on any error rather than failing the job.

mod huggingface;

pub use huggingface::{HuggingFaceClassifier, HuggingFaceConfig};

use crate::models::Sentiment;
use async_trait::async_trait;
use thiserror::Error;

/// Candidate tag vocabulary for zero-shot extraction.
pub const TAG_CANDIDATES: [&str; 5] = ["quality", "price", "delivery", "service", "packaging"];

/// A tag is kept when its relevance score is strictly greater than this.
pub const TAG_SCORE_THRESHOLD: f64 = 0.2;

/// Sentiment label with the model's confidence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentScore {
    pub label: Sentiment,
    pub score: f64,
}

/// A candidate tag with its relevance score.
#[derive(Debug, Clone, PartialEq)]
pub struct TagScore {
    pub label: String,
    pub score: f64,
}

pub type ClassifyResult<T> = Result<T, ClassifyError>;

#[derive(Debug, Error)]
pub enum ClassifyError {
    /// Transport failure, timeout, or non-2xx response.
    #[error("Classification request failed: {0}")]
    Http(String),

    /// The service answered but the body had an unexpected shape.
    #[error("Unexpected classification response: {0}")]
    UnexpectedResponse(String),

    /// Missing or invalid configuration.
    #[error("Classifier configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ClassifyError {
    fn from(err: reqwest::Error) -> Self {
        ClassifyError::Http(err.to_string())
    }
}

/// Capability trait for the external classification service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify the sentiment of a text. `Ok(None)` means the service
    /// answered without a recognizable polarity label.
    async fn classify_sentiment(&self, text: &str) -> ClassifyResult<Option<SentimentScore>>;

    /// Score the candidate labels against a text. The caller filters by
    /// threshold.
    async fn extract_tags(
        &self,
        text: &str,
        candidate_labels: &[&'static str],
    ) -> ClassifyResult<Vec<TagScore>>;
}
