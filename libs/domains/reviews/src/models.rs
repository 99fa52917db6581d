//! Domain models for reviews.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;
use validator::Validate;

/// Sentiment polarity of a review text.
///
/// Parsed case-insensitively so provider labels like "NEGATIVE" map cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// The outcome of one classification pass over a review text.
///
/// Grouping the three derived fields into one struct keeps the invariant
/// that a review either has all of them (from a single pass) or none; the
/// tag set may legitimately be empty when nothing clears the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub sentiment: Sentiment,
    pub score: f64,
    pub tags: Vec<String>,
}

/// A persisted review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub space_id: Uuid,
    pub name: String,
    pub email: String,
    pub rating: i16,
    pub text: Option<String>,
    pub sentiment: Option<Sentiment>,
    pub sentiment_score: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    pub fn is_negative(&self) -> bool {
        matches!(self.sentiment, Some(Sentiment::Negative))
    }
}

/// Fields for creating a review.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub space_id: Uuid,
    pub name: String,
    pub email: String,
    pub rating: i16,
    pub text: Option<String>,
    pub classification: Option<Classification>,
}

/// Review submission payload, validated at the HTTP boundary.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitReview {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,

    #[validate(email(message = "invalid email address"))]
    pub email: String,

    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: i16,

    #[validate(length(max = 5000, message = "text must be at most 5000 characters"))]
    pub text: Option<String>,
}
