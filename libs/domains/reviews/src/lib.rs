//! Reviews Domain
//!
//! The review-processing pipeline: a submitted review is queued, classified
//! for sentiment and topic tags, and persisted. When the sentiment comes
//! back negative, the pipeline fans out an alert email job for the space
//! owner.
//!
//! # Pipeline
//!
//! ```text
//! ┌─────────────────┐
//! │ Submission API  │  ← validates and queues ReviewJob, returns 202
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │   Redis Stream  │  ← reviews:jobs queue
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐      ┌──────────────────┐
//! │  Review Worker  │─────▶│ Classifier (HF)  │  soft failure: absent fields
//! │                 │      └──────────────────┘
//! │                 │─────▶ Postgres (create review)   hard failure: retry
//! │                 │─────▶ emails:jobs (negative only) soft failure: log
//! └─────────────────┘
//! ```

pub mod alerts;
pub mod classify;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod processor;
pub mod repository;
pub mod stream_models;
pub mod streams;

mod entity;

pub use alerts::AlertQueue;
pub use classify::{Classifier, HuggingFaceClassifier, TAG_CANDIDATES, TAG_SCORE_THRESHOLD};
pub use error::{ReviewError, ReviewResult};
pub use handlers::{submission_router, SubmissionState};
pub use models::{Classification, NewReview, Review, Sentiment, SubmitReview};
pub use postgres::PgReviewStore;
pub use processor::ReviewProcessor;
pub use repository::ReviewStore;
pub use stream_models::ReviewJob;
pub use streams::ReviewStream;
