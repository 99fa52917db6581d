//! Review submission endpoint (fire-and-forget).
//!
//! The public submission route validates the payload at the boundary,
//! queues a `ReviewJob`, and answers `202 Accepted` immediately. Downstream
//! processing outcomes never surface to the submitter; failures are visible
//! only in worker logs and the DLQ.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use stream_worker::{StreamDef, StreamProducer};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ReviewError, ReviewResult};
use crate::models::SubmitReview;
use crate::stream_models::ReviewJob;
use crate::streams::ReviewStream;

/// State for the submission handlers.
#[derive(Clone)]
pub struct SubmissionState {
    /// Producer bound to the reviews:jobs stream.
    pub producer: StreamProducer,
}

impl SubmissionState {
    pub fn new(redis: ConnectionManager) -> Self {
        Self {
            producer: StreamProducer::from_stream_def::<ReviewStream>(redis),
        }
    }
}

/// Response for accepted submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptedResponse {
    /// The queued job's ID.
    pub job_id: String,
    pub message: String,
    /// Stream the job was sent to.
    pub stream: String,
}

/// Submit a review to a space (fire-and-forget).
///
/// Queues the review for background processing and returns 202 Accepted.
pub async fn submit_review(
    State(state): State<SubmissionState>,
    Path(space_id): Path<Uuid>,
    Json(input): Json<SubmitReview>,
) -> ReviewResult<impl IntoResponse> {
    input
        .validate()
        .map_err(|e| ReviewError::Validation(e.to_string()))?;

    let job = ReviewJob::new(
        space_id,
        input.name,
        input.email,
        input.rating,
        normalize_text(input.text),
    );
    let job_id = job.id.to_string();

    state
        .producer
        .send(&job)
        .await
        .map_err(|e| ReviewError::Stream(format!("Failed to queue review: {}", e)))?;

    Ok((
        StatusCode::ACCEPTED,
        Json(AcceptedResponse {
            job_id,
            message: "Review accepted for processing".to_string(),
            stream: ReviewStream::STREAM_NAME.to_string(),
        }),
    ))
}

/// Router for the public submission endpoint.
pub fn submission_router(state: SubmissionState) -> Router {
    Router::new()
        .route("/api/spaces/{space_id}/reviews", post(submit_review))
        .with_state(state)
}

/// Blank text is the same as no text: it must not trigger classification.
fn normalize_text(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_response_shape() {
        let response = AcceptedResponse {
            job_id: Uuid::new_v4().to_string(),
            message: "Review accepted for processing".to_string(),
            stream: "reviews:jobs".to_string(),
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["stream"], "reviews:jobs");
        assert!(value["job_id"].is_string());
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(
            normalize_text(Some("  good  ".to_string())),
            Some("good".to_string())
        );
        assert_eq!(normalize_text(Some("   ".to_string())), None);
        assert_eq!(normalize_text(None), None);
    }
}
