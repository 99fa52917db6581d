//! Store abstraction for review persistence.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ReviewResult;
use crate::models::{NewReview, Review};

/// The two store operations the pipeline needs.
///
/// The schema itself (spaces, users, sessions) belongs to the web
/// application; this trait is the pipeline's entire view of it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Create a review row. There is no uniqueness constraint: duplicate
    /// submissions (and redeliveries) legally produce duplicate rows.
    async fn create_review(&self, input: NewReview) -> ReviewResult<Review>;

    /// Resolve the owning space's owner email, if any.
    async fn find_space_owner_email(&self, space_id: Uuid) -> ReviewResult<Option<String>>;
}
