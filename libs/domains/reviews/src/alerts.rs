//! Alert fan-out seam.
//!
//! The review processor enqueues negative-review alerts through this trait
//! rather than holding the notification queue directly, so tests can observe
//! the fan-out and production can inject the real producer.

use async_trait::async_trait;
use domain_notifications::EmailJob;
use stream_worker::{StreamError, StreamProducer};

/// Destination for negative-review alert jobs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertQueue: Send + Sync {
    /// Enqueue one alert job. Returns the queue-assigned entry ID.
    async fn enqueue(&self, job: &EmailJob) -> Result<String, StreamError>;
}

/// The production alert queue is simply a stream producer bound to the
/// notification stream.
#[async_trait]
impl AlertQueue for StreamProducer {
    async fn enqueue(&self, job: &EmailJob) -> Result<String, StreamError> {
        self.send(job).await
    }
}
