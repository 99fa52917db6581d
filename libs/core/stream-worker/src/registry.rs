//! Core traits: stream definitions, job payloads, and processors.

use crate::error::StreamError;
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

/// Stream definition trait.
///
/// Each domain implements this to name its queue, consumer group, and DLQ.
/// Producers and workers built from the same `StreamDef` are guaranteed to
/// agree on naming.
///
/// # Example
///
/// ```rust,ignore
/// use stream_worker::StreamDef;
///
/// pub struct EmailStream;
///
/// impl StreamDef for EmailStream {
///     const STREAM_NAME: &'static str = "emails:jobs";
///     const CONSUMER_GROUP: &'static str = "email_workers";
///     const DLQ_STREAM: &'static str = "emails:dlq";
/// }
/// ```
pub trait StreamDef: Send + Sync {
    /// The Redis stream name (e.g. "reviews:jobs").
    const STREAM_NAME: &'static str;

    /// The consumer group name for this stream.
    const CONSUMER_GROUP: &'static str;

    /// The dead letter queue stream name for failed jobs.
    const DLQ_STREAM: &'static str;

    /// Maximum stream length before auto-trim (MAXLEN ~).
    const MAX_LENGTH: i64 = 100_000;

    fn stream_name() -> &'static str {
        Self::STREAM_NAME
    }

    fn consumer_group() -> &'static str {
        Self::CONSUMER_GROUP
    }

    fn dlq_stream() -> &'static str {
        Self::DLQ_STREAM
    }
}

/// Trait for stream job payloads.
///
/// Jobs are JSON documents on the wire. The retry policy is part of the job
/// type, so every job enqueued onto a given stream carries the same attempt
/// count and backoff, declared where the job is defined rather than where it
/// fails.
pub trait StreamJob: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Job ID for logging and DLQ bookkeeping.
    fn job_id(&self) -> String;

    /// Number of failed attempts so far.
    fn retry_count(&self) -> u32;

    /// A copy of the job with the retry count incremented, for requeueing.
    fn with_retry(&self) -> Self;

    /// Retry policy applied by the worker on transient failures.
    /// Default: 3 attempts with exponential backoff.
    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
    }
}

/// Trait for job processors.
///
/// Domain handlers implement this to process jobs from a stream. Returning
/// `Err` engages the retry/DLQ machinery according to the error's category
/// and the job's retry policy.
///
/// # Example
///
/// ```rust,ignore
/// #[async_trait]
/// impl StreamProcessor<EmailJob> for EmailProcessor {
///     async fn process(&self, job: &EmailJob) -> Result<(), StreamError> {
///         self.provider.send(&content).await.map_err(|e| StreamError::transient(e.to_string()))
///     }
///
///     fn name(&self) -> &'static str {
///         "EmailProcessor"
///     }
/// }
/// ```
#[async_trait]
pub trait StreamProcessor<J: StreamJob>: Send + Sync {
    /// Process a single job.
    async fn process(&self, job: &J) -> Result<(), StreamError>;

    /// Processor name for logging and metrics labels.
    fn name(&self) -> &'static str;

    /// Health check for the processor's downstream dependencies.
    /// Default: always healthy.
    async fn health_check(&self) -> Result<bool, StreamError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    struct TestStream;

    impl StreamDef for TestStream {
        const STREAM_NAME: &'static str = "test:jobs";
        const CONSUMER_GROUP: &'static str = "test_workers";
        const DLQ_STREAM: &'static str = "test:dlq";
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct TestJob {
        id: String,
        retry_count: u32,
    }

    impl StreamJob for TestJob {
        fn job_id(&self) -> String {
            self.id.clone()
        }

        fn retry_count(&self) -> u32 {
            self.retry_count
        }

        fn with_retry(&self) -> Self {
            Self {
                retry_count: self.retry_count + 1,
                ..self.clone()
            }
        }
    }

    #[test]
    fn test_stream_def() {
        assert_eq!(TestStream::stream_name(), "test:jobs");
        assert_eq!(TestStream::consumer_group(), "test_workers");
        assert_eq!(TestStream::dlq_stream(), "test:dlq");
        assert_eq!(TestStream::MAX_LENGTH, 100_000);
    }

    #[test]
    fn test_stream_job_defaults() {
        let job = TestJob {
            id: "job-1".to_string(),
            retry_count: 0,
        };

        assert_eq!(job.job_id(), "job-1");
        assert_eq!(job.retry_policy(), RetryPolicy::default());

        let retry = job.with_retry();
        assert_eq!(retry.retry_count(), 1);
    }
}
