//! Stream producer for enqueueing jobs.
//!
//! Used by any service (API handlers, other workers) to queue jobs for
//! background processing. Producers are cheap to clone and share a
//! connection handle, so they are injected where needed rather than held as
//! process-wide globals.
//!
//! # Example
//!
//! ```rust,ignore
//! use stream_worker::StreamProducer;
//!
//! let producer = StreamProducer::from_stream_def::<EmailStream>(redis);
//! let stream_id = producer.send(&job).await?;
//! ```

use crate::error::StreamError;
use crate::registry::{StreamDef, StreamJob};
use redis::aio::ConnectionManager;
use tracing::debug;

/// Producer bound to a single stream.
#[derive(Clone)]
pub struct StreamProducer {
    redis: ConnectionManager,
    stream_name: String,
    max_length: i64,
}

impl StreamProducer {
    /// Create a producer for an explicitly named stream.
    pub fn new(redis: ConnectionManager, stream_name: impl Into<String>) -> Self {
        Self {
            redis,
            stream_name: stream_name.into(),
            max_length: 100_000,
        }
    }

    /// Create a producer from a `StreamDef`.
    ///
    /// This is the recommended constructor: the stream name and trim length
    /// stay consistent with the consuming worker.
    pub fn from_stream_def<S: StreamDef>(redis: ConnectionManager) -> Self {
        Self {
            redis,
            stream_name: S::STREAM_NAME.to_string(),
            max_length: S::MAX_LENGTH,
        }
    }

    pub fn with_max_length(mut self, max_length: i64) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    /// Enqueue a job. Returns the Redis stream entry ID.
    ///
    /// Uses XADD with `MAXLEN ~` for approximate trimming, which is cheaper
    /// than exact trimming and keeps the stream bounded.
    pub async fn send<J: StreamJob>(&self, job: &J) -> Result<String, StreamError> {
        let mut conn = self.redis.clone();

        let job_json = serde_json::to_string(job)?;

        let stream_id: String = redis::cmd("XADD")
            .arg(&self.stream_name)
            .arg("MAXLEN")
            .arg("~")
            .arg(self.max_length)
            .arg("*")
            .arg("job")
            .arg(&job_json)
            .query_async(&mut conn)
            .await?;

        debug!(
            stream = %self.stream_name,
            stream_id = %stream_id,
            job_id = %job.job_id(),
            "Enqueued job"
        );

        Ok(stream_id)
    }

    /// Current stream length.
    pub async fn stream_length(&self) -> Result<i64, StreamError> {
        let mut conn = self.redis.clone();
        let len: i64 = redis::cmd("XLEN")
            .arg(&self.stream_name)
            .query_async(&mut conn)
            .await?;
        Ok(len)
    }
}
