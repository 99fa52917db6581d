//! Worker configuration.

use crate::registry::StreamDef;
use uuid::Uuid;

/// Configuration for the stream worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Redis stream name
    pub stream_name: String,

    /// Consumer group name
    pub consumer_group: String,

    /// Unique consumer ID (auto-generated if not provided)
    pub consumer_id: String,

    /// Dead letter queue stream name
    pub dlq_stream: String,

    /// Maximum stream length before trimming
    pub max_length: i64,

    /// Batch size for reading messages
    pub batch_size: usize,

    /// Blocking read timeout in milliseconds (None = non-blocking polling)
    pub block_timeout_ms: Option<u64>,

    /// Poll interval in milliseconds when running in polling mode
    pub poll_interval_ms: u64,

    /// Idle time in milliseconds before another consumer's lease is reclaimed
    pub claim_idle_ms: u64,
}

impl WorkerConfig {
    /// Create a WorkerConfig from a StreamDef.
    ///
    /// This is the recommended constructor: the stream, group, and DLQ names
    /// stay consistent with the producer side.
    pub fn from_stream_def<S: StreamDef>() -> Self {
        Self {
            stream_name: S::STREAM_NAME.to_string(),
            consumer_group: S::CONSUMER_GROUP.to_string(),
            consumer_id: format!("worker-{}", Uuid::new_v4()),
            dlq_stream: S::DLQ_STREAM.to_string(),
            max_length: S::MAX_LENGTH,
            batch_size: 10,
            block_timeout_ms: Some(5000),
            poll_interval_ms: 1000,
            claim_idle_ms: 30_000,
        }
    }

    /// Create a WorkerConfig with explicit stream and group names.
    pub fn new(stream_name: impl Into<String>, consumer_group: impl Into<String>) -> Self {
        let stream_name = stream_name.into();
        let dlq_stream = format!("{}:dlq", stream_name.split(':').next().unwrap_or("jobs"));
        Self {
            stream_name,
            consumer_group: consumer_group.into(),
            consumer_id: format!("worker-{}", Uuid::new_v4()),
            dlq_stream,
            max_length: 100_000,
            batch_size: 10,
            block_timeout_ms: Some(5000),
            poll_interval_ms: 1000,
            claim_idle_ms: 30_000,
        }
    }

    pub fn with_consumer_id(mut self, id: impl Into<String>) -> Self {
        self.consumer_id = id.into();
        self
    }

    pub fn with_dlq_stream(mut self, stream: impl Into<String>) -> Self {
        self.dlq_stream = stream.into();
        self
    }

    pub fn with_max_length(mut self, max_length: i64) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Set the blocking read timeout; `None` switches to polling mode.
    pub fn with_block(mut self, timeout_ms: Option<u64>) -> Self {
        self.block_timeout_ms = timeout_ms;
        self
    }

    pub fn with_poll_interval_ms(mut self, interval: u64) -> Self {
        self.poll_interval_ms = interval;
        self
    }

    pub fn with_claim_idle_ms(mut self, idle_ms: u64) -> Self {
        self.claim_idle_ms = idle_ms;
        self
    }

    /// Whether the worker uses blocking reads.
    pub fn is_blocking(&self) -> bool {
        self.block_timeout_ms.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestStream;

    impl StreamDef for TestStream {
        const STREAM_NAME: &'static str = "test:jobs";
        const CONSUMER_GROUP: &'static str = "test_workers";
        const DLQ_STREAM: &'static str = "test:dlq";
    }

    #[test]
    fn test_from_stream_def() {
        let config = WorkerConfig::from_stream_def::<TestStream>();

        assert_eq!(config.stream_name, "test:jobs");
        assert_eq!(config.consumer_group, "test_workers");
        assert_eq!(config.dlq_stream, "test:dlq");
        assert!(config.consumer_id.starts_with("worker-"));
        assert!(config.is_blocking());
    }

    #[test]
    fn test_builder_pattern() {
        let config = WorkerConfig::new("my:jobs", "my_workers")
            .with_consumer_id("worker-1")
            .with_dlq_stream("my:dlq")
            .with_batch_size(20)
            .with_block(None)
            .with_poll_interval_ms(250)
            .with_claim_idle_ms(10_000);

        assert_eq!(config.consumer_id, "worker-1");
        assert_eq!(config.dlq_stream, "my:dlq");
        assert_eq!(config.batch_size, 20);
        assert!(!config.is_blocking());
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.claim_idle_ms, 10_000);
    }

    #[test]
    fn test_new_derives_dlq_from_stream_domain() {
        let config = WorkerConfig::new("emails:jobs", "email_workers");
        assert_eq!(config.dlq_stream, "emails:dlq");
    }
}
