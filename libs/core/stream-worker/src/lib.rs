//! Stream Worker Framework
//!
//! A generic Redis Streams job queue for background processing.
//!
//! ## Features
//!
//! - **Generic worker**: `StreamWorker<J, P>` processes any job type
//! - **Consumer groups**: at-least-once delivery with per-job leases;
//!   horizontal scaling by running more worker instances
//! - **Per-queue retry policy**: attempt count and backoff declared by the
//!   job type, applied by the worker on failure
//! - **Dead Letter Queue**: failed and malformed jobs kept for inspection
//! - **Prometheus metrics** and health/admin endpoints
//!
//! ## Example
//!
//! ```ignore
//! use stream_worker::{RetryPolicy, StreamDef, StreamJob, StreamProcessor, StreamWorker, WorkerConfig};
//!
//! #[derive(Clone, Serialize, Deserialize)]
//! struct MyJob { /* ... */ }
//!
//! impl StreamJob for MyJob {
//!     fn job_id(&self) -> String { self.id.to_string() }
//!     fn retry_count(&self) -> u32 { self.retry_count }
//!     fn with_retry(&self) -> Self { Self { retry_count: self.retry_count + 1, ..self.clone() } }
//!     fn retry_policy(&self) -> RetryPolicy { RetryPolicy::fixed(3, 10_000) }
//! }
//!
//! struct MyStream;
//! impl StreamDef for MyStream {
//!     const STREAM_NAME: &'static str = "my:jobs";
//!     const CONSUMER_GROUP: &'static str = "my_workers";
//!     const DLQ_STREAM: &'static str = "my:dlq";
//! }
//!
//! let config = WorkerConfig::from_stream_def::<MyStream>();
//! let worker = StreamWorker::new(redis, processor, config);
//! worker.run(shutdown_rx).await?;
//! ```

mod config;
mod consumer;
mod dlq;
mod error;
mod event;
mod health;
pub mod metrics;
mod producer;
mod registry;
mod retry;
mod worker;

pub use config::WorkerConfig;
pub use consumer::{ReadBatch, StreamConsumer, StreamInfo};
pub use dlq::{DlqEntry, DlqManager, DlqStats};
pub use error::{ErrorCategory, StreamError};
pub use event::{PoisonMessage, StreamEvent};
pub use health::{full_admin_router, health_router, HealthState};
pub use crate::metrics::{init_metrics, render_metrics, StreamMetrics};
pub use producer::StreamProducer;
pub use registry::{StreamDef, StreamJob, StreamProcessor};
pub use retry::{Backoff, RetryPolicy};
pub use worker::StreamWorker;
