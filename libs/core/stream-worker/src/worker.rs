//! The generic stream worker loop.

use crate::config::WorkerConfig;
use crate::consumer::StreamConsumer;
use crate::dlq::DlqManager;
use crate::error::StreamError;
use crate::event::StreamEvent;
use crate::metrics::StreamMetrics;
use crate::registry::{StreamJob, StreamProcessor};
use redis::aio::ConnectionManager;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Generic stream worker that feeds jobs from one stream into a processor.
///
/// The loop provides:
/// - consumer group management (created on startup if missing)
/// - recovery of pending and abandoned deliveries (at-least-once)
/// - retry with the job type's declared backoff policy
/// - dead-lettering of exhausted, permanent, and undecodable jobs
/// - graceful shutdown via a `watch` channel
///
/// Jobs are processed one at a time per worker instance; throughput scales
/// horizontally by running more instances against the same consumer group.
pub struct StreamWorker<J, P>
where
    J: StreamJob,
    P: StreamProcessor<J>,
{
    consumer: StreamConsumer,
    dlq: DlqManager,
    processor: Arc<P>,
    metrics: StreamMetrics,
    config: WorkerConfig,
    _phantom: PhantomData<J>,
}

impl<J, P> StreamWorker<J, P>
where
    J: StreamJob + 'static,
    P: StreamProcessor<J> + 'static,
{
    /// Create a new stream worker.
    pub fn new(redis: ConnectionManager, processor: P, config: WorkerConfig) -> Self {
        Self::with_arc_processor(redis, Arc::new(processor), config)
    }

    /// Create a new stream worker from an already shared processor.
    pub fn with_arc_processor(
        redis: ConnectionManager,
        processor: Arc<P>,
        config: WorkerConfig,
    ) -> Self {
        let consumer = StreamConsumer::new(redis.clone(), config.clone());
        let dlq = DlqManager::new(redis, config.dlq_stream.clone());
        let metrics = StreamMetrics::new(config.stream_name.clone(), processor.name());

        Self {
            consumer,
            dlq,
            processor,
            metrics,
            config,
            _phantom: PhantomData,
        }
    }

    /// Get a reference to the consumer (for health checks).
    pub fn consumer(&self) -> &StreamConsumer {
        &self.consumer
    }

    /// Get a clone of the Redis connection handle.
    pub fn redis(&self) -> ConnectionManager {
        self.consumer.redis()
    }

    /// Run the worker loop until the shutdown signal flips to `true`.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), StreamError> {
        info!(
            consumer_id = %self.config.consumer_id,
            stream = %self.config.stream_name,
            group = %self.config.consumer_group,
            processor = %self.processor.name(),
            "Starting stream worker"
        );

        self.consumer.ensure_consumer_group().await?;

        // Workers restarted under a new consumer ID would otherwise leave
        // their old deliveries pending until the idle-claim kicks in.
        match self.consumer.claim_all_pending_on_startup().await {
            Ok(claimed) if claimed > 0 => self.metrics.messages_claimed(claimed),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Failed to claim pending messages on startup"),
        }

        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);
        let claim_interval = Duration::from_millis(self.config.claim_idle_ms.max(1000) * 2);
        let mut last_claim = std::time::Instant::now();
        let is_blocking = self.config.is_blocking();

        let mut consecutive_errors: u32 = 0;
        const MAX_BACKOFF_SECS: u64 = 30;

        info!(
            block_timeout_ms = ?self.config.block_timeout_ms,
            poll_interval_ms = %self.config.poll_interval_ms,
            batch_size = %self.config.batch_size,
            claim_idle_ms = %self.config.claim_idle_ms,
            "Worker loop configuration"
        );

        loop {
            if *shutdown.borrow() {
                info!("Received shutdown signal, stopping worker");
                break;
            }

            match self.process_batch().await {
                Ok(_) => {
                    if consecutive_errors > 0 {
                        info!("Connection recovered after {} errors", consecutive_errors);
                        consecutive_errors = 0;
                    }
                }
                Err(e) => {
                    consecutive_errors += 1;

                    if e.is_nogroup_error() {
                        warn!("Consumer group missing, recreating...");
                        if let Err(create_err) = self.consumer.ensure_consumer_group().await {
                            error!(error = %create_err, "Failed to recreate consumer group");
                        }
                    } else if e.is_connection_error() {
                        let backoff_secs =
                            std::cmp::min(2u64.pow(consecutive_errors.min(5)), MAX_BACKOFF_SECS);
                        warn!(
                            error = %e,
                            consecutive_errors = %consecutive_errors,
                            backoff_secs = %backoff_secs,
                            "Redis connection error, backing off"
                        );
                        tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                    } else {
                        error!(error = %e, "Error processing batch");
                    }

                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            }

            // Periodically reclaim leases abandoned by crashed workers.
            if last_claim.elapsed() >= claim_interval {
                match self.consumer.claim_abandoned().await {
                    Ok(claimed) if claimed > 0 => self.metrics.messages_claimed(claimed),
                    Ok(_) => {}
                    Err(e) => debug!(error = %e, "Error claiming abandoned messages"),
                }
                last_claim = std::time::Instant::now();
            }

            // In blocking mode, XREADGROUP BLOCK already paces the loop.
            if !is_blocking {
                tokio::select! {
                    _ = shutdown.changed() => {
                        if *shutdown.borrow() {
                            info!("Received shutdown signal, stopping worker");
                            break;
                        }
                    }
                    _ = tokio::time::sleep(poll_interval) => {}
                }
            }
        }

        info!("Stream worker stopped");
        Ok(())
    }

    /// Read pending and new deliveries and process them sequentially.
    async fn process_batch(&self) -> Result<(), StreamError> {
        let pending = self.consumer.read_pending::<J>().await?;
        let new = self.consumer.read_new::<J>().await?;

        if pending.is_empty() && new.is_empty() {
            return Ok(());
        }

        for poison in pending.poison.iter().chain(new.poison.iter()) {
            // Redelivering an undecodable entry can never succeed; park it.
            if let Err(e) = self.dlq.move_poison(poison).await {
                error!(stream_id = %poison.stream_id, error = %e, "Failed to DLQ poison message");
                continue;
            }
            self.metrics.job_dead_lettered();
            if let Err(e) = self.consumer.ack(&poison.stream_id).await {
                error!(stream_id = %poison.stream_id, error = %e, "Failed to ACK poison message");
            }
        }

        for event in pending.events.into_iter().chain(new.events) {
            self.process_event(&event).await;
        }

        Ok(())
    }

    /// Process a single delivery and settle it (ack / retry / DLQ).
    async fn process_event(&self, event: &StreamEvent<J>) {
        self.metrics.job_received();

        debug!(
            stream_id = %event.stream_id,
            job_id = %event.job_id(),
            retry_count = %event.retry_count(),
            queue_latency_ms = %event.age_ms(),
            "Processing job"
        );

        let start = std::time::Instant::now();

        match self.processor.process(&event.job).await {
            Ok(()) => {
                self.metrics.job_processed(start.elapsed());

                if let Err(e) = self.consumer.ack(&event.stream_id).await {
                    error!(stream_id = %event.stream_id, error = %e, "Failed to ACK message");
                }
            }
            Err(e) => {
                let category = e.category();
                self.metrics.job_failed(category.as_str());

                warn!(
                    stream_id = %event.stream_id,
                    job_id = %event.job_id(),
                    error = %e,
                    error_category = ?category,
                    "Job processing failed"
                );

                if let Err(handler_err) = self.handle_job_error(event, e).await {
                    error!(
                        stream_id = %event.stream_id,
                        error = %handler_err,
                        "Failed to handle job error"
                    );
                    // Still ACK so the delivery doesn't loop forever.
                    let _ = self.consumer.ack(&event.stream_id).await;
                }
            }
        }
    }

    /// Settle a failed delivery according to the error category and the
    /// job's retry policy.
    async fn handle_job_error(
        &self,
        event: &StreamEvent<J>,
        error: StreamError,
    ) -> Result<(), StreamError> {
        let job = &event.job;
        let policy = job.retry_policy();
        let category = error.category();

        if !category.should_retry() {
            warn!(
                job_id = %job.job_id(),
                error_category = ?category,
                "Permanent error, moving to DLQ without retry"
            );

            self.dlq
                .move_to_dlq(job, &error.to_string(), &event.stream_id)
                .await?;
            self.metrics.job_dead_lettered();
            self.consumer.ack(&event.stream_id).await?;
            return Ok(());
        }

        if policy.is_exhausted(job.retry_count()) {
            warn!(
                job_id = %job.job_id(),
                max_attempts = %policy.max_attempts,
                "Job exhausted its attempts, moving to DLQ"
            );

            self.dlq
                .move_to_dlq(job, &error.to_string(), &event.stream_id)
                .await?;
            self.metrics.job_dead_lettered();
            self.consumer.ack(&event.stream_id).await?;
            return Ok(());
        }

        let delay = policy.delay_for_attempt(job.retry_count());

        info!(
            job_id = %job.job_id(),
            retry_attempt = %(job.retry_count() + 1),
            delay_ms = %delay.as_millis(),
            "Scheduling job retry with backoff"
        );

        // One job at a time per instance: sleeping here is what spaces the
        // job's attempts apart.
        tokio::time::sleep(delay).await;

        let retry_job = job.with_retry();
        self.consumer.requeue(&retry_job).await?;
        self.metrics.job_retried();
        self.consumer.ack(&event.stream_id).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryPolicy;
    use serde::{Deserialize, Serialize};

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

        fn retry_policy(&self) -> RetryPolicy {
            RetryPolicy::fixed(3, 10)
        }
    }

    #[test]
    fn test_job_retry_lifecycle() {
        let job = TestJob {
            id: "job-1".to_string(),
            retry_count: 0,
        };
        let policy = job.retry_policy();

        assert!(!policy.is_exhausted(job.retry_count()));

        let second = job.with_retry();
        let third = second.with_retry();
        assert_eq!(third.retry_count(), 2);
        assert!(policy.is_exhausted(third.retry_count()));
    }
}
