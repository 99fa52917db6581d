//! Stream consumer for Redis operations.
//!
//! Handles consumer-group reads, acknowledgement, requeueing, and lease
//! reclaim for a single stream.

use crate::config::WorkerConfig;
use crate::error::StreamError;
use crate::event::{PoisonMessage, StreamEvent};
use crate::registry::StreamJob;
use redis::aio::ConnectionManager;
use redis::RedisResult;
use tracing::{debug, info, warn};

type StreamEntries = Vec<(String, Vec<(String, String)>)>;
type StreamReadReply = Vec<(String, StreamEntries)>;

/// One batch of deliveries: decoded jobs plus entries that failed to decode.
#[derive(Debug)]
pub struct ReadBatch<J: StreamJob> {
    pub events: Vec<StreamEvent<J>>,
    pub poison: Vec<PoisonMessage>,
}

impl<J: StreamJob> ReadBatch<J> {
    fn empty() -> Self {
        Self {
            events: Vec::new(),
            poison: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.poison.is_empty()
    }

    fn merge(mut self, other: ReadBatch<J>) -> Self {
        self.events.extend(other.events);
        self.poison.extend(other.poison);
        self
    }
}

/// Stream consumer bound to one stream and consumer group.
pub struct StreamConsumer {
    redis: ConnectionManager,
    config: WorkerConfig,
}

impl StreamConsumer {
    pub fn new(redis: ConnectionManager, config: WorkerConfig) -> Self {
        Self { redis, config }
    }

    /// Get a clone of the Redis connection handle.
    pub fn redis(&self) -> ConnectionManager {
        self.redis.clone()
    }

    pub fn stream_name(&self) -> &str {
        &self.config.stream_name
    }

    pub fn consumer_group(&self) -> &str {
        &self.config.consumer_group
    }

    pub fn consumer_id(&self) -> &str {
        &self.config.consumer_id
    }

    /// Create the consumer group if it doesn't exist yet (MKSTREAM creates
    /// the stream as well, so workers can start before the first enqueue).
    pub async fn ensure_consumer_group(&self) -> Result<(), StreamError> {
        let mut conn = self.redis.clone();

        let result: RedisResult<()> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg("0")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;

        match result {
            Ok(_) => {
                info!(
                    stream = %self.config.stream_name,
                    group = %self.config.consumer_group,
                    "Created consumer group"
                );
            }
            Err(e) if e.to_string().contains("BUSYGROUP") => {
                debug!(
                    stream = %self.config.stream_name,
                    group = %self.config.consumer_group,
                    "Consumer group already exists"
                );
            }
            Err(e) => return Err(StreamError::Redis(e)),
        }

        Ok(())
    }

    /// Read this consumer's pending messages (delivered but not yet ACKed,
    /// including entries claimed from crashed workers).
    pub async fn read_pending<J: StreamJob>(&self) -> Result<ReadBatch<J>, StreamError> {
        let mut conn = self.redis.clone();

        let result: RedisResult<Option<StreamReadReply>> = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(&self.config.consumer_group)
            .arg(&self.config.consumer_id)
            .arg("COUNT")
            .arg(self.config.batch_size)
            .arg("STREAMS")
            .arg(&self.config.stream_name)
            .arg("0")
            .query_async(&mut conn)
            .await;

        match result {
            Ok(Some(streams)) => Ok(self.parse_stream_response(streams)),
            Ok(None) => Ok(ReadBatch::empty()),
            Err(e) if e.to_string().contains("NOGROUP") => Ok(ReadBatch::empty()),
            Err(e) => Err(StreamError::Redis(e)),
        }
    }

    /// Read new messages from the stream, blocking up to the configured
    /// timeout when in blocking mode.
    pub async fn read_new<J: StreamJob>(&self) -> Result<ReadBatch<J>, StreamError> {
        let mut conn = self.redis.clone();

        let mut cmd = redis::cmd("XREADGROUP");
        cmd.arg("GROUP")
            .arg(&self.config.consumer_group)
            .arg(&self.config.consumer_id);

        if let Some(timeout) = self.config.block_timeout_ms {
            cmd.arg("BLOCK").arg(timeout);
        }

        cmd.arg("COUNT")
            .arg(self.config.batch_size)
            .arg("STREAMS")
            .arg(&self.config.stream_name)
            .arg(">");

        let result: RedisResult<Option<StreamReadReply>> = cmd.query_async(&mut conn).await;

        match result {
            Ok(Some(streams)) => Ok(self.parse_stream_response(streams)),
            // Nil reply: blocking read timed out with no messages.
            Ok(None) => Ok(ReadBatch::empty()),
            Err(e) if e.to_string().contains("NOGROUP") => Ok(ReadBatch::empty()),
            Err(e) => Err(StreamError::Redis(e)),
        }
    }

    /// Acknowledge a delivery.
    pub async fn ack(&self, stream_id: &str) -> Result<(), StreamError> {
        let mut conn = self.redis.clone();

        let _: i64 = redis::cmd("XACK")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg(stream_id)
            .query_async(&mut conn)
            .await?;

        debug!(stream_id = %stream_id, "Acknowledged message");
        Ok(())
    }

    /// Requeue a job as a fresh stream entry (used for retries; the original
    /// delivery is ACKed separately).
    pub async fn requeue<J: StreamJob>(&self, job: &J) -> Result<String, StreamError> {
        let mut conn = self.redis.clone();

        let job_json = serde_json::to_string(job)?;

        let stream_id: String = redis::cmd("XADD")
            .arg(&self.config.stream_name)
            .arg("MAXLEN")
            .arg("~")
            .arg(self.config.max_length)
            .arg("*")
            .arg("job")
            .arg(&job_json)
            .query_async(&mut conn)
            .await?;

        debug!(
            job_id = %job.job_id(),
            retry_count = %job.retry_count(),
            stream_id = %stream_id,
            "Requeued job"
        );

        Ok(stream_id)
    }

    /// Claim messages whose lease has been idle longer than the configured
    /// claim timeout (their consumer crashed or stalled). Claimed entries
    /// surface through `read_pending` on the next iteration.
    pub async fn claim_abandoned(&self) -> Result<u64, StreamError> {
        self.autoclaim(self.config.claim_idle_ms).await
    }

    /// Claim ALL pending messages regardless of idle time.
    ///
    /// Used on startup: frequently-restarted workers get fresh consumer IDs,
    /// so entries pending under old IDs would otherwise sit until the idle
    /// claim kicks in.
    pub async fn claim_all_pending_on_startup(&self) -> Result<u64, StreamError> {
        let claimed = self.autoclaim(0).await?;

        if claimed > 0 {
            info!(
                count = claimed,
                consumer = %self.config.consumer_id,
                "Claimed pending messages on startup"
            );
        }

        Ok(claimed)
    }

    /// XAUTOCLAIM with the given minimum idle time, paginating until the
    /// cursor wraps. Returns the number of claimed entries.
    async fn autoclaim(&self, min_idle_ms: u64) -> Result<u64, StreamError> {
        let mut conn = self.redis.clone();
        let mut total_claimed: u64 = 0;
        let mut cursor = "0-0".to_string();

        loop {
            let result: RedisResult<redis::Value> = redis::cmd("XAUTOCLAIM")
                .arg(&self.config.stream_name)
                .arg(&self.config.consumer_group)
                .arg(&self.config.consumer_id)
                .arg(min_idle_ms)
                .arg(&cursor)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await;

            let value = match result {
                Ok(v) => v,
                Err(e) if e.to_string().contains("NOGROUP") => return Ok(total_claimed),
                Err(e) => return Err(StreamError::Redis(e)),
            };

            // Reply: [next-cursor, [[id, fields], ...], [deleted-ids]]
            let redis::Value::Array(parts) = value else {
                break;
            };
            if parts.len() < 2 {
                break;
            }

            let next_cursor = match &parts[0] {
                redis::Value::BulkString(bytes) => String::from_utf8_lossy(bytes).to_string(),
                redis::Value::SimpleString(s) => s.clone(),
                _ => break,
            };

            if let redis::Value::Array(messages) = &parts[1] {
                total_claimed += messages.len() as u64;
                if messages.is_empty() && next_cursor == "0-0" {
                    break;
                }
            } else {
                break;
            }

            if next_cursor == "0-0" {
                break;
            }
            cursor = next_cursor;
        }

        if total_claimed > 0 {
            warn!(
                count = total_claimed,
                consumer = %self.config.consumer_id,
                "Claimed abandoned messages"
            );
        }

        Ok(total_claimed)
    }

    /// Queue depth and pending count, for monitoring.
    pub async fn stream_info(&self) -> Result<StreamInfo, StreamError> {
        let mut conn = self.redis.clone();

        let length: i64 = redis::cmd("XLEN")
            .arg(&self.config.stream_name)
            .query_async(&mut conn)
            .await?;

        let pending: RedisResult<(i64, Option<String>, Option<String>, Option<Vec<(String, i64)>>)> =
            redis::cmd("XPENDING")
                .arg(&self.config.stream_name)
                .arg(&self.config.consumer_group)
                .query_async(&mut conn)
                .await;

        let pending_count = pending.map(|(count, _, _, _)| count).unwrap_or(0);

        Ok(StreamInfo {
            stream_name: self.config.stream_name.clone(),
            length,
            pending_count,
            consumer_group: self.config.consumer_group.clone(),
        })
    }

    fn parse_stream_response<J: StreamJob>(&self, streams: StreamReadReply) -> ReadBatch<J> {
        streams
            .into_iter()
            .map(|(_stream_name, entries)| parse_entries(entries))
            .fold(ReadBatch::empty(), ReadBatch::merge)
    }
}

/// Decode raw stream entries into jobs, diverting undecodable entries into
/// the poison list.
fn parse_entries<J: StreamJob>(entries: StreamEntries) -> ReadBatch<J> {
    let mut batch = ReadBatch::empty();

    for (stream_id, fields) in entries {
        let job_json = fields
            .iter()
            .find(|(k, _)| k == "job")
            .map(|(_, v)| v.as_str());

        let Some(json) = job_json else {
            warn!(stream_id = %stream_id, "Missing 'job' field in message");
            batch.poison.push(PoisonMessage {
                stream_id,
                raw: format!("{:?}", fields),
                error: "missing 'job' field".to_string(),
            });
            continue;
        };

        match serde_json::from_str::<J>(json) {
            Ok(job) => batch.events.push(StreamEvent::new(stream_id, job)),
            Err(e) => {
                warn!(stream_id = %stream_id, error = %e, "Failed to decode job");
                batch.poison.push(PoisonMessage {
                    stream_id,
                    raw: json.to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    batch
}

/// Stream monitoring snapshot.
#[derive(Debug, Clone)]
pub struct StreamInfo {
    pub stream_name: String,
    pub length: i64,
    pub pending_count: i64,
    pub consumer_group: String,
}
