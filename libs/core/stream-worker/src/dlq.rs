//! Dead Letter Queue management.
//!
//! Failed jobs that exhaust their retries, jobs that hit a permanent error,
//! and undecodable stream entries land here for operator inspection.

use crate::error::StreamError;
use crate::event::PoisonMessage;
use crate::registry::StreamJob;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

type StreamEntries = Vec<(String, Vec<(String, String)>)>;

/// Dead Letter Queue manager for one DLQ stream.
#[derive(Clone)]
pub struct DlqManager {
    redis: ConnectionManager,
    dlq_stream: String,
    max_length: i64,
}

impl DlqManager {
    pub fn new(redis: ConnectionManager, dlq_stream: impl Into<String>) -> Self {
        Self {
            redis,
            dlq_stream: dlq_stream.into(),
            max_length: 10_000,
        }
    }

    pub fn with_max_length(mut self, max_length: i64) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn dlq_stream(&self) -> &str {
        &self.dlq_stream
    }

    /// Move a failed job to the dead letter queue.
    pub async fn move_to_dlq<J: StreamJob>(
        &self,
        job: &J,
        error: &str,
        original_stream_id: &str,
    ) -> Result<String, StreamError> {
        let entry = DlqEntry {
            job_id: job.job_id(),
            job_data: serde_json::to_value(job)?,
            error: error.to_string(),
            original_stream_id: original_stream_id.to_string(),
            retry_count: job.retry_count(),
            failed_at: Utc::now(),
        };

        let dlq_id = self.append(&entry).await?;

        info!(
            job_id = %job.job_id(),
            dlq_id = %dlq_id,
            error = %error,
            retry_count = job.retry_count(),
            "Moved job to DLQ"
        );

        Ok(dlq_id)
    }

    /// Move an undecodable stream entry to the DLQ, preserving the raw
    /// payload for inspection.
    pub async fn move_poison(&self, poison: &PoisonMessage) -> Result<String, StreamError> {
        let entry = DlqEntry {
            job_id: format!("poison-{}", poison.stream_id),
            job_data: serde_json::Value::String(poison.raw.clone()),
            error: poison.error.clone(),
            original_stream_id: poison.stream_id.clone(),
            retry_count: 0,
            failed_at: Utc::now(),
        };

        let dlq_id = self.append(&entry).await?;

        warn!(
            stream_id = %poison.stream_id,
            dlq_id = %dlq_id,
            error = %poison.error,
            "Moved undecodable message to DLQ"
        );

        Ok(dlq_id)
    }

    async fn append(&self, entry: &DlqEntry) -> Result<String, StreamError> {
        let data = serde_json::to_string(entry)?;
        let mut conn = self.redis.clone();

        let dlq_id: String = redis::cmd("XADD")
            .arg(&self.dlq_stream)
            .arg("MAXLEN")
            .arg("~")
            .arg(self.max_length)
            .arg("*")
            .arg("data")
            .arg(&data)
            .query_async(&mut conn)
            .await?;

        Ok(dlq_id)
    }

    /// DLQ statistics.
    pub async fn stats(&self) -> Result<DlqStats, StreamError> {
        let mut conn = self.redis.clone();

        let length: i64 = redis::cmd("XLEN")
            .arg(&self.dlq_stream)
            .query_async(&mut conn)
            .await
            .unwrap_or(0);

        let oldest: Option<StreamEntries> = redis::cmd("XRANGE")
            .arg(&self.dlq_stream)
            .arg("-")
            .arg("+")
            .arg("COUNT")
            .arg(1)
            .query_async(&mut conn)
            .await
            .ok();

        let newest: Option<StreamEntries> = redis::cmd("XREVRANGE")
            .arg(&self.dlq_stream)
            .arg("+")
            .arg("-")
            .arg("COUNT")
            .arg(1)
            .query_async(&mut conn)
            .await
            .ok();

        let oldest_entry_id = oldest.and_then(|v| v.first().map(|(id, _)| id.clone()));
        let newest_entry_id = newest.and_then(|v| v.first().map(|(id, _)| id.clone()));

        Ok(DlqStats {
            stream_name: self.dlq_stream.clone(),
            length,
            oldest_entry_id,
            newest_entry_id,
        })
    }

    /// List DLQ entries, oldest first.
    pub async fn list(
        &self,
        count: usize,
        offset: Option<&str>,
    ) -> Result<Vec<DlqEntry>, StreamError> {
        let mut conn = self.redis.clone();

        let start = offset.unwrap_or("-");

        let entries: StreamEntries = redis::cmd("XRANGE")
            .arg(&self.dlq_stream)
            .arg(start)
            .arg("+")
            .arg("COUNT")
            .arg(count)
            .query_async(&mut conn)
            .await?;

        let mut results = Vec::new();

        for (_id, fields) in entries {
            if let Some(data) = fields.iter().find(|(k, _)| k == "data").map(|(_, v)| v) {
                if let Ok(entry) = serde_json::from_str::<DlqEntry>(data) {
                    results.push(entry);
                }
            }
        }

        Ok(results)
    }

    /// Get a specific DLQ entry by its stream ID.
    pub async fn get(&self, dlq_id: &str) -> Result<Option<DlqEntry>, StreamError> {
        let mut conn = self.redis.clone();

        let entries: StreamEntries = redis::cmd("XRANGE")
            .arg(&self.dlq_stream)
            .arg(dlq_id)
            .arg(dlq_id)
            .query_async(&mut conn)
            .await?;

        if let Some((_id, fields)) = entries.first() {
            if let Some(data) = fields.iter().find(|(k, _)| k == "data").map(|(_, v)| v) {
                return Ok(serde_json::from_str(data).ok());
            }
        }

        Ok(None)
    }

    /// Delete an entry from the DLQ.
    pub async fn delete(&self, dlq_id: &str) -> Result<bool, StreamError> {
        let mut conn = self.redis.clone();

        let deleted: i64 = redis::cmd("XDEL")
            .arg(&self.dlq_stream)
            .arg(dlq_id)
            .query_async(&mut conn)
            .await?;

        debug!(dlq_id = %dlq_id, "Deleted DLQ entry");

        Ok(deleted > 0)
    }

    /// Purge all entries from the DLQ. Returns how many were dropped.
    pub async fn purge(&self) -> Result<i64, StreamError> {
        let mut conn = self.redis.clone();

        let length: i64 = redis::cmd("XLEN")
            .arg(&self.dlq_stream)
            .query_async(&mut conn)
            .await?;

        if length > 0 {
            let _: () = redis::cmd("XTRIM")
                .arg(&self.dlq_stream)
                .arg("MAXLEN")
                .arg(0)
                .query_async(&mut conn)
                .await?;

            info!(count = length, "Purged DLQ");
        }

        Ok(length)
    }
}

/// One dead-lettered job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DlqEntry {
    /// Original job ID
    pub job_id: String,

    /// Serialized job data (or the raw payload for poison messages)
    pub job_data: serde_json::Value,

    /// Error message that caused the failure
    pub error: String,

    /// Original stream entry ID
    pub original_stream_id: String,

    /// Number of failed attempts before dead-lettering
    pub retry_count: u32,

    /// When the job was moved to the DLQ
    pub failed_at: DateTime<Utc>,
}

/// DLQ statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DlqStats {
    pub stream_name: String,
    pub length: i64,
    pub oldest_entry_id: Option<String>,
    pub newest_entry_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dlq_entry_serialization() {
        let entry = DlqEntry {
            job_id: "job-1".to_string(),
            job_data: serde_json::json!({"rating": 1}),
            error: "provider unavailable".to_string(),
            original_stream_id: "1234567890123-0".to_string(),
            retry_count: 3,
            failed_at: Utc::now(),
        };

        let json = serde_json::to_string(&entry).unwrap();
        let decoded: DlqEntry = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded.job_id, "job-1");
        assert_eq!(decoded.retry_count, 3);
        assert_eq!(decoded.error, "provider unavailable");
    }
}
