//! Stream definition for the notifications domain.

use stream_worker::StreamDef;

/// Email jobs stream.
///
/// Produced by the review worker, consumed by the email worker.
pub struct EmailStream;

impl StreamDef for EmailStream {
    const STREAM_NAME: &'static str = "emails:jobs";
    const CONSUMER_GROUP: &'static str = "email_workers";
    const DLQ_STREAM: &'static str = "emails:dlq";
    const MAX_LENGTH: i64 = 100_000;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_stream_def() {
        assert_eq!(EmailStream::stream_name(), "emails:jobs");
        assert_eq!(EmailStream::consumer_group(), "email_workers");
        assert_eq!(EmailStream::dlq_stream(), "emails:dlq");
    }
}
