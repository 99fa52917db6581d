//! Stream definition for the reviews domain.

use stream_worker::StreamDef;

/// Review jobs stream.
///
/// Produced by the submission API, consumed by the review worker.
pub struct ReviewStream;

impl StreamDef for ReviewStream {
    const STREAM_NAME: &'static str = "reviews:jobs";
    const CONSUMER_GROUP: &'static str = "review_workers";
    const DLQ_STREAM: &'static str = "reviews:dlq";
    const MAX_LENGTH: i64 = 100_000;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_stream_def() {
        assert_eq!(ReviewStream::stream_name(), "reviews:jobs");
        assert_eq!(ReviewStream::consumer_group(), "review_workers");
        assert_eq!(ReviewStream::dlq_stream(), "reviews:dlq");
    }
}
