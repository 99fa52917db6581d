//! Review Worker Service - Entry Point
//!
//! Background worker that processes review jobs from the Redis stream.

#[tokio::main]
async fn main() -> eyre::Result<()> {
    vouch_review_worker::run().await
}
