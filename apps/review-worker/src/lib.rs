//! Review Worker Service
//!
//! Background worker that processes review submissions from the Redis
//! stream: classifies the text, persists the review, and fans out a
//! negative-review alert job when warranted.
//!
//! ## Architecture
//!
//! ```text
//! Redis Stream (reviews:jobs)
//!   ↓ (Consumer Group: review_workers)
//! StreamWorker<ReviewJob, ReviewProcessor>
//!   ↓ classify (Hugging Face, soft failure)
//!   ↓ persist  (PostgreSQL, retryable)
//!   ↓ alert    (emails:jobs, best-effort, negative sentiment only)
//! ```

use axum::Router;
use core_config::{app_info, Environment, FromEnv};
use database::postgres::PostgresConfig;
use database::redis::RedisConfig;
use domain_notifications::EmailStream;
use domain_reviews::{
    HuggingFaceClassifier, PgReviewStore, ReviewJob, ReviewProcessor, ReviewStream,
};
use eyre::{Result, WrapErr};
use stream_worker::{
    full_admin_router, metrics, HealthState, StreamProducer, StreamWorker, WorkerConfig,
};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

/// Start the health and admin HTTP server.
///
/// Provides liveness/readiness probes, stream monitoring, Prometheus
/// metrics, and DLQ admin endpoints.
async fn start_health_server(health_state: HealthState, port: u16) -> Result<()> {
    let app: Router = full_admin_router(health_state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr)
        .await
        .wrap_err_with(|| format!("Failed to bind health server to {}", addr))?;

    info!(port = %port, "Health and admin server listening");

    axum::serve(listener, app)
        .await
        .wrap_err("Health server failed")?;

    Ok(())
}

/// Run the review worker.
pub async fn run() -> Result<()> {
    let environment = Environment::from_env();
    core_config::tracing::init_tracing(&environment);

    metrics::init_metrics();

    let app_info = app_info!();

    info!(name = %app_info.name, version = %app_info.version, "Starting review worker service");
    info!("Environment: {:?}", environment);

    let health_port: u16 = std::env::var("REVIEW_WORKER_HEALTH_PORT")
        .or_else(|_| std::env::var("HEALTH_PORT"))
        .unwrap_or_else(|_| "8081".to_string())
        .parse()
        .unwrap_or(8081);

    let pg_config =
        PostgresConfig::from_env().wrap_err("Failed to load PostgreSQL configuration")?;

    info!("Connecting to PostgreSQL...");
    let db = database::postgres::connect_from_config_with_retry(pg_config, None)
        .await
        .wrap_err("Failed to connect to PostgreSQL")?;

    let redis_config = RedisConfig::from_env().wrap_err("Failed to load Redis configuration")?;

    info!("Connecting to Redis...");
    let redis = database::redis::connect_from_config_with_retry(redis_config, None)
        .await
        .wrap_err("Failed to connect to Redis")?;

    // Block for 1 second per read: instant delivery, clean shutdown checks.
    let worker_config = WorkerConfig::from_stream_def::<ReviewStream>().with_block(Some(1000));
    info!(
        stream = %worker_config.stream_name,
        consumer_group = %worker_config.consumer_group,
        consumer_id = %worker_config.consumer_id,
        "Worker configuration loaded"
    );

    let store = PgReviewStore::new(db);
    let classifier =
        HuggingFaceClassifier::from_env().wrap_err("Failed to configure classifier")?;
    let alerts = StreamProducer::from_stream_def::<EmailStream>(redis.clone());

    let processor = ReviewProcessor::new(store, classifier, alerts);
    info!("Review processor initialized");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if let Err(e) = shutdown_signal().await {
            error!("Error waiting for shutdown signal: {}", e);
        }
        let _ = shutdown_tx.send(true);
    });

    let health_state = HealthState::new(
        redis.clone(),
        app_info.name,
        app_info.version,
        worker_config.stream_name.clone(),
    );

    tokio::spawn(async move {
        if let Err(e) = start_health_server(health_state, health_port).await {
            error!(error = %e, "Health server failed");
        }
    });

    info!("Starting review job processor...");
    let worker = StreamWorker::<ReviewJob, _>::new(redis, processor, worker_config);
    worker
        .run(shutdown_rx)
        .await
        .map_err(|e| eyre::eyre!("{}", e))?;

    info!("Review worker service stopped");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        },
    }

    Ok(())
}
