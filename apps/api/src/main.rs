//! Review Submission API
//!
//! Public fire-and-forget endpoint that validates review submissions and
//! queues them for the review worker. The submitter always gets an
//! immediate 202; processing outcomes surface only in worker logs and the
//! DLQ. Everything else the product's web application does (spaces CRUD,
//! auth, dashboards) lives outside this service.

use axum::{routing::get, Json, Router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_reviews::{submission_router, SubmissionState};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

mod config;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!(
        name = %config.app.name,
        version = %config.app.version,
        "Starting review submission API"
    );

    info!("Connecting to Redis...");
    let redis = database::redis::connect_from_config_with_retry(config.redis.clone(), None)
        .await
        .map_err(|e| eyre::eyre!("Redis connection failed: {}", e))?;

    let state = AppState {
        config: config.clone(),
        redis,
    };

    let app_name = config.app.name;
    let app_version = config.app.version;

    let app = Router::new()
        .route(
            "/health",
            get(move || async move {
                Json(json!({
                    "status": "healthy",
                    "name": app_name,
                    "version": app_version,
                }))
            }),
        )
        .merge(submission_router(SubmissionState::new(state.redis.clone())));

    let addr = state.config.server.address();
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Review submission API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Review submission API stopped");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
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
}
