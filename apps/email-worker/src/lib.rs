//! Email Worker Service
//!
//! Background worker that delivers negative-review alert emails from the
//! Redis stream. Delivery retries up to 3 attempts with a fixed 10-second
//! backoff, then dead-letters the job; a missed notification never blocks
//! anything else.
//!
//! ## Architecture
//!
//! ```text
//! Redis Stream (emails:jobs)
//!   ↓ (Consumer Group: email_workers)
//! StreamWorker<EmailJob, EmailProcessor>
//!   ↓ render (handlebars)
//!   ↓ send   (Brevo HTTP API, or SMTP for local dev)
//! ```

use axum::Router;
use core_config::{app_info, env_or_default, Environment, FromEnv};
use database::redis::RedisConfig;
use domain_notifications::{
    BrevoProvider, EmailJob, EmailProcessor, EmailProvider, EmailStream, SmtpProvider,
    TemplateEngine,
};
use eyre::{Result, WrapErr};
use redis::aio::ConnectionManager;
use stream_worker::{
    full_admin_router, metrics, HealthState, StreamWorker, WorkerConfig,
};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

/// Start the health and admin HTTP server.
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

/// Run the email worker.
pub async fn run() -> Result<()> {
    let environment = Environment::from_env();
    core_config::tracing::init_tracing(&environment);

    metrics::init_metrics();

    let app_info = app_info!();

    info!(name = %app_info.name, version = %app_info.version, "Starting email worker service");
    info!("Environment: {:?}", environment);

    let health_port: u16 = std::env::var("EMAIL_WORKER_HEALTH_PORT")
        .or_else(|_| std::env::var("HEALTH_PORT"))
        .unwrap_or_else(|_| "8082".to_string())
        .parse()
        .unwrap_or(8082);

    let redis_config = RedisConfig::from_env().wrap_err("Failed to load Redis configuration")?;

    info!("Connecting to Redis...");
    let redis = database::redis::connect_from_config_with_retry(redis_config, None)
        .await
        .wrap_err("Failed to connect to Redis")?;

    let worker_config = WorkerConfig::from_stream_def::<EmailStream>().with_block(Some(1000));
    info!(
        stream = %worker_config.stream_name,
        consumer_group = %worker_config.consumer_group,
        consumer_id = %worker_config.consumer_id,
        "Worker configuration loaded"
    );

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

    let templates = TemplateEngine::new().wrap_err("Failed to build template engine")?;

    // Provider selected at startup: Brevo in deployed environments, SMTP
    // for local development against a mail catcher.
    let provider_name = env_or_default("EMAIL_PROVIDER", "brevo");
    info!(provider = %provider_name, "Email provider selected");

    match provider_name.as_str() {
        "smtp" => {
            let provider = SmtpProvider::from_env()
                .map_err(|e| eyre::eyre!("Failed to configure SMTP provider: {}", e))?;
            run_worker(redis, EmailProcessor::new(provider, templates), worker_config, shutdown_rx)
                .await?;
        }
        _ => {
            let provider = BrevoProvider::from_env()
                .map_err(|e| eyre::eyre!("Failed to configure Brevo provider: {}", e))?;
            run_worker(redis, EmailProcessor::new(provider, templates), worker_config, shutdown_rx)
                .await?;
        }
    }

    info!("Email worker service stopped");
    Ok(())
}

async fn run_worker<P: EmailProvider + 'static>(
    redis: ConnectionManager,
    processor: EmailProcessor<P>,
    config: WorkerConfig,
    shutdown: watch::Receiver<bool>,
) -> Result<()> {
    info!("Starting email job processor...");
    let worker = StreamWorker::<EmailJob, _>::new(redis, processor, config);
    worker
        .run(shutdown)
        .await
        .map_err(|e| eyre::eyre!("{}", e))
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
