//! Health and admin endpoints for stream workers.
//!
//! Reusable axum handlers for:
//! - Liveness probes (`/health`, `/healthz`)
//! - Readiness probes (`/ready`, `/readyz`), which verify Redis connectivity
//! - Stream monitoring (`/stream/info`)
//! - Prometheus metrics (`/metrics`)
//! - DLQ inspection (`/admin/dlq/*`)

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::dlq::DlqManager;
use crate::metrics;

/// Shared state for health and admin endpoints.
#[derive(Clone)]
pub struct HealthState {
    /// Redis connection for readiness checks and stream queries.
    pub redis: ConnectionManager,
    /// Application name.
    pub app_name: String,
    /// Application version.
    pub app_version: String,
    /// Stream name being consumed.
    pub stream_name: String,
    /// DLQ stream name.
    pub dlq_stream_name: String,
}

impl HealthState {
    /// Create a health state; the DLQ name defaults to `<domain>:dlq`.
    pub fn new(
        redis: ConnectionManager,
        app_name: impl Into<String>,
        app_version: impl Into<String>,
        stream_name: impl Into<String>,
    ) -> Self {
        let stream = stream_name.into();
        let domain = stream.split(':').next().unwrap_or("jobs").to_string();
        Self {
            redis,
            app_name: app_name.into(),
            app_version: app_version.into(),
            stream_name: stream,
            dlq_stream_name: format!("{}:dlq", domain),
        }
    }

    /// Override the DLQ stream name.
    pub fn with_dlq_stream(mut self, dlq_stream_name: impl Into<String>) -> Self {
        self.dlq_stream_name = dlq_stream_name.into();
        self
    }

    fn dlq_manager(&self) -> DlqManager {
        DlqManager::new(self.redis.clone(), self.dlq_stream_name.clone())
    }
}

/// Health response for liveness probes.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub name: String,
    pub version: String,
}

/// Liveness probe: OK whenever the server is responding.
async fn health_handler(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        name: state.app_name,
        version: state.app_version,
    })
}

/// Readiness probe: verifies Redis with a PING.
async fn ready_handler(
    State(state): State<HealthState>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let mut conn = state.redis.clone();

    let result: Result<String, _> = redis::cmd("PING").query_async(&mut conn).await;

    match result {
        Ok(response) if response == "PONG" => Ok((
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "checks": { "redis": "ok" }
            })),
        )),
        Ok(response) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "checks": { "redis": format!("unexpected response: {}", response) }
            })),
        )),
        Err(e) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "checks": { "redis": format!("error: {}", e) }
            })),
        )),
    }
}

/// Stream monitoring: queue depth and DLQ depth.
async fn stream_info_handler(
    State(state): State<HealthState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let mut conn = state.redis.clone();

    let length: Result<i64, _> = redis::cmd("XLEN")
        .arg(&state.stream_name)
        .query_async(&mut conn)
        .await;

    let length = length.map_err(|e| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": format!("{}", e) })),
        )
    })?;

    let dlq_length: i64 = redis::cmd("XLEN")
        .arg(&state.dlq_stream_name)
        .query_async(&mut conn)
        .await
        .unwrap_or(0);

    Ok(Json(json!({
        "stream": state.stream_name,
        "length": length,
        "dlq_stream": state.dlq_stream_name,
        "dlq_length": dlq_length,
    })))
}

/// Prometheus metrics in exposition format.
async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::render_metrics(),
    )
}

#[derive(Debug, Deserialize)]
struct DlqListParams {
    count: Option<usize>,
    start: Option<String>,
}

/// DLQ statistics.
async fn dlq_stats_handler(
    State(state): State<HealthState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let stats = state.dlq_manager().stats().await.map_err(internal_error)?;
    Ok(Json(json!(stats)))
}

/// List DLQ entries.
async fn dlq_list_handler(
    State(state): State<HealthState>,
    Query(params): Query<DlqListParams>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let count = params.count.unwrap_or(20).min(100);
    let entries = state
        .dlq_manager()
        .list(count, params.start.as_deref())
        .await
        .map_err(internal_error)?;
    let returned = entries.len();
    Ok(Json(json!({ "entries": entries, "count": returned })))
}

/// Get one DLQ entry by stream ID.
async fn dlq_get_handler(
    State(state): State<HealthState>,
    Path(dlq_id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let entry = state
        .dlq_manager()
        .get(&dlq_id)
        .await
        .map_err(internal_error)?;

    match entry {
        Some(entry) => Ok(Json(json!(entry))),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "DLQ entry not found" })),
        )),
    }
}

/// Delete one DLQ entry.
async fn dlq_delete_handler(
    State(state): State<HealthState>,
    Path(dlq_id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let deleted = state
        .dlq_manager()
        .delete(&dlq_id)
        .await
        .map_err(internal_error)?;
    Ok(Json(json!({ "deleted": deleted })))
}

/// Purge the DLQ.
async fn dlq_purge_handler(
    State(state): State<HealthState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let purged = state.dlq_manager().purge().await.map_err(internal_error)?;
    Ok(Json(json!({ "purged": purged })))
}

fn internal_error(e: crate::error::StreamError) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": format!("{}", e) })),
    )
}

/// Health-only router (liveness, readiness, stream info, metrics).
pub fn health_router(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/healthz", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/readyz", get(ready_handler))
        .route("/stream/info", get(stream_info_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Health router plus DLQ admin endpoints.
pub fn full_admin_router(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/healthz", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/readyz", get(ready_handler))
        .route("/stream/info", get(stream_info_handler))
        .route("/metrics", get(metrics_handler))
        .route("/admin/dlq", get(dlq_stats_handler))
        .route("/admin/dlq/entries", get(dlq_list_handler))
        .route(
            "/admin/dlq/entries/{dlq_id}",
            get(dlq_get_handler).delete(dlq_delete_handler),
        )
        .route("/admin/dlq/purge", post(dlq_purge_handler))
        .with_state(state)
}
