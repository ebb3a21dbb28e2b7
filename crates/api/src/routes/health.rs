//! Health check endpoint handlers.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::RadioStatusResponse;
use persistence::repositories::KeyValueRepository;
use serde::Serialize;

use crate::app::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: DatabaseHealth,
    pub radio: RadioStatusResponse,
    pub monitoring: bool,
}

/// Database health status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseHealth {
    pub connected: bool,
    pub latency_ms: Option<u64>,
}

/// Simple status response for liveness/readiness probes.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

async fn database_connected(state: &AppState) -> bool {
    KeyValueRepository::new(state.pool.clone())
        .ping()
        .await
        .is_ok()
}

/// Full health check endpoint.
///
/// Reports database connectivity, the radio state and whether a monitoring
/// session is running. Only the database decides the status code; a missing
/// radio is a degraded but serving state.
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, StatusCode> {
    let start = std::time::Instant::now();
    let db_connected = database_connected(&state).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let radio = state.tracker.radio_status().await;
    let monitoring = state.session.is_active().await;

    let status = match (db_connected, radio.radio) {
        (false, _) => return Err(StatusCode::SERVICE_UNAVAILABLE),
        (true, domain::models::RadioStatus::Unavailable) => "degraded",
        (true, _) => "healthy",
    };

    Ok(Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: DatabaseHealth {
            connected: db_connected,
            latency_ms: Some(latency_ms),
        },
        radio,
        monitoring,
    }))
}

/// Liveness probe endpoint.
///
/// Returns 200 OK if the process is running.
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe endpoint.
///
/// Returns 200 OK if the service can accept traffic (database connected).
pub async fn ready(State(state): State<AppState>) -> Result<Json<StatusResponse>, StatusCode> {
    if database_connected(&state).await {
        Ok(Json(StatusResponse {
            status: "ready".to_string(),
        }))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}
