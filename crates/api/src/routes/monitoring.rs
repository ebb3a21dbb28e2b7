//! Monitoring session endpoint handlers.

use axum::{extract::State, Json};

use crate::app::AppState;
use crate::services::MonitoringStatusResponse;

/// POST /api/v1/monitoring/start
pub async fn start_monitoring(State(state): State<AppState>) -> Json<MonitoringStatusResponse> {
    Json(state.session.start().await)
}

/// POST /api/v1/monitoring/stop
pub async fn stop_monitoring(State(state): State<AppState>) -> Json<MonitoringStatusResponse> {
    Json(state.session.stop().await)
}

/// GET /api/v1/monitoring
pub async fn get_monitoring(State(state): State<AppState>) -> Json<MonitoringStatusResponse> {
    Json(state.session.status().await)
}
