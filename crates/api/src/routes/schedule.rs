//! Dose status endpoint handler.

use axum::{extract::State, Json};
use chrono::Local;
use domain::models::ScheduleStatusResponse;

use crate::app::AppState;

/// Current dose status of every entry.
///
/// GET /api/v1/schedule/status
pub async fn get_status(State(state): State<AppState>) -> Json<ScheduleStatusResponse> {
    Json(state.tracker.status(Local::now().naive_local()).await)
}
