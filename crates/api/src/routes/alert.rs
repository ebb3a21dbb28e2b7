//! Alert banner endpoint handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::AlertResponse;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// The outstanding alert, if any.
///
/// GET /api/v1/alert
pub async fn get_alert(State(state): State<AppState>) -> Json<AlertResponse> {
    Json(AlertResponse {
        alert: state.tracker.current_alert().await,
    })
}

/// Dismiss the outstanding alert.
///
/// POST /api/v1/alert/:id/acknowledge
pub async fn acknowledge_alert(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.tracker.acknowledge_alert(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!(
            "Alert {} is not outstanding",
            id
        )))
    }
}
