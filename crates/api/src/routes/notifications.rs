//! Notification center endpoint handler.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::app::AppState;
use crate::services::PendingNotification;

/// Response listing pending notifications.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingNotificationsResponse {
    pub notifications: Vec<PendingNotification>,
    pub total: usize,
}

/// Pending reminder and wrong-box notifications, soonest first.
///
/// GET /api/v1/notifications/pending
pub async fn list_pending(State(state): State<AppState>) -> Json<PendingNotificationsResponse> {
    let notifications = state.notifications.pending().await;
    Json(PendingNotificationsResponse {
        total: notifications.len(),
        notifications,
    })
}
