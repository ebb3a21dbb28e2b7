//! Beacon-to-box mapping endpoint handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::{AssignBeaconRequest, BeaconId, BeaconMapping, ListMappingsResponse};
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;

/// List all mappings.
///
/// GET /api/v1/mappings
pub async fn list_mappings(State(state): State<AppState>) -> Json<ListMappingsResponse> {
    let mappings = state.tracker.mappings().await;
    Json(ListMappingsResponse {
        total: mappings.len(),
        mappings,
    })
}

/// Assign a beacon to a box.
///
/// POST /api/v1/mappings
pub async fn assign_beacon(
    State(state): State<AppState>,
    Json(request): Json<AssignBeaconRequest>,
) -> Result<(StatusCode, Json<BeaconMapping>), ApiError> {
    request.validate()?;

    let mapping = state
        .tracker
        .assign(BeaconId::new(request.beacon_id), request.box_number)
        .await?;

    info!(
        beacon_id = %mapping.beacon_id,
        box_number = mapping.box_number,
        "Mapping created"
    );

    Ok((StatusCode::CREATED, Json(mapping)))
}

/// Remove a beacon's mapping.
///
/// DELETE /api/v1/mappings/:beacon_id
pub async fn unassign_beacon(
    State(state): State<AppState>,
    Path(beacon_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let removed = state.tracker.unassign(&BeaconId::new(beacon_id)).await?;

    info!(
        beacon_id = %removed.beacon_id,
        box_number = removed.box_number,
        "Mapping removed"
    );

    Ok(StatusCode::NO_CONTENT)
}
