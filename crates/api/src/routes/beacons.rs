//! Beacon discovery endpoint handlers.
//!
//! The advertisement and radio endpoints are the HTTP radio bridge: an
//! external scanner posts what the radio sees.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::{
    IngestAdvertisementsRequest, IngestAdvertisementsResponse, ListBeaconsResponse,
    RadioPowerRequest, RadioStatusResponse, UnassignedBeaconsResponse,
};
use tracing::{debug, info};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;

/// List beacons currently in range.
///
/// GET /api/v1/beacons
pub async fn list_beacons(State(state): State<AppState>) -> Json<ListBeaconsResponse> {
    Json(state.tracker.list_beacons().await)
}

/// List observed beacons without a box, with the boxes each may take.
///
/// GET /api/v1/beacons/unassigned
pub async fn list_unassigned(State(state): State<AppState>) -> Json<UnassignedBeaconsResponse> {
    Json(state.tracker.unassigned_beacons().await)
}

/// Ingest a batch of advertisements from the radio bridge.
///
/// POST /api/v1/beacons/advertisements
pub async fn ingest_advertisements(
    State(state): State<AppState>,
    Json(request): Json<IngestAdvertisementsRequest>,
) -> Result<(StatusCode, Json<IngestAdvertisementsResponse>), ApiError> {
    request.validate()?;

    let response = state.tracker.ingest(&request.advertisements).await;
    debug!(
        accepted = response.accepted,
        rejected = response.rejected,
        "Advertisements ingested"
    );

    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// Report the radio power state.
///
/// POST /api/v1/beacons/radio
pub async fn set_radio_power(
    State(state): State<AppState>,
    Json(request): Json<RadioPowerRequest>,
) -> Json<RadioStatusResponse> {
    let status = state.tracker.set_radio_powered(request.powered).await;
    info!(powered = request.powered, radio = %status.radio, "Radio power reported");
    Json(status)
}
