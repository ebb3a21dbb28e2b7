//! Medication schedule endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Local;
use domain::models::{
    AddMedicationsRequest, AvailableBoxesQuery, AvailableBoxesResponse, ListMedicationsResponse,
    MedicationEntry, UpdateMedicationRequest,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;

/// List all medication entries in stored order.
///
/// GET /api/v1/medications
pub async fn list_medications(State(state): State<AppState>) -> Json<ListMedicationsResponse> {
    let medications = state.tracker.medications().await;
    Json(ListMedicationsResponse {
        total: medications.len(),
        medications,
    })
}

/// Add one or more entries. The batch is stored entirely or not at all.
///
/// POST /api/v1/medications
pub async fn add_medications(
    State(state): State<AppState>,
    Json(request): Json<AddMedicationsRequest>,
) -> Result<(StatusCode, Json<ListMedicationsResponse>), ApiError> {
    request.validate()?;

    let added = state
        .tracker
        .add_medications(&request.entries, Local::now().naive_local())
        .await?;

    info!(count = added.len(), "Medications added");

    Ok((
        StatusCode::CREATED,
        Json(ListMedicationsResponse {
            total: added.len(),
            medications: added,
        }),
    ))
}

/// Replace an entry's time and box.
///
/// PUT /api/v1/medications/:id
pub async fn update_medication(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateMedicationRequest>,
) -> Result<Json<MedicationEntry>, ApiError> {
    request.validate()?;

    let updated = state
        .tracker
        .update_medication(
            id,
            request.time,
            request.box_number,
            Local::now().naive_local(),
        )
        .await?;

    Ok(Json(updated))
}

/// Delete an entry and its reminder.
///
/// DELETE /api/v1/medications/:id
pub async fn delete_medication(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.tracker.delete_medication(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Boxes selectable for an add or edit row.
///
/// GET /api/v1/medications/available-boxes?excluding=<id>&staged=1,2
pub async fn available_boxes(
    State(state): State<AppState>,
    Query(query): Query<AvailableBoxesQuery>,
) -> Result<Json<AvailableBoxesResponse>, ApiError> {
    let staged = query.staged_boxes().map_err(ApiError::Validation)?;
    let boxes = state
        .tracker
        .available_boxes(query.excluding, &staged)
        .await;
    Ok(Json(AvailableBoxesResponse { boxes }))
}
