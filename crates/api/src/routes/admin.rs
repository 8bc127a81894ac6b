//! Admin panel: registration control, timeslot setup and export.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use domain::models::{
    ClearTimeslotsResult, GenerateTimeslotsResult, ParticipantExportRow, RegistrationControl,
    RegistrationStatus, SetRegistrationControlRequest, SetTimeslotConfigRequest,
    TimeslotConfigView,
};
use serde::Serialize;

use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// GET /escaperoom/api/admin/registration-status
pub async fn registration_status(
    State(state): State<AppState>,
) -> Result<Json<RegistrationStatus>, ApiError> {
    Ok(Json(state.admin.registration_status().await?))
}

/// POST /escaperoom/api/admin/registration-control
pub async fn set_registration_control(
    State(state): State<AppState>,
    payload: Result<Json<SetRegistrationControlRequest>, JsonRejection>,
) -> Result<Json<RegistrationControl>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(state.admin.set_registration_control(request).await?))
}

/// DELETE /escaperoom/api/admin/registration-control
pub async fn reset_registration_control(
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.admin.reset_to_automatic().await?;
    Ok(Json(MessageResponse {
        message: "Registration control reset to automatic".into(),
    }))
}

/// GET /escaperoom/api/admin/timeslot-config
pub async fn get_timeslot_config(
    State(state): State<AppState>,
) -> Result<Json<TimeslotConfigView>, ApiError> {
    Ok(Json(state.timeslots.get_config().await?))
}

/// POST /escaperoom/api/admin/timeslot-config
pub async fn set_timeslot_config(
    State(state): State<AppState>,
    payload: Result<Json<SetTimeslotConfigRequest>, JsonRejection>,
) -> Result<Json<TimeslotConfigView>, ApiError> {
    let Json(request) = payload?;
    let config = state.timeslots.set_config(request).await?;
    Ok(Json(TimeslotConfigView::from(&config)))
}

/// POST /escaperoom/api/admin/generate-timeslots
pub async fn generate_timeslots(
    State(state): State<AppState>,
) -> Result<Json<GenerateTimeslotsResult>, ApiError> {
    Ok(Json(state.timeslots.generate().await?))
}

/// DELETE /escaperoom/api/admin/timeslots
pub async fn clear_timeslots(
    State(state): State<AppState>,
) -> Result<Json<ClearTimeslotsResult>, ApiError> {
    Ok(Json(state.timeslots.clear().await?))
}

/// GET /escaperoom/api/admin/users-data
pub async fn export_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<ParticipantExportRow>>, ApiError> {
    Ok(Json(state.admin.export_participants().await?))
}
