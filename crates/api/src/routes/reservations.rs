//! Reservation booking.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use domain::models::{
    CreatePairReservationRequest, CreateReservationRequest, ReservationDetails,
    ResendConfirmationRequest,
};
use serde::Serialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_reservations_created;

#[derive(Debug, Serialize)]
pub struct ResendResponse {
    pub message: String,
    pub reservation: ReservationDetails,
}

/// POST /escaperoom/api/reservations
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreateReservationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ReservationDetails>), ApiError> {
    let Json(request) = payload?;
    let details = state
        .reservations
        .create(request.user_id, request.timeslot_id)
        .await?;
    record_reservations_created("single", 1);
    Ok((StatusCode::CREATED, Json(details)))
}

/// POST /escaperoom/api/reservations/multiple
pub async fn create_multiple(
    State(state): State<AppState>,
    payload: Result<Json<CreatePairReservationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Vec<ReservationDetails>>), ApiError> {
    let Json(request) = payload?;
    let booked = state
        .reservations
        .create_pair(request.user_id, request.partner_id, request.timeslot_id)
        .await?;
    record_reservations_created("pair", booked.len());
    Ok((StatusCode::CREATED, Json(booked)))
}

/// POST /escaperoom/api/reservations/resend
pub async fn resend(
    State(state): State<AppState>,
    payload: Result<Json<ResendConfirmationRequest>, JsonRejection>,
) -> Result<Json<ResendResponse>, ApiError> {
    let Json(request) = payload?;
    let reservation = state
        .reservations
        .resend_confirmation(&request.email)
        .await?;
    Ok(Json(ResendResponse {
        message: format!("Confirmation resent to {}", reservation.user.email),
        reservation,
    }))
}
