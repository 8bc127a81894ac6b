//! Door-side operations: check-in, cancel, reassign and rating.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use domain::models::{
    CheckedInGroup, GroupCheckinRequest, GroupReassignRequest, GroupResult, QrCodeRequest,
    RateGroupRequest, ReassignRequest, Reservation, ReservationDetails,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_checkins;

/// POST /escaperoom/api/checkin/validate
///
/// Looks a QR code up without changing anything.
pub async fn validate(
    State(state): State<AppState>,
    payload: Result<Json<QrCodeRequest>, JsonRejection>,
) -> Result<Json<ReservationDetails>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(state.reservations.get_by_qr(&request.qr_code).await?))
}

/// POST /escaperoom/api/checkin/confirm
pub async fn confirm(
    State(state): State<AppState>,
    payload: Result<Json<QrCodeRequest>, JsonRejection>,
) -> Result<Json<ReservationDetails>, ApiError> {
    let Json(request) = payload?;
    let details = state.reservations.check_in(&request.qr_code).await?;
    record_checkins("single", 1);
    Ok(Json(details))
}

/// POST /escaperoom/api/checkin/cancel
pub async fn cancel(
    State(state): State<AppState>,
    payload: Result<Json<QrCodeRequest>, JsonRejection>,
) -> Result<Json<Reservation>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(state.reservations.cancel(&request.qr_code).await?))
}

/// POST /escaperoom/api/checkin/reassign
pub async fn reassign(
    State(state): State<AppState>,
    payload: Result<Json<ReassignRequest>, JsonRejection>,
) -> Result<Json<ReservationDetails>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(
        state
            .reservations
            .reassign(&request.qr_code, request.new_timeslot_id)
            .await?,
    ))
}

/// POST /escaperoom/api/checkin/group/checkin
pub async fn group_checkin(
    State(state): State<AppState>,
    payload: Result<Json<GroupCheckinRequest>, JsonRejection>,
) -> Result<Json<GroupResult>, ApiError> {
    let Json(request) = payload?;
    let reservations = state
        .reservations
        .check_in_group(&request.qr_code1, &request.qr_code2)
        .await?;
    record_checkins("group", reservations.len());
    Ok(Json(GroupResult {
        message: "Group checked in".into(),
        reservations,
    }))
}

/// POST /escaperoom/api/checkin/group/reassign
pub async fn group_reassign(
    State(state): State<AppState>,
    payload: Result<Json<GroupReassignRequest>, JsonRejection>,
) -> Result<Json<GroupResult>, ApiError> {
    let Json(request) = payload?;
    let reservations = state
        .reservations
        .reassign_group(&request.qr_code1, &request.qr_code2, request.new_timeslot_id)
        .await?;
    Ok(Json(GroupResult {
        message: "Group reassigned".into(),
        reservations,
    }))
}

/// GET /escaperoom/api/checkin/groups/checked-in
pub async fn checked_in_groups(
    State(state): State<AppState>,
) -> Result<Json<Vec<CheckedInGroup>>, ApiError> {
    Ok(Json(state.reservations.checked_in_groups().await?))
}

/// POST /escaperoom/api/checkin/groups/rate
pub async fn rate_group(
    State(state): State<AppState>,
    payload: Result<Json<RateGroupRequest>, JsonRejection>,
) -> Result<Json<GroupResult>, ApiError> {
    let Json(request) = payload?;
    let reservations = state
        .reservations
        .rate_group(
            request.reservation_id1,
            request.reservation_id2,
            request.rating,
        )
        .await?;
    Ok(Json(GroupResult {
        message: "Group rated".into(),
        reservations,
    }))
}
