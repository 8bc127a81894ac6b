//! Group registration and participant lookup.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::{Participant, ParticipantProfile, RegisterPairRequest};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct RegisterGroupResponse {
    pub message: String,
    pub users: Vec<Participant>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub email: Option<String>,
}

/// POST /escaperoom/api/users/register-multiple
pub async fn register_multiple(
    State(state): State<AppState>,
    payload: Result<Json<RegisterPairRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterGroupResponse>), ApiError> {
    let Json(request) = payload?;
    let users = state.participants.register_pair(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterGroupResponse {
            message: "Group registered. Both members must complete the trivia.".into(),
            users,
        }),
    ))
}

/// GET /escaperoom/api/users/search?email=
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ParticipantProfile>, ApiError> {
    let email = query
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("email query parameter is required".into()))?;
    Ok(Json(state.participants.find_by_email(&email).await?))
}
