use axum::{
    extract::{Query, State},
    Json,
};
use domain::models::SlotAvailability;
use serde::Deserialize;

use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: Option<String>,
}

/// GET /escaperoom/api/timeslots?date=YYYY-MM-DD
pub async fn availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<SlotAvailability>>, ApiError> {
    let date = query
        .date
        .ok_or_else(|| ApiError::Validation("date query parameter is required".into()))?;
    Ok(Json(state.timeslots.availability(&date).await?))
}
