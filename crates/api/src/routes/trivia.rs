use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use domain::models::{QuestionView, TriviaResult, ValidateTriviaRequest};

use crate::app::AppState;
use crate::error::ApiError;

/// GET /escaperoom/api/trivia/questions
pub async fn questions(State(state): State<AppState>) -> Result<Json<Vec<QuestionView>>, ApiError> {
    Ok(Json(state.trivia.questions().await?))
}

/// POST /escaperoom/api/trivia/validate
///
/// A wrong attempt is a normal `200` with `correct: false`.
pub async fn validate(
    State(state): State<AppState>,
    payload: Result<Json<ValidateTriviaRequest>, JsonRejection>,
) -> Result<Json<TriviaResult>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(state.trivia.validate(request).await?))
}
