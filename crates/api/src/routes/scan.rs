//! Passport scanner endpoints.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Json,
};
use domain::models::{
    HistoryQuery, NewPassportRegistration, PassportRegistration, ScanHistory, ScanReceipt,
    ScanRequest, ScanStage, ScanStats, ScanValidation, ValidateScanRequest,
};
use domain::DomainError;
use serde::Deserialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_passport_scan;

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub date: Option<String>,
}

/// POST /api/scan/register
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<NewPassportRegistration>, JsonRejection>,
) -> Result<(StatusCode, Json<PassportRegistration>), ApiError> {
    let Json(request) = payload?;
    let registration = state.passport.register(request).await?;
    Ok((StatusCode::CREATED, Json(registration)))
}

/// POST /api/scan/validate
///
/// Tells the scanner whether a stage scan would be accepted, without scanning.
pub async fn validate(
    State(state): State<AppState>,
    payload: Result<Json<ValidateScanRequest>, JsonRejection>,
) -> Result<Json<ScanValidation>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(state.passport.validate(request).await?))
}

async fn scan_stage(
    state: AppState,
    stage: ScanStage,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Json<ScanReceipt>, ApiError> {
    let Json(request) = payload?;
    match state.passport.scan(stage, request).await {
        Ok(receipt) => {
            record_passport_scan(stage, "accepted");
            Ok(Json(receipt))
        }
        Err(err) => {
            let outcome = match &err {
                DomainError::Stage { code, .. } => code.as_str(),
                _ => "error",
            };
            record_passport_scan(stage, outcome);
            Err(err.into())
        }
    }
}

/// POST /api/scan/entrada
pub async fn entrada(
    State(state): State<AppState>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Json<ScanReceipt>, ApiError> {
    scan_stage(state, ScanStage::Entrada, payload).await
}

/// POST /api/scan/entrega
pub async fn entrega(
    State(state): State<AppState>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Json<ScanReceipt>, ApiError> {
    scan_stage(state, ScanStage::Entrega, payload).await
}

/// POST /api/scan/completo
pub async fn completo(
    State(state): State<AppState>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Json<ScanReceipt>, ApiError> {
    scan_stage(state, ScanStage::Completo, payload).await
}

/// POST /api/scan/sorteo
pub async fn sorteo(
    State(state): State<AppState>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Json<ScanReceipt>, ApiError> {
    scan_stage(state, ScanStage::Sorteo, payload).await
}

/// GET /api/scan/history?mode=&limit=
pub async fn history(
    State(state): State<AppState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<ScanHistory>, ApiError> {
    let Query(query) = query?;
    Ok(Json(state.passport.history(query).await?))
}

/// GET /api/scan/stats?date=
pub async fn stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<ScanStats>, ApiError> {
    Ok(Json(state.passport.stats(query.date).await?))
}
