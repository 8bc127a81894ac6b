//! Admin key check for the admin panel routes.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared::crypto::verify_key_hash;

use super::trace_id::get_request_id;
use crate::app::AppState;
use crate::error::ApiError;

pub const ADMIN_KEY_HEADER: &str = "X-Admin-Key";

/// Rejects requests whose `X-Admin-Key` does not hash to
/// `security.admin_key_hash`. With no hash configured the routes stay open.
pub async fn require_admin_key(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let security = &state.config.security;
    if !security.admin_key_required() {
        return next.run(req).await;
    }

    let presented = req
        .headers()
        .get(ADMIN_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match presented {
        Some(key) if verify_key_hash(key, &security.admin_key_hash) => next.run(req).await,
        Some(_) => {
            tracing::warn!(
                request_id = %get_request_id(req.extensions()),
                path = %req.uri().path(),
                "Rejected admin request with wrong key"
            );
            ApiError::Unauthorized("Invalid admin key".into()).into_response()
        }
        None => ApiError::Unauthorized("Missing admin key".into()).into_response(),
    }
}
