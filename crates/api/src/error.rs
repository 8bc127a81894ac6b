use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::{DomainError, StageErrorCode};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(String),

    #[error("Already used: {0}")]
    AlreadyUsed(String),

    /// Passport scan rejection; the code tells the scanner which screen to show.
    #[error("{code}: {message}")]
    Stage {
        code: StageErrorCode,
        message: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) | ApiError::CapacityExceeded(_) | ApiError::AlreadyUsed(_) => {
                StatusCode::CONFLICT
            }
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Stage { code, .. } => match code {
                StageErrorCode::InvalidQr => StatusCode::NOT_FOUND,
                code if code.is_prerequisite() => StatusCode::BAD_REQUEST,
                _ => StatusCode::CONFLICT,
            },
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Validation(_) => "INVALID_INPUT",
            ApiError::CapacityExceeded(_) => "CAPACITY_EXCEEDED",
            ApiError::AlreadyUsed(_) => "ALREADY_USED",
            ApiError::Stage { code, .. } => code.as_str(),
            ApiError::Internal(_) => "INTERNAL_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = match self {
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            ApiError::Unauthorized(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::Validation(msg)
            | ApiError::CapacityExceeded(msg)
            | ApiError::AlreadyUsed(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
            ApiError::Stage { message, .. } => message,
        };

        let body = ErrorBody {
            error: code.into(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound(msg) => ApiError::NotFound(msg),
            DomainError::Conflict(msg) => ApiError::Conflict(msg),
            DomainError::InvalidInput(msg) => ApiError::Validation(msg),
            DomainError::CapacityExceeded(msg) => ApiError::CapacityExceeded(msg),
            DomainError::AlreadyUsed(msg) => ApiError::AlreadyUsed(msg),
            DomainError::Stage { code, message } => ApiError::Stage { code, message },
            DomainError::Store(err) => ApiError::Internal(format!("Store error: {}", err)),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::store::StoreError;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_api_error_unauthorized() {
        let response = ApiError::Unauthorized("missing key".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_domain_error_statuses() {
        let cases = [
            (DomainError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (DomainError::Conflict("x".into()), StatusCode::CONFLICT),
            (DomainError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (DomainError::CapacityExceeded("x".into()), StatusCode::CONFLICT),
            (DomainError::AlreadyUsed("x".into()), StatusCode::CONFLICT),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_stage_error_statuses() {
        let status = |code| {
            ApiError::from(DomainError::stage(code, "msg"))
                .into_response()
                .status()
        };
        assert_eq!(status(StageErrorCode::InvalidQr), StatusCode::NOT_FOUND);
        assert_eq!(status(StageErrorCode::NotEntered), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(StageErrorCode::PassportNotDelivered),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status(StageErrorCode::AlreadyEntered), StatusCode::CONFLICT);
        assert_eq!(status(StageErrorCode::AlreadyScanned), StatusCode::CONFLICT);
        assert_eq!(
            status(StageErrorCode::AlreadyParticipated),
            StatusCode::CONFLICT
        );
    }

    #[tokio::test]
    async fn test_stage_error_body_carries_code() {
        let response = ApiError::from(DomainError::stage(
            StageErrorCode::NotEntered,
            "Participant has not entered",
        ))
        .into_response();
        let body = body_json(response).await;
        assert_eq!(body["error"], "NOT_ENTERED");
        assert_eq!(body["message"], "Participant has not entered");
    }

    #[tokio::test]
    async fn test_store_error_is_hidden() {
        let response = ApiError::from(DomainError::Store(StoreError::Backend(
            "connection refused on 10.0.0.3".into(),
        )))
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "INTERNAL_ERROR");
        assert_eq!(body["message"], "An internal error occurred");
    }

    #[test]
    fn test_api_error_display() {
        assert_eq!(
            format!("{}", ApiError::NotFound("test".to_string())),
            "Not found: test"
        );
        assert_eq!(
            format!(
                "{}",
                ApiError::Stage {
                    code: StageErrorCode::AlreadyScanned,
                    message: "test".to_string()
                }
            ),
            "ALREADY_SCANNED: test"
        );
    }
}
