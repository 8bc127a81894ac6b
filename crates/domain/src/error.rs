//! Domain error types.

use thiserror::Error;

use crate::store::StoreError;

/// Rejection codes for passport scans.
///
/// Scanner clients render a different screen per code, so each stage
/// violation keeps its own code instead of collapsing into a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageErrorCode {
    InvalidQr,
    AlreadyEntered,
    NotEntered,
    AlreadyScanned,
    PassportNotDelivered,
    AlreadyParticipated,
}

impl StageErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageErrorCode::InvalidQr => "INVALID_QR",
            StageErrorCode::AlreadyEntered => "ALREADY_ENTERED",
            StageErrorCode::NotEntered => "NOT_ENTERED",
            StageErrorCode::AlreadyScanned => "ALREADY_SCANNED",
            StageErrorCode::PassportNotDelivered => "PASSPORT_NOT_DELIVERED",
            StageErrorCode::AlreadyParticipated => "ALREADY_PARTICIPATED",
        }
    }

    /// True when the rejection is an ordering violation (an earlier stage is missing).
    pub fn is_prerequisite(&self) -> bool {
        matches!(
            self,
            StageErrorCode::NotEntered | StageErrorCode::PassportNotDelivered
        )
    }

    /// True when the rejection is a repeated one-shot transition.
    pub fn is_repeat(&self) -> bool {
        matches!(
            self,
            StageErrorCode::AlreadyEntered
                | StageErrorCode::AlreadyScanned
                | StageErrorCode::AlreadyParticipated
        )
    }
}

impl std::fmt::Display for StageErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors raised by domain services.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(String),

    #[error("Already used: {0}")]
    AlreadyUsed(String),

    #[error("{code}: {message}")]
    Stage {
        code: StageErrorCode,
        message: String,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        DomainError::InvalidInput(errors.to_string())
    }
}

impl DomainError {
    pub fn stage(code: StageErrorCode, message: impl Into<String>) -> Self {
        DomainError::Stage {
            code,
            message: message.into(),
        }
    }

    /// Stable machine-readable code for the calling layer.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::NotFound(_) => "NOT_FOUND",
            DomainError::Conflict(_) => "CONFLICT",
            DomainError::InvalidInput(_) => "INVALID_INPUT",
            DomainError::CapacityExceeded(_) => "CAPACITY_EXCEEDED",
            DomainError::AlreadyUsed(_) => "ALREADY_USED",
            DomainError::Stage { code, .. } => code.as_str(),
            DomainError::Store(_) => "INTERNAL_ERROR",
        }
    }

    /// Human message without the code prefix.
    pub fn message(&self) -> String {
        match self {
            DomainError::NotFound(msg)
            | DomainError::Conflict(msg)
            | DomainError::InvalidInput(msg)
            | DomainError::CapacityExceeded(msg)
            | DomainError::AlreadyUsed(msg) => msg.clone(),
            DomainError::Stage { message, .. } => message.clone(),
            DomainError::Store(_) => "An internal error occurred".to_string(),
        }
    }
}
