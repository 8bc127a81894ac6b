//! Registration control entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::RegistrationControl;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the registration_controls table.
#[derive(Debug, Clone, FromRow)]
pub struct RegistrationControlEntity {
    pub id: Uuid,
    pub is_open: bool,
    pub reason: Option<String>,
    pub updated_by: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<RegistrationControlEntity> for RegistrationControl {
    fn from(entity: RegistrationControlEntity) -> Self {
        Self {
            id: entity.id,
            is_open: entity.is_open,
            reason: entity.reason,
            updated_by: entity.updated_by,
            updated_at: entity.updated_at,
        }
    }
}
