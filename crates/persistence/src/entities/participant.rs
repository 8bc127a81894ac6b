//! Participant entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::Participant;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the users table.
#[derive(Debug, Clone, FromRow)]
pub struct ParticipantEntity {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub whatsapp: String,
    pub partner_id: Option<Uuid>,
    pub trivia_completed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ParticipantEntity> for Participant {
    fn from(entity: ParticipantEntity) -> Self {
        Self {
            id: entity.id,
            first_name: entity.first_name,
            last_name: entity.last_name,
            email: entity.email,
            whatsapp: entity.whatsapp,
            partner_id: entity.partner_id,
            trivia_completed: entity.trivia_completed,
            created_at: entity.created_at,
        }
    }
}
