//! Passport registration entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{PassportRegistration, PassportStatus, StageCounts};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for passport_status that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "passport_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PassportStatusDb {
    Pending,
    CheckedIn,
    NoShow,
}

impl From<PassportStatusDb> for PassportStatus {
    fn from(db: PassportStatusDb) -> Self {
        match db {
            PassportStatusDb::Pending => PassportStatus::Pending,
            PassportStatusDb::CheckedIn => PassportStatus::CheckedIn,
            PassportStatusDb::NoShow => PassportStatus::NoShow,
        }
    }
}

impl From<PassportStatus> for PassportStatusDb {
    fn from(status: PassportStatus) -> Self {
        match status {
            PassportStatus::Pending => PassportStatusDb::Pending,
            PassportStatus::CheckedIn => PassportStatusDb::CheckedIn,
            PassportStatus::NoShow => PassportStatusDb::NoShow,
        }
    }
}

/// Database row mapping for the passport_registrations table.
#[derive(Debug, Clone, FromRow)]
pub struct PassportRegistrationEntity {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub status: PassportStatusDb,
    pub registration_date: DateTime<Utc>,
    pub check_in_time: Option<DateTime<Utc>>,
    pub entrada_scanned: bool,
    pub entrada_time: Option<DateTime<Utc>>,
    pub entrega_scanned: bool,
    pub entrega_time: Option<DateTime<Utc>>,
    pub completo_scanned: bool,
    pub completo_time: Option<DateTime<Utc>>,
    pub sorteo_scanned: bool,
    pub sorteo_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PassportRegistrationEntity> for PassportRegistration {
    fn from(entity: PassportRegistrationEntity) -> Self {
        Self {
            id: entity.id,
            first_name: entity.first_name,
            last_name: entity.last_name,
            email: entity.email,
            phone: entity.phone,
            status: entity.status.into(),
            registration_date: entity.registration_date,
            check_in_time: entity.check_in_time,
            entrada_scanned: entity.entrada_scanned,
            entrada_time: entity.entrada_time,
            entrega_scanned: entity.entrega_scanned,
            entrega_time: entity.entrega_time,
            completo_scanned: entity.completo_scanned,
            completo_time: entity.completo_time,
            sorteo_scanned: entity.sorteo_scanned,
            sorteo_time: entity.sorteo_time,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Per-stage counts aggregated in one query.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct StageCountsEntity {
    pub entrada: i64,
    pub entrega: i64,
    pub completo: i64,
    pub sorteo: i64,
}

impl From<StageCountsEntity> for StageCounts {
    fn from(entity: StageCountsEntity) -> Self {
        Self {
            entrada: entity.entrada,
            entrega: entity.entrega,
            completo: entity.completo,
            sorteo: entity.sorteo,
        }
    }
}
