//! Reservation entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{InterestRating, Reservation, ReservationStatus};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for reservation_status that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "reservation_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatusDb {
    Reserved,
    Used,
    Cancelled,
}

impl From<ReservationStatusDb> for ReservationStatus {
    fn from(db: ReservationStatusDb) -> Self {
        match db {
            ReservationStatusDb::Reserved => ReservationStatus::Reserved,
            ReservationStatusDb::Used => ReservationStatus::Used,
            ReservationStatusDb::Cancelled => ReservationStatus::Cancelled,
        }
    }
}

impl From<ReservationStatus> for ReservationStatusDb {
    fn from(status: ReservationStatus) -> Self {
        match status {
            ReservationStatus::Reserved => ReservationStatusDb::Reserved,
            ReservationStatus::Used => ReservationStatusDb::Used,
            ReservationStatus::Cancelled => ReservationStatusDb::Cancelled,
        }
    }
}

/// Database row mapping for the reservations table.
#[derive(Debug, Clone, FromRow)]
pub struct ReservationEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub timeslot_id: Uuid,
    pub qr_code: String,
    pub status: ReservationStatusDb,
    pub interest_rating: Option<i16>,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<ReservationEntity> for Reservation {
    fn from(entity: ReservationEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            timeslot_id: entity.timeslot_id,
            qr_code: entity.qr_code,
            status: entity.status.into(),
            // The column CHECK keeps values in 1..=3.
            interest_rating: entity
                .interest_rating
                .and_then(|v| InterestRating::try_from(v).ok()),
            checked_in_at: entity.checked_in_at,
            created_at: entity.created_at,
        }
    }
}
