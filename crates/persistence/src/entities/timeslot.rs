//! Timeslot and timeslot configuration entities.

use chrono::{DateTime, NaiveDate, Utc};
use domain::models::{SlotUsage, TimeSlot, TimeslotConfig};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the timeslot_configs table.
#[derive(Debug, Clone, FromRow)]
pub struct TimeslotConfigEntity {
    pub id: Uuid,
    pub event_dates: Vec<NaiveDate>,
    pub duration_minutes: i32,
    pub start_hour: i32,
    pub end_hour: i32,
    pub slots_per_day: i32,
    pub updated_by: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<TimeslotConfigEntity> for TimeslotConfig {
    fn from(entity: TimeslotConfigEntity) -> Self {
        Self {
            id: entity.id,
            event_dates: entity.event_dates,
            duration_minutes: entity.duration_minutes,
            start_hour: entity.start_hour,
            end_hour: entity.end_hour,
            slots_per_day: entity.slots_per_day,
            updated_by: entity.updated_by,
            updated_at: entity.updated_at,
        }
    }
}

/// Database row mapping for the timeslots table.
#[derive(Debug, Clone, FromRow)]
pub struct TimeSlotEntity {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub start_time: String,
    pub end_time: String,
    pub capacity: i32,
    pub created_at: DateTime<Utc>,
}

impl From<TimeSlotEntity> for TimeSlot {
    fn from(entity: TimeSlotEntity) -> Self {
        Self {
            id: entity.id,
            date: entity.date,
            start_time: entity.start_time,
            end_time: entity.end_time,
            capacity: entity.capacity,
            created_at: entity.created_at,
        }
    }
}

/// Timeslot row joined with its count of non-cancelled reservations.
#[derive(Debug, Clone, FromRow)]
pub struct SlotUsageEntity {
    #[sqlx(flatten)]
    pub slot: TimeSlotEntity,
    pub reserved_count: i64,
}

impl From<SlotUsageEntity> for SlotUsage {
    fn from(entity: SlotUsageEntity) -> Self {
        Self {
            slot: entity.slot.into(),
            reserved_count: entity.reserved_count,
        }
    }
}
