//! Timeslot domain models.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Number of event days a configuration must name.
pub const EVENT_DAY_COUNT: usize = 3;

/// Seats per slot when nothing else is configured.
pub const DEFAULT_SLOT_CAPACITY: i32 = 1;

pub const DEFAULT_DURATION_MINUTES: i32 = 15;
pub const DEFAULT_START_HOUR: i32 = 8;
pub const DEFAULT_END_HOUR: i32 = 20;
pub const DEFAULT_SLOTS_PER_DAY: i32 = 48;

/// Hour of day (UTC) at which event dates are anchored.
const EVENT_DAY_ANCHOR_HOUR: u32 = 12;

/// Anchors a calendar date at noon UTC.
///
/// Every stored slot date uses this instant so that a timezone-aware
/// comparison never lands on the neighbouring calendar day.
pub fn event_day_instant(date: NaiveDate) -> DateTime<Utc> {
    let noon = NaiveTime::from_hms_opt(EVENT_DAY_ANCHOR_HOUR, 0, 0).unwrap_or(NaiveTime::MIN);
    Utc.from_utc_datetime(&date.and_time(noon))
}

/// Calendar-day equality on the UTC calendar, ignoring time of day.
pub fn is_same_event_day(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.date_naive() == b.date_naive()
}

/// Authoritative slot-generation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeslotConfig {
    pub id: Uuid,
    pub event_dates: Vec<NaiveDate>,
    pub duration_minutes: i32,
    pub start_hour: i32,
    pub end_hour: i32,
    pub slots_per_day: i32,
    pub updated_by: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Timeslot configuration as presented to admins (defaults when unset).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeslotConfigView {
    pub event_dates: Vec<NaiveDate>,
    pub duration_minutes: i32,
    pub start_hour: i32,
    pub end_hour: i32,
    pub slots_per_day: i32,
}

impl Default for TimeslotConfigView {
    fn default() -> Self {
        Self {
            event_dates: Vec::new(),
            duration_minutes: DEFAULT_DURATION_MINUTES,
            start_hour: DEFAULT_START_HOUR,
            end_hour: DEFAULT_END_HOUR,
            slots_per_day: DEFAULT_SLOTS_PER_DAY,
        }
    }
}

impl From<&TimeslotConfig> for TimeslotConfigView {
    fn from(config: &TimeslotConfig) -> Self {
        Self {
            event_dates: config.event_dates.clone(),
            duration_minutes: config.duration_minutes,
            start_hour: config.start_hour,
            end_hour: config.end_hour,
            slots_per_day: config.slots_per_day,
        }
    }
}

/// Request to replace the timeslot configuration.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SetTimeslotConfigRequest {
    pub event_dates: Vec<String>,

    #[validate(range(min = 1, message = "Duration must be greater than 0"))]
    pub duration_minutes: i32,

    #[validate(custom(function = "shared::validation::validate_hour"))]
    pub start_hour: i32,

    #[validate(custom(function = "shared::validation::validate_hour"))]
    pub end_hour: i32,

    #[validate(email(message = "Invalid admin email"))]
    pub admin_email: String,
}

/// A bookable window on one event day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub id: Uuid,
    /// Event day anchored at noon UTC.
    pub date: DateTime<Utc>,
    /// `HH:MM`, 24h.
    pub start_time: String,
    /// `HH:MM`, 24h.
    pub end_time: String,
    pub capacity: i32,
    pub created_at: DateTime<Utc>,
}

impl TimeSlot {
    pub fn window(&self) -> String {
        format!("{} - {}", self.start_time, self.end_time)
    }
}

/// A slot together with its count of non-cancelled reservations.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotUsage {
    pub slot: TimeSlot,
    pub reserved_count: i64,
}

/// Availability of one slot on a requested day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAvailability {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub start_time: String,
    pub end_time: String,
    pub capacity: i32,
    pub reserved_count: i64,
    pub available_spots: i64,
    pub is_available: bool,
}

/// Result of a slot generation run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTimeslotsResult {
    pub message: String,
    pub total_slots: usize,
    pub slots_per_day: i32,
    pub days: usize,
}

/// Result of clearing all slots.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearTimeslotsResult {
    pub message: String,
    pub deleted_count: usize,
}
