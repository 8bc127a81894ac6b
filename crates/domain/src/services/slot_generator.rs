//! Turns a timeslot configuration into concrete slots.

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::error::DomainError;
use crate::models::timeslot::event_day_instant;
use crate::models::TimeSlot;

const MINUTES_PER_HOUR: i32 = 60;
const LAST_HOUR: i32 = 23;

/// Validated slot-generation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotParams {
    pub duration_minutes: i32,
    pub start_hour: i32,
    pub end_hour: i32,
}

impl SlotParams {
    pub fn new(duration_minutes: i32, start_hour: i32, end_hour: i32) -> Result<Self, DomainError> {
        if duration_minutes <= 0 {
            return Err(DomainError::InvalidInput(
                "Duration must be greater than 0".into(),
            ));
        }
        if !(0..=LAST_HOUR).contains(&start_hour) || !(0..=LAST_HOUR).contains(&end_hour) {
            return Err(DomainError::InvalidInput(
                "Hours must be between 0 and 23".into(),
            ));
        }
        if start_hour >= end_hour {
            return Err(DomainError::InvalidInput(
                "Start hour must be before end hour".into(),
            ));
        }
        Ok(Self {
            duration_minutes,
            start_hour,
            end_hour,
        })
    }

    /// `floor(total_minutes / duration)`.
    pub fn slots_per_day(&self) -> i32 {
        (self.end_hour - self.start_hour) * MINUTES_PER_HOUR / self.duration_minutes
    }

    /// Start/end minute-of-day pairs for one day. A trailing partial window is dropped.
    pub fn windows(&self) -> Vec<(i32, i32)> {
        let end = self.end_hour * MINUTES_PER_HOUR;
        let mut cursor = self.start_hour * MINUTES_PER_HOUR;
        let mut windows = Vec::new();
        while cursor + self.duration_minutes <= end {
            windows.push((cursor, cursor + self.duration_minutes));
            cursor += self.duration_minutes;
        }
        windows
    }
}

/// Formats a minute-of-day as zero-padded `HH:MM`.
pub fn format_minutes(minutes: i32) -> String {
    format!(
        "{:02}:{:02}",
        minutes / MINUTES_PER_HOUR,
        minutes % MINUTES_PER_HOUR
    )
}

/// Generates every slot for every date, in date order then time order.
pub fn generate_slots(dates: &[NaiveDate], params: SlotParams, capacity: i32) -> Vec<TimeSlot> {
    let windows = params.windows();
    let created_at = Utc::now();

    dates
        .iter()
        .flat_map(|date| {
            let day = event_day_instant(*date);
            windows.iter().map(move |(start, end)| TimeSlot {
                id: Uuid::new_v4(),
                date: day,
                start_time: format_minutes(*start),
                end_time: format_minutes(*end),
                capacity,
                created_at,
            })
        })
        .collect()
}
