//! Per-day slot availability.

use chrono::NaiveDate;

use crate::models::timeslot::{event_day_instant, is_same_event_day};
use crate::models::{SlotAvailability, SlotUsage};

/// Availability of every slot on `date`.
///
/// Day matching compares UTC calendar days of the stored noon anchor and the
/// requested date's noon anchor.
pub fn resolve_availability(date: NaiveDate, usage: Vec<SlotUsage>) -> Vec<SlotAvailability> {
    let target = event_day_instant(date);

    usage
        .into_iter()
        .filter(|u| is_same_event_day(u.slot.date, target))
        .map(|u| {
            let capacity = i64::from(u.slot.capacity);
            SlotAvailability {
                id: u.slot.id,
                date: u.slot.date,
                start_time: u.slot.start_time,
                end_time: u.slot.end_time,
                capacity: u.slot.capacity,
                reserved_count: u.reserved_count,
                available_spots: (capacity - u.reserved_count).max(0),
                is_available: u.reserved_count < capacity,
            }
        })
        .collect()
}
