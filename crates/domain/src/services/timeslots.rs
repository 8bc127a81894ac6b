//! Timeslot configuration, generation and availability.

use std::sync::Arc;

use chrono::Utc;
use shared::validation::parse_event_date;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::availability::resolve_availability;
use super::commit_error;
use super::slot_generator::{generate_slots, SlotParams};
use crate::error::DomainError;
use crate::models::timeslot::EVENT_DAY_COUNT;
use crate::models::{
    ClearTimeslotsResult, GenerateTimeslotsResult, SetTimeslotConfigRequest, SlotAvailability,
    TimeslotConfig, TimeslotConfigView,
};
use crate::store::{EventStore, Guard, UnitOfWork, WriteIntent};

pub struct TimeslotService {
    store: Arc<dyn EventStore>,
    default_capacity: i32,
}

impl TimeslotService {
    pub fn new(store: Arc<dyn EventStore>, default_capacity: i32) -> Self {
        Self {
            store,
            default_capacity,
        }
    }

    /// Current configuration, or the defaults when none was saved.
    pub async fn get_config(&self) -> Result<TimeslotConfigView, DomainError> {
        Ok(self
            .store
            .latest_timeslot_config()
            .await?
            .as_ref()
            .map(TimeslotConfigView::from)
            .unwrap_or_default())
    }

    /// Saves a new authoritative configuration. Existing slots are untouched.
    pub async fn set_config(
        &self,
        request: SetTimeslotConfigRequest,
    ) -> Result<TimeslotConfig, DomainError> {
        request.validate()?;

        if request.event_dates.len() != EVENT_DAY_COUNT {
            return Err(DomainError::InvalidInput(format!(
                "Exactly {} event dates are required",
                EVENT_DAY_COUNT
            )));
        }

        let event_dates = request
            .event_dates
            .iter()
            .map(|raw| {
                parse_event_date(raw).ok_or_else(|| {
                    DomainError::InvalidInput(format!("Invalid event date: {}", raw))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let params = SlotParams::new(
            request.duration_minutes,
            request.start_hour,
            request.end_hour,
        )?;

        let config = TimeslotConfig {
            id: Uuid::new_v4(),
            event_dates,
            duration_minutes: params.duration_minutes,
            start_hour: params.start_hour,
            end_hour: params.end_hour,
            slots_per_day: params.slots_per_day(),
            updated_by: Some(request.admin_email),
            updated_at: Utc::now(),
        };

        self.store
            .commit(UnitOfWork::new().write(WriteIntent::InsertTimeslotConfig(config.clone())))
            .await?;

        info!(
            config_id = %config.id,
            slots_per_day = config.slots_per_day,
            updated_by = ?config.updated_by,
            "Timeslot configuration saved"
        );
        Ok(config)
    }

    /// Replaces every slot with a fresh set built from the current configuration.
    pub async fn generate(&self) -> Result<GenerateTimeslotsResult, DomainError> {
        let config = self
            .store
            .latest_timeslot_config()
            .await?
            .filter(|c| !c.event_dates.is_empty())
            .ok_or_else(|| {
                DomainError::InvalidInput(
                    "No timeslot configuration found. Configure timeslots first.".into(),
                )
            })?;

        let params = SlotParams::new(config.duration_minutes, config.start_hour, config.end_hour)?;
        self.ensure_no_reservations().await?;

        let slots = generate_slots(&config.event_dates, params, self.default_capacity);
        let total_slots = slots.len();

        self.store
            .commit(
                UnitOfWork::new()
                    .guard(Guard::NoReservations)
                    .write(WriteIntent::DeleteAllTimeslots)
                    .write(WriteIntent::InsertTimeslots(slots)),
            )
            .await
            .map_err(commit_error)?;

        info!(
            total_slots,
            days = config.event_dates.len(),
            capacity = self.default_capacity,
            "Timeslots generated"
        );

        Ok(GenerateTimeslotsResult {
            message: format!("Generated {} timeslots", total_slots),
            total_slots,
            slots_per_day: params.slots_per_day(),
            days: config.event_dates.len(),
        })
    }

    /// Deletes every slot. Refused while any reservation exists.
    pub async fn clear(&self) -> Result<ClearTimeslotsResult, DomainError> {
        self.ensure_no_reservations().await?;
        let deleted_count = self.store.list_timeslots_with_usage().await?.len();

        self.store
            .commit(
                UnitOfWork::new()
                    .guard(Guard::NoReservations)
                    .write(WriteIntent::DeleteAllTimeslots),
            )
            .await
            .map_err(commit_error)?;

        info!(deleted_count, "Timeslots cleared");
        Ok(ClearTimeslotsResult {
            message: format!("Deleted {} timeslots", deleted_count),
            deleted_count,
        })
    }

    /// Availability of every slot on a `YYYY-MM-DD` date.
    pub async fn availability(&self, date: &str) -> Result<Vec<SlotAvailability>, DomainError> {
        let day = parse_event_date(date)
            .ok_or_else(|| DomainError::InvalidInput(format!("Invalid date: {}", date)))?;
        let usage = self.store.list_timeslots_with_usage().await?;
        Ok(resolve_availability(day, usage))
    }

    async fn ensure_no_reservations(&self) -> Result<(), DomainError> {
        let count = self.store.count_reservations().await?;
        if count > 0 {
            return Err(DomainError::Conflict(format!(
                "Timeslots cannot be deleted because {} reservation(s) exist. Remove the reservations first.",
                count
            )));
        }
        Ok(())
    }
}
