//! Registration control and participant export for the admin panel.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::DomainError;
use crate::models::reservation::UNRATED_LABEL;
use crate::models::{
    Participant, ParticipantExportRow, RegistrationControl, RegistrationStatus, Reservation,
    SetRegistrationControlRequest, TimeSlot, TimeslotConfigView,
};
use crate::store::{EventStore, UnitOfWork, WriteIntent};

const NO_RESERVATION: &str = "Sin reserva";
const NO_PARTNER: &str = "Sin compañero";
const NO_TIMESLOT: &str = "Sin turno";

pub struct AdminService {
    store: Arc<dyn EventStore>,
}

impl AdminService {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Latest manual override merged with the timeslot configuration.
    pub async fn registration_status(&self) -> Result<RegistrationStatus, DomainError> {
        let control = self.store.latest_registration_control().await?;
        let timeslots = self
            .store
            .latest_timeslot_config()
            .await?
            .as_ref()
            .map(TimeslotConfigView::from)
            .unwrap_or_default();
        Ok(RegistrationStatus::from_parts(control, timeslots))
    }

    pub async fn set_registration_control(
        &self,
        request: SetRegistrationControlRequest,
    ) -> Result<RegistrationControl, DomainError> {
        let control = RegistrationControl {
            id: Uuid::new_v4(),
            is_open: request.is_open,
            reason: request.reason,
            updated_by: request.admin_email,
            updated_at: Utc::now(),
        };
        self.store
            .commit(
                UnitOfWork::new().write(WriteIntent::AppendRegistrationControl(control.clone())),
            )
            .await?;

        info!(
            is_open = control.is_open,
            updated_by = ?control.updated_by,
            "Registration override set"
        );
        Ok(control)
    }

    /// Drops every manual override so registration follows the automatic rules again.
    pub async fn reset_to_automatic(&self) -> Result<(), DomainError> {
        self.store
            .commit(UnitOfWork::new().write(WriteIntent::ClearRegistrationControls))
            .await?;
        info!("Registration control reset to automatic");
        Ok(())
    }

    /// One row per participant, newest first.
    ///
    /// Fails when any participant holds more than one active reservation.
    pub async fn export_participants(&self) -> Result<Vec<ParticipantExportRow>, DomainError> {
        let participants = self.store.list_participants().await?;
        let names: HashMap<Uuid, String> = participants
            .iter()
            .map(|p| (p.id, p.full_name()))
            .collect();

        let mut active: HashMap<Uuid, Reservation> = HashMap::new();
        for reservation in self.store.list_reservations(None).await? {
            if !reservation.is_active() {
                continue;
            }
            let user_id = reservation.user_id;
            if active.insert(user_id, reservation).is_some() {
                error!(
                    user_id = %user_id,
                    "Participant holds more than one active reservation"
                );
                return Err(DomainError::Conflict(format!(
                    "User {} holds more than one active reservation",
                    user_id
                )));
            }
        }

        let slots: HashMap<Uuid, TimeSlot> = self
            .store
            .list_timeslots_with_usage()
            .await?
            .into_iter()
            .map(|usage| (usage.slot.id, usage.slot))
            .collect();

        Ok(participants
            .into_iter()
            .map(|p| {
                let reservation = active.get(&p.id);
                let slot = reservation.and_then(|r| slots.get(&r.timeslot_id));
                export_row(p, reservation, slot, &names)
            })
            .collect())
    }
}

fn export_row(
    participant: Participant,
    reservation: Option<&Reservation>,
    slot: Option<&TimeSlot>,
    names: &HashMap<Uuid, String>,
) -> ParticipantExportRow {
    let rating = reservation.and_then(|r| r.interest_rating);
    ParticipantExportRow {
        has_reservation: reservation.is_some(),
        reservation_status: reservation
            .map(|r| r.status.as_str().to_string())
            .unwrap_or_else(|| NO_RESERVATION.to_string()),
        checked_in: reservation.map_or(false, |r| r.checked_in_at.is_some()),
        interest_rating: rating.map(|r| r.value()),
        interest_level: rating
            .map(|r| r.label())
            .unwrap_or(UNRATED_LABEL)
            .to_string(),
        partner_name: participant
            .partner_id
            .and_then(|id| names.get(&id).cloned())
            .unwrap_or_else(|| NO_PARTNER.to_string()),
        timeslot: slot
            .map(TimeSlot::window)
            .unwrap_or_else(|| NO_TIMESLOT.to_string()),
        first_name: participant.first_name,
        last_name: participant.last_name,
        email: participant.email,
        whatsapp: participant.whatsapp,
        trivia_completed: participant.trivia_completed,
        created_at: participant.created_at,
    }
}
