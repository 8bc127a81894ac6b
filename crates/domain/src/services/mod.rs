//! Domain services for the event operations backend.
//!
//! Services validate a request against current state, then commit their
//! writes as one [`UnitOfWork`](crate::store::UnitOfWork) whose guards repeat
//! the checks that concurrent requests could invalidate.

pub mod admin;
pub mod availability;
pub mod notification;
pub mod participants;
pub mod passport;
pub mod qr;
pub mod reservations;
pub mod slot_generator;
pub mod timeslots;
pub mod trivia;

#[cfg(test)]
pub(crate) mod test_support;

pub use admin::AdminService;
pub use availability::resolve_availability;
pub use notification::{
    MockNotificationService, NotificationChannel, NotificationResult, NotificationService,
    ReservationConfirmation,
};
pub use participants::ParticipantService;
pub use passport::{scan_guard, PassportService};
pub use qr::{TokenGenerator, UuidTokenGenerator};
pub use reservations::ReservationService;
pub use slot_generator::{format_minutes, generate_slots, SlotParams};
pub use timeslots::TimeslotService;
pub use trivia::TriviaService;

use crate::error::{DomainError, StageErrorCode};
use crate::models::{ReservationStatus, ScanStage};
use crate::store::{Guard, StoreError};

/// Translates a failed commit into the domain error its guard stands for.
pub(crate) fn commit_error(err: StoreError) -> DomainError {
    match err {
        StoreError::GuardFailed(guard) => match guard {
            Guard::SlotHasCapacity { .. } => DomainError::CapacityExceeded(
                "The selected timeslot has no available spots".into(),
            ),
            Guard::ReservationIs {
                status: ReservationStatus::Reserved,
                ..
            } => DomainError::AlreadyUsed("Reservation is no longer pending".into()),
            Guard::ReservationIs { status, .. } => {
                DomainError::Conflict(format!("Reservation is no longer {}", status))
            }
            Guard::NoActiveReservation { .. } => {
                DomainError::Conflict("User already has an active reservation".into())
            }
            Guard::EmailsUnregistered { emails } => DomainError::Conflict(format!(
                "These emails are already registered: {}",
                emails.join(", ")
            )),
            Guard::NoReservations => DomainError::Conflict(
                "Timeslots cannot be deleted because reservations exist".into(),
            ),
            Guard::PassportStage {
                stage,
                scanned: false,
                ..
            } => repeat_scan_error(stage),
            Guard::PassportStage { stage, .. } => missing_stage_error(stage),
        },
        StoreError::UniqueViolation(what) => {
            DomainError::Conflict(format!("Duplicate value for {}", what))
        }
        StoreError::Missing(what) => DomainError::NotFound(what),
        other => DomainError::Store(other),
    }
}

/// Error for scanning a stage that is already set.
pub(crate) fn repeat_scan_error(stage: ScanStage) -> DomainError {
    match stage {
        ScanStage::Entrada => DomainError::stage(
            StageErrorCode::AlreadyEntered,
            "Participant already registered their entrance",
        ),
        ScanStage::Entrega => DomainError::stage(
            StageErrorCode::AlreadyScanned,
            "Passport was already delivered",
        ),
        ScanStage::Completo => DomainError::stage(
            StageErrorCode::AlreadyScanned,
            "Passport was already marked as complete",
        ),
        ScanStage::Sorteo => DomainError::stage(
            StageErrorCode::AlreadyParticipated,
            "Participant is already in the raffle",
        ),
    }
}

/// Error for a stage whose prerequisite `stage` is not set.
pub(crate) fn missing_stage_error(stage: ScanStage) -> DomainError {
    match stage {
        ScanStage::Entrada => DomainError::stage(
            StageErrorCode::NotEntered,
            "Participant must register their entrance first",
        ),
        ScanStage::Entrega => DomainError::stage(
            StageErrorCode::PassportNotDelivered,
            "Passport must be delivered first",
        ),
        ScanStage::Completo | ScanStage::Sorteo => {
            DomainError::InvalidInput(format!("Stage {} is not a prerequisite", stage))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_commit_error_maps_capacity() {
        let err = commit_error(StoreError::GuardFailed(Guard::SlotHasCapacity {
            timeslot_id: Uuid::new_v4(),
            seats: 1,
            excluding: vec![],
        }));
        assert!(matches!(err, DomainError::CapacityExceeded(_)));
    }

    #[test]
    fn test_commit_error_maps_passport_guards() {
        let id = Uuid::new_v4();
        let repeat = commit_error(StoreError::GuardFailed(Guard::PassportStage {
            registration_id: id,
            stage: ScanStage::Sorteo,
            scanned: false,
        }));
        assert_eq!(repeat.code(), "ALREADY_PARTICIPATED");

        let missing = commit_error(StoreError::GuardFailed(Guard::PassportStage {
            registration_id: id,
            stage: ScanStage::Entrada,
            scanned: true,
        }));
        assert_eq!(missing.code(), "NOT_ENTERED");
    }

    #[test]
    fn test_commit_error_keeps_backend_faults() {
        let err = commit_error(StoreError::Backend("connection reset".into()));
        assert!(matches!(err, DomainError::Store(_)));
    }
}
