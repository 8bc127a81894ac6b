//! Storage port for the event backend.
//!
//! Reads are plain async queries. Every mutation goes through
//! [`EventStore::commit`], which takes a [`UnitOfWork`]: a list of guards
//! (preconditions checked against current state) and write intents. A store
//! evaluates all guards and applies all writes inside one transaction, so a
//! unit either lands completely or not at all.

pub mod memory;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    InterestRating, Participant, PassportRegistration, Question, RegistrationControl, Reservation,
    ReservationStatus, ScanStage, SlotUsage, StageCounts, TimeSlot, TimeslotConfig,
};

pub use memory::InMemoryEventStore;

/// Precondition evaluated inside a commit, against the state the writes will modify.
#[derive(Debug, Clone, PartialEq)]
pub enum Guard {
    /// Active reservations at the slot, ignoring `excluding`, leave room for `seats` more.
    SlotHasCapacity {
        timeslot_id: Uuid,
        seats: i64,
        excluding: Vec<Uuid>,
    },
    /// The reservation exists and currently has `status`.
    ReservationIs {
        reservation_id: Uuid,
        status: ReservationStatus,
    },
    /// The participant holds no non-cancelled reservation.
    NoActiveReservation { user_id: Uuid },
    /// None of the emails belongs to a participant.
    EmailsUnregistered { emails: Vec<String> },
    /// No reservation of any status exists.
    NoReservations,
    /// The registration's flag for `stage` equals `scanned`.
    PassportStage {
        registration_id: Uuid,
        stage: ScanStage,
        scanned: bool,
    },
}

/// A single mutation inside a unit of work.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteIntent {
    InsertParticipant(Participant),
    LinkPartner {
        participant_id: Uuid,
        partner_id: Uuid,
    },
    MarkTriviaCompleted {
        participant_id: Uuid,
    },
    InsertReservation(Reservation),
    CheckInReservation {
        reservation_id: Uuid,
        at: DateTime<Utc>,
    },
    MoveReservation {
        reservation_id: Uuid,
        timeslot_id: Uuid,
    },
    RateReservation {
        reservation_id: Uuid,
        rating: InterestRating,
    },
    CancelReservation {
        reservation_id: Uuid,
    },
    InsertTimeslotConfig(TimeslotConfig),
    InsertTimeslots(Vec<TimeSlot>),
    DeleteAllTimeslots,
    AppendRegistrationControl(RegistrationControl),
    ClearRegistrationControls,
    InsertQuestion(Question),
    InsertPassport(PassportRegistration),
    MarkStageScanned {
        registration_id: Uuid,
        stage: ScanStage,
        at: DateTime<Utc>,
    },
}

/// Guards plus writes, committed atomically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitOfWork {
    pub guards: Vec<Guard>,
    pub writes: Vec<WriteIntent>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn guard(mut self, guard: Guard) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn write(mut self, write: WriteIntent) -> Self {
        self.writes.push(write);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty() && self.writes.is_empty()
    }
}

/// Errors raised by store implementations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("Precondition failed: {0:?}")]
    GuardFailed(Guard),

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Referenced row missing: {0}")]
    Missing(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence port used by every domain service.
#[async_trait::async_trait]
pub trait EventStore: Send + Sync {
    /// Round-trip to the backend.
    async fn ping(&self) -> StoreResult<()>;

    async fn find_participant(&self, id: Uuid) -> StoreResult<Option<Participant>>;

    async fn find_participant_by_email(&self, email: &str) -> StoreResult<Option<Participant>>;

    /// Participants whose email is in `emails` (case-insensitive).
    async fn find_participants_by_emails(
        &self,
        emails: &[String],
    ) -> StoreResult<Vec<Participant>>;

    /// All participants, newest first.
    async fn list_participants(&self) -> StoreResult<Vec<Participant>>;

    /// Questions ordered by `order`, answers included.
    async fn list_questions(&self) -> StoreResult<Vec<Question>>;

    /// True when `answer_id` belongs to `question_id` and is marked correct.
    async fn is_correct_answer(&self, question_id: Uuid, answer_id: Uuid) -> StoreResult<bool>;

    /// Most recently updated configuration.
    async fn latest_timeslot_config(&self) -> StoreResult<Option<TimeslotConfig>>;

    async fn find_timeslot(&self, id: Uuid) -> StoreResult<Option<TimeSlot>>;

    /// Every slot with its count of non-cancelled reservations, ordered by date then start time.
    async fn list_timeslots_with_usage(&self) -> StoreResult<Vec<SlotUsage>>;

    async fn count_reservations(&self) -> StoreResult<i64>;

    async fn find_reservation(&self, id: Uuid) -> StoreResult<Option<Reservation>>;

    async fn find_reservation_by_qr(&self, qr_code: &str) -> StoreResult<Option<Reservation>>;

    /// Non-cancelled reservations of a participant, newest first.
    async fn active_reservations_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Reservation>>;

    /// Reservations with `status`, or all when `None`, newest first.
    async fn list_reservations(
        &self,
        status: Option<ReservationStatus>,
    ) -> StoreResult<Vec<Reservation>>;

    async fn latest_registration_control(&self) -> StoreResult<Option<RegistrationControl>>;

    async fn find_passport(&self, id: Uuid) -> StoreResult<Option<PassportRegistration>>;

    /// Registrations with `stage` scanned (all when `None`), most recently updated first.
    async fn list_passports(
        &self,
        stage: Option<ScanStage>,
        limit: i64,
    ) -> StoreResult<Vec<PassportRegistration>>;

    async fn count_passports(&self) -> StoreResult<i64>;

    async fn passport_stage_counts(&self) -> StoreResult<StageCounts>;

    /// Evaluate every guard and apply every write atomically.
    async fn commit(&self, unit: UnitOfWork) -> StoreResult<()>;
}
