//! PostgreSQL implementation of the domain [`EventStore`] port.
//!
//! `commit` opens one transaction per unit of work. Guards lock the row they
//! inspect (`FOR UPDATE`) so concurrent check-then-act requests on the same
//! slot, reservation, user or registration serialize.

use domain::models::{
    Participant, PassportRegistration, Question, RegistrationControl, Reservation,
    ReservationStatus, ScanStage, SlotUsage, StageCounts, TimeSlot, TimeslotConfig,
};
use domain::store::{EventStore, Guard, StoreError, StoreResult, UnitOfWork, WriteIntent};
use sqlx::{PgConnection, PgPool};
use tracing::{debug, error};
use uuid::Uuid;

use crate::repositories::{
    ParticipantRepository, PassportRepository, RegistrationControlRepository,
    ReservationRepository, TimeslotRepository, TriviaRepository,
};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Maps a driver error onto the port's error kinds.
pub fn store_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        let constraint = db.constraint().unwrap_or("unknown").to_string();
        match db.code().as_deref() {
            Some(UNIQUE_VIOLATION) => return StoreError::UniqueViolation(constraint),
            Some(FOREIGN_KEY_VIOLATION) => return StoreError::Missing(constraint),
            _ => {}
        }
    }
    error!(error = %err, "Database error");
    StoreError::Backend(err.to_string())
}

fn affected(rows: u64, what: impl FnOnce() -> String) -> StoreResult<()> {
    if rows == 0 {
        Err(StoreError::Missing(what()))
    } else {
        Ok(())
    }
}

/// Event store backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
    participants: ParticipantRepository,
    trivia: TriviaRepository,
    timeslots: TimeslotRepository,
    reservations: ReservationRepository,
    controls: RegistrationControlRepository,
    passports: PassportRepository,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            participants: ParticipantRepository::new(pool.clone()),
            trivia: TriviaRepository::new(pool.clone()),
            timeslots: TimeslotRepository::new(pool.clone()),
            reservations: ReservationRepository::new(pool.clone()),
            controls: RegistrationControlRepository::new(pool.clone()),
            passports: PassportRepository::new(pool.clone()),
            pool,
        }
    }

    async fn check(&self, conn: &mut PgConnection, guard: &Guard) -> StoreResult<()> {
        let ok = match guard {
            Guard::SlotHasCapacity {
                timeslot_id,
                seats,
                excluding,
            } => {
                let capacity = self
                    .timeslots
                    .lock_capacity(&mut *conn, *timeslot_id)
                    .await
                    .map_err(store_error)?
                    .ok_or_else(|| StoreError::Missing(format!("timeslot {}", timeslot_id)))?;
                let used = self
                    .timeslots
                    .count_active(&mut *conn, *timeslot_id, excluding)
                    .await
                    .map_err(store_error)?;
                used + seats <= i64::from(capacity)
            }
            Guard::ReservationIs {
                reservation_id,
                status,
            } => {
                let current = self
                    .reservations
                    .lock_status(&mut *conn, *reservation_id)
                    .await
                    .map_err(store_error)?;
                current.map(ReservationStatus::from) == Some(*status)
            }
            Guard::NoActiveReservation { user_id } => {
                if !self
                    .participants
                    .lock(&mut *conn, *user_id)
                    .await
                    .map_err(store_error)?
                {
                    return Err(StoreError::Missing(format!("user {}", user_id)));
                }
                self.reservations
                    .count_active_for_user(&mut *conn, *user_id)
                    .await
                    .map_err(store_error)?
                    == 0
            }
            // The unique email index catches a concurrent insert that slips past this check.
            Guard::EmailsUnregistered { emails } => {
                self.participants
                    .count_registered(&mut *conn, emails)
                    .await
                    .map_err(store_error)?
                    == 0
            }
            Guard::NoReservations => {
                self.reservations
                    .lock_and_count(&mut *conn)
                    .await
                    .map_err(store_error)?
                    == 0
            }
            Guard::PassportStage {
                registration_id,
                stage,
                scanned,
            } => self
                .passports
                .lock(&mut *conn, *registration_id)
                .await
                .map_err(store_error)?
                .map(PassportRegistration::from)
                .map(|p| p.is_scanned(*stage) == *scanned)
                .unwrap_or(false),
        };

        if ok {
            Ok(())
        } else {
            debug!(?guard, "Commit guard failed");
            Err(StoreError::GuardFailed(guard.clone()))
        }
    }

    async fn apply(&self, conn: &mut PgConnection, write: &WriteIntent) -> StoreResult<()> {
        match write {
            WriteIntent::InsertParticipant(participant) => self
                .participants
                .insert(&mut *conn, participant)
                .await
                .map_err(store_error),
            WriteIntent::LinkPartner {
                participant_id,
                partner_id,
            } => {
                let rows = self
                    .participants
                    .link_partner(&mut *conn, *participant_id, *partner_id)
                    .await
                    .map_err(store_error)?;
                affected(rows, || format!("user {}", participant_id))
            }
            WriteIntent::MarkTriviaCompleted { participant_id } => {
                let rows = self
                    .participants
                    .mark_trivia_completed(&mut *conn, *participant_id)
                    .await
                    .map_err(store_error)?;
                affected(rows, || format!("user {}", participant_id))
            }
            WriteIntent::InsertReservation(reservation) => self
                .reservations
                .insert(&mut *conn, reservation)
                .await
                .map_err(store_error),
            WriteIntent::CheckInReservation { reservation_id, at } => {
                let rows = self
                    .reservations
                    .check_in(&mut *conn, *reservation_id, *at)
                    .await
                    .map_err(store_error)?;
                affected(rows, || format!("reservation {}", reservation_id))
            }
            WriteIntent::MoveReservation {
                reservation_id,
                timeslot_id,
            } => {
                let rows = self
                    .reservations
                    .move_to(&mut *conn, *reservation_id, *timeslot_id)
                    .await
                    .map_err(store_error)?;
                affected(rows, || format!("reservation {}", reservation_id))
            }
            WriteIntent::RateReservation {
                reservation_id,
                rating,
            } => {
                let rows = self
                    .reservations
                    .rate(&mut *conn, *reservation_id, *rating)
                    .await
                    .map_err(store_error)?;
                affected(rows, || format!("reservation {}", reservation_id))
            }
            WriteIntent::CancelReservation { reservation_id } => {
                let rows = self
                    .reservations
                    .cancel(&mut *conn, *reservation_id)
                    .await
                    .map_err(store_error)?;
                affected(rows, || format!("reservation {}", reservation_id))
            }
            WriteIntent::InsertTimeslotConfig(config) => self
                .timeslots
                .insert_config(&mut *conn, config)
                .await
                .map_err(store_error),
            WriteIntent::InsertTimeslots(slots) => self
                .timeslots
                .insert_many(&mut *conn, slots)
                .await
                .map(|_| ())
                .map_err(store_error),
            WriteIntent::DeleteAllTimeslots => self
                .timeslots
                .delete_all(&mut *conn)
                .await
                .map(|_| ())
                .map_err(store_error),
            WriteIntent::AppendRegistrationControl(control) => self
                .controls
                .append(&mut *conn, control)
                .await
                .map_err(store_error),
            WriteIntent::ClearRegistrationControls => self
                .controls
                .clear(&mut *conn)
                .await
                .map(|_| ())
                .map_err(store_error),
            WriteIntent::InsertQuestion(question) => self
                .trivia
                .insert_question(&mut *conn, question)
                .await
                .map_err(store_error),
            WriteIntent::InsertPassport(registration) => self
                .passports
                .insert(&mut *conn, registration)
                .await
                .map_err(store_error),
            WriteIntent::MarkStageScanned {
                registration_id,
                stage,
                at,
            } => {
                let rows = self
                    .passports
                    .mark_scanned(&mut *conn, *registration_id, *stage, *at)
                    .await
                    .map_err(store_error)?;
                affected(rows, || format!("registration {}", registration_id))
            }
        }
    }
}

#[async_trait::async_trait]
impl EventStore for PgEventStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(store_error)
    }

    async fn find_participant(&self, id: Uuid) -> StoreResult<Option<Participant>> {
        Ok(self
            .participants
            .find_by_id(id)
            .await
            .map_err(store_error)?
            .map(Participant::from))
    }

    async fn find_participant_by_email(&self, email: &str) -> StoreResult<Option<Participant>> {
        Ok(self
            .participants
            .find_by_email(email)
            .await
            .map_err(store_error)?
            .map(Participant::from))
    }

    async fn find_participants_by_emails(
        &self,
        emails: &[String],
    ) -> StoreResult<Vec<Participant>> {
        Ok(self
            .participants
            .find_by_emails(emails)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(Participant::from)
            .collect())
    }

    async fn list_participants(&self) -> StoreResult<Vec<Participant>> {
        Ok(self
            .participants
            .list_all()
            .await
            .map_err(store_error)?
            .into_iter()
            .map(Participant::from)
            .collect())
    }

    async fn list_questions(&self) -> StoreResult<Vec<Question>> {
        self.trivia.list_questions().await.map_err(store_error)
    }

    async fn is_correct_answer(&self, question_id: Uuid, answer_id: Uuid) -> StoreResult<bool> {
        self.trivia
            .is_correct_answer(question_id, answer_id)
            .await
            .map_err(store_error)
    }

    async fn latest_timeslot_config(&self) -> StoreResult<Option<TimeslotConfig>> {
        Ok(self
            .timeslots
            .latest_config()
            .await
            .map_err(store_error)?
            .map(TimeslotConfig::from))
    }

    async fn find_timeslot(&self, id: Uuid) -> StoreResult<Option<TimeSlot>> {
        Ok(self
            .timeslots
            .find_by_id(id)
            .await
            .map_err(store_error)?
            .map(TimeSlot::from))
    }

    async fn list_timeslots_with_usage(&self) -> StoreResult<Vec<SlotUsage>> {
        Ok(self
            .timeslots
            .list_with_usage()
            .await
            .map_err(store_error)?
            .into_iter()
            .map(SlotUsage::from)
            .collect())
    }

    async fn count_reservations(&self) -> StoreResult<i64> {
        self.reservations.count_all().await.map_err(store_error)
    }

    async fn find_reservation(&self, id: Uuid) -> StoreResult<Option<Reservation>> {
        Ok(self
            .reservations
            .find_by_id(id)
            .await
            .map_err(store_error)?
            .map(Reservation::from))
    }

    async fn find_reservation_by_qr(&self, qr_code: &str) -> StoreResult<Option<Reservation>> {
        Ok(self
            .reservations
            .find_by_qr(qr_code)
            .await
            .map_err(store_error)?
            .map(Reservation::from))
    }

    async fn active_reservations_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Reservation>> {
        Ok(self
            .reservations
            .active_for_user(user_id)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(Reservation::from)
            .collect())
    }

    async fn list_reservations(
        &self,
        status: Option<ReservationStatus>,
    ) -> StoreResult<Vec<Reservation>> {
        Ok(self
            .reservations
            .list(status)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(Reservation::from)
            .collect())
    }

    async fn latest_registration_control(&self) -> StoreResult<Option<RegistrationControl>> {
        Ok(self
            .controls
            .latest()
            .await
            .map_err(store_error)?
            .map(RegistrationControl::from))
    }

    async fn find_passport(&self, id: Uuid) -> StoreResult<Option<PassportRegistration>> {
        Ok(self
            .passports
            .find_by_id(id)
            .await
            .map_err(store_error)?
            .map(PassportRegistration::from))
    }

    async fn list_passports(
        &self,
        stage: Option<ScanStage>,
        limit: i64,
    ) -> StoreResult<Vec<PassportRegistration>> {
        Ok(self
            .passports
            .list(stage, limit)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(PassportRegistration::from)
            .collect())
    }

    async fn count_passports(&self) -> StoreResult<i64> {
        self.passports.count().await.map_err(store_error)
    }

    async fn passport_stage_counts(&self) -> StoreResult<StageCounts> {
        Ok(self
            .passports
            .stage_counts()
            .await
            .map_err(store_error)?
            .into())
    }

    async fn commit(&self, unit: UnitOfWork) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        for guard in &unit.guards {
            self.check(&mut tx, guard).await?;
        }
        for write in &unit.writes {
            self.apply(&mut tx, write).await?;
        }

        // Dropping `tx` on an early return rolls it back.
        tx.commit().await.map_err(store_error)
    }
}
