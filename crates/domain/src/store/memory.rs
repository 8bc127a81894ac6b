//! In-memory [`EventStore`] used by tests and local runs without a database.
//!
//! A single `RwLock` guards the whole state. `commit` stages writes on a copy
//! and swaps it in only when every guard and write succeeded.

use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use super::{EventStore, Guard, StoreError, StoreResult, UnitOfWork, WriteIntent};
use crate::models::{
    Participant, PassportRegistration, Question, RegistrationControl, Reservation,
    ReservationStatus, ScanStage, SlotUsage, StageCounts, TimeSlot, TimeslotConfig,
};

#[derive(Debug, Clone, Default)]
struct State {
    participants: HashMap<Uuid, Participant>,
    questions: Vec<Question>,
    configs: Vec<TimeslotConfig>,
    timeslots: HashMap<Uuid, TimeSlot>,
    reservations: HashMap<Uuid, Reservation>,
    controls: Vec<RegistrationControl>,
    passports: HashMap<Uuid, PassportRegistration>,
}

impl State {
    fn email_taken(&self, email: &str) -> bool {
        self.participants
            .values()
            .any(|p| p.email.eq_ignore_ascii_case(email))
    }

    fn active_at_slot(&self, timeslot_id: Uuid, excluding: &[Uuid]) -> i64 {
        self.reservations
            .values()
            .filter(|r| {
                r.timeslot_id == timeslot_id && r.is_active() && !excluding.contains(&r.id)
            })
            .count() as i64
    }

    fn check(&self, guard: &Guard) -> StoreResult<()> {
        let ok = match guard {
            Guard::SlotHasCapacity {
                timeslot_id,
                seats,
                excluding,
            } => {
                let slot = self
                    .timeslots
                    .get(timeslot_id)
                    .ok_or_else(|| StoreError::Missing(format!("timeslot {}", timeslot_id)))?;
                self.active_at_slot(*timeslot_id, excluding) + seats <= i64::from(slot.capacity)
            }
            Guard::ReservationIs {
                reservation_id,
                status,
            } => self
                .reservations
                .get(reservation_id)
                .map(|r| r.status == *status)
                .unwrap_or(false),
            Guard::NoActiveReservation { user_id } => !self
                .reservations
                .values()
                .any(|r| r.user_id == *user_id && r.is_active()),
            Guard::EmailsUnregistered { emails } => !emails.iter().any(|e| self.email_taken(e)),
            Guard::NoReservations => self.reservations.is_empty(),
            Guard::PassportStage {
                registration_id,
                stage,
                scanned,
            } => self
                .passports
                .get(registration_id)
                .map(|p| p.is_scanned(*stage) == *scanned)
                .unwrap_or(false),
        };

        if ok {
            Ok(())
        } else {
            Err(StoreError::GuardFailed(guard.clone()))
        }
    }

    fn reservation_mut(&mut self, id: Uuid) -> StoreResult<&mut Reservation> {
        self.reservations
            .get_mut(&id)
            .ok_or_else(|| StoreError::Missing(format!("reservation {}", id)))
    }

    fn participant_mut(&mut self, id: Uuid) -> StoreResult<&mut Participant> {
        self.participants
            .get_mut(&id)
            .ok_or_else(|| StoreError::Missing(format!("user {}", id)))
    }

    fn apply(&mut self, write: WriteIntent) -> StoreResult<()> {
        match write {
            WriteIntent::InsertParticipant(participant) => {
                if self.email_taken(&participant.email) {
                    return Err(StoreError::UniqueViolation("users.email".into()));
                }
                if let Some(partner_id) = participant.partner_id {
                    if !self.participants.contains_key(&partner_id) {
                        return Err(StoreError::Missing(format!("user {}", partner_id)));
                    }
                }
                self.participants.insert(participant.id, participant);
            }
            WriteIntent::LinkPartner {
                participant_id,
                partner_id,
            } => {
                if !self.participants.contains_key(&partner_id) {
                    return Err(StoreError::Missing(format!("user {}", partner_id)));
                }
                self.participant_mut(participant_id)?.partner_id = Some(partner_id);
            }
            WriteIntent::MarkTriviaCompleted { participant_id } => {
                self.participant_mut(participant_id)?.trivia_completed = true;
            }
            WriteIntent::InsertReservation(reservation) => {
                if !self.participants.contains_key(&reservation.user_id) {
                    return Err(StoreError::Missing(format!("user {}", reservation.user_id)));
                }
                if !self.timeslots.contains_key(&reservation.timeslot_id) {
                    return Err(StoreError::Missing(format!(
                        "timeslot {}",
                        reservation.timeslot_id
                    )));
                }
                if self
                    .reservations
                    .values()
                    .any(|r| r.qr_code == reservation.qr_code)
                {
                    return Err(StoreError::UniqueViolation("reservations.qr_code".into()));
                }
                self.reservations.insert(reservation.id, reservation);
            }
            WriteIntent::CheckInReservation { reservation_id, at } => {
                let reservation = self.reservation_mut(reservation_id)?;
                reservation.status = ReservationStatus::Used;
                reservation.checked_in_at = Some(at);
            }
            WriteIntent::MoveReservation {
                reservation_id,
                timeslot_id,
            } => {
                if !self.timeslots.contains_key(&timeslot_id) {
                    return Err(StoreError::Missing(format!("timeslot {}", timeslot_id)));
                }
                self.reservation_mut(reservation_id)?.timeslot_id = timeslot_id;
            }
            WriteIntent::RateReservation {
                reservation_id,
                rating,
            } => {
                self.reservation_mut(reservation_id)?.interest_rating = Some(rating);
            }
            WriteIntent::CancelReservation { reservation_id } => {
                self.reservation_mut(reservation_id)?.status = ReservationStatus::Cancelled;
            }
            WriteIntent::InsertTimeslotConfig(config) => self.configs.push(config),
            WriteIntent::InsertTimeslots(slots) => {
                for slot in slots {
                    self.timeslots.insert(slot.id, slot);
                }
            }
            WriteIntent::DeleteAllTimeslots => {
                if !self.reservations.is_empty() {
                    return Err(StoreError::Backend(
                        "timeslots are referenced by reservations".into(),
                    ));
                }
                self.timeslots.clear();
            }
            WriteIntent::AppendRegistrationControl(control) => self.controls.push(control),
            WriteIntent::ClearRegistrationControls => self.controls.clear(),
            WriteIntent::InsertQuestion(question) => self.questions.push(question),
            WriteIntent::InsertPassport(passport) => {
                if self
                    .passports
                    .values()
                    .any(|p| p.email.eq_ignore_ascii_case(&passport.email))
                {
                    return Err(StoreError::UniqueViolation("registrations.email".into()));
                }
                self.passports.insert(passport.id, passport);
            }
            WriteIntent::MarkStageScanned {
                registration_id,
                stage,
                at,
            } => {
                let passport = self.passports.get_mut(&registration_id).ok_or_else(|| {
                    StoreError::Missing(format!("registration {}", registration_id))
                })?;
                passport.mark_scanned(stage, at);
            }
        }
        Ok(())
    }
}

/// Process-local store with the same commit semantics as the database.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    state: RwLock<State>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(reservations: &mut [Reservation]) {
    reservations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[async_trait::async_trait]
impl EventStore for InMemoryEventStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn find_participant(&self, id: Uuid) -> StoreResult<Option<Participant>> {
        Ok(self.state.read().await.participants.get(&id).cloned())
    }

    async fn find_participant_by_email(&self, email: &str) -> StoreResult<Option<Participant>> {
        let state = self.state.read().await;
        Ok(state
            .participants
            .values()
            .find(|p| p.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_participants_by_emails(
        &self,
        emails: &[String],
    ) -> StoreResult<Vec<Participant>> {
        let state = self.state.read().await;
        Ok(state
            .participants
            .values()
            .filter(|p| emails.iter().any(|e| p.email.eq_ignore_ascii_case(e)))
            .cloned()
            .collect())
    }

    async fn list_participants(&self) -> StoreResult<Vec<Participant>> {
        let mut all: Vec<Participant> = self
            .state
            .read()
            .await
            .participants
            .values()
            .cloned()
            .collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn list_questions(&self) -> StoreResult<Vec<Question>> {
        let mut questions = self.state.read().await.questions.clone();
        questions.sort_by_key(|q| q.order);
        Ok(questions)
    }

    async fn is_correct_answer(&self, question_id: Uuid, answer_id: Uuid) -> StoreResult<bool> {
        let state = self.state.read().await;
        Ok(state
            .questions
            .iter()
            .filter(|q| q.id == question_id)
            .flat_map(|q| q.answers.iter())
            .any(|a| a.id == answer_id && a.is_correct))
    }

    async fn latest_timeslot_config(&self) -> StoreResult<Option<TimeslotConfig>> {
        let state = self.state.read().await;
        Ok(state.configs.iter().max_by_key(|c| c.updated_at).cloned())
    }

    async fn find_timeslot(&self, id: Uuid) -> StoreResult<Option<TimeSlot>> {
        Ok(self.state.read().await.timeslots.get(&id).cloned())
    }

    async fn list_timeslots_with_usage(&self) -> StoreResult<Vec<SlotUsage>> {
        let state = self.state.read().await;
        let mut usage: Vec<SlotUsage> = state
            .timeslots
            .values()
            .map(|slot| SlotUsage {
                reserved_count: state.active_at_slot(slot.id, &[]),
                slot: slot.clone(),
            })
            .collect();
        usage.sort_by(|a, b| {
            a.slot
                .date
                .cmp(&b.slot.date)
                .then_with(|| a.slot.start_time.cmp(&b.slot.start_time))
        });
        Ok(usage)
    }

    async fn count_reservations(&self) -> StoreResult<i64> {
        Ok(self.state.read().await.reservations.len() as i64)
    }

    async fn find_reservation(&self, id: Uuid) -> StoreResult<Option<Reservation>> {
        Ok(self.state.read().await.reservations.get(&id).cloned())
    }

    async fn find_reservation_by_qr(&self, qr_code: &str) -> StoreResult<Option<Reservation>> {
        let state = self.state.read().await;
        Ok(state
            .reservations
            .values()
            .find(|r| r.qr_code == qr_code)
            .cloned())
    }

    async fn active_reservations_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Reservation>> {
        let state = self.state.read().await;
        let mut found: Vec<Reservation> = state
            .reservations
            .values()
            .filter(|r| r.user_id == user_id && r.is_active())
            .cloned()
            .collect();
        newest_first(&mut found);
        Ok(found)
    }

    async fn list_reservations(
        &self,
        status: Option<ReservationStatus>,
    ) -> StoreResult<Vec<Reservation>> {
        let state = self.state.read().await;
        let mut found: Vec<Reservation> = state
            .reservations
            .values()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        newest_first(&mut found);
        Ok(found)
    }

    async fn latest_registration_control(&self) -> StoreResult<Option<RegistrationControl>> {
        let state = self.state.read().await;
        Ok(state.controls.iter().max_by_key(|c| c.updated_at).cloned())
    }

    async fn find_passport(&self, id: Uuid) -> StoreResult<Option<PassportRegistration>> {
        Ok(self.state.read().await.passports.get(&id).cloned())
    }

    async fn list_passports(
        &self,
        stage: Option<ScanStage>,
        limit: i64,
    ) -> StoreResult<Vec<PassportRegistration>> {
        let state = self.state.read().await;
        let mut found: Vec<PassportRegistration> = state
            .passports
            .values()
            .filter(|p| stage.map_or(true, |s| p.is_scanned(s)))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        found.truncate(limit.max(0) as usize);
        Ok(found)
    }

    async fn count_passports(&self) -> StoreResult<i64> {
        Ok(self.state.read().await.passports.len() as i64)
    }

    async fn passport_stage_counts(&self) -> StoreResult<StageCounts> {
        let state = self.state.read().await;
        let count = |stage: ScanStage| {
            state
                .passports
                .values()
                .filter(|p| p.is_scanned(stage))
                .count() as i64
        };
        Ok(StageCounts {
            entrada: count(ScanStage::Entrada),
            entrega: count(ScanStage::Entrega),
            completo: count(ScanStage::Completo),
            sorteo: count(ScanStage::Sorteo),
        })
    }

    async fn commit(&self, unit: UnitOfWork) -> StoreResult<()> {
        let mut state = self.state.write().await;

        for guard in &unit.guards {
            state.check(guard)?;
        }

        let mut staged = state.clone();
        for write in unit.writes {
            staged.apply(write)?;
        }

        *state = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn participant(email: &str) -> Participant {
        Participant {
            id: Uuid::new_v4(),
            first_name: "Ana".into(),
            last_name: "Vera".into(),
            email: email.into(),
            whatsapp: "0991234567".into(),
            partner_id: None,
            trivia_completed: false,
            created_at: Utc::now(),
        }
    }

    fn slot(capacity: i32) -> TimeSlot {
        TimeSlot {
            id: Uuid::new_v4(),
            date: Utc::now(),
            start_time: "08:00".into(),
            end_time: "08:15".into(),
            capacity,
            created_at: Utc::now(),
        }
    }

    fn reservation(user_id: Uuid, timeslot_id: Uuid) -> Reservation {
        Reservation {
            id: Uuid::new_v4(),
            user_id,
            timeslot_id,
            qr_code: Uuid::new_v4().to_string(),
            status: ReservationStatus::Reserved,
            interest_rating: None,
            checked_in_at: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back_whole_unit() {
        let store = InMemoryEventStore::new();
        let first = participant("a@x.com");
        let duplicate = participant("A@X.com");

        let result = store
            .commit(
                UnitOfWork::new()
                    .write(WriteIntent::InsertParticipant(first.clone()))
                    .write(WriteIntent::InsertParticipant(duplicate)),
            )
            .await;

        assert!(matches!(result, Err(StoreError::UniqueViolation(_))));
        assert!(store.find_participant(first.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_capacity_guard() {
        let store = InMemoryEventStore::new();
        let user_a = participant("a@x.com");
        let user_b = participant("b@x.com");
        let slot = slot(1);
        store
            .commit(
                UnitOfWork::new()
                    .write(WriteIntent::InsertParticipant(user_a.clone()))
                    .write(WriteIntent::InsertParticipant(user_b.clone()))
                    .write(WriteIntent::InsertTimeslots(vec![slot.clone()])),
            )
            .await
            .unwrap();

        let capacity = Guard::SlotHasCapacity {
            timeslot_id: slot.id,
            seats: 1,
            excluding: vec![],
        };
        let first = reservation(user_a.id, slot.id);
        store
            .commit(
                UnitOfWork::new()
                    .guard(capacity.clone())
                    .write(WriteIntent::InsertReservation(first.clone())),
            )
            .await
            .unwrap();

        let second = store
            .commit(
                UnitOfWork::new()
                    .guard(capacity)
                    .write(WriteIntent::InsertReservation(reservation(user_b.id, slot.id))),
            )
            .await;
        assert!(matches!(second, Err(StoreError::GuardFailed(_))));

        // Moving the reservation that already holds the seat is allowed.
        let excluding_self = Guard::SlotHasCapacity {
            timeslot_id: slot.id,
            seats: 1,
            excluding: vec![first.id],
        };
        assert!(store
            .commit(UnitOfWork::new().guard(excluding_self))
            .await
            .is_ok());

        let usage = store.list_timeslots_with_usage().await.unwrap();
        assert_eq!(usage[0].reserved_count, 1);
    }

    #[tokio::test]
    async fn test_cancelled_reservations_free_the_seat() {
        let store = InMemoryEventStore::new();
        let user = participant("a@x.com");
        let slot = slot(1);
        let booked = reservation(user.id, slot.id);
        store
            .commit(
                UnitOfWork::new()
                    .write(WriteIntent::InsertParticipant(user.clone()))
                    .write(WriteIntent::InsertTimeslots(vec![slot.clone()]))
                    .write(WriteIntent::InsertReservation(booked.clone()))
                    .write(WriteIntent::CancelReservation {
                        reservation_id: booked.id,
                    }),
            )
            .await
            .unwrap();

        assert!(store
            .active_reservations_for_user(user.id)
            .await
            .unwrap()
            .is_empty());
        assert!(store
            .commit(UnitOfWork::new().guard(Guard::SlotHasCapacity {
                timeslot_id: slot.id,
                seats: 1,
                excluding: vec![],
            }))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_reservation_requires_existing_slot() {
        let store = InMemoryEventStore::new();
        let user = participant("a@x.com");
        let result = store
            .commit(
                UnitOfWork::new()
                    .write(WriteIntent::InsertParticipant(user.clone()))
                    .write(WriteIntent::InsertReservation(reservation(
                        user.id,
                        Uuid::new_v4(),
                    ))),
            )
            .await;
        assert!(matches!(result, Err(StoreError::Missing(_))));
        assert!(store.list_participants().await.unwrap().is_empty());
    }
}
