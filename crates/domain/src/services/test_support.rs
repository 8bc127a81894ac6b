//! Fixtures shared by the service tests.

use std::sync::Arc;

use chrono::Utc;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use uuid::Uuid;

use crate::models::timeslot::event_day_instant;
use crate::models::{
    PassportRegistration, PassportStatus, Participant, Reservation, ReservationStatus, TimeSlot,
};
use crate::store::{EventStore, InMemoryEventStore, UnitOfWork, WriteIntent};

pub struct TestStore {
    pub inner: Arc<InMemoryEventStore>,
}

impl TestStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(InMemoryEventStore::new()),
        }
    }

    pub fn port(&self) -> Arc<dyn EventStore> {
        self.inner.clone()
    }

    pub async fn commit(&self, unit: UnitOfWork) {
        self.inner.commit(unit).await.expect("fixture commit");
    }
}

pub fn participant(email: &str) -> Participant {
    Participant {
        id: Uuid::new_v4(),
        first_name: FirstName().fake(),
        last_name: LastName().fake(),
        email: email.to_string(),
        whatsapp: "0991234567".to_string(),
        partner_id: None,
        trivia_completed: false,
        created_at: Utc::now(),
    }
}

pub async fn seed_participant(
    store: &TestStore,
    email: &str,
    partner_id: Option<Uuid>,
) -> Participant {
    let mut p = participant(email);
    p.partner_id = partner_id;
    store
        .commit(UnitOfWork::new().write(WriteIntent::InsertParticipant(p.clone())))
        .await;
    p
}

/// Two linked participants, both with trivia completed.
pub async fn seed_pair(store: &TestStore, a: &str, b: &str) -> (Participant, Participant) {
    let mut first = participant(a);
    let mut second = participant(b);
    first.trivia_completed = true;
    second.trivia_completed = true;
    second.partner_id = Some(first.id);
    store
        .commit(
            UnitOfWork::new()
                .write(WriteIntent::InsertParticipant(first.clone()))
                .write(WriteIntent::InsertParticipant(second.clone()))
                .write(WriteIntent::LinkPartner {
                    participant_id: first.id,
                    partner_id: second.id,
                }),
        )
        .await;
    first.partner_id = Some(second.id);
    (first, second)
}

pub async fn seed_slot(store: &TestStore, start_time: &str, capacity: i32) -> TimeSlot {
    let date = chrono::NaiveDate::from_ymd_opt(2026, 2, 27).expect("valid date");
    let slot = TimeSlot {
        id: Uuid::new_v4(),
        date: event_day_instant(date),
        start_time: start_time.to_string(),
        end_time: "23:59".to_string(),
        capacity,
        created_at: Utc::now(),
    };
    store
        .commit(UnitOfWork::new().write(WriteIntent::InsertTimeslots(vec![slot.clone()])))
        .await;
    slot
}

pub async fn seed_reservation(store: &TestStore, user_id: Uuid, timeslot_id: Uuid) -> Reservation {
    let reservation = Reservation {
        id: Uuid::new_v4(),
        user_id,
        timeslot_id,
        qr_code: Uuid::new_v4().to_string(),
        status: ReservationStatus::Reserved,
        interest_rating: None,
        checked_in_at: None,
        created_at: Utc::now(),
    };
    store
        .commit(UnitOfWork::new().write(WriteIntent::InsertReservation(reservation.clone())))
        .await;
    reservation
}

pub async fn seed_passport(store: &TestStore, email: &str) -> PassportRegistration {
    let now = Utc::now();
    let passport = PassportRegistration {
        id: Uuid::new_v4(),
        first_name: FirstName().fake(),
        last_name: LastName().fake(),
        email: email.to_string(),
        phone: "0991112222".to_string(),
        status: PassportStatus::Pending,
        registration_date: now,
        check_in_time: None,
        entrada_scanned: false,
        entrada_time: None,
        entrega_scanned: false,
        entrega_time: None,
        completo_scanned: false,
        completo_time: None,
        sorteo_scanned: false,
        sorteo_time: None,
        created_at: now,
        updated_at: now,
    };
    store
        .commit(UnitOfWork::new().write(WriteIntent::InsertPassport(passport.clone())))
        .await;
    passport
}
