//! Repository implementations for database operations.
//!
//! Reads run on the pool. Methods taking a `PgConnection` are meant to run
//! inside the transaction opened by [`PgEventStore::commit`](crate::PgEventStore).

pub mod participant;
pub mod passport;
pub mod registration_control;
pub mod reservation;
pub mod timeslot;
pub mod trivia;

pub use participant::ParticipantRepository;
pub use passport::PassportRepository;
pub use registration_control::RegistrationControlRepository;
pub use reservation::ReservationRepository;
pub use timeslot::TimeslotRepository;
pub use trivia::TriviaRepository;
