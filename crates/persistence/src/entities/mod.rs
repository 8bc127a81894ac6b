//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod participant;
pub mod passport;
pub mod registration_control;
pub mod reservation;
pub mod timeslot;
pub mod trivia;

pub use participant::ParticipantEntity;
pub use passport::{PassportRegistrationEntity, PassportStatusDb, StageCountsEntity};
pub use registration_control::RegistrationControlEntity;
pub use reservation::{ReservationEntity, ReservationStatusDb};
pub use timeslot::{SlotUsageEntity, TimeSlotEntity, TimeslotConfigEntity};
pub use trivia::{assemble_questions, AnswerEntity, QuestionEntity};
