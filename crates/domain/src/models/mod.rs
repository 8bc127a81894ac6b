//! Domain models for the event operations backend.

pub mod participant;
pub mod passport;
pub mod registration_control;
pub mod reservation;
pub mod timeslot;
pub mod trivia;

pub use participant::{
    ActiveReservationSummary, NewParticipant, Participant, ParticipantExportRow,
    ParticipantProfile, PartnerSummary, RegisterPairRequest,
};
pub use passport::{
    HistoryEntry, HistoryQuery, NewPassportRegistration, PassportRegistration, PassportStatus,
    ScanHistory, ScanReceipt, ScanRequest, ScanStage, ScanStats, ScanValidation, StageCounts,
    StageFlags, ValidateScanRequest,
};
pub use registration_control::{
    RegistrationControl, RegistrationStatus, SetRegistrationControlRequest,
};
pub use reservation::{
    CheckedInGroup, CheckedInMember, CreatePairReservationRequest, CreateReservationRequest,
    GroupCheckinRequest, GroupReassignRequest, GroupResult, InterestRating, QrCodeRequest,
    RateGroupRequest, ReassignRequest, Reservation, ReservationDetails, ReservationStatus,
    ResendConfirmationRequest,
};
pub use timeslot::{
    ClearTimeslotsResult, GenerateTimeslotsResult, SetTimeslotConfigRequest, SlotAvailability,
    SlotUsage, TimeSlot, TimeslotConfig, TimeslotConfigView,
};
pub use trivia::{
    Answer, AnswerView, Question, QuestionView, SubmittedAnswer, TriviaResult,
    ValidateTriviaRequest,
};
