//! Participant domain models for escape room registration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::reservation::ReservationStatus;

/// A registered escape room participant.
///
/// `partner_id` is symmetric: when set, the partner's record points back here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub whatsapp: String,
    pub partner_id: Option<Uuid>,
    pub trivia_completed: bool,
    pub created_at: DateTime<Utc>,
}

impl Participant {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn has_partner(&self) -> bool {
        self.partner_id.is_some()
    }
}

/// Identity supplied for one person at registration time.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewParticipant {
    #[validate(length(min = 2, message = "First name must have at least 2 characters"))]
    pub first_name: String,

    #[validate(length(min = 2, message = "Last name must have at least 2 characters"))]
    pub last_name: String,

    #[validate(email(message = "Invalid email"))]
    pub email: String,

    #[validate(custom(function = "shared::validation::validate_whatsapp"))]
    pub whatsapp: String,
}

/// Request to register a two-person group.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPairRequest {
    #[validate(nested)]
    pub users: Vec<NewParticipant>,
}

/// Partner summary shown alongside a participant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub whatsapp: String,
    pub trivia_completed: bool,
}

impl From<&Participant> for PartnerSummary {
    fn from(p: &Participant) -> Self {
        Self {
            id: p.id,
            first_name: p.first_name.clone(),
            last_name: p.last_name.clone(),
            email: p.email.clone(),
            whatsapp: p.whatsapp.clone(),
            trivia_completed: p.trivia_completed,
        }
    }
}

/// Reservation summary shown alongside a participant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveReservationSummary {
    pub id: Uuid,
    pub qr_code: String,
    pub status: ReservationStatus,
    pub timeslot_id: Uuid,
}

/// Participant lookup result (search by email).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantProfile {
    #[serde(flatten)]
    pub participant: Participant,
    pub partner: Option<PartnerSummary>,
    pub reservation: Option<ActiveReservationSummary>,
}

/// One row of the admin participant export.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantExportRow {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub whatsapp: String,
    pub trivia_completed: bool,
    pub has_reservation: bool,
    pub reservation_status: String,
    pub checked_in: bool,
    pub interest_rating: Option<i16>,
    pub interest_level: String,
    pub partner_name: String,
    pub timeslot: String,
    pub created_at: DateTime<Utc>,
}
