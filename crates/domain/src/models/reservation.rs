//! Reservation domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::participant::Participant;
use super::timeslot::TimeSlot;

/// Lifecycle status of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReservationStatus {
    Reserved,
    Used,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Reserved => "RESERVED",
            ReservationStatus::Used => "USED",
            ReservationStatus::Cancelled => "CANCELLED",
        }
    }

    /// Non-cancelled reservations hold a seat.
    pub fn holds_seat(&self) -> bool {
        !matches!(self, ReservationStatus::Cancelled)
    }
}

impl FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "RESERVED" => Ok(ReservationStatus::Reserved),
            "USED" => Ok(ReservationStatus::Used),
            "CANCELLED" => Ok(ReservationStatus::Cancelled),
            _ => Err(format!("Invalid reservation status: {}", s)),
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Interest rating given to a group after playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum InterestRating {
    NotInterested,
    SomewhatInterested,
    VeryInterested,
}

impl InterestRating {
    pub fn value(&self) -> i16 {
        match self {
            InterestRating::NotInterested => 1,
            InterestRating::SomewhatInterested => 2,
            InterestRating::VeryInterested => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InterestRating::NotInterested => "No interesado",
            InterestRating::SomewhatInterested => "Poco interesado",
            InterestRating::VeryInterested => "Bastante interesado",
        }
    }
}

impl TryFrom<i16> for InterestRating {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(InterestRating::NotInterested),
            2 => Ok(InterestRating::SomewhatInterested),
            3 => Ok(InterestRating::VeryInterested),
            other => Err(format!("Rating must be 1, 2 or 3 (got {})", other)),
        }
    }
}

impl From<InterestRating> for i16 {
    fn from(rating: InterestRating) -> Self {
        rating.value()
    }
}

/// Label used in exports when no rating was recorded.
pub const UNRATED_LABEL: &str = "Sin calificar";

/// A seat booking for one participant in one slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub timeslot_id: Uuid,
    pub qr_code: String,
    pub status: ReservationStatus,
    pub interest_rating: Option<InterestRating>,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    pub fn is_active(&self) -> bool {
        self.status.holds_seat()
    }
}

/// Request to book one seat.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationRequest {
    pub user_id: Uuid,
    pub timeslot_id: Uuid,
}

/// Request to book two seats in one slot for a partnered pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePairReservationRequest {
    pub user_id: Uuid,
    pub partner_id: Uuid,
    pub timeslot_id: Uuid,
}

/// Request carrying one QR code.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeRequest {
    pub qr_code: String,
}

/// Request to move one reservation to another slot.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReassignRequest {
    pub qr_code: String,
    pub new_timeslot_id: Uuid,
}

/// Request carrying both QR codes of a pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupCheckinRequest {
    pub qr_code1: String,
    pub qr_code2: String,
}

/// Request to move both reservations of a pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupReassignRequest {
    pub qr_code1: String,
    pub qr_code2: String,
    pub new_timeslot_id: Uuid,
}

/// Request to rate a checked-in pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateGroupRequest {
    pub reservation_id1: Uuid,
    pub reservation_id2: Uuid,
    pub rating: i16,
}

/// Request to resend a confirmation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResendConfirmationRequest {
    pub email: String,
}

/// Reservation with its participant and slot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationDetails {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub user: Participant,
    pub timeslot: TimeSlot,
}

/// Both reservations of a pair after a group operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupResult {
    pub message: String,
    pub reservations: Vec<Reservation>,
}

/// One member of a checked-in group.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckedInMember {
    pub reservation_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub checked_in_at: Option<DateTime<Utc>>,
}

/// A partnered pair whose reservations are both USED.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckedInGroup {
    pub members: Vec<CheckedInMember>,
    pub timeslot: String,
    pub rating: Option<InterestRating>,
    pub rating_label: String,
}
