//! Event passport models for the four-stage scan flow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Default number of entries returned by the scan history.
pub const DEFAULT_HISTORY_LIMIT: i64 = 50;

/// Scan stage, in progression order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStage {
    Entrada,
    Entrega,
    Completo,
    Sorteo,
}

impl ScanStage {
    pub const ALL: [ScanStage; 4] = [
        ScanStage::Entrada,
        ScanStage::Entrega,
        ScanStage::Completo,
        ScanStage::Sorteo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStage::Entrada => "entrada",
            ScanStage::Entrega => "entrega",
            ScanStage::Completo => "completo",
            ScanStage::Sorteo => "sorteo",
        }
    }
}

impl FromStr for ScanStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "entrada" => Ok(ScanStage::Entrada),
            "entrega" => Ok(ScanStage::Entrega),
            "completo" => Ok(ScanStage::Completo),
            "sorteo" => Ok(ScanStage::Sorteo),
            _ => Err(format!("Invalid scan mode: {}", s)),
        }
    }
}

impl fmt::Display for ScanStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Overall attendance status of a passport registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PassportStatus {
    Pending,
    CheckedIn,
    NoShow,
}

impl PassportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassportStatus::Pending => "PENDING",
            PassportStatus::CheckedIn => "CHECKED_IN",
            PassportStatus::NoShow => "NO_SHOW",
        }
    }
}

impl FromStr for PassportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(PassportStatus::Pending),
            "CHECKED_IN" => Ok(PassportStatus::CheckedIn),
            "NO_SHOW" => Ok(PassportStatus::NoShow),
            _ => Err(format!("Invalid passport status: {}", s)),
        }
    }
}

/// A passport registration. Its id doubles as the printed QR payload.
///
/// Stage flags only move from false to true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassportRegistration {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub status: PassportStatus,
    pub registration_date: DateTime<Utc>,
    pub check_in_time: Option<DateTime<Utc>>,
    pub entrada_scanned: bool,
    pub entrada_time: Option<DateTime<Utc>>,
    pub entrega_scanned: bool,
    pub entrega_time: Option<DateTime<Utc>>,
    pub completo_scanned: bool,
    pub completo_time: Option<DateTime<Utc>>,
    pub sorteo_scanned: bool,
    pub sorteo_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PassportRegistration {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_scanned(&self, stage: ScanStage) -> bool {
        match stage {
            ScanStage::Entrada => self.entrada_scanned,
            ScanStage::Entrega => self.entrega_scanned,
            ScanStage::Completo => self.completo_scanned,
            ScanStage::Sorteo => self.sorteo_scanned,
        }
    }

    pub fn stage_time(&self, stage: ScanStage) -> Option<DateTime<Utc>> {
        match stage {
            ScanStage::Entrada => self.entrada_time,
            ScanStage::Entrega => self.entrega_time,
            ScanStage::Completo => self.completo_time,
            ScanStage::Sorteo => self.sorteo_time,
        }
    }

    pub fn flags(&self) -> StageFlags {
        StageFlags {
            entrada: self.entrada_scanned,
            entrega: self.entrega_scanned,
            completo: self.completo_scanned,
            sorteo: self.sorteo_scanned,
        }
    }

    /// Entrance and handoff done, raffle not yet joined.
    pub fn eligible_for_sorteo(&self) -> bool {
        self.entrada_scanned && self.entrega_scanned && !self.sorteo_scanned
    }

    /// Sets a stage flag. Entrance also checks the participant in.
    pub fn mark_scanned(&mut self, stage: ScanStage, at: DateTime<Utc>) {
        match stage {
            ScanStage::Entrada => {
                self.entrada_scanned = true;
                self.entrada_time = Some(at);
                self.status = PassportStatus::CheckedIn;
                self.check_in_time = Some(at);
            }
            ScanStage::Entrega => {
                self.entrega_scanned = true;
                self.entrega_time = Some(at);
            }
            ScanStage::Completo => {
                self.completo_scanned = true;
                self.completo_time = Some(at);
            }
            ScanStage::Sorteo => {
                self.sorteo_scanned = true;
                self.sorteo_time = Some(at);
            }
        }
        self.updated_at = Utc::now();
    }
}

/// Request to register an event passport.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewPassportRegistration {
    #[validate(length(min = 2, message = "First name must have at least 2 characters"))]
    pub first_name: String,

    #[validate(length(min = 2, message = "Last name must have at least 2 characters"))]
    pub last_name: String,

    #[validate(email(message = "Invalid email"))]
    pub email: String,

    #[validate(length(min = 7, max = 20, message = "Invalid phone number"))]
    pub phone: String,
}

/// Read-only check of a target stage.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateScanRequest {
    pub qr_code: String,
    pub mode: ScanStage,
}

/// A stage scan as sent by a scanner device.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanRequest {
    pub qr_code: String,
    pub scanned_at: Option<DateTime<Utc>>,
    pub device_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageFlags {
    pub entrada: bool,
    pub entrega: bool,
    pub completo: bool,
    pub sorteo: bool,
}

/// Result of a read-only stage check.
#[derive(Debug, Clone, Serialize)]
pub struct ScanValidation {
    pub participant_id: Uuid,
    pub name: String,
    pub email: String,
    pub registration_date: DateTime<Utc>,
    pub status: StageFlags,
    pub can_scan: bool,
    pub eligible_for_sorteo: bool,
    pub message: String,
}

/// Confirmation of an accepted scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReceipt {
    pub scan_id: String,
    pub participant_id: Uuid,
    pub name: String,
    pub mode: ScanStage,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    pub date: Option<String>,
    pub mode: Option<ScanStage>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub scan_id: String,
    pub participant_id: Uuid,
    pub name: String,
    pub mode: ScanStage,
    pub timestamp: DateTime<Utc>,
    pub status: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanHistory {
    pub total: usize,
    pub scans: Vec<HistoryEntry>,
}

/// Count of registrations per scanned stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StageCounts {
    pub entrada: i64,
    pub entrega: i64,
    pub completo: i64,
    pub sorteo: i64,
}

impl StageCounts {
    pub fn total(&self) -> i64 {
        self.entrada + self.entrega + self.completo + self.sorteo
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanStats {
    pub date: String,
    pub total_registrations: i64,
    pub total_scans: i64,
    pub by_mode: StageCounts,
    pub valid_scans: i64,
    pub invalid_scans: i64,
    pub sorteo_participants: i64,
    pub last_updated: DateTime<Utc>,
}
