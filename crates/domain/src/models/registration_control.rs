//! Manual registration open/close overrides.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::timeslot::TimeslotConfigView;

/// One manual override entry. The most recent entry is authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationControl {
    pub id: Uuid,
    pub is_open: bool,
    pub reason: Option<String>,
    pub updated_by: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Request to set a manual override.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRegistrationControlRequest {
    pub is_open: bool,
    pub reason: Option<String>,
    pub admin_email: Option<String>,
}

/// Registration state as shown to admins.
///
/// `manual_override` is `None` in automatic mode.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationStatus {
    pub manual_override: Option<bool>,
    pub reason: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
    #[serde(flatten)]
    pub timeslots: TimeslotConfigView,
}

impl RegistrationStatus {
    pub fn from_parts(control: Option<RegistrationControl>, timeslots: TimeslotConfigView) -> Self {
        match control {
            Some(control) => Self {
                manual_override: Some(control.is_open),
                reason: control.reason,
                updated_at: Some(control.updated_at),
                updated_by: control.updated_by,
                timeslots,
            },
            None => Self {
                manual_override: None,
                reason: None,
                updated_at: None,
                updated_by: None,
                timeslots,
            },
        }
    }

    pub fn is_automatic(&self) -> bool {
        self.manual_override.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_without_control_is_automatic() {
        let status = RegistrationStatus::from_parts(None, TimeslotConfigView::default());
        assert!(status.is_automatic());
        assert_eq!(status.timeslots.slots_per_day, 48);
    }

    #[test]
    fn test_status_with_control() {
        let control = RegistrationControl {
            id: Uuid::new_v4(),
            is_open: false,
            reason: Some("Sala llena".to_string()),
            updated_by: Some("admin@example.com".to_string()),
            updated_at: Utc::now(),
        };
        let status = RegistrationStatus::from_parts(Some(control), TimeslotConfigView::default());
        assert_eq!(status.manual_override, Some(false));
        assert_eq!(status.reason.as_deref(), Some("Sala llena"));
    }

    #[test]
    fn test_status_serializes_flattened_config() {
        let status = RegistrationStatus::from_parts(None, TimeslotConfigView::default());
        let json = serde_json::to_value(&status).unwrap();
        assert!(json["manualOverride"].is_null());
        assert_eq!(json["durationMinutes"], 15);
    }
}
