//! Notification service for reservation confirmations.
//!
//! Dispatch is best-effort: callers log failures and carry on, because the
//! reservation has already been committed when a notification goes out.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Channel a confirmation was sent through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Email,
    Whatsapp,
}

impl std::fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationChannel::Email => write!(f, "email"),
            NotificationChannel::Whatsapp => write!(f, "whatsapp"),
        }
    }
}

/// Everything a confirmation message needs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationConfirmation {
    pub participant_name: String,
    pub email: String,
    pub whatsapp: String,
    pub qr_code: String,
    pub date: DateTime<Utc>,
    pub start_time: String,
    pub end_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_name: Option<String>,
}

/// Result of a notification send attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationResult {
    Sent,
    /// Sending failed; the caller only logs it.
    Failed(String),
    /// Notifications are disabled.
    Skipped,
}

#[async_trait::async_trait]
pub trait NotificationService: Send + Sync {
    async fn send_reservation_confirmation(
        &self,
        confirmation: &ReservationConfirmation,
    ) -> NotificationResult;
}

/// Notification service that only logs, and remembers who it would have contacted.
#[derive(Debug, Default)]
pub struct MockNotificationService {
    pub simulate_failure: bool,
    sent: Mutex<Vec<String>>,
}

impl MockNotificationService {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock whose every send fails.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Emails that received a confirmation, in send order.
    pub fn sent_to(&self) -> Vec<String> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl NotificationService for MockNotificationService {
    async fn send_reservation_confirmation(
        &self,
        confirmation: &ReservationConfirmation,
    ) -> NotificationResult {
        if self.simulate_failure {
            tracing::warn!(
                email = %confirmation.email,
                "Mock notification service simulating failure"
            );
            return NotificationResult::Failed("Simulated failure".to_string());
        }

        tracing::info!(
            email = %confirmation.email,
            slot = %format!("{} - {}", confirmation.start_time, confirmation.end_time),
            "Mock: Would send reservation confirmation"
        );

        if let Ok(mut sent) = self.sent.lock() {
            sent.push(confirmation.email.clone());
        }
        NotificationResult::Sent
    }
}
