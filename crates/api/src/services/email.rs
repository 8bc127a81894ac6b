//! Reservation confirmation emails.
//!
//! Supported providers:
//! - `console`: logs the message (development)
//! - `sendgrid`: SendGrid v3 mail API

use async_trait::async_trait;
use domain::services::{NotificationResult, NotificationService, ReservationConfirmation};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::NotificationsConfig;

const SENDGRID_URL: &str = "https://api.sendgrid.com/v3/mail/send";

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email provider not configured: {0}")]
    NotConfigured(String),

    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Provider error: {0}")]
    ProviderError(String),
}

/// A rendered message ready for a provider.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub to_name: String,
    pub subject: String,
    pub body_text: String,
}

impl EmailMessage {
    pub fn confirmation(confirmation: &ReservationConfirmation) -> Self {
        let partner_line = confirmation
            .partner_name
            .as_deref()
            .map(|name| format!("Compañero: {}\n", name))
            .unwrap_or_default();

        let body_text = format!(
            "¡Hola {name}!\n\n\
             Tu reserva para el escape room está confirmada.\n\n\
             Fecha: {date}\n\
             Horario: {start} - {end}\n\
             {partner}\
             Código QR: {qr}\n\n\
             Presenta este código en la entrada.",
            name = confirmation.participant_name,
            date = confirmation.date.format("%Y-%m-%d"),
            start = confirmation.start_time,
            end = confirmation.end_time,
            partner = partner_line,
            qr = confirmation.qr_code,
        );

        Self {
            to: confirmation.email.clone(),
            to_name: confirmation.participant_name.clone(),
            subject: "Tu reserva está confirmada".to_string(),
            body_text,
        }
    }
}

/// Sends confirmations through the configured provider.
#[derive(Clone)]
pub struct EmailNotifier {
    config: NotificationsConfig,
    client: reqwest::Client,
}

impl EmailNotifier {
    pub fn new(config: NotificationsConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        match self.config.provider.as_str() {
            "console" => {
                self.send_console(&message);
                Ok(())
            }
            "sendgrid" => self.send_sendgrid(&message).await,
            other => Err(EmailError::NotConfigured(other.to_string())),
        }
    }

    fn send_console(&self, message: &EmailMessage) {
        info!(
            to = %message.to,
            subject = %message.subject,
            from = %self.config.sender_email,
            "Email (console provider)"
        );
        debug!(body_text = %message.body_text, "Email body");
    }

    async fn send_sendgrid(&self, message: &EmailMessage) -> Result<(), EmailError> {
        if self.config.api_key.is_empty() {
            return Err(EmailError::NotConfigured("sendgrid api_key".into()));
        }

        let body = serde_json::json!({
            "personalizations": [{
                "to": [{ "email": message.to, "name": message.to_name }]
            }],
            "from": {
                "email": self.config.sender_email,
                "name": self.config.sender_name
            },
            "subject": message.subject,
            "content": [{ "type": "text/plain", "value": message.body_text }]
        });

        let response = self
            .client
            .post(SENDGRID_URL)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::SendFailed(format!("SendGrid request failed: {}", e)))?;

        if response.status().is_success() {
            info!(to = %message.to, "Email sent via SendGrid");
            return Ok(());
        }

        let status = response.status();
        let error_body = response.text().await.unwrap_or_default();
        error!(status = %status, error = %error_body, "SendGrid API error");
        Err(EmailError::ProviderError(format!(
            "SendGrid returned {}: {}",
            status, error_body
        )))
    }
}

#[async_trait]
impl NotificationService for EmailNotifier {
    async fn send_reservation_confirmation(
        &self,
        confirmation: &ReservationConfirmation,
    ) -> NotificationResult {
        if !self.config.enabled {
            debug!(email = %confirmation.email, "Notifications disabled, skipping confirmation");
            return NotificationResult::Skipped;
        }

        match self.send(EmailMessage::confirmation(confirmation)).await {
            Ok(()) => NotificationResult::Sent,
            Err(e) => NotificationResult::Failed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn config(enabled: bool, provider: &str) -> NotificationsConfig {
        NotificationsConfig {
            enabled,
            provider: provider.to_string(),
            ..NotificationsConfig::default()
        }
    }

    fn confirmation(partner: Option<&str>) -> ReservationConfirmation {
        ReservationConfirmation {
            participant_name: "Ana Torres".into(),
            email: "ana@example.com".into(),
            whatsapp: "0991234567".into(),
            qr_code: "qr-123".into(),
            date: Utc.with_ymd_and_hms(2026, 2, 27, 12, 0, 0).unwrap(),
            start_time: "10:00".into(),
            end_time: "10:30".into(),
            partner_name: partner.map(str::to_string),
        }
    }

    #[test]
    fn test_confirmation_message() {
        let message = EmailMessage::confirmation(&confirmation(Some("Luis Vega")));
        assert_eq!(message.to, "ana@example.com");
        assert!(message.body_text.contains("2026-02-27"));
        assert!(message.body_text.contains("10:00 - 10:30"));
        assert!(message.body_text.contains("Compañero: Luis Vega"));
        assert!(message.body_text.contains("qr-123"));
    }

    #[test]
    fn test_confirmation_message_without_partner() {
        let message = EmailMessage::confirmation(&confirmation(None));
        assert!(!message.body_text.contains("Compañero"));
    }

    #[tokio::test]
    async fn test_disabled_is_skipped() {
        let notifier = EmailNotifier::new(config(false, "console"));
        assert!(!notifier.is_enabled());
        assert_eq!(
            notifier
                .send_reservation_confirmation(&confirmation(None))
                .await,
            NotificationResult::Skipped
        );
    }

    #[tokio::test]
    async fn test_console_provider_sends() {
        let notifier = EmailNotifier::new(config(true, "console"));
        assert_eq!(
            notifier
                .send_reservation_confirmation(&confirmation(None))
                .await,
            NotificationResult::Sent
        );
    }

    #[tokio::test]
    async fn test_sendgrid_without_key_fails() {
        let notifier = EmailNotifier::new(config(true, "sendgrid"));
        assert!(matches!(
            notifier
                .send_reservation_confirmation(&confirmation(None))
                .await,
            NotificationResult::Failed(_)
        ));
    }

    #[tokio::test]
    async fn test_unknown_provider_fails() {
        let notifier = EmailNotifier::new(config(true, "carrier-pigeon"));
        assert!(matches!(
            notifier.send(EmailMessage::confirmation(&confirmation(None))).await,
            Err(EmailError::NotConfigured(_))
        ));
    }
}
