//! Common validation utilities.

use chrono::NaiveDate;
use validator::ValidationError;

/// Date format accepted for event days.
pub const EVENT_DATE_FORMAT: &str = "%Y-%m-%d";

lazy_static::lazy_static! {
    /// Local WhatsApp numbers: `09` followed by eight digits.
    static ref WHATSAPP_REGEX: regex::Regex =
        regex::Regex::new(r"^09\d{8}$").expect("valid whatsapp regex");
}

/// Validates that a WhatsApp number has the `09XXXXXXXX` format.
pub fn validate_whatsapp(number: &str) -> Result<(), ValidationError> {
    if WHATSAPP_REGEX.is_match(number) {
        Ok(())
    } else {
        let mut err = ValidationError::new("whatsapp_format");
        err.message = Some("WhatsApp must have the format 09XXXXXXXX".into());
        Err(err)
    }
}

/// Validates that a string is a calendar date in `YYYY-MM-DD` form.
pub fn validate_event_date(value: &str) -> Result<(), ValidationError> {
    match parse_event_date(value) {
        Some(_) => Ok(()),
        None => {
            let mut err = ValidationError::new("event_date_format");
            err.message = Some("Date must have the format YYYY-MM-DD".into());
            Err(err)
        }
    }
}

/// Validates that an hour is within 0..=23.
pub fn validate_hour(hour: i32) -> Result<(), ValidationError> {
    if (0..=23).contains(&hour) {
        Ok(())
    } else {
        let mut err = ValidationError::new("hour_range");
        err.message = Some("Hours must be between 0 and 23".into());
        Err(err)
    }
}

/// Parses a `YYYY-MM-DD` string, ignoring surrounding whitespace.
pub fn parse_event_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), EVENT_DATE_FORMAT).ok()
}

/// Normalizes an email for identity comparisons.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_whatsapp() {
        assert!(validate_whatsapp("0991234567").is_ok());
        assert!(validate_whatsapp("0912345678").is_ok());
        assert!(validate_whatsapp("0891234567").is_err());
        assert!(validate_whatsapp("099123456").is_err());
        assert!(validate_whatsapp("09912345678").is_err());
        assert!(validate_whatsapp("+593991234567").is_err());
    }

    #[test]
    fn test_validate_whatsapp_error_message() {
        let err = validate_whatsapp("12345").unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "WhatsApp must have the format 09XXXXXXXX"
        );
    }

    #[test]
    fn test_validate_event_date() {
        assert!(validate_event_date("2026-02-27").is_ok());
        assert!(validate_event_date(" 2026-03-01 ").is_ok());
        assert!(validate_event_date("2026-02-30").is_err());
        assert!(validate_event_date("27/02/2026").is_err());
        assert!(validate_event_date("").is_err());
    }

    #[test]
    fn test_validate_hour() {
        assert!(validate_hour(0).is_ok());
        assert!(validate_hour(23).is_ok());
        assert!(validate_hour(-1).is_err());
        assert!(validate_hour(24).is_err());
    }

    #[test]
    fn test_parse_event_date() {
        let date = parse_event_date("2026-02-28").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ana@Example.COM "), "ana@example.com");
    }
}
