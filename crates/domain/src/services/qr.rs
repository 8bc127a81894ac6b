//! QR token generation.

use uuid::Uuid;

/// Source of unique QR tokens for reservations.
pub trait TokenGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random v4 UUID tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidTokenGenerator;

impl TokenGenerator for UuidTokenGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
