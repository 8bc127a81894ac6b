//! Shared utilities and common types for the event operations backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Hashing helpers for admin key verification
//! - Common validation logic (emails, WhatsApp numbers, event dates)

pub mod crypto;
pub mod validation;
