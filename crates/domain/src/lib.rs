//! Domain layer for the event operations backend.
//!
//! This crate contains:
//! - Domain models (participants, timeslots, reservations, passport registrations)
//! - The `EventStore` port and its unit-of-work types
//! - Business logic services for both the escape room and the passport flow
//! - Domain error types

pub mod error;
pub mod models;
pub mod services;
pub mod store;

pub use error::{DomainError, StageErrorCode};
