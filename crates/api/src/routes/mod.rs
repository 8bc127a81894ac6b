//! HTTP route handlers.
//!
//! Handlers only decode the request, call one domain service and wrap the
//! result; every rule lives in the domain crate.

pub mod admin;
pub mod checkin;
pub mod health;
pub mod reservations;
pub mod scan;
pub mod timeslots;
pub mod trivia;
pub mod users;
