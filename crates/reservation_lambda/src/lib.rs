//! AWS-oriented adapters and handlers for the reservations functions.
//!
//! This crate owns runtime integration details (Lambda handlers, DynamoDB and
//! Cognito adapters, configuration and log setup). Domain contracts and the
//! slot conflict rule live in `reservation_core`.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod telemetry;
