//! Shared restaurant reservation domain primitives.
//!
//! This crate owns request/response contracts, validation, route resolution
//! and the slot conflict rule. It intentionally excludes AWS SDK and Lambda
//! runtime concerns; those live in `reservation_lambda`.

pub mod booking;
pub mod contract;
pub mod error;
pub mod identity;
pub mod model;
pub mod route;
pub mod storage_keys;
