//! Domain rules for package entitlements and session scheduling.
//!
//! Everything here is pure: no database, no clock. Callers pass `today`
//! explicitly so classification and availability stay deterministic.

pub mod availability;
pub mod booking;
pub mod entitlement;
pub mod error;
pub mod roles;
pub mod types;
