//! Row types and DTOs, one module per table group.

pub mod booking;
pub mod course;
pub mod master_package;
pub mod purchased_package;
pub mod status;
