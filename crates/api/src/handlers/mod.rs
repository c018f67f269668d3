pub mod admin;
pub mod availability;
pub mod bookings;
pub mod courses;
pub mod packages;
