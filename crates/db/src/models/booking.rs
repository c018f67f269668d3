//! Booking models and scheduling request DTOs.

use academy_core::booking::Participant;
use academy_core::types::{Date, DbId, ReservationToken, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::status::BookingStatus;

/// A row from the `bookings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: DbId,
    pub owner_id: DbId,
    pub purchased_package_id: Option<DbId>,
    pub course_id: DbId,
    pub schedule_id: DbId,
    pub booked_date: Date,
    pub status_id: i16,
    pub reservation_token: Option<ReservationToken>,
    pub rescheduled_from_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `booking_participants` table.
#[derive(Debug, Clone, FromRow)]
pub struct BookingParticipant {
    pub id: DbId,
    pub booking_id: DbId,
    pub position: i32,
    pub first_name: String,
    pub last_name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A booking with its status name and ordered participants.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetail {
    #[serde(flatten)]
    pub booking: Booking,
    pub status: &'static str,
    pub participants: Vec<Participant>,
}

impl BookingDetail {
    pub fn new(booking: Booking, participants: Vec<Participant>) -> Self {
        let status = BookingStatus::from_id(booking.status_id)
            .map(BookingStatus::name)
            .unwrap_or("unknown");
        Self {
            booking,
            status,
            participants,
        }
    }
}

/// Body of `POST /users/schedule-from-package`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleFromPackage {
    pub purchased_package_id: DbId,
    pub course_id: DbId,
    pub schedule_id: DbId,
    pub booked_dates: Vec<Date>,
    pub participants: Vec<Participant>,
}

/// Body of `POST /users/me/bookings/{id}/reschedule`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleBooking {
    /// Target schedule; defaults to the booking's current schedule.
    pub schedule_id: Option<DbId>,
    pub new_date: Date,
}
