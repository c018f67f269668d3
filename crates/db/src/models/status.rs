//! Booking status ids, matching the seed order of the `booking_statuses`
//! lookup table.

use academy_core::booking::state_machine;

/// SMALLINT id of a `booking_statuses` row.
pub type StatusId = i16;

#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStatus {
    Confirmed = state_machine::CONFIRMED,
    Cancelled = state_machine::CANCELLED,
    Completed = state_machine::COMPLETED,
    Rescheduled = state_machine::RESCHEDULED,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 4] = [
        Self::Confirmed,
        Self::Cancelled,
        Self::Completed,
        Self::Rescheduled,
    ];

    pub fn id(self) -> StatusId {
        self as StatusId
    }

    pub fn from_id(id: StatusId) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    pub fn name(self) -> &'static str {
        state_machine::status_name(self.id())
    }
}
