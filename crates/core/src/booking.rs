//! Booking lifecycle and request rules.
//!
//! Lives in `core` so the repository layer and the HTTP handlers share one
//! definition of which transitions are legal.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::types::Date;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Maximum dates accepted by one schedule-from-package request.
pub const MAX_DATES_PER_REQUEST: usize = 10;

/// Maximum participants on a single booking.
pub const MAX_PARTICIPANTS: usize = 10;

// ---------------------------------------------------------------------------
// Participants
// ---------------------------------------------------------------------------

/// A person attending a booked session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
}

/// Trim names and check the participant list.
pub fn normalize_participants(participants: &[Participant]) -> Result<Vec<Participant>, String> {
    if participants.is_empty() {
        return Err("At least one participant is required".to_string());
    }
    if participants.len() > MAX_PARTICIPANTS {
        return Err(format!(
            "At most {MAX_PARTICIPANTS} participants per booking, got {}",
            participants.len()
        ));
    }
    participants
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let trimmed = Participant {
                first_name: p.first_name.trim().to_string(),
                last_name: p.last_name.trim().to_string(),
            };
            trimmed
                .validate()
                .map_err(|e| format!("Participant {}: {e}", i + 1))?;
            Ok(trimmed)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Requested dates
// ---------------------------------------------------------------------------

/// Sort the requested dates and reject empty, duplicate or oversized lists.
pub fn normalize_booked_dates(dates: &[Date]) -> Result<Vec<Date>, String> {
    if dates.is_empty() {
        return Err("At least one date is required".to_string());
    }
    if dates.len() > MAX_DATES_PER_REQUEST {
        return Err(format!(
            "At most {MAX_DATES_PER_REQUEST} dates per request, got {}",
            dates.len()
        ));
    }
    let mut sorted = dates.to_vec();
    sorted.sort_unstable();
    if let Some(pair) = sorted.windows(2).find(|w| w[0] == w[1]) {
        return Err(format!("Date {} is requested more than once", pair[0]));
    }
    Ok(sorted)
}

/// A confirmed booking can be cancelled or moved only until its day passes.
pub fn check_still_changeable(booked_date: Date, today: Date) -> Result<(), String> {
    if booked_date < today {
        Err(format!(
            "The session on {booked_date} has already taken place"
        ))
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Booking status IDs matching `booking_statuses` seed data (1-based SMALLSERIAL).
pub mod state_machine {
    pub const CONFIRMED: i16 = 1;
    pub const CANCELLED: i16 = 2;
    pub const COMPLETED: i16 = 3;
    pub const RESCHEDULED: i16 = 4;

    /// Returns the set of valid target status IDs reachable from `from_status`.
    ///
    /// Only Confirmed has outgoing transitions; everything else is terminal.
    pub fn valid_transitions(from_status: i16) -> &'static [i16] {
        match from_status {
            CONFIRMED => &[COMPLETED, CANCELLED, RESCHEDULED],
            _ => &[],
        }
    }

    pub fn can_transition(from: i16, to: i16) -> bool {
        valid_transitions(from).contains(&to)
    }

    /// Validate a state transition, returning an error message for invalid ones.
    pub fn validate_transition(from: i16, to: i16) -> Result<(), String> {
        if can_transition(from, to) {
            Ok(())
        } else {
            Err(format!(
                "Invalid booking transition: {} -> {}",
                status_name(from),
                status_name(to)
            ))
        }
    }

    pub fn status_name(id: i16) -> &'static str {
        match id {
            CONFIRMED => "confirmed",
            CANCELLED => "cancelled",
            COMPLETED => "completed",
            RESCHEDULED => "rescheduled",
            _ => "unknown",
        }
    }
}
