//! Entitlement rules: lifecycle classification, reservation checks and
//! the renewal call-to-action.
//!
//! Status is always derived from `(total_sessions, allocations, expiry_date,
//! today)` and never stored, so it cannot drift from the counters.

use serde::{Deserialize, Serialize};

use crate::error::BookingError;
use crate::types::{Date, DbId};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Upper bound on a catalog package's validity window.
pub const MAX_VALIDITY_DAYS: i32 = 3 * 365;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Lifecycle status of a purchased package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageStatus {
    Active,
    Depleted,
    Expired,
}

/// Per-course counters of one allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationUsage {
    pub course_id: DbId,
    pub sessions_allotted: i32,
    pub sessions_consumed: i32,
}

impl AllocationUsage {
    pub fn remaining(&self) -> i32 {
        self.sessions_allotted - self.sessions_consumed
    }
}

/// What the account area should offer for a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenewalPrompt {
    None,
    RenewDepleted,
    RenewExpired,
}

/// Filter applied when listing a customer's packages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageView {
    /// Only packages that can still be booked.
    Active,
    /// Depleted and expired packages.
    History,
    #[default]
    All,
}

impl PackageView {
    pub fn includes(&self, status: PackageStatus) -> bool {
        match self {
            Self::Active => status == PackageStatus::Active,
            Self::History => status != PackageStatus::Active,
            Self::All => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Derived values
// ---------------------------------------------------------------------------

/// Sessions left across all courses.
pub fn remaining_sessions(total_sessions: i32, allocations: &[AllocationUsage]) -> i32 {
    let consumed: i32 = allocations.iter().map(|a| a.sessions_consumed).sum();
    total_sessions - consumed
}

/// Classify a package. EXPIRED takes precedence over DEPLETED.
pub fn classify(
    total_sessions: i32,
    allocations: &[AllocationUsage],
    expiry_date: Date,
    today: Date,
) -> PackageStatus {
    if today >= expiry_date {
        PackageStatus::Expired
    } else if remaining_sessions(total_sessions, allocations) <= 0 {
        PackageStatus::Depleted
    } else {
        PackageStatus::Active
    }
}

pub fn renewal_prompt(status: PackageStatus) -> RenewalPrompt {
    match status {
        PackageStatus::Active => RenewalPrompt::None,
        PackageStatus::Depleted => RenewalPrompt::RenewDepleted,
        PackageStatus::Expired => RenewalPrompt::RenewExpired,
    }
}

/// Expiry date of a package bought on `purchased_on` with the given validity.
pub fn expiry_for(purchased_on: Date, validity_days: i32) -> Date {
    purchased_on + chrono::Duration::days(i64::from(validity_days))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check the purchase-time invariants of a set of allocations.
pub fn validate_allocations(
    total_sessions: i32,
    allocations: &[AllocationUsage],
) -> Result<(), String> {
    if allocations.is_empty() {
        return Err("A package must include at least one course".to_string());
    }
    let mut seen = std::collections::HashSet::new();
    for a in allocations {
        if !seen.insert(a.course_id) {
            return Err(format!("Course {} is allocated more than once", a.course_id));
        }
        if a.sessions_allotted <= 0 {
            return Err(format!(
                "Course {} must be allotted at least one session",
                a.course_id
            ));
        }
        if a.sessions_consumed < 0 || a.sessions_consumed > a.sessions_allotted {
            return Err(format!(
                "Course {} has {} sessions consumed out of {}",
                a.course_id, a.sessions_consumed, a.sessions_allotted
            ));
        }
    }
    let sum: i32 = allocations.iter().map(|a| a.sessions_allotted).sum();
    if sum != total_sessions {
        return Err(format!(
            "Allocations sum to {sum} sessions but the package total is {total_sessions}"
        ));
    }
    Ok(())
}

pub fn validate_validity_days(validity_days: i32) -> Result<(), String> {
    if (1..=MAX_VALIDITY_DAYS).contains(&validity_days) {
        Ok(())
    } else {
        Err(format!(
            "Validity must be between 1 and {MAX_VALIDITY_DAYS} days, got {validity_days}"
        ))
    }
}

/// Run the reservation checks that follow the existence/ownership check:
/// not expired, course allocated, a session left for the course.
///
/// `allocation` is the caller's lookup of the allocation for `course_id`.
pub fn check_reservable(
    package_id: DbId,
    course_id: DbId,
    expiry_date: Date,
    allocation: Option<&AllocationUsage>,
    today: Date,
) -> Result<(), BookingError> {
    if today >= expiry_date {
        return Err(BookingError::Expired { package_id });
    }
    let allocation = allocation.ok_or(BookingError::CourseNotAllocated {
        package_id,
        course_id,
    })?;
    if allocation.sessions_consumed >= allocation.sessions_allotted {
        return Err(BookingError::Depleted {
            package_id,
            course_id,
        });
    }
    Ok(())
}

/// Entitlement cannot be spent on a session held on or after the expiry date.
pub fn check_date_within_entitlement(
    package_id: DbId,
    expiry_date: Date,
    booked_date: Date,
) -> Result<(), BookingError> {
    if booked_date >= expiry_date {
        Err(BookingError::Expired { package_id })
    } else {
        Ok(())
    }
}
