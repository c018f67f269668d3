use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failures of the entitlement ledger and the scheduler.
///
/// Every variant maps to its own HTTP status, machine code and user-facing
/// message; two failures that need different user actions (renew vs. pick
/// another date) must never collapse into the same response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    /// The package, course or schedule does not exist or belongs to someone else.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// The package reached its expiry date, or the requested date is past it.
    #[error("Package {package_id} has expired")]
    Expired { package_id: DbId },

    /// No sessions remain for the requested course in this package.
    #[error("Package {package_id} has no sessions left for course {course_id}")]
    Depleted { package_id: DbId, course_id: DbId },

    /// The slot is closed or full. The calendar the user saw was stale.
    #[error("No capacity left on schedule {schedule_id} for {date}")]
    SlotUnavailable {
        schedule_id: DbId,
        date: chrono::NaiveDate,
    },

    /// The package never included the requested course.
    #[error("Course {course_id} is not part of package {package_id}")]
    CourseNotAllocated { package_id: DbId, course_id: DbId },

    /// The package already holds a confirmed booking for this schedule and date.
    #[error("Package {package_id} is already booked on schedule {schedule_id} for {date}")]
    AlreadyBooked {
        package_id: DbId,
        schedule_id: DbId,
        date: chrono::NaiveDate,
    },

    /// Releasing a reserved session failed after a downstream error.
    /// The session stays reserved without a booking until reconciled by hand.
    #[error("Failed to release reservation {token}: {reason}")]
    CompensationFailure { token: uuid::Uuid, reason: String },
}

impl BookingError {
    /// Stable machine-readable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Expired { .. } => "PACKAGE_EXPIRED",
            Self::Depleted { .. } => "PACKAGE_DEPLETED",
            Self::SlotUnavailable { .. } => "SLOT_UNAVAILABLE",
            Self::CourseNotAllocated { .. } => "COURSE_NOT_ALLOCATED",
            Self::AlreadyBooked { .. } => "ALREADY_BOOKED",
            Self::CompensationFailure { .. } => "COMPENSATION_FAILURE",
        }
    }

    /// Message shown to the customer. Tells them what to do next.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound { entity, .. } => {
                format!("{entity} not found. Please refresh the page and try again.")
            }
            Self::Expired { .. } => {
                "This package has expired. Renew it to keep booking sessions.".to_string()
            }
            Self::Depleted { .. } => {
                "All sessions for this course have been used. Renew the package to book more."
                    .to_string()
            }
            Self::SlotUnavailable { date, .. } => {
                format!("{date} is no longer available. Please pick another date.")
            }
            Self::CourseNotAllocated { .. } => {
                "This course is not included in your package. Please contact support.".to_string()
            }
            Self::AlreadyBooked { date, .. } => {
                format!("You already have a booking on {date} for this schedule.")
            }
            Self::CompensationFailure { .. } => {
                "Your booking could not be completed and a session may be held. Our team has been notified."
                    .to_string()
            }
        }
    }

    /// Whether the client may retry automatically, starting again from a
    /// fresh availability fetch.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::SlotUnavailable { .. })
    }

    /// Whether the failure directs the customer to the renewal path.
    pub fn requires_renewal(&self) -> bool {
        matches!(self, Self::Expired { .. } | Self::Depleted { .. })
    }
}
