use academy_core::error::{BookingError, CoreError};
use academy_db::LedgerError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for generic domain errors, [`BookingError`] for
/// ledger and scheduling failures, and adds HTTP-specific variants.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A ledger or scheduling failure. Each variant has its own status and code.
    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Booking(e) => AppError::Booking(e),
            LedgerError::Core(e) => AppError::Core(e),
            LedgerError::Database(e) => AppError::Database(e),
        }
    }
}

/// JSON body of every error response.
///
/// `retryable` tells the dashboard it may resubmit the same request;
/// `renewal` tells it to offer the renewal flow instead.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    retryable: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    renewal: bool,
}

struct Classified {
    status: StatusCode,
    body: ErrorBody,
}

impl Classified {
    fn new(status: StatusCode, code: &'static str, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: error.into(),
                code,
                retryable: false,
                renewal: false,
            },
        }
    }

    fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "An internal error occurred",
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let classified = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Booking(err) => classify_booking_error(err),
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::BadRequest(msg) => {
                Classified::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone())
            }
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                Classified::internal()
            }
        };

        (classified.status, Json(classified.body)).into_response()
    }
}

fn classify_core_error(core: &CoreError) -> Classified {
    match core {
        CoreError::NotFound { entity, id } => Classified::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => {
            Classified::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
        }
        CoreError::Conflict(msg) => Classified::new(StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Unauthorized(msg) => {
            Classified::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
        }
        CoreError::Forbidden(msg) => {
            Classified::new(StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone())
        }
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            Classified::internal()
        }
    }
}

/// `CourseNotAllocated` and `CompensationFailure` point at a data or
/// infrastructure problem rather than a customer mistake and are logged at
/// error level.
fn classify_booking_error(err: &BookingError) -> Classified {
    let status = match err {
        BookingError::NotFound { .. } => StatusCode::NOT_FOUND,
        BookingError::Expired { .. } => StatusCode::GONE,
        BookingError::Depleted { .. }
        | BookingError::SlotUnavailable { .. }
        | BookingError::AlreadyBooked { .. } => StatusCode::CONFLICT,
        BookingError::CourseNotAllocated { .. } => {
            tracing::error!(error = %err, "Booking requested for a course outside the package");
            StatusCode::UNPROCESSABLE_ENTITY
        }
        BookingError::CompensationFailure { token, .. } => {
            tracing::error!(error = %err, %token, "Reserved session left without a booking");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let mut classified = Classified::new(status, err.code(), err.user_message());
    classified.body.retryable = err.is_retryable();
    classified.body.renewal = err.requires_renewal();
    classified
}

/// - `RowNotFound` maps to 404.
/// - Unique violations on a `uq_*` constraint map to 409.
/// - Deadlocks and serialization failures map to a retryable 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> Classified {
    let db_err = match err {
        sqlx::Error::RowNotFound => {
            return Classified::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Resource not found")
        }
        sqlx::Error::Database(db_err) => db_err,
        other => {
            tracing::error!(error = %other, "Database error");
            return Classified::internal();
        }
    };

    match (db_err.code().as_deref(), db_err.constraint()) {
        (Some("23505"), Some(constraint)) if constraint.starts_with("uq_") => Classified::new(
            StatusCode::CONFLICT,
            "CONFLICT",
            format!("Duplicate value violates unique constraint: {constraint}"),
        ),
        // deadlock_detected, serialization_failure
        (Some("40P01" | "40001"), _) => {
            tracing::warn!(error = %db_err, "Transaction aborted by lock conflict");
            let mut classified = Classified::new(
                StatusCode::CONFLICT,
                "TRANSACTION_CONFLICT",
                "The request collided with another booking. Please try again.",
            );
            classified.body.retryable = true;
            classified
        }
        _ => {
            tracing::error!(error = %db_err, "Database error");
            Classified::internal()
        }
    }
}
