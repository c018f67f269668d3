use academy_core::error::{BookingError, CoreError};

/// Error returned by repository operations that mix ledger rules with storage.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// A ledger or scheduling rule rejected the operation.
    #[error(transparent)]
    Booking(#[from] BookingError),

    /// A generic domain error (validation, conflict, not found).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The database failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenience alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
