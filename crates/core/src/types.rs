/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Calendar date in the academy's business timezone.
pub type Date = chrono::NaiveDate;

/// Handle linking an entitlement decrement to the booking it paid for.
pub type ReservationToken = uuid::Uuid;
