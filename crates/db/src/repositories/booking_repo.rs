//! Repository for `bookings` and `booking_participants`.

use std::collections::HashMap;

use academy_core::booking::Participant;
use academy_core::types::{Date, DbId, ReservationToken};
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::models::booking::{Booking, BookingDetail, BookingParticipant};
use crate::models::status::BookingStatus;

const COLUMNS: &str = "id, owner_id, purchased_package_id, course_id, schedule_id, booked_date, \
    status_id, reservation_token, rescheduled_from_id, created_at, updated_at";

const PARTICIPANT_COLUMNS: &str =
    "id, booking_id, position, first_name, last_name, created_at, updated_at";

/// Fields of a new confirmed booking.
#[derive(Debug, Clone, Copy)]
pub struct NewBooking {
    pub owner_id: DbId,
    pub purchased_package_id: Option<DbId>,
    pub course_id: DbId,
    pub schedule_id: DbId,
    pub booked_date: Date,
    pub reservation_token: Option<ReservationToken>,
    pub rescheduled_from_id: Option<DbId>,
}

pub struct BookingRepo;

impl BookingRepo {
    /// Insert a confirmed booking. A second confirmed booking of the same
    /// package, schedule and date violates `uq_bookings_package_schedule_date`.
    pub async fn insert(
        conn: &mut PgConnection,
        input: &NewBooking,
    ) -> Result<Booking, sqlx::Error> {
        let query = format!(
            "INSERT INTO bookings
                (owner_id, purchased_package_id, course_id, schedule_id, booked_date,
                 status_id, reservation_token, rescheduled_from_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Booking>(&query)
            .bind(input.owner_id)
            .bind(input.purchased_package_id)
            .bind(input.course_id)
            .bind(input.schedule_id)
            .bind(input.booked_date)
            .bind(BookingStatus::Confirmed.id())
            .bind(input.reservation_token)
            .bind(input.rescheduled_from_id)
            .fetch_one(conn)
            .await
    }

    /// Store participants in the given order (positions start at 1).
    pub async fn insert_participants(
        conn: &mut PgConnection,
        booking_id: DbId,
        participants: &[Participant],
    ) -> Result<(), sqlx::Error> {
        for (i, p) in participants.iter().enumerate() {
            sqlx::query(
                "INSERT INTO booking_participants (booking_id, position, first_name, last_name) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(booking_id)
            .bind(i as i32 + 1)
            .bind(&p.first_name)
            .bind(&p.last_name)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<Booking>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bookings WHERE id = $1");
        sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Lock a booking row for a status change.
    ///
    /// With `owner_id` set, bookings of other owners are invisible.
    pub async fn lock(
        conn: &mut PgConnection,
        id: DbId,
        owner_id: Option<DbId>,
    ) -> Result<Option<Booking>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM bookings
             WHERE id = $1 AND ($2::BIGINT IS NULL OR owner_id = $2)
             FOR UPDATE"
        );
        sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(conn)
            .await
    }

    pub async fn set_status(
        conn: &mut PgConnection,
        id: DbId,
        status: BookingStatus,
    ) -> Result<Booking, sqlx::Error> {
        let query = format!("UPDATE bookings SET status_id = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .bind(status.id())
            .fetch_one(conn)
            .await
    }

    pub async fn list_participants<'e>(
        executor: impl PgExecutor<'e>,
        booking_id: DbId,
    ) -> Result<Vec<Participant>, sqlx::Error> {
        let query = format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM booking_participants
             WHERE booking_id = $1
             ORDER BY position"
        );
        let rows = sqlx::query_as::<_, BookingParticipant>(&query)
            .bind(booking_id)
            .fetch_all(executor)
            .await?;
        Ok(rows.into_iter().map(into_participant).collect())
    }

    /// All bookings of an owner, soonest session first.
    pub async fn list_by_owner(
        pool: &PgPool,
        owner_id: DbId,
    ) -> Result<Vec<BookingDetail>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM bookings
             WHERE owner_id = $1
             ORDER BY booked_date, id"
        );
        let bookings = sqlx::query_as::<_, Booking>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await?;

        let ids: Vec<DbId> = bookings.iter().map(|b| b.id).collect();
        let participant_query = format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM booking_participants
             WHERE booking_id = ANY($1)
             ORDER BY booking_id, position"
        );
        let rows = sqlx::query_as::<_, BookingParticipant>(&participant_query)
            .bind(&ids)
            .fetch_all(pool)
            .await?;

        let mut by_booking: HashMap<DbId, Vec<Participant>> = HashMap::new();
        for row in rows {
            by_booking
                .entry(row.booking_id)
                .or_default()
                .push(into_participant(row));
        }

        Ok(bookings
            .into_iter()
            .map(|b| {
                let participants = by_booking.remove(&b.id).unwrap_or_default();
                BookingDetail::new(b, participants)
            })
            .collect())
    }

    /// Confirmed bookings on one schedule date.
    pub async fn count_confirmed_for_slot<'e>(
        executor: impl PgExecutor<'e>,
        schedule_id: DbId,
        date: Date,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM bookings \
             WHERE schedule_id = $1 AND booked_date = $2 AND status_id = $3",
        )
        .bind(schedule_id)
        .bind(date)
        .bind(BookingStatus::Confirmed.id())
        .fetch_one(executor)
        .await?;
        Ok(row.0)
    }

    /// Mark every confirmed booking dated before `today` as completed.
    ///
    /// The consumed session stays consumed. Returns the number of bookings
    /// completed.
    pub async fn complete_elapsed(pool: &PgPool, today: Date) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE bookings SET status_id = $1 WHERE status_id = $2 AND booked_date < $3",
        )
        .bind(BookingStatus::Completed.id())
        .bind(BookingStatus::Confirmed.id())
        .bind(today)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}

fn into_participant(row: BookingParticipant) -> Participant {
    Participant {
        first_name: row.first_name,
        last_name: row.last_name,
    }
}
