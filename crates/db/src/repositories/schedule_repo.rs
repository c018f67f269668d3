//! Repository for `course_schedules`, `schedule_closures` and `schedule_slots`.
//!
//! Also hosts the availability read path, which projects these three tables
//! into per-date [`AvailabilitySlot`]s.

use academy_core::availability::{self, AvailabilitySlot, BookedSlot};
use academy_core::error::{BookingError, CoreError};
use academy_core::types::{Date, DbId};
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::error::LedgerResult;
use crate::models::course::{
    CourseSchedule, CreateCourseSchedule, CreateScheduleClosure, ScheduleClosure, ScheduleSlot,
};

const SCHEDULE_COLUMNS: &str = "id, course_id, name, days_of_week, capacity_per_day, \
    starts_on, ends_on, is_active, created_at, updated_at";

const CLOSURE_COLUMNS: &str = "id, schedule_id, closed_on, reason, created_at, updated_at";

const SLOT_COLUMNS: &str =
    "id, schedule_id, slot_date, capacity_total, capacity_booked, created_at, updated_at";

pub struct ScheduleRepo;

impl ScheduleRepo {
    // ── Schedules ────────────────────────────────────────────────────

    /// Insert a schedule after checking its weekdays and per-day capacity.
    pub async fn create(
        pool: &PgPool,
        input: &CreateCourseSchedule,
    ) -> LedgerResult<CourseSchedule> {
        availability::validate_days_of_week(&input.days_of_week).map_err(CoreError::Validation)?;
        availability::validate_capacity(input.capacity_per_day).map_err(CoreError::Validation)?;

        let query = format!(
            "INSERT INTO course_schedules
                (course_id, name, days_of_week, capacity_per_day, starts_on, ends_on)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {SCHEDULE_COLUMNS}"
        );
        let schedule = sqlx::query_as::<_, CourseSchedule>(&query)
            .bind(input.course_id)
            .bind(&input.name)
            .bind(&input.days_of_week)
            .bind(input.capacity_per_day)
            .bind(input.starts_on)
            .bind(input.ends_on)
            .fetch_one(pool)
            .await?;
        Ok(schedule)
    }

    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<CourseSchedule>, sqlx::Error> {
        let query = format!("SELECT {SCHEDULE_COLUMNS} FROM course_schedules WHERE id = $1");
        sqlx::query_as::<_, CourseSchedule>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Active schedules of a course, by name.
    pub async fn list_by_course(
        pool: &PgPool,
        course_id: DbId,
    ) -> Result<Vec<CourseSchedule>, sqlx::Error> {
        let query = format!(
            "SELECT {SCHEDULE_COLUMNS} FROM course_schedules
             WHERE course_id = $1 AND is_active = true
             ORDER BY name, id"
        );
        sqlx::query_as::<_, CourseSchedule>(&query)
            .bind(course_id)
            .fetch_all(pool)
            .await
    }

    // ── Closures ─────────────────────────────────────────────────────

    /// Close a schedule on a date. A second closure for the same date
    /// violates `uq_schedule_closures_schedule_date`.
    pub async fn add_closure(
        pool: &PgPool,
        schedule_id: DbId,
        input: &CreateScheduleClosure,
    ) -> Result<ScheduleClosure, sqlx::Error> {
        let query = format!(
            "INSERT INTO schedule_closures (schedule_id, closed_on, reason)
             VALUES ($1, $2, $3)
             RETURNING {CLOSURE_COLUMNS}"
        );
        sqlx::query_as::<_, ScheduleClosure>(&query)
            .bind(schedule_id)
            .bind(input.closed_on)
            .bind(&input.reason)
            .fetch_one(pool)
            .await
    }

    /// Reopen a closed date. Returns `true` if a closure was removed.
    pub async fn remove_closure(
        pool: &PgPool,
        schedule_id: DbId,
        closed_on: Date,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM schedule_closures WHERE schedule_id = $1 AND closed_on = $2")
                .bind(schedule_id)
                .bind(closed_on)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_closed_dates<'e>(
        executor: impl PgExecutor<'e>,
        schedule_id: DbId,
        from: Date,
        to: Date,
    ) -> Result<Vec<Date>, sqlx::Error> {
        let rows: Vec<(Date,)> = sqlx::query_as(
            "SELECT closed_on FROM schedule_closures \
             WHERE schedule_id = $1 AND closed_on BETWEEN $2 AND $3 \
             ORDER BY closed_on",
        )
        .bind(schedule_id)
        .bind(from)
        .bind(to)
        .fetch_all(executor)
        .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    pub async fn is_closed<'e>(
        executor: impl PgExecutor<'e>,
        schedule_id: DbId,
        date: Date,
    ) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM schedule_closures \
             WHERE schedule_id = $1 AND closed_on = $2)",
        )
        .bind(schedule_id)
        .bind(date)
        .fetch_one(executor)
        .await?;
        Ok(row.0)
    }

    // ── Slots ────────────────────────────────────────────────────────

    pub async fn list_slots<'e>(
        executor: impl PgExecutor<'e>,
        schedule_id: DbId,
        from: Date,
        to: Date,
    ) -> Result<Vec<ScheduleSlot>, sqlx::Error> {
        let query = format!(
            "SELECT {SLOT_COLUMNS} FROM schedule_slots
             WHERE schedule_id = $1 AND slot_date BETWEEN $2 AND $3
             ORDER BY slot_date"
        );
        sqlx::query_as::<_, ScheduleSlot>(&query)
            .bind(schedule_id)
            .bind(from)
            .bind(to)
            .fetch_all(executor)
            .await
    }

    pub async fn find_slot<'e>(
        executor: impl PgExecutor<'e>,
        schedule_id: DbId,
        date: Date,
    ) -> Result<Option<ScheduleSlot>, sqlx::Error> {
        let query = format!(
            "SELECT {SLOT_COLUMNS} FROM schedule_slots WHERE schedule_id = $1 AND slot_date = $2"
        );
        sqlx::query_as::<_, ScheduleSlot>(&query)
            .bind(schedule_id)
            .bind(date)
            .fetch_optional(executor)
            .await
    }

    /// Materialize the slot row for `(schedule, date)` if needed and lock it
    /// for the rest of the transaction.
    pub async fn lock_slot(
        conn: &mut PgConnection,
        schedule: &CourseSchedule,
        date: Date,
    ) -> Result<ScheduleSlot, sqlx::Error> {
        sqlx::query(
            "INSERT INTO schedule_slots (schedule_id, slot_date, capacity_total) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (schedule_id, slot_date) DO NOTHING",
        )
        .bind(schedule.id)
        .bind(date)
        .bind(schedule.capacity_per_day)
        .execute(&mut *conn)
        .await?;

        let query = format!(
            "SELECT {SLOT_COLUMNS} FROM schedule_slots
             WHERE schedule_id = $1 AND slot_date = $2
             FOR UPDATE"
        );
        sqlx::query_as::<_, ScheduleSlot>(&query)
            .bind(schedule.id)
            .bind(date)
            .fetch_one(&mut *conn)
            .await
    }

    /// Take one place on a locked slot. The table's CHECK constraint rejects
    /// overbooking even if the caller skipped the capacity check.
    pub async fn increment_booked(
        conn: &mut PgConnection,
        slot_id: DbId,
    ) -> Result<ScheduleSlot, sqlx::Error> {
        let query = format!(
            "UPDATE schedule_slots SET capacity_booked = capacity_booked + 1
             WHERE id = $1
             RETURNING {SLOT_COLUMNS}"
        );
        sqlx::query_as::<_, ScheduleSlot>(&query)
            .bind(slot_id)
            .fetch_one(conn)
            .await
    }

    /// Give back one place. Returns `false` if there was nothing to give back.
    pub async fn decrement_booked(
        conn: &mut PgConnection,
        schedule_id: DbId,
        date: Date,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE schedule_slots SET capacity_booked = capacity_booked - 1 \
             WHERE schedule_id = $1 AND slot_date = $2 AND capacity_booked > 0",
        )
        .bind(schedule_id)
        .bind(date)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // ── Availability ─────────────────────────────────────────────────

    /// Per-date availability of a schedule for one month.
    ///
    /// Advisory: it takes no locks. The scheduler re-checks under lock.
    pub async fn availability(
        pool: &PgPool,
        schedule_id: DbId,
        year: i32,
        month: u32,
        today: Date,
    ) -> LedgerResult<Vec<AvailabilitySlot>> {
        let (from, to) = availability::month_bounds(year, month).map_err(CoreError::Validation)?;

        let schedule = Self::find_by_id(pool, schedule_id)
            .await?
            .ok_or(BookingError::NotFound {
                entity: "Schedule",
                id: schedule_id,
            })?;

        let closures = Self::list_closed_dates(pool, schedule_id, from, to).await?;
        let booked: Vec<BookedSlot> = Self::list_slots(pool, schedule_id, from, to)
            .await?
            .iter()
            .map(ScheduleSlot::booked)
            .collect();

        let slots = availability::project_month(
            &schedule.window(),
            year,
            month,
            &closures,
            &booked,
            today,
        )
        .map_err(CoreError::Validation)?;
        Ok(slots)
    }
}
