//! Scheduler: turns entitlement into confirmed bookings.
//!
//! Every date of a request goes through three steps inside the request's
//! transaction:
//!
//! 1. lock the schedule slot and check it is open with capacity left;
//! 2. reserve one session from the package allocation;
//! 3. write the booking, its participants and the slot counter.
//!
//! Step 3 runs in a savepoint. If it fails the savepoint is rolled back and
//! the session reserved in step 2 is released before the error is returned,
//! so the ledger never keeps a consumed session without a booking.
//!
//! Row locks are taken in the order booking, slot, allocation. Every slot a
//! request touches is locked up front in ascending `(schedule_id, date)`
//! order, before any allocation row.

use academy_core::availability;
use academy_core::booking::{self, state_machine, Participant};
use academy_core::error::{BookingError, CoreError};
use academy_core::types::{Date, DbId, ReservationToken};
use sqlx::{Connection, PgConnection, PgPool};

use crate::error::{LedgerError, LedgerResult};
use crate::models::booking::{Booking, BookingDetail, RescheduleBooking, ScheduleFromPackage};
use crate::models::status::BookingStatus;
use crate::repositories::booking_repo::NewBooking;
use crate::repositories::{BookingRepo, PurchasedPackageRepo, ScheduleRepo};

const UQ_PACKAGE_SCHEDULE_DATE: &str = "uq_bookings_package_schedule_date";
const CK_SLOT_CAPACITY: &str = "ck_schedule_slots_capacity";

/// What a booking draws on: a package's course, taught on one schedule.
#[derive(Debug, Clone, Copy)]
pub struct BookingTarget {
    pub purchased_package_id: DbId,
    pub course_id: DbId,
    pub schedule_id: DbId,
}

pub struct SchedulingRepo;

impl SchedulingRepo {
    /// Book one or more dates against a purchased package.
    ///
    /// All-or-nothing: if any date fails, no booking of the request is kept
    /// and no session stays consumed.
    pub async fn schedule_from_package(
        pool: &PgPool,
        owner_id: DbId,
        input: &ScheduleFromPackage,
        today: Date,
    ) -> LedgerResult<Vec<BookingDetail>> {
        let dates = booking::normalize_booked_dates(&input.booked_dates)
            .map_err(CoreError::Validation)?;
        let participants =
            booking::normalize_participants(&input.participants).map_err(CoreError::Validation)?;
        let target = BookingTarget {
            purchased_package_id: input.purchased_package_id,
            course_id: input.course_id,
            schedule_id: input.schedule_id,
        };

        let mut tx = pool.begin().await?;
        Self::lock_slots_in_order(
            &mut tx,
            dates.iter().map(|d| (target.schedule_id, *d)).collect(),
        )
        .await?;

        let mut created = Vec::with_capacity(dates.len());
        for date in dates {
            let detail =
                Self::schedule_in_tx(&mut tx, owner_id, target, date, &participants, None, today)
                    .await?;
            created.push(detail);
        }
        tx.commit().await?;

        for detail in &created {
            tracing::info!(
                booking_id = detail.booking.id,
                owner_id,
                package_id = target.purchased_package_id,
                schedule_id = target.schedule_id,
                date = %detail.booking.booked_date,
                "Booking confirmed",
            );
        }
        Ok(created)
    }

    /// Book a single date inside the caller's transaction.
    ///
    /// On error the caller must roll back its transaction; the reservation
    /// has already been released when the failure happened after step 2.
    pub async fn schedule_in_tx(
        conn: &mut PgConnection,
        owner_id: DbId,
        target: BookingTarget,
        date: Date,
        participants: &[Participant],
        rescheduled_from_id: Option<DbId>,
        today: Date,
    ) -> LedgerResult<BookingDetail> {
        // 1. Capacity.
        let schedule = ScheduleRepo::find_by_id(&mut *conn, target.schedule_id)
            .await?
            .filter(|s| s.course_id == target.course_id)
            .ok_or(BookingError::NotFound {
                entity: "Schedule",
                id: target.schedule_id,
            })?;
        let slot = ScheduleRepo::lock_slot(conn, &schedule, date).await?;
        let closed = ScheduleRepo::is_closed(&mut *conn, schedule.id, date).await?;
        if let Err(err) =
            availability::check_slot_bookable(&schedule.window(), date, closed, slot.booked(), today)
        {
            tracing::warn!(
                schedule_id = schedule.id,
                %date,
                closed,
                capacity_booked = slot.capacity_booked,
                capacity_total = slot.capacity_total,
                "Slot unavailable at booking time",
            );
            return Err(err.into());
        }

        // 2. Entitlement.
        let reservation = PurchasedPackageRepo::reserve_session(
            conn,
            owner_id,
            target.purchased_package_id,
            target.course_id,
            date,
            today,
        )
        .await?;

        // 3. Booking record, compensated on failure.
        let new_booking = NewBooking {
            owner_id,
            purchased_package_id: Some(target.purchased_package_id),
            course_id: target.course_id,
            schedule_id: schedule.id,
            booked_date: date,
            reservation_token: Some(reservation.token),
            rescheduled_from_id,
        };
        match Self::record_booking(conn, &new_booking, slot.id, participants).await {
            Ok(detail) => Ok(detail),
            Err(cause) => Err(Self::compensate(conn, reservation.token, cause).await),
        }
    }

    /// Cancel a confirmed booking and give its session and slot place back.
    ///
    /// With `owner_id` set only that owner's bookings are found; admins pass
    /// `None`.
    pub async fn cancel(
        pool: &PgPool,
        booking_id: DbId,
        owner_id: Option<DbId>,
        today: Date,
    ) -> LedgerResult<BookingDetail> {
        let mut tx = pool.begin().await?;
        let booking =
            Self::lock_changeable(&mut tx, booking_id, owner_id, BookingStatus::Cancelled, today)
                .await?;
        let booking = Self::release_booking(&mut tx, &booking, BookingStatus::Cancelled).await?;
        let participants = BookingRepo::list_participants(&mut *tx, booking.id).await?;
        tx.commit().await?;

        tracing::info!(
            booking_id,
            owner_id = booking.owner_id,
            schedule_id = booking.schedule_id,
            date = %booking.booked_date,
            by_admin = owner_id.is_none(),
            "Booking cancelled",
        );
        Ok(BookingDetail::new(booking, participants))
    }

    /// Move a confirmed booking to another date, and optionally another
    /// schedule of the same course.
    ///
    /// The old booking becomes `rescheduled` and the new one records
    /// `rescheduled_from_id`. Either both happen or neither does.
    pub async fn reschedule(
        pool: &PgPool,
        owner_id: DbId,
        booking_id: DbId,
        input: &RescheduleBooking,
        today: Date,
    ) -> LedgerResult<BookingDetail> {
        let mut tx = pool.begin().await?;

        let old = Self::lock_changeable(
            &mut tx,
            booking_id,
            Some(owner_id),
            BookingStatus::Rescheduled,
            today,
        )
        .await?;
        let purchased_package_id = old.purchased_package_id.ok_or_else(|| {
            CoreError::Conflict(format!(
                "Booking {booking_id} was not made from a package and cannot be rescheduled"
            ))
        })?;
        let target = BookingTarget {
            purchased_package_id,
            course_id: old.course_id,
            schedule_id: input.schedule_id.unwrap_or(old.schedule_id),
        };

        Self::lock_slots_in_order(
            &mut tx,
            vec![
                (old.schedule_id, old.booked_date),
                (target.schedule_id, input.new_date),
            ],
        )
        .await?;
        let old = Self::release_booking(&mut tx, &old, BookingStatus::Rescheduled).await?;
        let participants = BookingRepo::list_participants(&mut *tx, old.id).await?;

        let detail = Self::schedule_in_tx(
            &mut tx,
            owner_id,
            target,
            input.new_date,
            &participants,
            Some(old.id),
            today,
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            booking_id = detail.booking.id,
            rescheduled_from_id = old.id,
            owner_id,
            from = %old.booked_date,
            to = %detail.booking.booked_date,
            "Booking rescheduled",
        );
        Ok(detail)
    }

    // ── Internals ────────────────────────────────────────────────────

    /// Step 3 in a savepoint: booking row, participants, slot counter and
    /// the reservation back-link.
    async fn record_booking(
        conn: &mut PgConnection,
        input: &NewBooking,
        slot_id: DbId,
        participants: &[Participant],
    ) -> LedgerResult<BookingDetail> {
        let mut savepoint = conn.begin().await?;
        match Self::write_booking(&mut savepoint, input, slot_id, participants).await {
            Ok(detail) => {
                savepoint.commit().await?;
                Ok(detail)
            }
            Err(err) => {
                savepoint.rollback().await?;
                Err(err)
            }
        }
    }

    async fn write_booking(
        conn: &mut PgConnection,
        input: &NewBooking,
        slot_id: DbId,
        participants: &[Participant],
    ) -> LedgerResult<BookingDetail> {
        let booking = BookingRepo::insert(conn, input).await.map_err(|e| {
            if violates(&e, UQ_PACKAGE_SCHEDULE_DATE) {
                LedgerError::Booking(BookingError::AlreadyBooked {
                    package_id: input.purchased_package_id.unwrap_or_default(),
                    schedule_id: input.schedule_id,
                    date: input.booked_date,
                })
            } else {
                e.into()
            }
        })?;

        BookingRepo::insert_participants(conn, booking.id, participants).await?;

        ScheduleRepo::increment_booked(conn, slot_id)
            .await
            .map_err(|e| {
                if violates(&e, CK_SLOT_CAPACITY) {
                    LedgerError::Booking(BookingError::SlotUnavailable {
                        schedule_id: input.schedule_id,
                        date: input.booked_date,
                    })
                } else {
                    e.into()
                }
            })?;

        if let Some(token) = input.reservation_token {
            PurchasedPackageRepo::attach_booking(conn, token, booking.id).await?;
        }

        Ok(BookingDetail::new(booking, participants.to_vec()))
    }

    /// Release the reservation of a failed step 3 and hand back the error
    /// to report. A failed release is reported as `CompensationFailure`.
    async fn compensate(
        conn: &mut PgConnection,
        token: ReservationToken,
        cause: LedgerError,
    ) -> LedgerError {
        match PurchasedPackageRepo::release_session(conn, token).await {
            Ok(_) => {
                tracing::warn!(%token, error = %cause, "Booking failed, reserved session released");
                cause
            }
            Err(release_err) => {
                tracing::error!(
                    %token,
                    error = %cause,
                    release_error = %release_err,
                    "Booking failed and the reserved session could not be released",
                );
                BookingError::CompensationFailure {
                    token,
                    reason: release_err.to_string(),
                }
                .into()
            }
        }
    }

    /// Lock every listed slot, ascending by `(schedule_id, date)`. Unknown
    /// schedules are skipped; the booking step reports them.
    async fn lock_slots_in_order(
        conn: &mut PgConnection,
        mut slots: Vec<(DbId, Date)>,
    ) -> LedgerResult<()> {
        slots.sort_unstable();
        slots.dedup();
        for (schedule_id, date) in slots {
            if let Some(schedule) = ScheduleRepo::find_by_id(&mut *conn, schedule_id).await? {
                ScheduleRepo::lock_slot(conn, &schedule, date).await?;
            }
        }
        Ok(())
    }

    /// Lock a booking and check it may still move to `to`.
    async fn lock_changeable(
        conn: &mut PgConnection,
        booking_id: DbId,
        owner_id: Option<DbId>,
        to: BookingStatus,
        today: Date,
    ) -> LedgerResult<Booking> {
        let booking = BookingRepo::lock(conn, booking_id, owner_id)
            .await?
            .ok_or(BookingError::NotFound {
                entity: "Booking",
                id: booking_id,
            })?;

        state_machine::validate_transition(booking.status_id, to.id())
            .map_err(CoreError::Conflict)?;
        booking::check_still_changeable(booking.booked_date, today)
            .map_err(CoreError::Conflict)?;
        Ok(booking)
    }

    /// Give back a locked booking's slot place and session, and move it to
    /// `to`.
    async fn release_booking(
        conn: &mut PgConnection,
        booking: &Booking,
        to: BookingStatus,
    ) -> LedgerResult<Booking> {
        ScheduleRepo::decrement_booked(conn, booking.schedule_id, booking.booked_date).await?;
        if let Some(token) = booking.reservation_token {
            PurchasedPackageRepo::release_session(conn, token).await?;
        }

        Ok(BookingRepo::set_status(conn, booking.id, to).await?)
    }
}

fn violates(err: &sqlx::Error, constraint: &str) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.constraint() == Some(constraint))
}
