//! Integration tests for `SchedulingRepo`: booking from a package, the
//! compensating release, cancellation, rescheduling and completion.

mod common;

use academy_core::error::{BookingError, CoreError};
use academy_core::types::{Date, DbId};
use academy_db::models::booking::RescheduleBooking;
use academy_db::models::course::CreateScheduleClosure;
use academy_db::models::status::BookingStatus;
use academy_db::repositories::scheduling_repo::BookingTarget;
use academy_db::repositories::{BookingRepo, ScheduleRepo, SchedulingRepo};
use academy_db::LedgerError;
use assert_matches::assert_matches;
use common::*;
use sqlx::PgPool;

fn today() -> Date {
    purchase_day()
}

// ---------------------------------------------------------------------------
// Booking
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn booking_consumes_a_session_and_a_place(pool: PgPool) {
    let catalog = seed_catalog(&pool, 4).await;
    let package_id = buy_combo(&pool, &catalog, OWNER).await.package.id;
    let day = date(2030, 3, 4);

    let created = SchedulingRepo::schedule_from_package(
        &pool,
        OWNER,
        &swim_request(package_id, &catalog, &[day]),
        today(),
    )
    .await
    .unwrap();

    assert_eq!(created.len(), 1);
    let booking = &created[0];
    assert_eq!(booking.status, "confirmed");
    assert_eq!(booking.booking.booked_date, day);
    assert_eq!(booking.participants, participants());

    assert_eq!(consumed(&pool, package_id, catalog.swimming).await, (1, 3));
    assert_eq!(capacity_booked(&pool, catalog.swim_schedule.id, day).await, 1);

    let token = booking.booking.reservation_token.unwrap();
    let reservation = academy_db::repositories::PurchasedPackageRepo::find_reservation(&pool, token)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reservation.booking_id, Some(booking.booking.id));
    assert!(reservation.released_at.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn multi_date_request_is_all_or_nothing(pool: PgPool) {
    let catalog = seed_catalog(&pool, 4).await;
    let package_id = buy_combo(&pool, &catalog, OWNER).await.package.id;

    // Three swimming sessions, four dates requested.
    let dates = [
        date(2030, 3, 4),
        date(2030, 3, 6),
        date(2030, 3, 11),
        date(2030, 3, 13),
    ];
    let err = SchedulingRepo::schedule_from_package(
        &pool,
        OWNER,
        &swim_request(package_id, &catalog, &dates),
        today(),
    )
    .await
    .unwrap_err();
    assert_matches!(err, LedgerError::Booking(BookingError::Depleted { .. }));

    assert_eq!(consumed(&pool, package_id, catalog.swimming).await, (0, 3));
    for day in dates {
        assert_eq!(capacity_booked(&pool, catalog.swim_schedule.id, day).await, 0);
    }
    let bookings = BookingRepo::list_by_owner(&pool, OWNER).await.unwrap();
    assert!(bookings.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn multi_date_request_books_every_date(pool: PgPool) {
    let catalog = seed_catalog(&pool, 4).await;
    let package_id = buy_combo(&pool, &catalog, OWNER).await.package.id;

    let created = SchedulingRepo::schedule_from_package(
        &pool,
        OWNER,
        &swim_request(
            package_id,
            &catalog,
            &[date(2030, 3, 11), date(2030, 3, 4), date(2030, 3, 6)],
        ),
        today(),
    )
    .await
    .unwrap();

    let days: Vec<_> = created.iter().map(|b| b.booking.booked_date).collect();
    assert_eq!(
        days,
        [date(2030, 3, 4), date(2030, 3, 6), date(2030, 3, 11)]
    );
    assert_eq!(consumed(&pool, package_id, catalog.swimming).await, (3, 3));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn closed_or_non_operating_date_is_unavailable(pool: PgPool) {
    let catalog = seed_catalog(&pool, 4).await;
    let package_id = buy_combo(&pool, &catalog, OWNER).await.package.id;
    ScheduleRepo::add_closure(
        &pool,
        catalog.swim_schedule.id,
        &CreateScheduleClosure {
            closed_on: date(2030, 3, 4),
            reason: Some("Pool maintenance".to_string()),
        },
    )
    .await
    .unwrap();

    // Closed Monday, then a Tuesday the schedule does not run on.
    for day in [date(2030, 3, 4), date(2030, 3, 5)] {
        let err = SchedulingRepo::schedule_from_package(
            &pool,
            OWNER,
            &swim_request(package_id, &catalog, &[day]),
            today(),
        )
        .await
        .unwrap_err();
        assert_matches!(
            err,
            LedgerError::Booking(BookingError::SlotUnavailable { date, .. }) if date == day
        );
    }
    assert_eq!(consumed(&pool, package_id, catalog.swimming).await, (0, 3));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn schedule_of_another_course_is_not_found(pool: PgPool) {
    let catalog = seed_catalog(&pool, 4).await;
    let package_id = buy_combo(&pool, &catalog, OWNER).await.package.id;

    let mut request = swim_request(package_id, &catalog, &[date(2030, 3, 4)]);
    request.schedule_id = catalog.tennis_schedule.id;

    let err = SchedulingRepo::schedule_from_package(&pool, OWNER, &request, today())
        .await
        .unwrap_err();
    assert_matches!(
        err,
        LedgerError::Booking(BookingError::NotFound {
            entity: "Schedule",
            ..
        })
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn course_outside_the_package_is_rejected(pool: PgPool) {
    let catalog = seed_catalog(&pool, 4).await;
    let package_id = buy_combo(&pool, &catalog, OWNER).await.package.id;

    let mut request = swim_request(package_id, &catalog, &[date(2030, 3, 4)]);
    request.course_id = catalog.archery;
    request.schedule_id = catalog.archery_schedule.id;

    let err = SchedulingRepo::schedule_from_package(&pool, OWNER, &request, today())
        .await
        .unwrap_err();
    assert_matches!(
        err,
        LedgerError::Booking(BookingError::CourseNotAllocated { .. })
    );
    assert_eq!(
        capacity_booked(&pool, catalog.archery_schedule.id, date(2030, 3, 4)).await,
        0
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invalid_request_is_rejected_before_touching_the_ledger(pool: PgPool) {
    let catalog = seed_catalog(&pool, 4).await;
    let package_id = buy_combo(&pool, &catalog, OWNER).await.package.id;

    let mut request = swim_request(package_id, &catalog, &[date(2030, 3, 4)]);
    request.participants.clear();
    let err = SchedulingRepo::schedule_from_package(&pool, OWNER, &request, today())
        .await
        .unwrap_err();
    assert_matches!(err, LedgerError::Core(CoreError::Validation(_)));

    let request = swim_request(package_id, &catalog, &[date(2030, 3, 4), date(2030, 3, 4)]);
    let err = SchedulingRepo::schedule_from_package(&pool, OWNER, &request, today())
        .await
        .unwrap_err();
    assert_matches!(err, LedgerError::Core(CoreError::Validation(_)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_bookings_never_oversell_a_slot(pool: PgPool) {
    let catalog = seed_catalog(&pool, 2).await;
    let day = date(2030, 3, 4);

    let mut requests = Vec::new();
    for owner in 1..=6 {
        let package_id = buy_combo(&pool, &catalog, owner).await.package.id;
        requests.push((owner, swim_request(package_id, &catalog, &[day])));
    }

    let attempts = requests.into_iter().map(|(owner, request)| {
        let pool = pool.clone();
        tokio::spawn(async move {
            SchedulingRepo::schedule_from_package(&pool, owner, &request, today()).await
        })
    });
    let outcomes: Vec<_> = futures::future::join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let succeeded = outcomes.iter().filter(|o| o.is_ok()).count();
    assert_eq!(succeeded, 2);
    for outcome in outcomes.iter().filter(|o| o.is_err()) {
        assert_matches!(
            outcome,
            Err(LedgerError::Booking(BookingError::SlotUnavailable { .. }))
        );
    }
    assert_eq!(capacity_booked(&pool, catalog.swim_schedule.id, day).await, 2);
    assert_eq!(
        BookingRepo::count_confirmed_for_slot(&pool, catalog.swim_schedule.id, day)
            .await
            .unwrap(),
        2
    );
}

// ---------------------------------------------------------------------------
// Compensation
// ---------------------------------------------------------------------------

/// A failure after the session was reserved must hand the session back
/// within the same transaction.
#[sqlx::test(migrations = "../../db/migrations")]
async fn failed_booking_record_releases_its_session(pool: PgPool) {
    let catalog = seed_catalog(&pool, 4).await;
    let package_id = buy_combo(&pool, &catalog, OWNER).await.package.id;
    let day = date(2030, 3, 4);
    let target = BookingTarget {
        purchased_package_id: package_id,
        course_id: catalog.swimming,
        schedule_id: catalog.swim_schedule.id,
    };

    let mut tx = pool.begin().await.unwrap();
    SchedulingRepo::schedule_in_tx(&mut tx, OWNER, target, day, &participants(), None, today())
        .await
        .unwrap();

    // Same package, schedule and date again: capacity and entitlement pass,
    // the booking insert does not.
    let err =
        SchedulingRepo::schedule_in_tx(&mut tx, OWNER, target, day, &participants(), None, today())
            .await
            .unwrap_err();
    assert_matches!(err, LedgerError::Booking(BookingError::AlreadyBooked { .. }));

    let (consumed,): (i32,) = sqlx::query_as(
        "SELECT sessions_consumed FROM package_allocations \
         WHERE purchased_package_id = $1 AND course_id = $2",
    )
    .bind(package_id)
    .bind(catalog.swimming)
    .fetch_one(&mut *tx)
    .await
    .unwrap();
    assert_eq!(consumed, 1);

    let (open, released): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*) FILTER (WHERE released_at IS NULL), \
                COUNT(*) FILTER (WHERE released_at IS NOT NULL) \
         FROM session_reservations WHERE purchased_package_id = $1",
    )
    .bind(package_id)
    .fetch_one(&mut *tx)
    .await
    .unwrap();
    assert_eq!((open, released), (1, 1));

    let slot = ScheduleRepo::find_slot(&mut *tx, catalog.swim_schedule.id, day)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(slot.capacity_booked, 1);
}

// ---------------------------------------------------------------------------
// Cancel
// ---------------------------------------------------------------------------

async fn book_one(pool: &PgPool, catalog: &Catalog, package_id: i64, day: Date) -> i64 {
    SchedulingRepo::schedule_from_package(
        pool,
        OWNER,
        &swim_request(package_id, catalog, &[day]),
        today(),
    )
    .await
    .unwrap()[0]
        .booking
        .id
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn cancel_returns_session_and_place(pool: PgPool) {
    let catalog = seed_catalog(&pool, 4).await;
    let package_id = buy_combo(&pool, &catalog, OWNER).await.package.id;
    let day = date(2030, 3, 4);
    let booking_id = book_one(&pool, &catalog, package_id, day).await;

    let cancelled = SchedulingRepo::cancel(&pool, booking_id, Some(OWNER), today())
        .await
        .unwrap();
    assert_eq!(cancelled.status, "cancelled");
    assert_eq!(cancelled.participants, participants());

    assert_eq!(consumed(&pool, package_id, catalog.swimming).await, (0, 3));
    assert_eq!(capacity_booked(&pool, catalog.swim_schedule.id, day).await, 0);

    // Terminal: a second cancel is a conflict and changes nothing.
    let err = SchedulingRepo::cancel(&pool, booking_id, Some(OWNER), today())
        .await
        .unwrap_err();
    assert_matches!(err, LedgerError::Core(CoreError::Conflict(_)));
    assert_eq!(consumed(&pool, package_id, catalog.swimming).await, (0, 3));

    // The same date can be booked again.
    book_one(&pool, &catalog, package_id, day).await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn only_the_owner_or_an_admin_can_cancel(pool: PgPool) {
    let catalog = seed_catalog(&pool, 4).await;
    let package_id = buy_combo(&pool, &catalog, OWNER).await.package.id;
    let booking_id = book_one(&pool, &catalog, package_id, date(2030, 3, 4)).await;

    let err = SchedulingRepo::cancel(&pool, booking_id, Some(OTHER_OWNER), today())
        .await
        .unwrap_err();
    assert_matches!(
        err,
        LedgerError::Booking(BookingError::NotFound {
            entity: "Booking",
            ..
        })
    );

    let cancelled = SchedulingRepo::cancel(&pool, booking_id, None, today())
        .await
        .unwrap();
    assert_eq!(cancelled.booking.status_id, BookingStatus::Cancelled.id());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn past_booking_cannot_be_cancelled(pool: PgPool) {
    let catalog = seed_catalog(&pool, 4).await;
    let package_id = buy_combo(&pool, &catalog, OWNER).await.package.id;
    let booking_id = book_one(&pool, &catalog, package_id, date(2030, 3, 4)).await;

    let err = SchedulingRepo::cancel(&pool, booking_id, Some(OWNER), date(2030, 3, 5))
        .await
        .unwrap_err();
    assert_matches!(err, LedgerError::Core(CoreError::Conflict(_)));
    assert_eq!(consumed(&pool, package_id, catalog.swimming).await, (1, 3));
}

// ---------------------------------------------------------------------------
// Reschedule
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn reschedule_moves_the_booking(pool: PgPool) {
    let catalog = seed_catalog(&pool, 4).await;
    let package_id = buy_combo(&pool, &catalog, OWNER).await.package.id;
    let from = date(2030, 3, 4);
    let to = date(2030, 3, 6);
    let booking_id = book_one(&pool, &catalog, package_id, from).await;

    let moved = SchedulingRepo::reschedule(
        &pool,
        OWNER,
        booking_id,
        &RescheduleBooking {
            schedule_id: None,
            new_date: to,
        },
        today(),
    )
    .await
    .unwrap();

    assert_eq!(moved.status, "confirmed");
    assert_eq!(moved.booking.booked_date, to);
    assert_eq!(moved.booking.rescheduled_from_id, Some(booking_id));
    assert_eq!(moved.participants, participants());

    let old = BookingRepo::find_by_id(&pool, booking_id).await.unwrap().unwrap();
    assert_eq!(old.status_id, BookingStatus::Rescheduled.id());

    assert_eq!(consumed(&pool, package_id, catalog.swimming).await, (1, 3));
    assert_eq!(capacity_booked(&pool, catalog.swim_schedule.id, from).await, 0);
    assert_eq!(capacity_booked(&pool, catalog.swim_schedule.id, to).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failed_reschedule_keeps_the_original_booking(pool: PgPool) {
    let catalog = seed_catalog(&pool, 4).await;
    let package_id = buy_combo(&pool, &catalog, OWNER).await.package.id;
    let from = date(2030, 3, 4);
    let booking_id = book_one(&pool, &catalog, package_id, from).await;
    ScheduleRepo::add_closure(
        &pool,
        catalog.swim_schedule.id,
        &CreateScheduleClosure {
            closed_on: date(2030, 3, 6),
            reason: None,
        },
    )
    .await
    .unwrap();

    let err = SchedulingRepo::reschedule(
        &pool,
        OWNER,
        booking_id,
        &RescheduleBooking {
            schedule_id: None,
            new_date: date(2030, 3, 6),
        },
        today(),
    )
    .await
    .unwrap_err();
    assert_matches!(
        err,
        LedgerError::Booking(BookingError::SlotUnavailable { .. })
    );

    let old = BookingRepo::find_by_id(&pool, booking_id).await.unwrap().unwrap();
    assert_eq!(old.status_id, BookingStatus::Confirmed.id());
    assert_eq!(consumed(&pool, package_id, catalog.swimming).await, (1, 3));
    assert_eq!(capacity_booked(&pool, catalog.swim_schedule.id, from).await, 1);
}

/// Two customers trading dates at the same moment lock the same two slots in
/// opposite booking order; both moves must finish without a deadlock.
#[sqlx::test(migrations = "../../db/migrations")]
async fn swapping_reschedules_do_not_deadlock(pool: PgPool) {
    let catalog = seed_catalog(&pool, 10).await;
    let first = date(2030, 3, 4);
    let second = date(2030, 3, 11);

    let mut held = Vec::new();
    for (owner, day) in [(OWNER, first), (OTHER_OWNER, second)] {
        let package_id = buy_combo(&pool, &catalog, owner).await.package.id;
        let request = swim_request(package_id, &catalog, &[day]);
        let booked = SchedulingRepo::schedule_from_package(&pool, owner, &request, today())
            .await
            .unwrap();
        held.push((owner, package_id, booked[0].booking.id, day));
    }

    for _round in 0..10 {
        let (a, b) = (held[0], held[1]);
        let move_to = |owner: DbId, booking_id: DbId, new_date: Date| {
            let pool = pool.clone();
            tokio::spawn(async move {
                SchedulingRepo::reschedule(
                    &pool,
                    owner,
                    booking_id,
                    &RescheduleBooking {
                        schedule_id: None,
                        new_date,
                    },
                    today(),
                )
                .await
            })
        };
        let (moved_a, moved_b) = futures::future::join(
            move_to(a.0, a.2, b.3),
            move_to(b.0, b.2, a.3),
        )
        .await;
        let moved_a = moved_a.unwrap().unwrap();
        let moved_b = moved_b.unwrap().unwrap();

        held = vec![
            (a.0, a.1, moved_a.booking.id, b.3),
            (b.0, b.1, moved_b.booking.id, a.3),
        ];
    }

    for (_, package_id, _, _) in &held {
        assert_eq!(consumed(&pool, *package_id, catalog.swimming).await, (1, 3));
    }
    assert_eq!(capacity_booked(&pool, catalog.swim_schedule.id, first).await, 1);
    assert_eq!(capacity_booked(&pool, catalog.swim_schedule.id, second).await, 1);
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn elapsed_bookings_complete_and_keep_their_session(pool: PgPool) {
    let catalog = seed_catalog(&pool, 4).await;
    let package_id = buy_combo(&pool, &catalog, OWNER).await.package.id;
    let past = book_one(&pool, &catalog, package_id, date(2030, 3, 4)).await;
    let future = book_one(&pool, &catalog, package_id, date(2030, 3, 11)).await;

    let completed = BookingRepo::complete_elapsed(&pool, date(2030, 3, 10))
        .await
        .unwrap();
    assert_eq!(completed, 1);

    let past = BookingRepo::find_by_id(&pool, past).await.unwrap().unwrap();
    let future = BookingRepo::find_by_id(&pool, future).await.unwrap().unwrap();
    assert_eq!(past.status_id, BookingStatus::Completed.id());
    assert_eq!(future.status_id, BookingStatus::Confirmed.id());
    assert_eq!(consumed(&pool, package_id, catalog.swimming).await, (2, 3));

    // Running it again finds nothing new.
    assert_eq!(
        BookingRepo::complete_elapsed(&pool, date(2030, 3, 10))
            .await
            .unwrap(),
        0
    );
}
