//! Shared fixtures for the repository integration tests.
//!
//! Dates live in 2030 so that "today" is always passed in explicitly and
//! never collides with the wall clock. In March 2030, Mondays fall on 4, 11,
//! 18, 25 and Wednesdays on 6, 13, 20, 27.

#![allow(dead_code)]

use academy_core::booking::Participant;
use academy_core::types::{Date, DbId};
use academy_db::models::booking::ScheduleFromPackage;
use academy_db::models::course::{CourseSchedule, CreateCourse, CreateCourseSchedule};
use academy_db::models::master_package::{CreateMasterPackage, CreateMasterPackageCourse};
use academy_db::models::purchased_package::PurchasedPackageDetail;
use academy_db::repositories::{CourseRepo, MasterPackageRepo, PurchasedPackageRepo, ScheduleRepo};
use chrono::NaiveDate;
use sqlx::PgPool;

pub const OWNER: DbId = 1001;
pub const OTHER_OWNER: DbId = 2002;

pub fn date(y: i32, m: u32, d: u32) -> Date {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// The day every fixture package is bought on.
pub fn purchase_day() -> Date {
    date(2030, 3, 1)
}

/// Catalog built by [`seed_catalog`].
pub struct Catalog {
    pub swimming: DbId,
    pub tennis: DbId,
    /// Unrelated course that no package includes.
    pub archery: DbId,
    /// Swimming on Mondays and Wednesdays.
    pub swim_schedule: CourseSchedule,
    pub tennis_schedule: CourseSchedule,
    pub archery_schedule: CourseSchedule,
    /// 3 swimming + 2 tennis sessions, valid 60 days.
    pub combo_package: DbId,
}

pub async fn seed_catalog(pool: &PgPool, capacity_per_day: i32) -> Catalog {
    let swimming = course(pool, "Swimming").await;
    let tennis = course(pool, "Tennis").await;
    let archery = course(pool, "Archery").await;

    let swim_schedule = schedule(pool, swimming, capacity_per_day).await;
    let tennis_schedule = schedule(pool, tennis, capacity_per_day).await;
    let archery_schedule = schedule(pool, archery, capacity_per_day).await;

    let combo = MasterPackageRepo::create(
        pool,
        &CreateMasterPackage {
            name: "Swim & Tennis".to_string(),
            validity_days: 60,
            courses: vec![
                CreateMasterPackageCourse {
                    course_id: swimming,
                    sessions: 3,
                },
                CreateMasterPackageCourse {
                    course_id: tennis,
                    sessions: 2,
                },
            ],
        },
    )
    .await
    .unwrap();

    Catalog {
        swimming,
        tennis,
        archery,
        swim_schedule,
        tennis_schedule,
        archery_schedule,
        combo_package: combo.id,
    }
}

async fn course(pool: &PgPool, name: &str) -> DbId {
    CourseRepo::create(
        pool,
        &CreateCourse {
            name: name.to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

async fn schedule(pool: &PgPool, course_id: DbId, capacity_per_day: i32) -> CourseSchedule {
    ScheduleRepo::create(
        pool,
        &CreateCourseSchedule {
            course_id,
            name: "Mon/Wed evenings".to_string(),
            days_of_week: vec![1, 3],
            capacity_per_day,
            starts_on: date(2030, 1, 1),
            ends_on: None,
        },
    )
    .await
    .unwrap()
}

/// Buy the combo package for `owner` on [`purchase_day`].
pub async fn buy_combo(pool: &PgPool, catalog: &Catalog, owner: DbId) -> PurchasedPackageDetail {
    PurchasedPackageRepo::purchase_for_owner(pool, owner, catalog.combo_package, purchase_day())
        .await
        .unwrap()
}

pub fn participants() -> Vec<Participant> {
    vec![Participant {
        first_name: "Ana".to_string(),
        last_name: "Silva".to_string(),
    }]
}

pub fn swim_request(package_id: DbId, catalog: &Catalog, dates: &[Date]) -> ScheduleFromPackage {
    ScheduleFromPackage {
        purchased_package_id: package_id,
        course_id: catalog.swimming,
        schedule_id: catalog.swim_schedule.id,
        booked_dates: dates.to_vec(),
        participants: participants(),
    }
}

/// `(sessions_consumed, sessions_allotted)` of one allocation, read straight
/// from the table.
pub async fn consumed(pool: &PgPool, package_id: DbId, course_id: DbId) -> (i32, i32) {
    sqlx::query_as(
        "SELECT sessions_consumed, sessions_allotted FROM package_allocations \
         WHERE purchased_package_id = $1 AND course_id = $2",
    )
    .bind(package_id)
    .bind(course_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn capacity_booked(pool: &PgPool, schedule_id: DbId, day: Date) -> i32 {
    ScheduleRepo::find_slot(pool, schedule_id, day)
        .await
        .unwrap()
        .map(|s| s.capacity_booked)
        .unwrap_or(0)
}
