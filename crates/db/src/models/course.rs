//! Course, schedule, closure and slot models.

use academy_core::availability::{BookedSlot, ScheduleWindow};
use academy_core::types::{Date, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `courses` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: DbId,
    pub name: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a course.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourse {
    pub name: String,
}

/// A row from the `course_schedules` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSchedule {
    pub id: DbId,
    pub course_id: DbId,
    pub name: String,
    pub days_of_week: Vec<i16>,
    pub capacity_per_day: i32,
    pub starts_on: Date,
    pub ends_on: Option<Date>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CourseSchedule {
    /// The parts of the schedule the availability rules need.
    pub fn window(&self) -> ScheduleWindow {
        ScheduleWindow {
            schedule_id: self.id,
            days_of_week: self.days_of_week.clone(),
            capacity_per_day: self.capacity_per_day,
            starts_on: self.starts_on,
            ends_on: self.ends_on,
            is_active: self.is_active,
        }
    }
}

/// DTO for creating a course schedule.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseSchedule {
    pub course_id: DbId,
    pub name: String,
    pub days_of_week: Vec<i16>,
    pub capacity_per_day: i32,
    pub starts_on: Date,
    pub ends_on: Option<Date>,
}

/// A row from the `schedule_closures` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleClosure {
    pub id: DbId,
    pub schedule_id: DbId,
    pub closed_on: Date,
    pub reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for closing a schedule on a date.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleClosure {
    pub closed_on: Date,
    pub reason: Option<String>,
}

/// A row from the `schedule_slots` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSlot {
    pub id: DbId,
    pub schedule_id: DbId,
    pub slot_date: Date,
    pub capacity_total: i32,
    pub capacity_booked: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ScheduleSlot {
    pub fn booked(&self) -> BookedSlot {
        BookedSlot {
            date: self.slot_date,
            capacity_total: self.capacity_total,
            capacity_booked: self.capacity_booked,
        }
    }
}
