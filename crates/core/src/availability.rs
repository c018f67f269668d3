//! Availability projection for course schedules.
//!
//! Turns a schedule definition, its closures and the already-booked slot
//! counters into the per-date view a customer picks from. The projection is
//! advisory; the scheduler re-checks the same rules under a row lock.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::error::BookingError;
use crate::types::{Date, DbId};

/// Earliest year accepted by availability queries.
pub const MIN_YEAR: i32 = 2000;

/// Latest year accepted by availability queries.
pub const MAX_YEAR: i32 = 2100;

/// Upper bound on per-day capacity of a schedule.
pub const MAX_CAPACITY_PER_DAY: i32 = 500;

/// The parts of a course schedule that decide when it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleWindow {
    pub schedule_id: DbId,
    /// ISO weekdays the schedule runs on (1 = Monday .. 7 = Sunday).
    pub days_of_week: Vec<i16>,
    pub capacity_per_day: i32,
    pub starts_on: Date,
    pub ends_on: Option<Date>,
    pub is_active: bool,
}

impl ScheduleWindow {
    /// Whether `date` falls on one of the schedule's weekdays.
    pub fn runs_on_weekday(&self, date: Date) -> bool {
        let weekday = date.weekday().number_from_monday() as i16;
        self.days_of_week.contains(&weekday)
    }

    /// Whether the schedule holds a session on `date`, ignoring closures.
    pub fn operates_on(&self, date: Date) -> bool {
        date >= self.starts_on
            && self.ends_on.map_or(true, |end| date <= end)
            && self.runs_on_weekday(date)
    }
}

/// Booked counters for one date that already has a slot row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookedSlot {
    pub date: Date,
    pub capacity_total: i32,
    pub capacity_booked: i32,
}

/// One bookable date of a schedule as shown to a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySlot {
    pub date: Date,
    pub schedule_id: DbId,
    pub capacity_total: i32,
    pub capacity_booked: i32,
    pub available_slots: i32,
    pub is_booking_open: bool,
}

/// First and last day of a month.
pub fn month_bounds(year: i32, month: u32) -> Result<(Date, Date), String> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(format!(
            "Year must be between {MIN_YEAR} and {MAX_YEAR}, got {year}"
        ));
    }
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| format!("Month must be between 1 and 12, got {month}"))?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| format!("Month after {year}-{month:02} is out of range"))?;
    let last = next
        .pred_opt()
        .ok_or_else(|| format!("Month {year}-{month:02} is out of range"))?;
    Ok((first, last))
}

/// Whether a date accepts new bookings. Capacity is checked separately.
pub fn is_date_open(schedule: &ScheduleWindow, date: Date, closed: bool, today: Date) -> bool {
    schedule.is_active && !closed && date >= today && schedule.operates_on(date)
}

/// Project every day of `year-month` that falls on one of the schedule's
/// weekdays into an [`AvailabilitySlot`].
///
/// Dates without a slot row get the schedule's default capacity with nothing
/// booked. `is_booking_open` ignores capacity: full dates stay open with
/// `available_slots = 0`. Dates outside `[starts_on, ends_on]` are listed
/// closed.
pub fn project_month(
    schedule: &ScheduleWindow,
    year: i32,
    month: u32,
    closures: &[Date],
    booked: &[BookedSlot],
    today: Date,
) -> Result<Vec<AvailabilitySlot>, String> {
    let (first, last) = month_bounds(year, month)?;

    let slots = first
        .iter_days()
        .take_while(|d| *d <= last)
        .filter(|d| schedule.runs_on_weekday(*d))
        .map(|date| {
            let (capacity_total, capacity_booked) = booked
                .iter()
                .find(|b| b.date == date)
                .map(|b| (b.capacity_total, b.capacity_booked))
                .unwrap_or((schedule.capacity_per_day, 0));
            let available_slots = (capacity_total - capacity_booked).max(0);
            let closed = closures.contains(&date);
            AvailabilitySlot {
                date,
                schedule_id: schedule.schedule_id,
                capacity_total,
                capacity_booked,
                available_slots,
                is_booking_open: is_date_open(schedule, date, closed, today),
            }
        })
        .collect();

    Ok(slots)
}

/// Authoritative slot check used by the scheduler while holding the slot lock.
pub fn check_slot_bookable(
    schedule: &ScheduleWindow,
    date: Date,
    closed: bool,
    slot: BookedSlot,
    today: Date,
) -> Result<(), BookingError> {
    if !is_date_open(schedule, date, closed, today) || slot.capacity_booked >= slot.capacity_total
    {
        return Err(BookingError::SlotUnavailable {
            schedule_id: schedule.schedule_id,
            date,
        });
    }
    Ok(())
}

pub fn validate_days_of_week(days: &[i16]) -> Result<(), String> {
    if days.is_empty() {
        return Err("A schedule must run on at least one weekday".to_string());
    }
    if let Some(bad) = days.iter().find(|d| !(1..=7).contains(*d)) {
        return Err(format!("Weekday must be between 1 and 7, got {bad}"));
    }
    Ok(())
}

pub fn validate_capacity(capacity_per_day: i32) -> Result<(), String> {
    if (1..=MAX_CAPACITY_PER_DAY).contains(&capacity_per_day) {
        Ok(())
    } else {
        Err(format!(
            "Capacity must be between 1 and {MAX_CAPACITY_PER_DAY}, got {capacity_per_day}"
        ))
    }
}
