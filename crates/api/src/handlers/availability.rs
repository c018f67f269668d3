//! Handlers for the availability calendar.
//!
//! The calendar is advisory. It reads live counters without locking; the
//! scheduler re-checks capacity under lock when a date is actually booked.

use academy_core::availability::AvailabilitySlot;
use academy_core::types::DbId;
use academy_db::repositories::ScheduleRepo;
use axum::extract::{Path, Query, State};
use axum::Json;

use crate::error::AppResult;
use crate::query::MonthParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/availability/schedule/{schedule_id}?year=&month=
///
/// One entry per schedule weekday of the month. Past, closed and out-of-range
/// days come back with `isBookingOpen: false`; full days with
/// `availableSlots: 0`.
pub async fn get_month(
    State(state): State<AppState>,
    Path(schedule_id): Path<DbId>,
    Query(params): Query<MonthParams>,
) -> AppResult<Json<DataResponse<Vec<AvailabilitySlot>>>> {
    let slots = ScheduleRepo::availability(
        &state.pool,
        schedule_id,
        params.year,
        params.month,
        state.today(),
    )
    .await?;
    Ok(Json(DataResponse { data: slots }))
}
