//! Handlers for academy staff.
//!
//! All handlers require the `admin` role via the [`RequireAdmin`] extractor.

use academy_core::error::{BookingError, CoreError};
use academy_core::types::{Date, DbId};
use academy_db::models::booking::BookingDetail;
use academy_db::models::course::{CreateScheduleClosure, ScheduleClosure};
use academy_db::repositories::{BookingRepo, ScheduleRepo, SchedulingRepo};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Result of a completion sweep.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionSummary {
    pub completed: u64,
}

/// POST /api/v1/admin/bookings/{id}/cancel
///
/// Cancel any customer's booking. Same rules as a customer cancel: only
/// confirmed bookings for today or later.
pub async fn cancel_booking(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<BookingDetail>>> {
    let booking = SchedulingRepo::cancel(&state.pool, id, None, state.today()).await?;
    tracing::info!(admin_id = admin.user_id, booking_id = id, "Admin cancelled booking");
    Ok(Json(DataResponse { data: booking }))
}

/// POST /api/v1/admin/bookings/complete-elapsed
///
/// Run the completion sweep now instead of waiting for the background job.
pub async fn complete_elapsed(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<CompletionSummary>>> {
    let completed = BookingRepo::complete_elapsed(&state.pool, state.today()).await?;
    tracing::info!(admin_id = admin.user_id, completed, "Manual completion sweep");
    Ok(Json(DataResponse {
        data: CompletionSummary { completed },
    }))
}

/// POST /api/v1/admin/schedules/{id}/closures
///
/// Close a schedule on a date. Closing a date that is already closed
/// returns 409. Existing bookings on that date are left untouched.
pub async fn add_closure(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(schedule_id): Path<DbId>,
    Json(input): Json<CreateScheduleClosure>,
) -> AppResult<(StatusCode, Json<DataResponse<ScheduleClosure>>)> {
    ScheduleRepo::find_by_id(&state.pool, schedule_id)
        .await?
        .ok_or(AppError::Booking(BookingError::NotFound {
            entity: "Schedule",
            id: schedule_id,
        }))?;

    let closure = ScheduleRepo::add_closure(&state.pool, schedule_id, &input).await?;
    tracing::info!(
        admin_id = admin.user_id,
        schedule_id,
        closed_on = %closure.closed_on,
        "Schedule date closed",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: closure })))
}

/// DELETE /api/v1/admin/schedules/{id}/closures/{date}
///
/// Reopen a closed date. Returns 204, or 404 if the date was not closed.
pub async fn remove_closure(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path((schedule_id, closed_on)): Path<(DbId, Date)>,
) -> AppResult<StatusCode> {
    let removed = ScheduleRepo::remove_closure(&state.pool, schedule_id, closed_on).await?;
    if !removed {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Closure for schedule",
            id: schedule_id,
        }));
    }
    tracing::info!(admin_id = admin.user_id, schedule_id, %closed_on, "Schedule date reopened");
    Ok(StatusCode::NO_CONTENT)
}
