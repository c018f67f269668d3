//! Handlers for customer bookings.

use academy_core::types::DbId;
use academy_db::models::booking::{BookingDetail, RescheduleBooking, ScheduleFromPackage};
use academy_db::repositories::{BookingRepo, SchedulingRepo};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/users/schedule-from-package
///
/// Books every requested date or none of them. Returns the created bookings
/// in date order.
pub async fn schedule_from_package(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<ScheduleFromPackage>,
) -> AppResult<(StatusCode, Json<DataResponse<Vec<BookingDetail>>>)> {
    let bookings =
        SchedulingRepo::schedule_from_package(&state.pool, auth.user_id, &input, state.today())
            .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: bookings })))
}

/// GET /api/v1/users/me/bookings
pub async fn list_bookings(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<BookingDetail>>>> {
    let bookings = BookingRepo::list_by_owner(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: bookings }))
}

/// POST /api/v1/users/me/bookings/{id}/cancel
///
/// Returns the session to the package and frees the slot place.
pub async fn cancel_booking(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<BookingDetail>>> {
    let booking =
        SchedulingRepo::cancel(&state.pool, id, Some(auth.user_id), state.today()).await?;
    Ok(Json(DataResponse { data: booking }))
}

/// POST /api/v1/users/me/bookings/{id}/reschedule
///
/// Returns the new booking. The original stays on record as `rescheduled`.
pub async fn reschedule_booking(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<RescheduleBooking>,
) -> AppResult<Json<DataResponse<BookingDetail>>> {
    let booking =
        SchedulingRepo::reschedule(&state.pool, auth.user_id, id, &input, state.today()).await?;
    Ok(Json(DataResponse { data: booking }))
}
