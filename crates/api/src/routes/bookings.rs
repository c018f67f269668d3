//! Route definitions for customer bookings.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::bookings;
use crate::state::AppState;

/// Routes mounted at `/users`.
///
/// ```text
/// POST   /schedule-from-package            -> schedule_from_package
/// GET    /me/bookings                      -> list_bookings
/// POST   /me/bookings/{id}/cancel          -> cancel_booking
/// POST   /me/bookings/{id}/reschedule      -> reschedule_booking
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/schedule-from-package",
            post(bookings::schedule_from_package),
        )
        .route("/me/bookings", get(bookings::list_bookings))
        .route("/me/bookings/{id}/cancel", post(bookings::cancel_booking))
        .route(
            "/me/bookings/{id}/reschedule",
            post(bookings::reschedule_booking),
        )
}
