//! Route definitions for academy staff. Every handler requires the `admin` role.

use axum::routing::{delete, post};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// POST   /bookings/{id}/cancel                 -> cancel_booking
/// POST   /bookings/complete-elapsed            -> complete_elapsed
/// POST   /schedules/{id}/closures              -> add_closure
/// DELETE /schedules/{id}/closures/{date}       -> remove_closure
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/bookings/{id}/cancel", post(admin::cancel_booking))
        .route("/bookings/complete-elapsed", post(admin::complete_elapsed))
        .route("/schedules/{id}/closures", post(admin::add_closure))
        .route(
            "/schedules/{id}/closures/{date}",
            delete(admin::remove_closure),
        )
}
