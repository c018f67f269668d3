//! Route definitions for the `/courses` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::courses;
use crate::state::AppState;

/// Routes mounted at `/courses`.
///
/// ```text
/// GET    /{id}/schedules    -> list_schedules
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/schedules", get(courses::list_schedules))
}
