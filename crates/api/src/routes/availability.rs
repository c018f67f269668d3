use axum::routing::get;
use axum::Router;

use crate::handlers::availability;
use crate::state::AppState;

/// Routes mounted at `/availability`.
///
/// ```text
/// GET    /schedule/{schedule_id}    -> get_month  (?year=&month=)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/schedule/{schedule_id}", get(availability::get_month))
}
