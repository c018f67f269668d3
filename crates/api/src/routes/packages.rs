//! Route definitions for purchased packages.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::packages;
use crate::state::AppState;

/// Routes mounted at `/users/me/packages`.
///
/// ```text
/// GET    /               -> list_packages  (?view=active|history|all)
/// GET    /{id}           -> get_package
/// POST   /{id}/renew     -> renew_package
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(packages::list_packages))
        .route("/{id}", get(packages::get_package))
        .route("/{id}/renew", post(packages::renew_package))
}

/// Routes mounted at `/booking`.
///
/// ```text
/// POST   /package-booking/{master_package_id}    -> purchase_package
/// ```
pub fn purchase_router() -> Router<AppState> {
    Router::new().route(
        "/package-booking/{master_package_id}",
        post(packages::purchase_package),
    )
}
