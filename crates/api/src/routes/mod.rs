pub mod admin;
pub mod availability;
pub mod bookings;
pub mod courses;
pub mod health;
pub mod packages;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /courses/{id}/schedules                          schedules of a course (public)
///
/// /availability/schedule/{schedule_id}             month calendar (?year=&month=)
///
/// /booking/package-booking/{master_package_id}     purchase a package (POST)
///
/// /users/me/packages                               list (?view=active|history|all)
/// /users/me/packages/{id}                          get
/// /users/me/packages/{id}/renew                    renew (POST)
///
/// /users/schedule-from-package                     book dates from a package (POST)
/// /users/me/bookings                               list
/// /users/me/bookings/{id}/cancel                   cancel (POST)
/// /users/me/bookings/{id}/reschedule               move to another date (POST)
///
/// /admin/bookings/{id}/cancel                      cancel any booking (POST)
/// /admin/bookings/complete-elapsed                 run the completion sweep (POST)
/// /admin/schedules/{id}/closures                   close a date (POST)
/// /admin/schedules/{id}/closures/{date}            reopen a date (DELETE)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/courses", courses::router())
        .nest("/availability", availability::router())
        // Purchase completion from the storefront checkout.
        .nest("/booking", packages::purchase_router())
        .nest("/users/me/packages", packages::router())
        .nest("/users", bookings::router())
        .nest("/admin", admin::router())
}
