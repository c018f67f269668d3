//! Handlers for purchased packages: purchase, listing and renewal.
//!
//! Every query is scoped to the caller. A package owned by someone else is
//! reported as not found, never as forbidden.

use academy_core::error::BookingError;
use academy_core::types::DbId;
use academy_db::models::purchased_package::PurchasedPackageDetail;
use academy_db::repositories::PurchasedPackageRepo;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::PackageListParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/users/me/packages?view=active|history|all
///
/// Newest purchase first. Each entry carries its status, remaining sessions
/// and renewal prompt as of today.
pub async fn list_packages(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PackageListParams>,
) -> AppResult<Json<DataResponse<Vec<PurchasedPackageDetail>>>> {
    let packages =
        PurchasedPackageRepo::list_by_owner(&state.pool, auth.user_id, state.today()).await?;
    let data = packages
        .into_iter()
        .filter(|p| params.view.includes(p.status))
        .collect();
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/users/me/packages/{id}
pub async fn get_package(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PurchasedPackageDetail>>> {
    let package = PurchasedPackageRepo::find_for_owner(&state.pool, auth.user_id, id, state.today())
        .await?
        .ok_or(AppError::Booking(BookingError::NotFound {
            entity: "Package",
            id,
        }))?;
    Ok(Json(DataResponse { data: package }))
}

/// POST /api/v1/users/me/packages/{id}/renew
///
/// Buys the same master package again. The new package links back to the
/// one it renews; the old one keeps its own counters and expiry.
pub async fn renew_package(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<(StatusCode, Json<DataResponse<PurchasedPackageDetail>>)> {
    let package = PurchasedPackageRepo::renew(&state.pool, auth.user_id, id, state.today()).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: package })))
}

/// POST /api/v1/booking/package-booking/{master_package_id}
///
/// Completes a storefront purchase: snapshots the master package's course
/// lines into a new purchased package owned by the caller.
pub async fn purchase_package(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(master_package_id): Path<DbId>,
) -> AppResult<(StatusCode, Json<DataResponse<PurchasedPackageDetail>>)> {
    let package = PurchasedPackageRepo::purchase_for_owner(
        &state.pool,
        auth.user_id,
        master_package_id,
        state.today(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: package })))
}
