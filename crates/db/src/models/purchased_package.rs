//! Entitlement ledger models: purchased packages, allocations and
//! reservation tokens.

use academy_core::entitlement::{self, AllocationUsage, PackageStatus, RenewalPrompt};
use academy_core::types::{Date, DbId, ReservationToken, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `purchased_packages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchasedPackage {
    pub id: DbId,
    pub owner_id: DbId,
    pub master_package_id: DbId,
    pub package_name: String,
    pub total_sessions: i32,
    pub purchased_on: Date,
    pub expiry_date: Date,
    pub renewed_from_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `package_allocations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageAllocation {
    pub id: DbId,
    pub purchased_package_id: DbId,
    pub course_id: DbId,
    pub course_name: String,
    pub sort_order: i32,
    pub sessions_allotted: i32,
    pub sessions_consumed: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PackageAllocation {
    pub fn usage(&self) -> AllocationUsage {
        AllocationUsage {
            course_id: self.course_id,
            sessions_allotted: self.sessions_allotted,
            sessions_consumed: self.sessions_consumed,
        }
    }
}

/// A purchased package with its allocations and the values derived from them.
///
/// `status`, `remaining_sessions` and `renewal_prompt` are computed for the
/// `today` passed to [`PurchasedPackageDetail::evaluate`]; they are never stored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchasedPackageDetail {
    #[serde(flatten)]
    pub package: PurchasedPackage,
    pub allocations: Vec<PackageAllocation>,
    pub remaining_sessions: i32,
    pub status: PackageStatus,
    pub renewal_prompt: RenewalPrompt,
}

impl PurchasedPackageDetail {
    pub fn evaluate(
        package: PurchasedPackage,
        allocations: Vec<PackageAllocation>,
        today: Date,
    ) -> Self {
        let usage: Vec<AllocationUsage> = allocations.iter().map(|a| a.usage()).collect();
        let remaining_sessions = entitlement::remaining_sessions(package.total_sessions, &usage);
        let status = entitlement::classify(
            package.total_sessions,
            &usage,
            package.expiry_date,
            today,
        );
        Self {
            package,
            allocations,
            remaining_sessions,
            status,
            renewal_prompt: entitlement::renewal_prompt(status),
        }
    }
}

/// A row from the `session_reservations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReservation {
    pub id: DbId,
    pub token: ReservationToken,
    pub purchased_package_id: DbId,
    pub course_id: DbId,
    pub booking_id: Option<DbId>,
    pub released_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
