//! Entitlement ledger: `purchased_packages`, `package_allocations` and
//! `session_reservations`.
//!
//! [`PurchasedPackageRepo::reserve_session`] and
//! [`PurchasedPackageRepo::release_session`] are the only writers of
//! `sessions_consumed`. Both must run inside the caller's transaction.

use std::collections::HashMap;

use academy_core::entitlement::{self, AllocationUsage};
use academy_core::error::{BookingError, CoreError};
use academy_core::types::{Date, DbId, ReservationToken};
use sqlx::{PgConnection, PgExecutor, PgPool};
use uuid::Uuid;

use crate::error::LedgerResult;
use crate::models::purchased_package::{
    PackageAllocation, PurchasedPackage, PurchasedPackageDetail, SessionReservation,
};
use crate::repositories::MasterPackageRepo;

const COLUMNS: &str = "id, owner_id, master_package_id, package_name, total_sessions, \
    purchased_on, expiry_date, renewed_from_id, created_at, updated_at";

const ALLOCATION_COLUMNS: &str = "id, purchased_package_id, course_id, course_name, sort_order, \
    sessions_allotted, sessions_consumed, created_at, updated_at";

const RESERVATION_COLUMNS: &str = "id, token, purchased_package_id, course_id, booking_id, \
    released_at, created_at, updated_at";

pub struct PurchasedPackageRepo;

impl PurchasedPackageRepo {
    // ── Purchase path ────────────────────────────────────────────────

    /// Create a purchased package from a catalog package.
    ///
    /// This is the single purchase path: checkout completion and renewal
    /// both land here. Allocations are copied from the catalog's course lines
    /// and the expiry is `today + validity_days`.
    pub async fn purchase(
        conn: &mut PgConnection,
        owner_id: DbId,
        master_package_id: DbId,
        today: Date,
        renewed_from_id: Option<DbId>,
    ) -> LedgerResult<PurchasedPackageDetail> {
        let master = MasterPackageRepo::find_by_id(&mut *conn, master_package_id)
            .await?
            .ok_or(BookingError::NotFound {
                entity: "Package",
                id: master_package_id,
            })?;
        if !master.is_active {
            return Err(CoreError::Conflict(format!(
                "Package '{}' is no longer offered",
                master.name
            ))
            .into());
        }

        let lines = MasterPackageRepo::list_courses(&mut *conn, master_package_id).await?;
        let usage: Vec<AllocationUsage> = lines
            .iter()
            .map(|l| AllocationUsage {
                course_id: l.course_id,
                sessions_allotted: l.sessions,
                sessions_consumed: 0,
            })
            .collect();
        let total_sessions: i32 = usage.iter().map(|u| u.sessions_allotted).sum();
        entitlement::validate_allocations(total_sessions, &usage).map_err(|msg| {
            CoreError::Internal(format!(
                "Catalog package {master_package_id} is malformed: {msg}"
            ))
        })?;

        let expiry_date = entitlement::expiry_for(today, master.validity_days);

        let query = format!(
            "INSERT INTO purchased_packages
                (owner_id, master_package_id, package_name, total_sessions,
                 purchased_on, expiry_date, renewed_from_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        let package = sqlx::query_as::<_, PurchasedPackage>(&query)
            .bind(owner_id)
            .bind(master_package_id)
            .bind(&master.name)
            .bind(total_sessions)
            .bind(today)
            .bind(expiry_date)
            .bind(renewed_from_id)
            .fetch_one(&mut *conn)
            .await?;

        let alloc_query = format!(
            "INSERT INTO package_allocations
                (purchased_package_id, course_id, course_name, sort_order, sessions_allotted)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {ALLOCATION_COLUMNS}"
        );
        let mut allocations = Vec::with_capacity(lines.len());
        for (position, line) in lines.iter().enumerate() {
            let allocation = sqlx::query_as::<_, PackageAllocation>(&alloc_query)
                .bind(package.id)
                .bind(line.course_id)
                .bind(&line.course_name)
                .bind(position as i32)
                .bind(line.sessions)
                .fetch_one(&mut *conn)
                .await?;
            allocations.push(allocation);
        }

        tracing::info!(
            package_id = package.id,
            owner_id,
            master_package_id,
            total_sessions,
            %expiry_date,
            renewed_from_id,
            "Package purchased",
        );

        Ok(PurchasedPackageDetail::evaluate(package, allocations, today))
    }

    /// Complete a purchase in its own transaction.
    pub async fn purchase_for_owner(
        pool: &PgPool,
        owner_id: DbId,
        master_package_id: DbId,
        today: Date,
    ) -> LedgerResult<PurchasedPackageDetail> {
        let mut tx = pool.begin().await?;
        let detail = Self::purchase(&mut tx, owner_id, master_package_id, today, None).await?;
        tx.commit().await?;
        Ok(detail)
    }

    /// Buy the same catalog package again.
    ///
    /// Never touches the old package; the new one records `renewed_from_id`.
    /// Renewing a package that is still active is allowed.
    pub async fn renew(
        pool: &PgPool,
        owner_id: DbId,
        package_id: DbId,
        today: Date,
    ) -> LedgerResult<PurchasedPackageDetail> {
        let mut tx = pool.begin().await?;

        let old = Self::find_row_for_owner(&mut *tx, owner_id, package_id)
            .await?
            .ok_or(BookingError::NotFound {
                entity: "Package",
                id: package_id,
            })?;

        let detail = Self::purchase(
            &mut tx,
            owner_id,
            old.master_package_id,
            today,
            Some(old.id),
        )
        .await?;

        tx.commit().await?;
        Ok(detail)
    }

    // ── Reads ────────────────────────────────────────────────────────

    async fn find_row_for_owner<'e>(
        executor: impl PgExecutor<'e>,
        owner_id: DbId,
        id: DbId,
    ) -> Result<Option<PurchasedPackage>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM purchased_packages WHERE id = $1 AND owner_id = $2");
        sqlx::query_as::<_, PurchasedPackage>(&query)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(executor)
            .await
    }

    /// Allocations of one package in catalog order.
    pub async fn list_allocations<'e>(
        executor: impl PgExecutor<'e>,
        package_id: DbId,
    ) -> Result<Vec<PackageAllocation>, sqlx::Error> {
        let query = format!(
            "SELECT {ALLOCATION_COLUMNS} FROM package_allocations
             WHERE purchased_package_id = $1
             ORDER BY sort_order, id"
        );
        sqlx::query_as::<_, PackageAllocation>(&query)
            .bind(package_id)
            .fetch_all(executor)
            .await
    }

    /// A package with its allocations, if it exists and belongs to `owner_id`.
    pub async fn find_for_owner(
        pool: &PgPool,
        owner_id: DbId,
        id: DbId,
        today: Date,
    ) -> Result<Option<PurchasedPackageDetail>, sqlx::Error> {
        let Some(package) = Self::find_row_for_owner(pool, owner_id, id).await? else {
            return Ok(None);
        };
        let allocations = Self::list_allocations(pool, id).await?;
        Ok(Some(PurchasedPackageDetail::evaluate(
            package,
            allocations,
            today,
        )))
    }

    /// Every package of an owner, newest first.
    pub async fn list_by_owner(
        pool: &PgPool,
        owner_id: DbId,
        today: Date,
    ) -> Result<Vec<PurchasedPackageDetail>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM purchased_packages
             WHERE owner_id = $1
             ORDER BY purchased_on DESC, id DESC"
        );
        let packages = sqlx::query_as::<_, PurchasedPackage>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await?;

        let ids: Vec<DbId> = packages.iter().map(|p| p.id).collect();
        let alloc_query = format!(
            "SELECT {ALLOCATION_COLUMNS} FROM package_allocations
             WHERE purchased_package_id = ANY($1)
             ORDER BY purchased_package_id, sort_order, id"
        );
        let allocations = sqlx::query_as::<_, PackageAllocation>(&alloc_query)
            .bind(&ids)
            .fetch_all(pool)
            .await?;

        let mut by_package: HashMap<DbId, Vec<PackageAllocation>> = HashMap::new();
        for allocation in allocations {
            by_package
                .entry(allocation.purchased_package_id)
                .or_default()
                .push(allocation);
        }

        Ok(packages
            .into_iter()
            .map(|p| {
                let allocations = by_package.remove(&p.id).unwrap_or_default();
                PurchasedPackageDetail::evaluate(p, allocations, today)
            })
            .collect())
    }

    pub async fn find_reservation<'e>(
        executor: impl PgExecutor<'e>,
        token: ReservationToken,
    ) -> Result<Option<SessionReservation>, sqlx::Error> {
        let query =
            format!("SELECT {RESERVATION_COLUMNS} FROM session_reservations WHERE token = $1");
        sqlx::query_as::<_, SessionReservation>(&query)
            .bind(token)
            .fetch_optional(executor)
            .await
    }

    // ── Reserve / release ────────────────────────────────────────────

    /// Consume one session of `course_id` from a package.
    ///
    /// Checks, in order: the package exists and belongs to `owner_id`; it has
    /// not expired; the course is allocated; a session is left for it. The
    /// session date must also fall before the expiry. Locks the allocation
    /// row until the caller's transaction ends.
    pub async fn reserve_session(
        conn: &mut PgConnection,
        owner_id: DbId,
        package_id: DbId,
        course_id: DbId,
        session_date: Date,
        today: Date,
    ) -> LedgerResult<SessionReservation> {
        let package = Self::find_row_for_owner(&mut *conn, owner_id, package_id)
            .await?
            .ok_or(BookingError::NotFound {
                entity: "Package",
                id: package_id,
            })?;

        let query = format!(
            "SELECT {ALLOCATION_COLUMNS} FROM package_allocations
             WHERE purchased_package_id = $1 AND course_id = $2
             FOR UPDATE"
        );
        let allocation = sqlx::query_as::<_, PackageAllocation>(&query)
            .bind(package_id)
            .bind(course_id)
            .fetch_optional(&mut *conn)
            .await?;

        let usage = allocation.as_ref().map(PackageAllocation::usage);
        entitlement::check_reservable(
            package_id,
            course_id,
            package.expiry_date,
            usage.as_ref(),
            today,
        )?;
        entitlement::check_date_within_entitlement(package_id, package.expiry_date, session_date)?;

        sqlx::query(
            "UPDATE package_allocations SET sessions_consumed = sessions_consumed + 1 \
             WHERE purchased_package_id = $1 AND course_id = $2",
        )
        .bind(package_id)
        .bind(course_id)
        .execute(&mut *conn)
        .await?;

        let insert = format!(
            "INSERT INTO session_reservations (token, purchased_package_id, course_id)
             VALUES ($1, $2, $3)
             RETURNING {RESERVATION_COLUMNS}"
        );
        let reservation = sqlx::query_as::<_, SessionReservation>(&insert)
            .bind(Uuid::new_v4())
            .bind(package_id)
            .bind(course_id)
            .fetch_one(&mut *conn)
            .await?;

        tracing::debug!(
            package_id,
            course_id,
            token = %reservation.token,
            "Session reserved",
        );
        Ok(reservation)
    }

    /// Give a reserved session back to its allocation.
    ///
    /// Idempotent per token: only the first call restores a session and
    /// returns `true`; later calls (or unknown tokens) return `false`.
    pub async fn release_session(
        conn: &mut PgConnection,
        token: ReservationToken,
    ) -> Result<bool, sqlx::Error> {
        let released: Option<(DbId, DbId)> = sqlx::query_as(
            "UPDATE session_reservations SET released_at = NOW() \
             WHERE token = $1 AND released_at IS NULL \
             RETURNING purchased_package_id, course_id",
        )
        .bind(token)
        .fetch_optional(&mut *conn)
        .await?;

        let Some((package_id, course_id)) = released else {
            tracing::debug!(%token, "Reservation already released");
            return Ok(false);
        };

        sqlx::query(
            "UPDATE package_allocations SET sessions_consumed = sessions_consumed - 1 \
             WHERE purchased_package_id = $1 AND course_id = $2",
        )
        .bind(package_id)
        .bind(course_id)
        .execute(&mut *conn)
        .await?;

        tracing::debug!(package_id, course_id, %token, "Session released");
        Ok(true)
    }

    /// Record which booking a reservation paid for.
    pub async fn attach_booking(
        conn: &mut PgConnection,
        token: ReservationToken,
        booking_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE session_reservations SET booking_id = $2 WHERE token = $1")
            .bind(token)
            .bind(booking_id)
            .execute(conn)
            .await?;
        Ok(())
    }
}
