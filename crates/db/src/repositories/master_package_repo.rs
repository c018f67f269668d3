//! Repository for the package catalog (`master_packages`, `master_package_courses`).

use academy_core::entitlement::{self, AllocationUsage};
use academy_core::error::CoreError;
use academy_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::error::LedgerResult;
use crate::models::master_package::{CreateMasterPackage, MasterPackage, MasterPackageCourse};

const COLUMNS: &str = "id, name, validity_days, is_active, created_at, updated_at";

pub struct MasterPackageRepo;

impl MasterPackageRepo {
    /// Insert a master package and its course lines in one transaction.
    pub async fn create(
        pool: &PgPool,
        input: &CreateMasterPackage,
    ) -> LedgerResult<MasterPackage> {
        entitlement::validate_validity_days(input.validity_days).map_err(CoreError::Validation)?;
        let lines: Vec<AllocationUsage> = input
            .courses
            .iter()
            .map(|c| AllocationUsage {
                course_id: c.course_id,
                sessions_allotted: c.sessions,
                sessions_consumed: 0,
            })
            .collect();
        let total = lines.iter().map(|l| l.sessions_allotted).sum();
        entitlement::validate_allocations(total, &lines).map_err(CoreError::Validation)?;

        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO master_packages (name, validity_days) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        let package = sqlx::query_as::<_, MasterPackage>(&query)
            .bind(&input.name)
            .bind(input.validity_days)
            .fetch_one(&mut *tx)
            .await?;

        for (position, line) in input.courses.iter().enumerate() {
            sqlx::query(
                "INSERT INTO master_package_courses (master_package_id, course_id, sessions, sort_order) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(package.id)
            .bind(line.course_id)
            .bind(line.sessions)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(package)
    }

    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<MasterPackage>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM master_packages WHERE id = $1");
        sqlx::query_as::<_, MasterPackage>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Course lines of a master package in catalog order.
    pub async fn list_courses<'e>(
        executor: impl PgExecutor<'e>,
        master_package_id: DbId,
    ) -> Result<Vec<MasterPackageCourse>, sqlx::Error> {
        sqlx::query_as::<_, MasterPackageCourse>(
            "SELECT mpc.course_id, c.name AS course_name, mpc.sessions, mpc.sort_order \
             FROM master_package_courses mpc \
             JOIN courses c ON c.id = mpc.course_id \
             WHERE mpc.master_package_id = $1 \
             ORDER BY mpc.sort_order, mpc.id",
        )
        .bind(master_package_id)
        .fetch_all(executor)
        .await
    }

    /// Withdraw a package from sale, or offer it again.
    pub async fn set_active(pool: &PgPool, id: DbId, is_active: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE master_packages SET is_active = $2 WHERE id = $1")
            .bind(id)
            .bind(is_active)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
