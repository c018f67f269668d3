//! Catalog package models. A master package is the template every purchase
//! and renewal copies its allocations from.

use academy_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `master_packages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterPackage {
    pub id: DbId,
    pub name: String,
    pub validity_days: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A course line of a master package, joined with the course name.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterPackageCourse {
    pub course_id: DbId,
    pub course_name: String,
    pub sessions: i32,
    pub sort_order: i32,
}

/// DTO for creating a master package together with its course lines.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMasterPackage {
    pub name: String,
    pub validity_days: i32,
    pub courses: Vec<CreateMasterPackageCourse>,
}

/// One course line in [`CreateMasterPackage`]. Order in the list is kept.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMasterPackageCourse {
    pub course_id: DbId,
    pub sessions: i32,
}
