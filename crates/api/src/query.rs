//! Shared query parameter types for API handlers.

use academy_core::entitlement::PackageView;
use serde::Deserialize;

/// `?year=&month=` for the availability calendar. Both are required.
#[derive(Debug, Deserialize)]
pub struct MonthParams {
    pub year: i32,
    pub month: u32,
}

/// `?view=active|history|all` for package listings (default `all`).
#[derive(Debug, Default, Deserialize)]
pub struct PackageListParams {
    #[serde(default)]
    pub view: PackageView,
}
