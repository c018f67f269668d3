//! Role names carried in access-token claims.

/// Academy staff. May cancel any booking and manage schedule closures.
pub const ROLE_ADMIN: &str = "admin";

/// A customer holding purchased packages.
pub const ROLE_CUSTOMER: &str = "customer";
