use std::sync::Arc;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: academy_db::DbPool,
    /// Server configuration (JWT secret, academy time zone).
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Today's date in the academy's time zone.
    pub fn today(&self) -> academy_core::types::Date {
        self.config.today()
    }
}
