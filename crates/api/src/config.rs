use chrono::{FixedOffset, NaiveDate, Utc};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Time given to background jobs to stop after shutdown (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Offset of the academy's local time from UTC. Decides what "today" is
    /// for expiry, past-date and completion checks.
    pub academy_utc_offset: FixedOffset,
    /// How often elapsed bookings are marked completed (default: `900`).
    pub booking_sweep_interval_secs: u64,
    /// Largest accepted request body in bytes (default: `65536`).
    pub max_body_bytes: usize,
    /// JWT token configuration.
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                 |
    /// |-------------------------------|-------------------------|
    /// | `HOST`                        | `0.0.0.0`               |
    /// | `PORT`                        | `3000`                  |
    /// | `CORS_ORIGINS`                | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`        | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`       | `30`                    |
    /// | `ACADEMY_UTC_OFFSET_MINUTES`  | `0`                     |
    /// | `BOOKING_SWEEP_INTERVAL_SECS` | `900`                   |
    /// | `MAX_BODY_BYTES`              | `65536`                 |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let offset_minutes: i32 = std::env::var("ACADEMY_UTC_OFFSET_MINUTES")
            .unwrap_or_else(|_| "0".into())
            .parse()
            .expect("ACADEMY_UTC_OFFSET_MINUTES must be a valid i32");
        let academy_utc_offset = FixedOffset::east_opt(offset_minutes * 60)
            .expect("ACADEMY_UTC_OFFSET_MINUTES must be within +/- 24 hours");

        let booking_sweep_interval_secs: u64 = std::env::var("BOOKING_SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| "900".into())
            .parse()
            .expect("BOOKING_SWEEP_INTERVAL_SECS must be a valid u64");
        assert!(
            booking_sweep_interval_secs > 0,
            "BOOKING_SWEEP_INTERVAL_SECS must be greater than zero"
        );

        let max_body_bytes: usize = std::env::var("MAX_BODY_BYTES")
            .unwrap_or_else(|_| "65536".into())
            .parse()
            .expect("MAX_BODY_BYTES must be a valid usize");

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            academy_utc_offset,
            booking_sweep_interval_secs,
            max_body_bytes,
            jwt,
        }
    }

    /// The current calendar date at the academy.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.academy_utc_offset).date_naive()
    }
}
