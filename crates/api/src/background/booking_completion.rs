//! Periodic completion of elapsed bookings.
//!
//! Confirmed bookings whose date is before the academy's "today" become
//! `completed`. Runs on a fixed interval using `tokio::time::interval`.

use std::sync::Arc;
use std::time::Duration;

use academy_db::repositories::BookingRepo;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;

/// Run the completion sweep loop until `cancel` is triggered.
///
/// The first tick fires immediately, so bookings that elapsed while the
/// server was down are completed at startup.
pub async fn run(pool: PgPool, config: Arc<ServerConfig>, cancel: CancellationToken) {
    let period = Duration::from_secs(config.booking_sweep_interval_secs);

    tracing::info!(
        interval_secs = period.as_secs(),
        "Booking completion job started"
    );

    let mut interval = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Booking completion job stopping");
                break;
            }
            _ = interval.tick() => {
                let today = config.today();
                match BookingRepo::complete_elapsed(&pool, today).await {
                    Ok(completed) => {
                        if completed > 0 {
                            tracing::info!(completed, %today, "Booking completion: marked bookings completed");
                        } else {
                            tracing::debug!("Booking completion: nothing to complete");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Booking completion: sweep failed");
                    }
                }
            }
        }
    }
}
