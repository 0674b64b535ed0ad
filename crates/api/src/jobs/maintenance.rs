//! Periodic housekeeping: pool gauges and rate limiter cleanup.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::middleware::RateLimiterState;

/// Interval between pool metric samples.
pub const POOL_METRICS_INTERVAL: Duration = Duration::from_secs(10);

/// Rate limiter state is compacted every this many pool samples.
const LIMITER_SHRINK_EVERY: u64 = 6;

/// Starts the housekeeping loop; it stops once `shutdown_rx` turns true.
pub fn spawn_maintenance(
    pool: sqlx::PgPool,
    rate_limiter: Option<Arc<RateLimiterState>>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(POOL_METRICS_INTERVAL);
        let mut ticks: u64 = 0;

        // Skip the first immediate tick
        interval.tick().await;
        info!(interval_secs = POOL_METRICS_INTERVAL.as_secs(), "Maintenance task scheduled");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    ticks += 1;
                    persistence::metrics::record_pool_metrics(&pool);

                    if ticks % LIMITER_SHRINK_EVERY == 0 {
                        if let Some(limiter) = rate_limiter.as_ref() {
                            limiter.shrink();
                            debug!(?limiter, "Rate limiter compacted");
                        }
                    }
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Maintenance task shutting down");
                        break;
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    #[tokio::test]
    async fn test_stops_on_shutdown() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let limiter = RateLimiterState::new(10).map(Arc::new);
        let (tx, rx) = watch::channel(false);

        let handle = spawn_maintenance(pool, limiter, rx);
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("maintenance task did not stop")
            .unwrap();
    }
}
