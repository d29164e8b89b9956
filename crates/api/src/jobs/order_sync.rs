//! Nightly order→entitlement sync job.
//!
//! Sweeps the previous day's orders through the reconciliation engine at a
//! fixed wall-clock time, with per-order bounded retry.

use sqlx::PgPool;
use tracing::info;

use crate::services::ReconciliationService;

use super::scheduler::{Job, JobSchedule};

/// Background job running the daily order sync sweep.
pub struct OrderSyncJob {
    pool: PgPool,
    hour: u32,
    max_retries: u32,
}

impl OrderSyncJob {
    /// Create a new order sync job firing daily at `hour`:00 UTC.
    pub fn new(pool: PgPool, hour: u32, max_retries: u32) -> Self {
        Self {
            pool,
            hour,
            max_retries,
        }
    }
}

#[async_trait::async_trait]
impl Job for OrderSyncJob {
    fn name(&self) -> &'static str {
        "order_sync"
    }

    fn schedule(&self) -> JobSchedule {
        JobSchedule::DailyAt {
            hour: self.hour,
            minute: 0,
        }
    }

    async fn execute(&self) -> Result<(), String> {
        let service = ReconciliationService::new(self.pool.clone());
        let report = service
            .sync_orders_to_entitlements(self.hour, self.max_retries)
            .await
            .map_err(|e| format!("Order sync sweep failed: {}", e))?;

        metrics::counter!("order_sync_runs_total").increment(1);
        metrics::counter!("order_sync_entitlements_created_total")
            .increment(report.created as u64);
        metrics::counter!("order_sync_entitlements_retired_total")
            .increment(report.retired as u64);

        info!(
            processed = report.total_processed,
            created = report.created,
            retired = report.retired,
            failed = report.failures.len(),
            "Order sync job finished"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    #[test]
    fn test_schedule_fires_at_configured_hour() {
        let schedule = JobSchedule::DailyAt { hour: 13, minute: 0 };
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        assert_eq!(schedule.next_delay(now), Duration::from_secs(3600));
    }
}
