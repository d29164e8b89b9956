//! Daily quota reset job.

use sqlx::PgPool;
use tracing::info;

use crate::services::QuotaResetService;

use super::scheduler::{Job, JobSchedule};

/// Background job that rewrites every live entitlement's remaining-uses
/// counter to its rule's daily limit.
pub struct QuotaResetJob {
    pool: PgPool,
    hour: u32,
}

impl QuotaResetJob {
    /// Create a new quota reset job firing daily at `hour`:00 UTC.
    pub fn new(pool: PgPool, hour: u32) -> Self {
        Self { pool, hour }
    }
}

#[async_trait::async_trait]
impl Job for QuotaResetJob {
    fn name(&self) -> &'static str {
        "quota_reset"
    }

    fn schedule(&self) -> JobSchedule {
        JobSchedule::DailyAt {
            hour: self.hour,
            minute: 0,
        }
    }

    async fn execute(&self) -> Result<(), String> {
        let service = QuotaResetService::new(self.pool.clone());
        let report = service
            .reset_daily_quota()
            .await
            .map_err(|e| format!("Quota reset sweep failed: {}", e))?;

        metrics::counter!("quota_reset_runs_total").increment(1);
        metrics::gauge!("quota_reset_updated").set(report.updated as f64);

        info!(
            scanned = report.scanned,
            updated = report.updated,
            skipped = report.skipped_missing_rule,
            "Quota reset job finished"
        );
        Ok(())
    }
}
