//! Daily quota reset sweep.
//!
//! Rewrites every live entitlement's remaining-uses counter to its rule's
//! daily limit. Each row's update is independent and idempotent, so a
//! repeated run on the same day is harmless.

use std::collections::HashMap;

use sqlx::PgPool;
use tracing::{error, info, warn};

use domain::error::DomainError;
use domain::models::reports::QuotaResetReport;
use persistence::repositories::{EntitlementRuleRepository, UserEntitlementRepository};

/// Rows fetched per chunk of the sweep.
const CHUNK_SIZE: i64 = 500;

/// The quota reset sweep.
#[derive(Clone)]
pub struct QuotaResetService {
    pool: PgPool,
}

impl QuotaResetService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Reset `daily_remaining` to the rule's `daily_limit` for every
    /// non-deleted entitlement. Entitlements whose rule has been deleted
    /// are skipped and logged, never failed.
    pub async fn reset_daily_quota(&self) -> Result<QuotaResetReport, DomainError> {
        let entitlement_repo = UserEntitlementRepository::new(self.pool.clone());
        let rule_repo = EntitlementRuleRepository::new(self.pool.clone());

        let mut report = QuotaResetReport::default();
        // One rule lookup per distinct rule_id, not per row.
        let mut limits: HashMap<String, Option<i32>> = HashMap::new();
        let mut after_id: Option<String> = None;

        loop {
            let chunk = entitlement_repo
                .find_active_chunk(after_id.as_deref(), CHUNK_SIZE)
                .await?;
            if chunk.is_empty() {
                break;
            }
            after_id = chunk.last().map(|e| e.entitlement_id.clone());

            for entitlement in &chunk {
                report.scanned += 1;

                let limit = match limits.get(&entitlement.rule_id) {
                    Some(cached) => *cached,
                    None => {
                        let limit = rule_repo
                            .find_by_id(&entitlement.rule_id)
                            .await?
                            .filter(|r| !r.is_deleted)
                            .map(|r| r.daily_limit);
                        limits.insert(entitlement.rule_id.clone(), limit);
                        limit
                    }
                };

                match limit {
                    Some(daily_limit) => {
                        if let Err(e) = entitlement_repo
                            .set_daily_remaining(&entitlement.entitlement_id, daily_limit)
                            .await
                        {
                            error!(
                                entitlement_id = %entitlement.entitlement_id,
                                error = %e,
                                "Failed to reset daily quota for entitlement"
                            );
                        } else {
                            report.updated += 1;
                        }
                    }
                    None => {
                        warn!(
                            entitlement_id = %entitlement.entitlement_id,
                            rule_id = %entitlement.rule_id,
                            "Entitlement references a deleted rule; quota left untouched"
                        );
                        report.skipped_missing_rule += 1;
                    }
                }
            }
        }

        info!(
            scanned = report.scanned,
            updated = report.updated,
            skipped = report.skipped_missing_rule,
            "Daily quota reset finished"
        );
        Ok(report)
    }
}
