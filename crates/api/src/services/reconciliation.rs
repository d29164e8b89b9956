//! Order→entitlement reconciliation engine.
//!
//! Derives, retires, and repairs per-user entitlements in response to order
//! lifecycle events. Three entry points share the same state machine:
//! per-order generation (operator-triggered), batch generation (all pending
//! orders), and the nightly sync sweep (previous day's orders, with
//! bounded retry).
//!
//! The invariant this module exists to protect: an order's `is_generate`
//! flag and its entitlement row move together. Every create/retire pairs
//! the entitlement write with the order-flag write in one transaction.

use chrono::{Duration as ChronoDuration, Utc};
use rand::Rng;
use sqlx::PgPool;
use tracing::{info, warn};

use domain::error::DomainError;
use domain::models::reports::{BatchGenerateReport, SyncFailure, SyncReport};
use domain::models::{ReconcileAction, UserEntitlement};
use persistence::entities::{EntitlementRuleEntity, OrderEntity};
use persistence::repositories::{
    ErrorLogRepository, EntitlementRuleRepository, NewUserEntitlement, OrderRepository,
    UserEntitlementRepository,
};

/// Result of a per-order generation call.
#[derive(Debug, Clone)]
pub enum GenerateOutcome {
    /// A fresh entitlement was created and the order marked generated.
    Generated(UserEntitlement),
    /// The order was refunded; its entitlement was retired and the order's
    /// generation flag cleared.
    Retired(UserEntitlement),
    /// The order claimed a generated entitlement but none existed. The
    /// generation flag was cleared so the order can be reprocessed.
    SelfHealed { order_id: String },
}

/// The reconciliation engine.
#[derive(Clone)]
pub struct ReconciliationService {
    pool: PgPool,
}

impl ReconciliationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Generate or retire the entitlement for a single order, dispatching on
    /// the order's `(is_refund, is_generate)` state.
    pub async fn generate_from_order(
        &self,
        order_id: &str,
    ) -> Result<GenerateOutcome, DomainError> {
        let order_repo = OrderRepository::new(self.pool.clone());
        let order = order_repo
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Order {} not found", order_id)))?;

        match ReconcileAction::for_flags(order.is_refund, order.is_generate) {
            ReconcileAction::AlreadyGenerated => Err(DomainError::Conflict(format!(
                "Order {} already has a generated entitlement",
                order_id
            ))),
            ReconcileAction::NothingToRetire => Err(DomainError::Validation(format!(
                "Order {} is refunded; no entitlement can be generated",
                order_id
            ))),
            ReconcileAction::Retire => self.retire_for_order(&order).await,
            ReconcileAction::Generate => {
                let entitlement = self.create_for_order(&order).await?;
                Ok(GenerateOutcome::Generated(entitlement))
            }
        }
    }

    /// Create the entitlement for a fresh order and flip its generation
    /// flag, as one transaction.
    async fn create_for_order(&self, order: &OrderEntity) -> Result<UserEntitlement, DomainError> {
        let rule = self.rule_for_course(&order.course_id).await?;
        let new_entitlement = build_entitlement(order, &rule);

        let mut tx = self.pool.begin().await?;
        let entity = UserEntitlementRepository::insert_in_tx(&mut tx, &new_entitlement).await?;
        OrderRepository::set_generate_in_tx(&mut tx, &order.order_id, true).await?;
        tx.commit().await?;

        info!(
            order_id = %order.order_id,
            entitlement_id = %entity.entitlement_id,
            rule_id = %rule.rule_id,
            "Entitlement generated from order"
        );
        Ok(entity.into())
    }

    /// Retire the entitlement of a refunded order and clear its generation
    /// flag, as one transaction. Self-heals if the entitlement is missing.
    async fn retire_for_order(&self, order: &OrderEntity) -> Result<GenerateOutcome, DomainError> {
        let entitlement_repo = UserEntitlementRepository::new(self.pool.clone());
        let existing = entitlement_repo
            .find_active_by_order(&order.order_id)
            .await?;

        match existing {
            Some(entity) => {
                let mut tx = self.pool.begin().await?;
                UserEntitlementRepository::retire_in_tx(&mut tx, &entity.entitlement_id).await?;
                OrderRepository::set_generate_in_tx(&mut tx, &order.order_id, false).await?;
                tx.commit().await?;

                info!(
                    order_id = %order.order_id,
                    entitlement_id = %entity.entitlement_id,
                    "Entitlement retired for refunded order"
                );
                let mut entitlement: UserEntitlement = entity.into();
                entitlement.is_active = false;
                entitlement.is_deleted = true;
                Ok(GenerateOutcome::Retired(entitlement))
            }
            None => {
                // Order claims a generated entitlement that does not exist.
                // Clear the flag so the order re-enters the normal flow.
                warn!(
                    order_id = %order.order_id,
                    "Order marked generated but no live entitlement found; clearing flag"
                );
                let order_repo = OrderRepository::new(self.pool.clone());
                order_repo.set_generate(&order.order_id, false).await?;
                Ok(GenerateOutcome::SelfHealed {
                    order_id: order.order_id.clone(),
                })
            }
        }
    }

    /// Process every pending order: create entitlements for ungenerated,
    /// unrefunded orders and retire entitlements for refunded, generated
    /// ones. Never aborts on a single order's failure; each failure is
    /// recorded in the batch error log.
    ///
    /// Re-running is a no-op for orders the previous run handled: they fall
    /// outside both worksets.
    pub async fn batch_generate(&self) -> Result<BatchGenerateReport, DomainError> {
        let order_repo = OrderRepository::new(self.pool.clone());
        let error_log = ErrorLogRepository::new(self.pool.clone());

        let to_create = order_repo.find_generation_candidates().await?;
        let to_retire = order_repo.find_retirement_candidates().await?;

        let mut report = BatchGenerateReport {
            total: (to_create.len() + to_retire.len()) as i64,
            ..Default::default()
        };

        for order in &to_create {
            match self.create_for_order(order).await {
                Ok(_) => report.created += 1,
                Err(e) => {
                    let message =
                        format!("Order {} entitlement generation failed: {}", order.order_id, e);
                    record_batch_error(&error_log, &order.order_id, &message).await;
                    report.error_messages.push(message);
                    report.failed += 1;
                }
            }
        }

        for order in &to_retire {
            match self.retire_for_order(order).await {
                Ok(GenerateOutcome::Retired(_)) => report.retired += 1,
                Ok(_) => {
                    // Self-heal: the flag was cleared, but the operator
                    // should still know the entitlement was missing.
                    let message = format!(
                        "Order {} had no entitlement to retire; generation flag cleared",
                        order.order_id
                    );
                    record_batch_error(&error_log, &order.order_id, &message).await;
                    report.error_messages.push(message);
                    report.failed += 1;
                }
                Err(e) => {
                    let message =
                        format!("Order {} entitlement retirement failed: {}", order.order_id, e);
                    record_batch_error(&error_log, &order.order_id, &message).await;
                    report.error_messages.push(message);
                    report.failed += 1;
                }
            }
        }

        info!(
            total = report.total,
            created = report.created,
            retired = report.retired,
            failed = report.failed,
            "Batch entitlement generation finished"
        );
        Ok(report)
    }

    /// Manual grant: create an entitlement for a (phone, rule) pair with no
    /// backing order.
    ///
    /// The grant starts inactive; activation happens in the login flow,
    /// outside this engine. Deduped against live (phone, rule) grants, the
    /// same precondition the nightly sync applies.
    pub async fn create_manual_entitlement(
        &self,
        phone: &str,
        rule_id: &str,
    ) -> Result<UserEntitlement, DomainError> {
        let rule_repo = EntitlementRuleRepository::new(self.pool.clone());
        let rule = rule_repo
            .find_by_id(rule_id)
            .await?
            .filter(|r| !r.is_deleted)
            .ok_or_else(|| {
                DomainError::NotFound(format!("Entitlement rule {} not found", rule_id))
            })?;

        let entitlement_repo = UserEntitlementRepository::new(self.pool.clone());
        if entitlement_repo
            .find_active_by_phone_and_rule(phone, rule_id)
            .await?
            .is_some()
        {
            return Err(DomainError::Conflict(format!(
                "User {} already holds an entitlement for rule {}",
                phone, rule_id
            )));
        }

        let now = Utc::now();
        let entity = entitlement_repo
            .insert(&NewUserEntitlement {
                entitlement_id: shared::ids::entitlement_id(),
                phone: phone.to_string(),
                order_id: None,
                rule_id: rule.rule_id.clone(),
                course_name: rule.course_name.clone(),
                product_name: rule.product_name.clone(),
                ai_product_id: Some(rule.ai_product_id.clone()),
                start_date: now,
                end_date: now + ChronoDuration::days(rule.validity_days as i64),
                is_active: false,
                daily_remaining: rule.daily_limit,
            })
            .await?;

        info!(
            entitlement_id = %entity.entitlement_id,
            phone = %phone,
            rule_id = %rule_id,
            "Manual entitlement granted (inactive until first login)"
        );
        Ok(entity.into())
    }

    /// Nightly sweep: reconcile every order created in the 24 hours ending
    /// at today's `window_end_hour` UTC. Transient failures are retried up
    /// to `max_retries` times with exponential backoff; permanent failures
    /// are reported with their retry count.
    pub async fn sync_orders_to_entitlements(
        &self,
        window_end_hour: u32,
        max_retries: u32,
    ) -> Result<SyncReport, DomainError> {
        let now = Utc::now();
        let window_end = now
            .date_naive()
            .and_hms_opt(window_end_hour, 0, 0)
            .ok_or_else(|| {
                DomainError::Internal(format!("Invalid sync window hour {}", window_end_hour))
            })?
            .and_utc();
        let window_start = window_end - ChronoDuration::days(1);

        let order_repo = OrderRepository::new(self.pool.clone());
        let orders = order_repo
            .find_created_between(window_start, window_end)
            .await?;

        let mut report = SyncReport::default();
        if orders.is_empty() {
            info!("No new orders to sync");
            return Ok(report);
        }

        for order in &orders {
            report.total_processed += 1;
            let mut attempt: u32 = 0;
            loop {
                match self.sync_one(order).await {
                    Ok(SyncAction::Created) => {
                        report.created += 1;
                        break;
                    }
                    Ok(SyncAction::Retired) => {
                        report.retired += 1;
                        break;
                    }
                    Ok(SyncAction::Skipped) => break,
                    Err(e) if e.is_transient() && attempt + 1 < max_retries => {
                        attempt += 1;
                        warn!(
                            order_id = %order.order_id,
                            attempt,
                            error = %e,
                            "Transient failure syncing order; backing off"
                        );
                        tokio::time::sleep(backoff_delay(attempt)).await;
                    }
                    Err(e) => {
                        warn!(
                            order_id = %order.order_id,
                            retries = attempt,
                            error = %e,
                            "Order sync failed permanently"
                        );
                        report.failures.push(SyncFailure {
                            order_id: order.order_id.clone(),
                            error: e.to_string(),
                            retries: attempt,
                        });
                        break;
                    }
                }
            }
        }

        info!(
            total = report.total_processed,
            created = report.created,
            retired = report.retired,
            failed = report.failures.len(),
            "Order sync sweep finished"
        );
        Ok(report)
    }

    /// One order's worth of nightly sync work.
    ///
    /// Same state machine as `generate_from_order`, except already-handled
    /// states skip instead of erroring, creation dedups on (phone, rule),
    /// and retirement is keyed on (phone, rule) because sync-era orders may
    /// predate order-linked entitlements.
    async fn sync_one(&self, order: &OrderEntity) -> Result<SyncAction, DomainError> {
        let entitlement_repo = UserEntitlementRepository::new(self.pool.clone());

        match ReconcileAction::for_flags(order.is_refund, order.is_generate) {
            ReconcileAction::AlreadyGenerated | ReconcileAction::NothingToRetire => {
                Ok(SyncAction::Skipped)
            }
            ReconcileAction::Generate => {
                let rule = self.rule_for_course(&order.course_id).await?;
                if entitlement_repo
                    .find_active_by_phone_and_rule(&order.phone, &rule.rule_id)
                    .await?
                    .is_some()
                {
                    info!(
                        order_id = %order.order_id,
                        phone = %order.phone,
                        "Entitlement already exists for user and rule; skipping"
                    );
                    return Ok(SyncAction::Skipped);
                }
                self.create_for_order(order).await?;
                Ok(SyncAction::Created)
            }
            ReconcileAction::Retire => {
                let rule = self.rule_for_course(&order.course_id).await?;
                let existing = entitlement_repo
                    .find_active_by_phone_and_rule(&order.phone, &rule.rule_id)
                    .await?;
                match existing {
                    Some(entity) => {
                        let mut tx = self.pool.begin().await?;
                        UserEntitlementRepository::retire_in_tx(&mut tx, &entity.entitlement_id)
                            .await?;
                        OrderRepository::set_generate_in_tx(&mut tx, &order.order_id, false)
                            .await?;
                        tx.commit().await?;
                        Ok(SyncAction::Retired)
                    }
                    None => {
                        // Already retired elsewhere; treat as done.
                        warn!(
                            order_id = %order.order_id,
                            phone = %order.phone,
                            "No live entitlement to retire for refunded order"
                        );
                        Ok(SyncAction::Skipped)
                    }
                }
            }
        }
    }

    async fn rule_for_course(
        &self,
        course_id: &str,
    ) -> Result<EntitlementRuleEntity, DomainError> {
        let rule_repo = EntitlementRuleRepository::new(self.pool.clone());
        rule_repo
            .find_active_by_course(course_id)
            .await?
            .ok_or_else(|| {
                DomainError::Dependency(format!(
                    "No entitlement rule found for course {}",
                    course_id
                ))
            })
    }
}

/// What the sync sweep did with one order.
enum SyncAction {
    Created,
    Retired,
    Skipped,
}

/// Materialize a grant from an order and the rule in force at this moment.
/// Policy fields are copied, not referenced live.
fn build_entitlement(order: &OrderEntity, rule: &EntitlementRuleEntity) -> NewUserEntitlement {
    let start_date = Utc::now();
    NewUserEntitlement {
        entitlement_id: shared::ids::entitlement_id(),
        phone: order.phone.clone(),
        order_id: Some(order.order_id.clone()),
        rule_id: rule.rule_id.clone(),
        course_name: rule.course_name.clone(),
        product_name: rule.product_name.clone(),
        ai_product_id: Some(rule.ai_product_id.clone()),
        start_date,
        end_date: start_date + ChronoDuration::days(rule.validity_days as i64),
        is_active: true,
        daily_remaining: rule.daily_limit,
    }
}

/// Exponential backoff (2^attempt seconds) with up to 250ms of jitter.
fn backoff_delay(attempt: u32) -> std::time::Duration {
    let base = 2u64.saturating_pow(attempt).min(60);
    let jitter = rand::thread_rng().gen_range(0..250);
    std::time::Duration::from_secs(base) + std::time::Duration::from_millis(jitter)
}

/// Best-effort error-log append; a failed audit write must not fail the run.
async fn record_batch_error(error_log: &ErrorLogRepository, order_id: &str, message: &str) {
    if let Err(e) = error_log.insert_batch_error(order_id, message).await {
        tracing::error!(order_id = %order_id, error = %e, "Failed to record batch error");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn order(is_refund: bool, is_generate: bool) -> OrderEntity {
        OrderEntity {
            order_id: "PAY1".into(),
            phone: "13800000000".into(),
            course_id: "COURSE_1".into(),
            purchase_time: Utc::now(),
            is_refund,
            is_generate,
            is_deleted: false,
            created_at: Utc::now(),
        }
    }

    fn rule() -> EntitlementRuleEntity {
        EntitlementRuleEntity {
            rule_id: "RULE_1".into(),
            course_id: "COURSE_1".into(),
            course_name: "Python Basics".into(),
            ai_product_id: "AI_1".into(),
            product_name: "ChatBot".into(),
            daily_limit: 3,
            validity_days: 10,
            is_deleted: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_build_entitlement_copies_rule_policy() {
        let entitlement = build_entitlement(&order(false, false), &rule());
        assert_eq!(entitlement.daily_remaining, 3);
        assert_eq!(entitlement.order_id.as_deref(), Some("PAY1"));
        assert_eq!(
            (entitlement.end_date - entitlement.start_date).num_days(),
            10
        );
        assert!(entitlement.is_active);
        assert!(entitlement.entitlement_id.starts_with("ENT_"));
    }

    #[test]
    fn test_build_entitlement_denormalizes_names() {
        let entitlement = build_entitlement(&order(false, false), &rule());
        assert_eq!(entitlement.course_name, "Python Basics");
        assert_eq!(entitlement.product_name, "ChatBot");
        assert_eq!(entitlement.ai_product_id.as_deref(), Some("AI_1"));
    }

    #[test]
    fn test_backoff_is_exponential_and_capped() {
        assert!(backoff_delay(1) >= std::time::Duration::from_secs(2));
        assert!(backoff_delay(2) >= std::time::Duration::from_secs(4));
        // Never beyond cap + jitter even for absurd attempt counts.
        assert!(backoff_delay(30) < std::time::Duration::from_secs(61));
    }
}
