//! Background job scheduler and job implementations.

mod order_sync;
mod pool_metrics;
mod quota_reset;
mod scheduler;

pub use order_sync::OrderSyncJob;
pub use pool_metrics::PoolMetricsJob;
pub use quota_reset::QuotaResetJob;
pub use scheduler::{Job, JobSchedule, JobScheduler, JobStatus, JobStatusMap};
