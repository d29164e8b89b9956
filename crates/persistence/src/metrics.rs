//! Connection pool gauge recording.

use sqlx::PgPool;

/// Records current connection pool gauges. Called periodically by the
/// pool-metrics background job.
pub fn record_pool_metrics(pool: &PgPool) {
    metrics::gauge!("db_pool_connections").set(pool.size() as f64);
    metrics::gauge!("db_pool_idle_connections").set(pool.num_idle() as f64);
}
