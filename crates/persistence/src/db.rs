//! PostgreSQL connection pool construction.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Pool sizing and timeout knobs, resolved from the application config.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl PoolSettings {
    fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

/// Opens a PostgreSQL pool with the given settings.
///
/// The pool itself does not verify connectivity beyond the first
/// connection; readiness is probed separately via `/health/ready`.
pub async fn create_pool(settings: &PoolSettings) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(settings.acquire_timeout())
        .idle_timeout(settings.idle_timeout())
        .connect(&settings.url)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_conversions() {
        let settings = PoolSettings {
            url: "postgres://localhost/test".into(),
            max_connections: 10,
            min_connections: 2,
            connect_timeout_secs: 7,
            idle_timeout_secs: 300,
        };
        assert_eq!(settings.acquire_timeout(), Duration::from_secs(7));
        assert_eq!(settings.idle_timeout(), Duration::from_secs(300));
    }
}
