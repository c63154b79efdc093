use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::AppConfig;

/// Build a lazily-connecting Postgres pool from the environment. Returns
/// `None` when no DATABASE_URL is configured so the service can still boot
/// and answer health checks.
pub fn build_pool(config: &AppConfig) -> Option<PgPool> {
    let url = config.database_url.as_ref()?;

    let options = PgPoolOptions::new()
        .max_connections(config.db_pool_max_connections)
        .min_connections(config.db_pool_min_connections)
        .acquire_timeout(Duration::from_secs(config.db_pool_acquire_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.db_pool_idle_timeout_seconds));

    match options.connect_lazy(url) {
        Ok(pool) => Some(pool),
        Err(error) => {
            tracing::warn!(error = %error, "Could not configure the database pool");
            None
        }
    }
}
