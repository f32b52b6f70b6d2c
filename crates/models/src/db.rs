use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

pub use configs::DatabaseConfig;

/// Connect with explicit pool settings from `configs`.
///
/// SQLite in-memory databases live and die with their connection, so the pool
/// is pinned to a single connection for `sqlite::memory:`.
pub async fn connect_with_config(cfg: &DatabaseConfig) -> anyhow::Result<DatabaseConnection> {
    let in_memory = cfg.url.contains(":memory:");
    let (max, min) = if in_memory { (1, 1) } else { (cfg.max_connections, cfg.min_connections) };
    let mut opts = ConnectOptions::new(cfg.url.clone());
    opts.max_connections(max)
        .min_connections(min)
        .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs.max(1)))
        .acquire_timeout(Duration::from_secs(cfg.acquire_timeout_secs.max(1)))
        .idle_timeout(Duration::from_secs(cfg.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(cfg.max_lifetime_secs))
        .sqlx_logging(cfg.sqlx_logging);
    let db = Database::connect(opts).await?;
    info!(max_connections = max, sqlite = cfg.is_sqlite(), "database pool ready");
    Ok(db)
}

/// Throwaway in-memory database config used by tests across the workspace.
pub fn memory_config() -> DatabaseConfig {
    DatabaseConfig {
        url: "sqlite::memory:".into(),
        max_connections: 1,
        min_connections: 1,
        connect_timeout_secs: 5,
        idle_timeout_secs: 600,
        max_lifetime_secs: 3600,
        acquire_timeout_secs: 5,
        sqlx_logging: false,
    }
}
