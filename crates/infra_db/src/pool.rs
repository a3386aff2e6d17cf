//! Database connection pool management
//!
//! Connection pool configuration, creation and schema migration for
//! PostgreSQL using SQLx.

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::error::DatabaseError;

pub type DatabasePool = PgPool;

/// Application name reported to PostgreSQL in `pg_stat_activity`
pub const APPLICATION_NAME: &str = "invoicegen";

/// Pool sizing and connection lifetimes
///
/// # Example
///
/// ```rust
/// use infra_db::DatabaseConfig;
/// use std::time::Duration;
///
/// let config = DatabaseConfig::new("postgres://localhost/invoicegen")
///     .with_pool_size(2, 20)
///     .with_acquire_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// Connections kept open while idle
    pub min_connections: u32,
    /// How long a request waits for a free connection
    pub acquire_timeout: Duration,
    pub max_lifetime: Duration,
    pub idle_timeout: Duration,
}

impl DatabaseConfig {
    /// Small pool suited to a single API instance
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(10),
            max_lifetime: Duration::from_secs(30 * 60),
            idle_timeout: Duration::from_secs(5 * 60),
        }
    }

    /// Sets both bounds; `min` is clamped to `max`
    pub fn with_pool_size(mut self, min: u32, max: u32) -> Self {
        self.max_connections = max.max(1);
        self.min_connections = min.min(self.max_connections);
        self
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn with_lifetimes(mut self, max_lifetime: Duration, idle_timeout: Duration) -> Self {
        self.max_lifetime = max_lifetime;
        self.idle_timeout = idle_timeout;
        self
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::new("postgres://localhost/invoicegen")
    }
}

/// Connects a pool and verifies the server is reachable
///
/// # Errors
///
/// `DatabaseError::ConnectionFailed` for a malformed URL or an unreachable
/// server.
///
/// ```rust,ignore
/// let pool = create_pool(DatabaseConfig::new(&config.database_url)).await?;
/// run_migrations(&pool).await?;
/// ```
pub async fn create_pool(config: DatabaseConfig) -> Result<DatabasePool, DatabaseError> {
    let options = PgConnectOptions::from_str(&config.url)
        .map_err(|e| DatabaseError::ConnectionFailed(format!("invalid database url: {}", e)))?
        .application_name(APPLICATION_NAME);

    info!(
        host = options.get_host(),
        database = options.get_database().unwrap_or_default(),
        max_connections = config.max_connections,
        "Connecting to PostgreSQL"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .max_lifetime(config.max_lifetime)
        .idle_timeout(config.idle_timeout)
        .connect_with(options)
        .await
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

    Ok(pool)
}

/// [`create_pool`] with default sizing
pub async fn create_pool_from_url(url: &str) -> Result<DatabasePool, DatabaseError> {
    create_pool(DatabaseConfig::new(url)).await
}

/// Applies pending migrations from `migrations/`
///
/// # Errors
///
/// `DatabaseError::MigrationFailed` on the first failing migration; earlier
/// ones stay applied.
pub async fn run_migrations(pool: &DatabasePool) -> Result<(), DatabaseError> {
    let migrator = sqlx::migrate!("./migrations");
    migrator
        .run(pool)
        .await
        .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

    info!(migrations = migrator.iter().count(), "Schema up to date");
    Ok(())
}
