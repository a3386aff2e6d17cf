//! Domain Adapters
//!
//! PostgreSQL implementations of the domain ports. Each adapter:
//! - implements the domain's port trait
//! - converts between domain models and repository rows
//! - translates `DatabaseError` into `PortError`
//!
//! Rows that fail domain validation on the way back (an unknown tier, a
//! negative quantity written by hand) surface as internal errors rather than
//! being silently repaired.
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::PgUserStore;
//! use domain_membership::UserPort;
//!
//! let users = PgUserStore::new(pool);
//! let user = users.find_by_email("owner@example.com").await?;
//! ```

pub mod users;
pub mod invoices;

pub use users::PgUserStore;
pub use invoices::PgInvoiceStore;

use chrono::Utc;
use sqlx::PgPool;

use core_kernel::{AdapterHealth, HealthCheckResult};

/// Runs `SELECT 1` against the pool and reports the latency
pub(crate) async fn ping(pool: &PgPool, adapter_id: &str) -> HealthCheckResult {
    let start = std::time::Instant::now();

    let result = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await;

    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(_) => HealthCheckResult::healthy(adapter_id, latency_ms),
        Err(e) => HealthCheckResult {
            adapter_id: adapter_id.to_string(),
            status: AdapterHealth::Unhealthy,
            latency_ms,
            message: Some(format!("Database error: {}", e)),
            checked_at: Utc::now(),
        },
    }
}
