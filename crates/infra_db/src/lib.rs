//! Infrastructure Database Layer
//!
//! PostgreSQL storage for the invoicing system, built on SQLx.
//!
//! # Architecture
//!
//! - [`repositories`] hold the SQL and map rows to plain structs
//! - [`adapters`] implement the domain ports (`UserPort`, `InvoicePort`) on
//!   top of the repositories and translate errors into `PortError`
//!
//! Schema changes live in `migrations/` and are applied with
//! [`run_migrations`] at startup.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PgInvoiceStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/invoicegen")).await?;
//! run_migrations(&pool).await?;
//! let invoices = PgInvoiceStore::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{create_pool, create_pool_from_url, run_migrations, DatabaseConfig, DatabasePool};
pub use error::DatabaseError;
pub use adapters::{PgInvoiceStore, PgUserStore};
