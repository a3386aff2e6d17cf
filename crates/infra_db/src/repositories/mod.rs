//! Repository implementations
//!
//! Repositories own the SQL. They read and write flat row structs and know
//! nothing about domain invariants; conversion to domain types happens in
//! the adapters.
//!
//! Queries are built at runtime with `sqlx::query_as` so the crate compiles
//! without a live database. Multi-statement writes run in a transaction.

pub mod users;
pub mod invoices;

pub use users::{UserRepository, UserRow};
pub use invoices::{InvoiceItemRow, InvoiceRepository, InvoiceRow, InvoiceWithItems, QuotaCheck};
