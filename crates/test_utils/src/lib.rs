//! Test Utilities Crate
//!
//! Shared test infrastructure for the invoicing test suites.
//!
//! # Modules
//!
//! - `fixtures`: fixed instants, canonical invoice inputs and JSON payloads
//! - `builders`: builders for users and stored invoices
//! - `assertions`: assertion helpers for totals and JSON decimals
//! - `generators`: proptest strategies and `fake` client data

pub mod fixtures;
pub mod builders;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use assertions::*;
pub use generators::*;
