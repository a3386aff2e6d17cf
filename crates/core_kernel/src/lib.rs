//! Core Kernel - Foundational types and utilities for invoicing
//!
//! This crate provides the building blocks shared by every domain crate:
//! - Currency reference table and ISO-style currency codes
//! - Money values and tax rates with precise decimal arithmetic
//! - Display formatting honoring each currency's precision
//! - Exchange rate lookup for display-time conversion
//! - Billing periods, typed identifiers and port abstractions
//! - Free-text input sanitization

pub mod currency;
pub mod money;
pub mod format;
pub mod exchange;
pub mod temporal;
pub mod text;
pub mod identifiers;
pub mod ports;
pub mod error;

pub use currency::{CurrencyCode, CurrencyDefinition, CurrencyTable, DEFAULT_CURRENCY};
pub use money::{Money, MoneyError, TaxRate};
pub use format::{BoundFormatter, MoneyFormatter};
pub use exchange::{ExchangeRateTable, RateQuote, RateSource};
pub use temporal::BillingPeriod;
pub use text::{sanitize_text, sanitize_optional};
pub use identifiers::{InvalidId, UserId, InvoiceId, LineItemId};
pub use ports::{PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth};
pub use error::CoreError;
