//! Invoicing Domain
//!
//! Invoices, their line items and the arithmetic that ties them together.
//!
//! # Totals
//!
//! ```text
//! amount    = quantity × rate            (per line item)
//! subtotal  = Σ amount
//! tax       = subtotal × tax_rate / 100
//! total     = subtotal + tax
//! ```
//!
//! All four are computed with `rust_decimal` at full precision and are
//! recomputed together whenever items or the tax rate change. Rounding
//! happens only when a view formats them for display.
//!
//! # Lifecycle
//!
//! `draft → sent → paid`. Reverse moves are rejected and paid invoices
//! cannot be edited.
//!
//! # Creation
//!
//! Creation is gated by the owner's membership tier: the storage adapter
//! counts this month's invoices and inserts the new one as a single
//! serialized step, so concurrent requests cannot jointly exceed a quota.

pub mod error;
pub mod line_item;
pub mod draft;
pub mod calculator;
pub mod invoice;
pub mod numbering;
pub mod presentation;
pub mod ports;
pub mod services;

pub use error::{InvoiceError, ValidationError};
pub use line_item::{LineItem, LineItemInput, MAX_QUANTITY, MAX_RATE};
pub use draft::{ClientDetails, InvoiceDraft, InvoiceDraftInput};
pub use calculator::{InvoiceCalculator, InvoiceTotals};
pub use invoice::{Invoice, InvoiceRecord, InvoiceStatus};
pub use presentation::{ConvertedTotal, InvoiceExport, InvoiceView, LineItemView};
pub use ports::{InsertOutcome, InvoicePort, QuotaGuard};
pub use services::{InvoicingContext, InvoicingService};
