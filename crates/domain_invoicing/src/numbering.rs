//! Suggested invoice numbers
//!
//! Numbers are free text; the suggestion is a convenience and is never
//! checked for uniqueness.

/// Prefix of generated invoice numbers
pub const INVOICE_NUMBER_PREFIX: &str = "INV";

/// Suggests the number following `existing_invoices` invoices
///
/// ```rust
/// use domain_invoicing::numbering::next_invoice_number;
///
/// assert_eq!(next_invoice_number(0), "INV-0001");
/// assert_eq!(next_invoice_number(41), "INV-0042");
/// assert_eq!(next_invoice_number(12_345), "INV-12346");
/// ```
pub fn next_invoice_number(existing_invoices: u64) -> String {
    format!("{}-{:04}", INVOICE_NUMBER_PREFIX, existing_invoices.saturating_add(1))
}
