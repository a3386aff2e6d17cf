//! Raw invoice input and its validation
//!
//! Everything a client submits arrives as text. [`InvoiceDraftInput::parse`]
//! turns it into an [`InvoiceDraft`] whose fields are typed and bounded, or
//! fails before anything is stored.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::ValidateEmail;

use core_kernel::{sanitize_optional, sanitize_text, CurrencyCode, CurrencyTable, TaxRate};

use crate::error::ValidationError;
use crate::line_item::{parse_line_items, LineItem, LineItemInput};

pub const MAX_INVOICE_NUMBER_LENGTH: usize = 50;
pub const MAX_CLIENT_NAME_LENGTH: usize = 200;
pub const MAX_CLIENT_EMAIL_LENGTH: usize = 120;
pub const MAX_CLIENT_ADDRESS_LENGTH: usize = 500;
pub const MAX_NOTES_LENGTH: usize = 1000;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Who is being billed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDetails {
    pub name: String,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Invoice fields as submitted
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceDraftInput {
    #[serde(default)]
    pub invoice_number: String,
    #[serde(default)]
    pub client_name: String,
    pub client_email: Option<String>,
    pub client_address: Option<String>,
    #[serde(default)]
    pub issue_date: String,
    #[serde(default)]
    pub due_date: String,
    /// The account's default currency when absent
    pub currency: Option<String>,
    /// Percentage; blank means zero
    pub tax_rate: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItemInput>,
}

/// A fully validated invoice ready to become an aggregate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDraft {
    pub number: String,
    pub client: ClientDetails,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub currency: CurrencyCode,
    pub tax_rate: TaxRate,
    pub notes: Option<String>,
    pub items: Vec<LineItem>,
}

impl InvoiceDraftInput {
    /// Validates and normalizes the submission
    ///
    /// # Arguments
    ///
    /// * `currencies` - Table the invoice currency must belong to
    /// * `default_currency` - Used when no currency was submitted
    ///
    /// # Errors
    ///
    /// The first failing field, with the row index for line items.
    pub fn parse(
        &self,
        currencies: &CurrencyTable,
        default_currency: CurrencyCode,
    ) -> Result<InvoiceDraft, ValidationError> {
        let number = sanitize_text(&self.invoice_number, MAX_INVOICE_NUMBER_LENGTH);
        if number.is_empty() {
            return Err(ValidationError::field("invoice_number", "is required"));
        }

        let name = sanitize_text(&self.client_name, MAX_CLIENT_NAME_LENGTH);
        if name.is_empty() {
            return Err(ValidationError::field("client_name", "is required"));
        }

        let email = sanitize_optional(self.client_email.as_deref(), MAX_CLIENT_EMAIL_LENGTH);
        if let Some(ref email) = email {
            if !email.validate_email() {
                return Err(ValidationError::field("client_email", "is not a valid email address"));
            }
        }

        let issue_date = parse_date(&self.issue_date, "issue_date")?;
        let due_date = parse_date(&self.due_date, "due_date")?;
        if due_date < issue_date {
            return Err(ValidationError::field("due_date", "must not be before the issue date"));
        }

        let currency = match self.currency.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => currencies
                .require(code)
                .map_err(|e| ValidationError::field("currency", e.to_string()))?,
            _ => default_currency,
        };

        let tax_rate = parse_tax_rate(self.tax_rate.as_deref())?;
        let items = parse_line_items(&self.items)?;
        if items.is_empty() {
            return Err(ValidationError::field("items", "at least one line item is required"));
        }

        Ok(InvoiceDraft {
            number,
            client: ClientDetails {
                name,
                email,
                address: sanitize_optional(self.client_address.as_deref(), MAX_CLIENT_ADDRESS_LENGTH),
            },
            issue_date,
            due_date,
            currency,
            tax_rate,
            notes: sanitize_optional(self.notes.as_deref(), MAX_NOTES_LENGTH),
            items,
        })
    }
}

/// Parses a submitted tax percentage; blank means zero
pub fn parse_tax_rate(raw: Option<&str>) -> Result<TaxRate, ValidationError> {
    let trimmed = raw.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Ok(TaxRate::ZERO);
    }
    let percentage = Decimal::from_str(trimmed)
        .map_err(|_| ValidationError::field("tax_rate", format!("'{}' is not a number", trimmed)))?;
    TaxRate::from_percentage(percentage)
        .map_err(|e| ValidationError::field("tax_rate", e.to_string()))
}

fn parse_date(raw: &str, field: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::field(field, "is required"));
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| ValidationError::field(field, "must be a date in YYYY-MM-DD format"))
}
