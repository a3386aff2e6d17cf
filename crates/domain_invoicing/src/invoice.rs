//! Invoice aggregate
//!
//! The invoice owns its line items, currency and tax rate. Totals are
//! private and recomputed together on every change to items or tax rate, so
//! a stored invoice can never carry a total that disagrees with its items.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{CurrencyCode, InvoiceId, TaxRate, UserId};

use crate::calculator::{InvoiceCalculator, InvoiceTotals};
use crate::draft::{ClientDetails, InvoiceDraft};
use crate::error::{InvoiceError, ValidationError};
use crate::line_item::LineItem;

/// Invoice lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Being prepared, not yet sent to the client
    Draft,
    /// Sent to the client, awaiting payment
    Sent,
    /// Settled; no further changes
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Paid => "paid",
        }
    }

    /// Allowed moves: draft → sent → paid
    pub fn can_transition_to(&self, target: InvoiceStatus) -> bool {
        use InvoiceStatus::*;
        matches!((self, target), (Draft, Sent) | (Sent, Paid))
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(InvoiceStatus::Draft),
            "sent" => Ok(InvoiceStatus::Sent),
            "paid" => Ok(InvoiceStatus::Paid),
            other => Err(ValidationError::field(
                "status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

/// Stored invoice fields, as read back by an adapter
///
/// Totals are deliberately absent; [`Invoice::restore`] recomputes them.
#[derive(Debug, Clone)]
pub struct InvoiceRecord {
    pub id: InvoiceId,
    pub owner: UserId,
    pub number: String,
    pub client: ClientDetails,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub currency: CurrencyCode,
    pub tax_rate: TaxRate,
    pub notes: Option<String>,
    pub status: InvoiceStatus,
    pub items: Vec<LineItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An invoice owned by one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invoice {
    id: InvoiceId,
    owner: UserId,
    number: String,
    client: ClientDetails,
    issue_date: NaiveDate,
    due_date: NaiveDate,
    currency: CurrencyCode,
    tax_rate: TaxRate,
    items: Vec<LineItem>,
    #[serde(flatten)]
    totals: InvoiceTotals,
    notes: Option<String>,
    status: InvoiceStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Creates a draft invoice from validated input
    ///
    /// # Errors
    ///
    /// `Validation` if the totals do not fit a `Decimal`.
    pub fn create(owner: UserId, draft: InvoiceDraft, now: DateTime<Utc>) -> Result<Self, InvoiceError> {
        let totals = InvoiceCalculator::compute(&draft.items, draft.tax_rate)?;
        Ok(Self {
            id: InvoiceId::new_v7(),
            owner,
            number: draft.number,
            client: draft.client,
            issue_date: draft.issue_date,
            due_date: draft.due_date,
            currency: draft.currency,
            tax_rate: draft.tax_rate,
            items: draft.items,
            totals,
            notes: draft.notes,
            status: InvoiceStatus::Draft,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds an invoice from storage, recomputing its totals
    pub fn restore(record: InvoiceRecord) -> Result<Self, InvoiceError> {
        let totals = InvoiceCalculator::compute(&record.items, record.tax_rate)?;
        Ok(Self {
            id: record.id,
            owner: record.owner,
            number: record.number,
            client: record.client,
            issue_date: record.issue_date,
            due_date: record.due_date,
            currency: record.currency,
            tax_rate: record.tax_rate,
            items: record.items,
            totals,
            notes: record.notes,
            status: record.status,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    /// Replaces all line items and the tax rate together
    ///
    /// # Errors
    ///
    /// - `NotEditable` once the invoice is paid
    /// - `Validation` if `items` is empty
    pub fn replace_items(
        &mut self,
        items: Vec<LineItem>,
        tax_rate: TaxRate,
        now: DateTime<Utc>,
    ) -> Result<(), InvoiceError> {
        self.ensure_editable()?;
        if items.is_empty() {
            return Err(ValidationError::field("items", "at least one line item is required").into());
        }
        self.totals = InvoiceCalculator::compute(&items, tax_rate)?;
        self.items = items;
        self.tax_rate = tax_rate;
        self.updated_at = now;
        Ok(())
    }

    /// Changes only the tax rate, recomputing totals
    pub fn set_tax_rate(&mut self, tax_rate: TaxRate, now: DateTime<Utc>) -> Result<(), InvoiceError> {
        self.ensure_editable()?;
        self.totals = InvoiceCalculator::compute(&self.items, tax_rate)?;
        self.tax_rate = tax_rate;
        self.updated_at = now;
        Ok(())
    }

    /// Moves the invoice along its lifecycle
    ///
    /// # Errors
    ///
    /// `InvalidStatusTransition` for reverse, skipped or same-state moves.
    pub fn transition_to(&mut self, status: InvoiceStatus, now: DateTime<Utc>) -> Result<(), InvoiceError> {
        if !self.status.can_transition_to(status) {
            return Err(InvoiceError::InvalidStatusTransition {
                from: self.status,
                to: status,
            });
        }
        self.status = status;
        self.updated_at = now;
        Ok(())
    }

    /// Due date has passed and the invoice is unpaid
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        today > self.due_date && self.status != InvoiceStatus::Paid
    }

    fn ensure_editable(&self) -> Result<(), InvoiceError> {
        if self.status == InvoiceStatus::Paid {
            return Err(InvoiceError::NotEditable(self.status));
        }
        Ok(())
    }

    pub fn id(&self) -> InvoiceId {
        self.id
    }

    pub fn owner(&self) -> UserId {
        self.owner
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn client(&self) -> &ClientDetails {
        &self.client
    }

    pub fn issue_date(&self) -> NaiveDate {
        self.issue_date
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn currency(&self) -> CurrencyCode {
        self.currency
    }

    pub fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn totals(&self) -> InvoiceTotals {
        self.totals
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
