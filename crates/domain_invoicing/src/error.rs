//! Invoicing domain errors

use std::fmt;
use thiserror::Error;

use core_kernel::{CoreError, MoneyError, PortError};
use domain_membership::{Feature, MembershipError, MembershipTier, Quota};

use crate::invoice::InvoiceStatus;

/// Malformed or out-of-range input
///
/// Raised before anything is written. `row` is the 1-based position of the
/// offending line item in the submitted list, blank rows included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
    pub field: Option<String>,
    pub row: Option<usize>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: None,
            row: None,
        }
    }

    /// An error on a named invoice field
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: Some(field.into()),
            row: None,
        }
    }

    /// An error on one field of a line item
    pub fn row(row: usize, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: Some(field.into()),
            row: Some(row),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.row, &self.field) {
            (Some(row), Some(field)) => write!(f, "item {} {}: {}", row, field, self.message),
            (Some(row), None) => write!(f, "item {}: {}", row, self.message),
            (None, Some(field)) => write!(f, "{}: {}", field, self.message),
            (None, None) => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors that can occur in the invoicing domain
#[derive(Debug, Error)]
pub enum InvoiceError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The tier's monthly allowance is used up
    #[error("Monthly invoice limit reached on the {tier} plan ({used} of {max} used)", max = .limit.as_raw())]
    QuotaExceeded {
        tier: MembershipTier,
        used: u64,
        limit: Quota,
    },

    /// The tier does not include a feature the request needs
    #[error("The {tier} plan does not include {feature}")]
    FeatureUnavailable {
        tier: MembershipTier,
        feature: Feature,
    },

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition {
        from: InvoiceStatus,
        to: InvoiceStatus,
    },

    /// Paid invoices are frozen
    #[error("Invoice is {0} and can no longer be edited")]
    NotEditable(InvoiceStatus),

    #[error("Invoice not found: {0}")]
    NotFound(String),

    #[error("Account is deactivated")]
    AccountInactive,

    #[error(transparent)]
    Membership(#[from] MembershipError),

    #[error("Storage error: {0}")]
    Storage(#[from] PortError),
}

impl InvoiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        InvoiceError::Validation(ValidationError::new(message))
    }

    pub fn not_found(id: impl fmt::Display) -> Self {
        InvoiceError::NotFound(id.to_string())
    }

    /// Returns true for errors caused by caller input
    pub fn is_validation(&self) -> bool {
        match self {
            InvoiceError::Validation(_) => true,
            InvoiceError::Membership(e) => e.is_validation(),
            _ => false,
        }
    }
}

impl From<CoreError> for InvoiceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Money(e) => e.into(),
            CoreError::Validation(message) => InvoiceError::validation(message),
            CoreError::UnsupportedCurrency(_) | CoreError::InvalidId(_) => {
                InvoiceError::validation(err.to_string())
            }
            CoreError::Configuration(message) => {
                InvoiceError::Membership(MembershipError::Configuration(message))
            }
        }
    }
}

impl From<MoneyError> for InvoiceError {
    fn from(err: MoneyError) -> Self {
        match err {
            MoneyError::TaxRateOutOfRange(_) => {
                InvoiceError::Validation(ValidationError::field("tax_rate", err.to_string()))
            }
            other => InvoiceError::validation(other.to_string()),
        }
    }
}
