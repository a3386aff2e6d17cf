//! Kernel errors

use thiserror::Error;

use crate::currency::CurrencyCode;
use crate::identifiers::InvalidId;
use crate::money::MoneyError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Well-formed code missing from the currency table
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(CurrencyCode),

    #[error(transparent)]
    InvalidId(#[from] InvalidId),

    /// Reference tables that contradict themselves; fatal at startup
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation(message.into())
    }

    /// Returns true for errors caused by caller input
    pub fn is_validation(&self) -> bool {
        !matches!(self, CoreError::Configuration(_))
    }
}
