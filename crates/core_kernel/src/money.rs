//! Money types with precise decimal arithmetic
//!
//! Amounts are `rust_decimal::Decimal` end to end. Nothing here rounds:
//! stored values keep full precision and rounding happens only when an
//! amount is rendered by the [`MoneyFormatter`](crate::format::MoneyFormatter).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::currency::CurrencyCode;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Currency mismatch: cannot combine {0} and {1}")]
    CurrencyMismatch(String, String),

    #[error("Tax rate {0} is outside 0-100")]
    TaxRateOutOfRange(Decimal),

    #[error("Amount is too large to represent")]
    Overflow,
}

/// An amount tagged with its currency
///
/// Invoices keep bare `Decimal` totals next to a single currency; `Money`
/// is for the places where amounts in different currencies meet, such as
/// conversion and formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: CurrencyCode,
}

impl Money {
    pub fn new(amount: Decimal, currency: CurrencyCode) -> Self {
        Self { amount, currency }
    }

    pub fn zero(currency: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> CurrencyCode {
        self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Adds two amounts of the same currency
    ///
    /// # Errors
    ///
    /// `MoneyError::CurrencyMismatch` when the currencies differ.
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch(
                self.currency.to_string(),
                other.currency.to_string(),
            ));
        }
        self.amount
            .checked_add(other.amount)
            .map(|amount| Self::new(amount, self.currency))
            .ok_or(MoneyError::Overflow)
    }

    /// Re-expresses the amount in `target` using a multiplier
    ///
    /// # Errors
    ///
    /// `MoneyError::Overflow` if the product does not fit a `Decimal`.
    pub fn convert(&self, rate: Decimal, target: CurrencyCode) -> Result<Self, MoneyError> {
        self.amount
            .checked_mul(rate)
            .map(|amount| Self::new(amount, target))
            .ok_or(MoneyError::Overflow)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.currency, self.amount)
    }
}

/// A tax rate expressed as a percentage in the range 0 to 100 inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct TaxRate {
    percentage: Decimal,
}

impl TaxRate {
    /// No tax
    pub const ZERO: TaxRate = TaxRate {
        percentage: Decimal::ZERO,
    };

    /// Creates a rate from a percentage (e.g. 10 for 10%)
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::TaxRateOutOfRange` outside 0 to 100
    pub fn from_percentage(percentage: Decimal) -> Result<Self, MoneyError> {
        if percentage < Decimal::ZERO || percentage > dec!(100) {
            return Err(MoneyError::TaxRateOutOfRange(percentage));
        }
        Ok(Self { percentage })
    }

    /// Returns the rate as a percentage
    pub fn as_percentage(&self) -> Decimal {
        self.percentage
    }

    /// Returns the rate as a fraction (e.g. 0.1 for 10%)
    pub fn as_fraction(&self) -> Decimal {
        self.percentage / dec!(100)
    }

    /// Tax due on a base amount, at full precision
    ///
    /// The fraction is at most one, so the result never exceeds `base`.
    pub fn tax_on(&self, base: Decimal) -> Decimal {
        base * self.as_fraction()
    }
}

impl TryFrom<Decimal> for TaxRate {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::from_percentage(value)
    }
}

impl From<TaxRate> for Decimal {
    fn from(rate: TaxRate) -> Decimal {
        rate.percentage
    }
}

impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percentage.normalize())
    }
}
