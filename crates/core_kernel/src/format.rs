//! Human-readable money formatting
//!
//! Formatting is the only place amounts get rounded. Zero-decimal currencies
//! (yen, won) drop the fraction by truncation; everything else rounds to the
//! currency's precision with banker's rounding. Integer digits are grouped
//! with `,` and the currency symbol leads.

use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::Arc;

use crate::currency::{CurrencyCode, CurrencyDefinition, CurrencyTable};
use crate::money::Money;

/// Formats amounts according to the currency table
#[derive(Debug, Clone)]
pub struct MoneyFormatter {
    currencies: Arc<CurrencyTable>,
}

impl MoneyFormatter {
    /// Creates a formatter over a currency table
    pub fn new(currencies: Arc<CurrencyTable>) -> Self {
        Self { currencies }
    }

    /// The table this formatter reads from
    pub fn currencies(&self) -> &CurrencyTable {
        &self.currencies
    }

    /// Formats an amount in the given currency
    ///
    /// Unknown or malformed codes fall back to the table's default currency.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use core_kernel::{CurrencyTable, MoneyFormatter};
    /// use rust_decimal_macros::dec;
    ///
    /// let formatter = MoneyFormatter::new(Arc::new(CurrencyTable::standard()));
    /// assert_eq!(formatter.format(dec!(1500.75), "JPY"), "¥1,500");
    /// assert_eq!(formatter.format(dec!(1000), "USD"), "$1,000.00");
    /// ```
    pub fn format(&self, amount: Decimal, currency_code: &str) -> String {
        let definition = self.currencies.resolve(currency_code);
        if definition.code.as_str() != currency_code.trim().to_ascii_uppercase() {
            tracing::debug!(
                requested = currency_code,
                resolved = %definition.code,
                "Unknown currency, formatting with default"
            );
        }
        format_with(definition, amount)
    }

    /// Formats a Money value in its own currency
    pub fn format_money(&self, money: &Money) -> String {
        self.format(money.amount(), money.currency().as_str())
    }

    /// Returns a formatter fixed to one currency
    pub fn bind(&self, currency: CurrencyCode) -> BoundFormatter {
        BoundFormatter {
            definition: self.currencies.resolve(currency.as_str()).clone(),
        }
    }
}

/// A formatter bound to a single currency, handed to presentation code
#[derive(Debug, Clone)]
pub struct BoundFormatter {
    definition: CurrencyDefinition,
}

impl BoundFormatter {
    /// Formats an amount in the bound currency
    pub fn format_amount(&self, value: Decimal) -> String {
        format_with(&self.definition, value)
    }

    /// The bound currency
    pub fn currency(&self) -> &CurrencyDefinition {
        &self.definition
    }
}

fn format_with(definition: &CurrencyDefinition, amount: Decimal) -> String {
    let dp = definition.decimal_places;
    let shown = if dp == 0 {
        amount.trunc()
    } else {
        amount.round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven)
    };

    let digits = format!("{:.*}", dp as usize, shown.abs());
    let (integer, fraction) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits.as_str(), None),
    };

    let mut out = String::with_capacity(digits.len() + definition.symbol.len() + 4);
    if shown.is_sign_negative() && !shown.is_zero() {
        out.push('-');
    }
    out.push_str(&definition.symbol);
    out.push_str(&group_thousands(integer));
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

fn group_thousands(integer: &str) -> String {
    let len = integer.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
