//! Exchange rate lookup for display-time conversion
//!
//! Rates are a static table keyed by ordered currency pair. Each pair is
//! stored in one direction only; the opposite direction is answered with
//! the reciprocal, so `rate(a, b) * rate(b, a)` is one by construction.
//! Converted figures are never written back to stored invoice totals.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use crate::currency::{CurrencyCode, CurrencyTable};
use crate::error::CoreError;
use crate::money::{Money, MoneyError};

/// Where a quoted rate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    /// Same currency on both sides
    Identity,
    /// Found under the requested pair
    Direct,
    /// Reciprocal of the reversed pair
    Inverse,
    /// No data for the pair; the rate is a 1.0 placeholder
    Unavailable,
}

/// A rate together with its provenance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateQuote {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    pub rate: Decimal,
    pub source: RateSource,
}

impl RateQuote {
    /// Returns true if the rate reflects real table data or identity
    pub fn is_available(&self) -> bool {
        self.source != RateSource::Unavailable
    }
}

/// Static table of conversion multipliers
#[derive(Debug, Clone)]
pub struct ExchangeRateTable {
    currencies: Arc<CurrencyTable>,
    rates: HashMap<(CurrencyCode, CurrencyCode), Decimal>,
}

impl ExchangeRateTable {
    /// Creates an empty table validated against the given currencies
    pub fn new(currencies: Arc<CurrencyTable>) -> Self {
        Self {
            currencies,
            rates: HashMap::new(),
        }
    }

    /// The reference rates shipped with the application
    ///
    /// Quoted against USD plus a EUR/GBP cross rate. These are fixed
    /// figures for display, not live market data.
    ///
    /// # Errors
    ///
    /// Fails if the currency table lacks any of the quoted codes
    pub fn standard(currencies: Arc<CurrencyTable>) -> Result<Self, CoreError> {
        let pairs = [
            ("USD", "EUR", dec!(0.92)),
            ("USD", "GBP", dec!(0.79)),
            ("USD", "JPY", dec!(149.50)),
            ("USD", "CAD", dec!(1.36)),
            ("USD", "AUD", dec!(1.52)),
            ("USD", "CHF", dec!(0.88)),
            ("USD", "CNY", dec!(7.24)),
            ("USD", "INR", dec!(83.12)),
            ("USD", "BRL", dec!(4.97)),
            ("USD", "KRW", dec!(1330)),
            ("EUR", "GBP", dec!(0.86)),
        ];

        pairs
            .into_iter()
            .try_fold(Self::new(currencies), |table, (from, to, rate)| {
                table.with_rate(from.parse()?, to.parse()?, rate)
            })
    }

    /// Adds a rate for an ordered pair
    ///
    /// # Errors
    ///
    /// Returns a configuration error if either code is unsupported, the
    /// pair is an identity, the rate is not positive, or the pair (in
    /// either direction) is already present.
    pub fn with_rate(
        mut self,
        from: CurrencyCode,
        to: CurrencyCode,
        rate: Decimal,
    ) -> Result<Self, CoreError> {
        for code in [from, to] {
            if !self.currencies.contains(code) {
                return Err(CoreError::Configuration(format!(
                    "Exchange rate references unsupported currency {}",
                    code
                )));
            }
        }
        if from == to {
            return Err(CoreError::Configuration(format!(
                "Identity pair {}/{} cannot be configured",
                from, to
            )));
        }
        if rate <= Decimal::ZERO {
            return Err(CoreError::Configuration(format!(
                "Rate for {}/{} must be positive, got {}",
                from, to, rate
            )));
        }
        if self.rates.contains_key(&(from, to)) || self.rates.contains_key(&(to, from)) {
            return Err(CoreError::Configuration(format!(
                "Rate for {}/{} is already defined",
                from, to
            )));
        }

        self.rates.insert((from, to), rate);
        Ok(self)
    }

    /// Quotes a rate with its provenance
    pub fn quote(&self, from: CurrencyCode, to: CurrencyCode) -> RateQuote {
        let (rate, source) = if from == to {
            (Decimal::ONE, RateSource::Identity)
        } else if let Some(rate) = self.rates.get(&(from, to)) {
            (*rate, RateSource::Direct)
        } else if let Some(rate) = self.rates.get(&(to, from)) {
            (Decimal::ONE / *rate, RateSource::Inverse)
        } else {
            (Decimal::ONE, RateSource::Unavailable)
        };

        RateQuote { from, to, rate, source }
    }

    /// Returns the multiplier for converting `from` into `to`
    ///
    /// Pairs with no data in either direction yield 1.0 so invoice display
    /// keeps working; use [`quote`](Self::quote) to tell the cases apart.
    pub fn rate(&self, from: CurrencyCode, to: CurrencyCode) -> Decimal {
        let quote = self.quote(from, to);
        if !quote.is_available() {
            warn!(%from, %to, "No exchange rate for pair, using 1.0");
        }
        quote.rate
    }

    /// Converts an amount between currencies
    ///
    /// # Errors
    ///
    /// `MoneyError::Overflow` if the converted amount does not fit.
    pub fn convert(
        &self,
        amount: Decimal,
        from: CurrencyCode,
        to: CurrencyCode,
    ) -> Result<Decimal, MoneyError> {
        amount
            .checked_mul(self.rate(from, to))
            .ok_or(MoneyError::Overflow)
    }

    /// Converts a Money value into another currency
    pub fn convert_money(&self, money: &Money, to: CurrencyCode) -> Result<Money, MoneyError> {
        money.convert(self.rate(money.currency(), to), to)
    }

    /// Number of configured pairs
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// Returns true if no pairs are configured
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> CurrencyCode {
        s.parse().unwrap()
    }

    fn table() -> ExchangeRateTable {
        ExchangeRateTable::standard(Arc::new(CurrencyTable::standard())).unwrap()
    }

    #[test]
    fn test_identity() {
        let t = table();
        let q = t.quote(code("EUR"), code("EUR"));
        assert_eq!(q.rate, Decimal::ONE);
        assert_eq!(q.source, RateSource::Identity);
    }

    #[test]
    fn test_direct_and_inverse() {
        let t = table();
        assert_eq!(t.rate(code("USD"), code("EUR")), dec!(0.92));

        let inverse = t.quote(code("JPY"), code("USD"));
        assert_eq!(inverse.source, RateSource::Inverse);
        assert_eq!(inverse.rate, Decimal::ONE / dec!(149.50));
    }

    #[test]
    fn test_missing_pair_falls_back_to_one() {
        let t = table();
        let q = t.quote(code("INR"), code("BRL"));
        assert_eq!(q.source, RateSource::Unavailable);
        assert_eq!(t.rate(code("INR"), code("BRL")), Decimal::ONE);
        assert!(!q.is_available());
    }

    #[test]
    fn test_convert() {
        let t = table();
        assert_eq!(t.convert(dec!(100), code("USD"), code("EUR")).unwrap(), dec!(92.00));

        let usd = Money::new(dec!(10), code("USD"));
        let yen = t.convert_money(&usd, code("JPY")).unwrap();
        assert_eq!(yen.amount(), dec!(1495.00));
        assert_eq!(yen.currency(), code("JPY"));
    }

    #[test]
    fn test_convert_overflow_is_an_error() {
        let t = table();
        assert_eq!(
            t.convert(Decimal::MAX, code("USD"), code("KRW")),
            Err(MoneyError::Overflow)
        );
        let huge = Money::new(Decimal::MAX, code("USD"));
        assert!(t.convert_money(&huge, code("JPY")).is_err());
    }

    #[test]
    fn test_rejects_duplicate_and_reverse_pairs() {
        let t = table();
        assert!(t.clone().with_rate(code("EUR"), code("USD"), dec!(1.08)).is_err());
        assert!(t.with_rate(code("USD"), code("EUR"), dec!(0.93)).is_err());
    }

    #[test]
    fn test_rejects_unknown_currency_and_bad_rate() {
        let currencies = Arc::new(CurrencyTable::standard());
        let t = ExchangeRateTable::new(currencies);
        assert!(t.clone().with_rate(code("USD"), code("XYZ"), dec!(1)).is_err());
        assert!(t.clone().with_rate(code("USD"), code("EUR"), dec!(0)).is_err());
        assert!(t.with_rate(code("USD"), code("USD"), dec!(1)).is_err());
    }
}
