//! Currency reference data
//!
//! The currency table is immutable configuration built once at startup and
//! shared (by reference or `Arc`) with every component that needs it. The
//! same table feeds computation and presentation so the two never disagree
//! on a symbol or a precision.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Code used when a requested currency is not in the table
pub const DEFAULT_CURRENCY: CurrencyCode = CurrencyCode(*b"USD");

/// A three-letter currency code (e.g. `USD`, `JPY`)
///
/// Codes are normalised to upper case on parse. The code itself says nothing
/// about whether a currency is supported; that is the table's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode([u8; 3]);

impl CurrencyCode {
    /// Returns the code as a string slice
    pub fn as_str(&self) -> &str {
        // Only ASCII letters are ever stored
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl FromStr for CurrencyCode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let bytes = trimmed.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(CoreError::validation(format!(
                "Invalid currency code '{}': expected three letters",
                trimmed
            )));
        }
        let mut code = [0u8; 3];
        for (slot, byte) in code.iter_mut().zip(bytes) {
            *slot = byte.to_ascii_uppercase();
        }
        Ok(Self(code))
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> String {
        code.as_str().to_string()
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display and precision attributes of one currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyDefinition {
    /// Currency code
    pub code: CurrencyCode,
    /// Display name (e.g. "US Dollar")
    pub name: String,
    /// Symbol glyph placed before formatted amounts
    pub symbol: String,
    /// Number of fractional digits shown when formatting
    pub decimal_places: u32,
}

impl CurrencyDefinition {
    /// Creates a currency definition
    pub fn new(
        code: CurrencyCode,
        name: impl Into<String>,
        symbol: impl Into<String>,
        decimal_places: u32,
    ) -> Self {
        Self {
            code,
            name: name.into(),
            symbol: symbol.into(),
            decimal_places,
        }
    }
}

/// The table of supported currencies
#[derive(Debug, Clone)]
pub struct CurrencyTable {
    definitions: BTreeMap<CurrencyCode, CurrencyDefinition>,
    default_code: CurrencyCode,
}

impl CurrencyTable {
    /// Builds a table from definitions and a fallback code
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the fallback code is not one of the
    /// definitions, or if a code appears twice.
    pub fn new(
        definitions: impl IntoIterator<Item = CurrencyDefinition>,
        default_code: CurrencyCode,
    ) -> Result<Self, CoreError> {
        let mut map = BTreeMap::new();
        for definition in definitions {
            let code = definition.code;
            if map.insert(code, definition).is_some() {
                return Err(CoreError::Configuration(format!(
                    "Currency {} defined more than once",
                    code
                )));
            }
        }

        if !map.contains_key(&default_code) {
            return Err(CoreError::Configuration(format!(
                "Default currency {} is not in the table",
                default_code
            )));
        }

        Ok(Self {
            definitions: map,
            default_code,
        })
    }

    /// The standard set of supported currencies with USD as fallback
    pub fn standard() -> Self {
        let rows: [(&[u8; 3], &str, &str, u32); 11] = [
            (b"USD", "US Dollar", "$", 2),
            (b"EUR", "Euro", "€", 2),
            (b"GBP", "British Pound", "£", 2),
            (b"JPY", "Japanese Yen", "¥", 0),
            (b"CAD", "Canadian Dollar", "C$", 2),
            (b"AUD", "Australian Dollar", "A$", 2),
            (b"CHF", "Swiss Franc", "CHF", 2),
            (b"CNY", "Chinese Yuan", "¥", 2),
            (b"INR", "Indian Rupee", "₹", 2),
            (b"BRL", "Brazilian Real", "R$", 2),
            (b"KRW", "South Korean Won", "₩", 0),
        ];

        let definitions = rows
            .iter()
            .map(|(code, name, symbol, dp)| {
                let code = CurrencyCode(**code);
                (code, CurrencyDefinition::new(code, *name, *symbol, *dp))
            })
            .collect();

        Self {
            definitions,
            default_code: DEFAULT_CURRENCY,
        }
    }

    /// Looks up a definition by code
    pub fn get(&self, code: CurrencyCode) -> Option<&CurrencyDefinition> {
        self.definitions.get(&code)
    }

    /// Looks up a definition from raw text; `None` if unparsable or unknown
    pub fn lookup(&self, code: &str) -> Option<&CurrencyDefinition> {
        code.parse::<CurrencyCode>().ok().and_then(|c| self.get(c))
    }

    /// Resolves raw text to a definition, falling back to the default
    pub fn resolve(&self, code: &str) -> &CurrencyDefinition {
        self.lookup(code).unwrap_or_else(|| self.default_definition())
    }

    /// Parses and checks that a code is supported
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed or unsupported codes
    pub fn require(&self, code: &str) -> Result<CurrencyCode, CoreError> {
        let parsed: CurrencyCode = code.parse()?;
        if self.contains(parsed) {
            Ok(parsed)
        } else {
            Err(CoreError::UnsupportedCurrency(parsed))
        }
    }

    /// Returns true if the code is supported
    pub fn contains(&self, code: CurrencyCode) -> bool {
        self.definitions.contains_key(&code)
    }

    /// The fallback code
    pub fn default_code(&self) -> CurrencyCode {
        self.default_code
    }

    /// The fallback definition
    pub fn default_definition(&self) -> &CurrencyDefinition {
        // Presence is checked at construction
        &self.definitions[&self.default_code]
    }

    /// Iterates definitions in code order
    pub fn iter(&self) -> impl Iterator<Item = &CurrencyDefinition> {
        self.definitions.values()
    }

    /// Number of supported currencies
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns true if the table is empty
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl Default for CurrencyTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_parsing_normalises_case() {
        let code: CurrencyCode = " jpy ".parse().unwrap();
        assert_eq!(code.as_str(), "JPY");
    }

    #[test]
    fn test_code_parsing_rejects_bad_input() {
        assert!("US".parse::<CurrencyCode>().is_err());
        assert!("US1".parse::<CurrencyCode>().is_err());
        assert!("USDX".parse::<CurrencyCode>().is_err());
    }

    #[test]
    fn test_standard_table_precision() {
        let table = CurrencyTable::standard();
        assert_eq!(table.lookup("JPY").unwrap().decimal_places, 0);
        assert_eq!(table.lookup("KRW").unwrap().decimal_places, 0);
        assert_eq!(table.lookup("EUR").unwrap().decimal_places, 2);
        assert_eq!(table.len(), 11);
    }

    #[test]
    fn test_resolve_falls_back_to_default() {
        let table = CurrencyTable::standard();
        assert_eq!(table.resolve("XYZ").code, DEFAULT_CURRENCY);
        assert_eq!(table.resolve("not-a-code").code, DEFAULT_CURRENCY);
        assert_eq!(table.resolve("gbp").symbol, "£");
    }

    #[test]
    fn test_require_rejects_unknown() {
        let table = CurrencyTable::standard();
        assert!(table.require("EUR").is_ok());
        assert!(table.require("XYZ").is_err());
    }

    #[test]
    fn test_table_requires_default_present() {
        let eur = CurrencyDefinition::new("EUR".parse().unwrap(), "Euro", "€", 2);
        let result = CurrencyTable::new(vec![eur], DEFAULT_CURRENCY);
        assert!(matches!(result, Err(CoreError::Configuration(_))));
    }

    #[test]
    fn test_code_serde_as_string() {
        let code: CurrencyCode = "CHF".parse().unwrap();
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"CHF\"");
        let back: CurrencyCode = serde_json::from_str("\"chf\"").unwrap();
        assert_eq!(back, code);
    }
}
