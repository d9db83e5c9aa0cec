use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// ISO 4217-style currency code.
///
/// Currency codes are metadata for the pricing engine: they select default
/// risk-free rates and are carried through to results unchanged.
///
/// # Examples
///
/// ```
/// use fx_hedge_engine::core::currency::CurrencyCode;
///
/// let usd = CurrencyCode::new("usd");
/// assert_eq!(usd.as_str(), "USD");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Create a currency code. Codes are normalised to upper case.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CurrencyCode {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

/// Errors arising from risk-free rate lookups.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RateError {
    #[error("no risk-free rate configured for {currency}")]
    RateNotFound { currency: CurrencyCode },
    #[error("risk-free rate must be finite and above -100%, got {rate} for {currency}")]
    InvalidRate { currency: CurrencyCode, rate: f64 },
}

/// A currency pair quoted as `quote` units per one `base` unit.
///
/// For USD/MXN at 19.0, one US dollar costs 19 pesos: USD is the foreign
/// currency being hedged and MXN is the domestic currency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    pub base: CurrencyCode,
    pub quote: CurrencyCode,
}

impl CurrencyPair {
    pub fn new(base: CurrencyCode, quote: CurrencyCode) -> Self {
        Self { base, quote }
    }

    /// Parse a six-letter pair such as `"USDMXN"` or a slashed `"USD/MXN"`.
    pub fn parse(pair: &str) -> Option<Self> {
        let cleaned: String = pair.chars().filter(|c| c.is_ascii_alphabetic()).collect();
        if cleaned.len() != 6 {
            return None;
        }
        Some(Self::new(
            CurrencyCode::new(&cleaned[..3]),
            CurrencyCode::new(&cleaned[3..]),
        ))
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// Annual continuously-compounded risk-free rates per currency.
///
/// Used by the orchestrator to fill in domestic and foreign rates that a
/// request leaves out. The table is plain configuration: it is built once
/// and handed to the orchestrator, never read from global state.
///
/// # Examples
///
/// ```
/// use fx_hedge_engine::core::currency::{CurrencyCode, RiskFreeRateTable};
///
/// let mut rates = RiskFreeRateTable::new();
/// rates.set_rate(CurrencyCode::new("MXN"), 0.09).unwrap();
///
/// assert_eq!(rates.get_rate(&CurrencyCode::new("MXN")).unwrap(), 0.09);
/// assert!(rates.get_rate(&CurrencyCode::new("CHF")).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskFreeRateTable {
    rates: HashMap<CurrencyCode, f64>,
}

impl RiskFreeRateTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Long-end government yields for the currencies the platform quotes.
    pub fn with_market_defaults() -> Self {
        let defaults = [
            ("USD", 0.0450),
            ("EUR", 0.0300),
            ("GBP", 0.0420),
            ("JPY", 0.0080),
            ("MXN", 0.0900),
            ("COP", 0.1100),
            ("BRL", 0.1150),
            ("CLP", 0.0580),
            ("PEN", 0.0650),
            ("ARS", 0.1800),
            ("UYU", 0.0850),
        ];
        Self {
            rates: defaults
                .iter()
                .map(|(code, rate)| (CurrencyCode::new(*code), *rate))
                .collect(),
        }
    }

    /// Set the rate for a currency, replacing any previous value.
    pub fn set_rate(&mut self, currency: CurrencyCode, rate: f64) -> Result<(), RateError> {
        if !rate.is_finite() || rate <= -1.0 {
            return Err(RateError::InvalidRate { currency, rate });
        }
        self.rates.insert(currency, rate);
        Ok(())
    }

    /// Get the configured rate for a currency.
    pub fn get_rate(&self, currency: &CurrencyCode) -> Result<f64, RateError> {
        self.rates
            .get(currency)
            .copied()
            .ok_or_else(|| RateError::RateNotFound {
                currency: currency.clone(),
            })
    }

    /// Check every stored rate; a deserialized table bypasses `set_rate`.
    pub fn validate(&self) -> Result<(), RateError> {
        for (currency, rate) in &self.rates {
            if !rate.is_finite() || *rate <= -1.0 {
                return Err(RateError::InvalidRate {
                    currency: currency.clone(),
                    rate: *rate,
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}
