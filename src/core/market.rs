use crate::core::error::{ensure_finite, ensure_positive, EngineError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// European option direction.
///
/// A call is the right to buy the foreign currency at the strike and hedges
/// an importer who must pay foreign currency later. A put is the right to
/// sell it and hedges an exporter who will receive foreign currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    #[default]
    Call,
    Put,
}

impl OptionType {
    /// +1 for a call, -1 for a put.
    ///
    /// Every payoff in the engine is written as `max(0, side * (S - K))`.
    pub fn side(self) -> f64 {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OptionType::Call => "call",
            OptionType::Put => "put",
        }
    }

    /// Terminal payoff per unit of notional.
    pub fn intrinsic(self, spot: f64, strike: f64) -> f64 {
        (self.side() * (spot - strike)).max(0.0)
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "call" => Ok(OptionType::Call),
            "put" => Ok(OptionType::Put),
            other => Err(EngineError::validation(
                "option_type",
                format!("expected 'call' or 'put', got '{other}'"),
            )),
        }
    }
}

/// Market inputs for one calculation.
///
/// Rates are annual and continuously compounded. The spot is quoted as
/// domestic currency per unit of foreign currency (MXN per USD).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketParameters {
    pub spot_rate: f64,
    /// Annualized volatility; zero is allowed and prices at intrinsic value.
    pub volatility: f64,
    pub domestic_rate: f64,
    pub foreign_rate: f64,
    pub time_to_maturity_years: f64,
}

impl MarketParameters {
    /// Create validated market parameters.
    ///
    /// # Examples
    ///
    /// ```
    /// use fx_hedge_engine::core::market::MarketParameters;
    ///
    /// let params = MarketParameters::new(19.0, 0.20, 0.04, 0.07, 0.25).unwrap();
    /// assert_eq!(params.spot_rate, 19.0);
    ///
    /// assert!(MarketParameters::new(19.0, 0.20, 0.04, 0.07, 0.0).is_err());
    /// ```
    pub fn new(
        spot_rate: f64,
        volatility: f64,
        domestic_rate: f64,
        foreign_rate: f64,
        time_to_maturity_years: f64,
    ) -> Result<Self, EngineError> {
        let params = Self {
            spot_rate,
            volatility,
            domestic_rate,
            foreign_rate,
            time_to_maturity_years,
        };
        params.validate()?;
        Ok(params)
    }

    /// Check the domain of every field.
    ///
    /// Fields are public, so every engine entry point calls this again
    /// rather than trusting the constructor.
    pub fn validate(&self) -> Result<(), EngineError> {
        ensure_positive("spot_rate", self.spot_rate)?;
        ensure_finite("volatility", self.volatility)?;
        if self.volatility < 0.0 {
            return Err(EngineError::validation(
                "volatility",
                format!("must be non-negative, got {}", self.volatility),
            ));
        }
        ensure_finite("domestic_rate", self.domestic_rate)?;
        ensure_finite("foreign_rate", self.foreign_rate)?;
        ensure_positive("time_to_maturity_years", self.time_to_maturity_years)?;
        Ok(())
    }

    /// Same market with a different volatility.
    pub fn with_volatility(mut self, volatility: f64) -> Self {
        self.volatility = volatility;
        self
    }

    /// Same market with a different maturity.
    pub fn with_maturity(mut self, time_to_maturity_years: f64) -> Self {
        self.time_to_maturity_years = time_to_maturity_years;
        self
    }

    /// e^(-r_f T)
    pub fn foreign_discount(&self) -> f64 {
        (-self.foreign_rate * self.time_to_maturity_years).exp()
    }

    /// e^(-r_d T)
    pub fn domestic_discount(&self) -> f64 {
        (-self.domestic_rate * self.time_to_maturity_years).exp()
    }

    /// σ√T, the total standard deviation of log spot at maturity.
    pub fn total_volatility(&self) -> f64 {
        self.volatility * self.time_to_maturity_years.sqrt()
    }
}

/// What the treasury wants to protect and how much.
///
/// The strike is derived from spot and the protection level: above spot for
/// a call, below spot for a put. An explicit strike can override that.
///
/// # Examples
///
/// ```
/// use fx_hedge_engine::core::market::{HedgeSpecification, OptionType};
///
/// let hedge = HedgeSpecification::new(OptionType::Call, 0.05, 1_000_000.0).unwrap();
/// let strike = hedge.strike_price(19.0).unwrap();
/// assert!((strike - 19.95).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HedgeSpecification {
    option_type: OptionType,
    protection_level: f64,
    notional_amount: f64,
    strike_override: Option<f64>,
}

impl HedgeSpecification {
    /// Create a validated hedge specification.
    pub fn new(
        option_type: OptionType,
        protection_level: f64,
        notional_amount: f64,
    ) -> Result<Self, EngineError> {
        let spec = Self {
            option_type,
            protection_level,
            notional_amount,
            strike_override: None,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Use a fixed strike instead of deriving one from the protection level.
    pub fn with_strike(mut self, strike: f64) -> Result<Self, EngineError> {
        ensure_positive("strike_price", strike)?;
        self.strike_override = Some(strike);
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        ensure_finite("protection_level", self.protection_level)?;
        if !(0.0..1.0).contains(&self.protection_level) {
            return Err(EngineError::validation(
                "protection_level",
                format!("must lie in [0, 1), got {}", self.protection_level),
            ));
        }
        ensure_positive("notional_amount", self.notional_amount)?;
        if let Some(strike) = self.strike_override {
            ensure_positive("strike_price", strike)?;
        }
        Ok(())
    }

    /// Strike for the given spot.
    ///
    /// `spot * (1 + p)` for a call and `spot * (1 - p)` for a put, unless an
    /// explicit strike was set.
    pub fn strike_price(&self, spot_rate: f64) -> Result<f64, EngineError> {
        self.validate()?;
        if let Some(strike) = self.strike_override {
            return Ok(strike);
        }
        ensure_positive("spot_rate", spot_rate)?;
        let strike = spot_rate * (1.0 + self.option_type.side() * self.protection_level);
        // Unreachable for p in [0, 1), kept as the last line of defence.
        ensure_positive("strike_price", strike)
    }

    // --- Accessors ---

    pub fn option_type(&self) -> OptionType {
        self.option_type
    }

    pub fn protection_level(&self) -> f64 {
        self.protection_level
    }

    pub fn notional_amount(&self) -> f64 {
        self.notional_amount
    }

    pub fn strike_override(&self) -> Option<f64> {
        self.strike_override
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_option_type_parse() {
        assert_eq!("Call".parse::<OptionType>().unwrap(), OptionType::Call);
        assert_eq!(" put ".parse::<OptionType>().unwrap(), OptionType::Put);
        let err = "straddle".parse::<OptionType>().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_option_type_serde() {
        let json = serde_json::to_string(&OptionType::Put).unwrap();
        assert_eq!(json, "\"put\"");
        let parsed: OptionType = serde_json::from_str("\"call\"").unwrap();
        assert_eq!(parsed, OptionType::Call);
    }

    #[test]
    fn test_intrinsic() {
        assert_eq!(OptionType::Call.intrinsic(21.0, 20.0), 1.0);
        assert_eq!(OptionType::Call.intrinsic(19.0, 20.0), 0.0);
        assert_eq!(OptionType::Put.intrinsic(19.0, 20.0), 1.0);
        assert_eq!(OptionType::Put.intrinsic(21.0, 20.0), 0.0);
    }

    #[test]
    fn test_market_parameters_validation() {
        assert!(MarketParameters::new(19.0, 0.0, 0.04, 0.07, 0.25).is_ok());
        assert!(MarketParameters::new(19.0, 0.2, -0.01, -0.005, 0.25).is_ok());

        assert!(MarketParameters::new(0.0, 0.2, 0.04, 0.07, 0.25).is_err());
        assert!(MarketParameters::new(19.0, -0.2, 0.04, 0.07, 0.25).is_err());
        assert!(MarketParameters::new(19.0, 0.2, 0.04, 0.07, -1.0).is_err());
        assert!(MarketParameters::new(19.0, 0.2, f64::NAN, 0.07, 0.25).is_err());
    }

    #[test]
    fn test_discount_factors() {
        let params = MarketParameters::new(19.0, 0.2, 0.04, 0.07, 0.25).unwrap();
        assert_relative_eq!(params.domestic_discount(), (-0.01f64).exp());
        assert_relative_eq!(params.foreign_discount(), (-0.0175f64).exp());
        assert_relative_eq!(params.total_volatility(), 0.1);
    }

    #[test]
    fn test_put_strike_below_spot() {
        let hedge = HedgeSpecification::new(OptionType::Put, 0.10, 500_000.0).unwrap();
        assert_relative_eq!(hedge.strike_price(4000.0).unwrap(), 3600.0);
    }

    #[test]
    fn test_zero_protection_is_at_the_money() {
        let hedge = HedgeSpecification::new(OptionType::Call, 0.0, 1.0).unwrap();
        assert_eq!(hedge.strike_price(19.0).unwrap(), 19.0);
    }

    #[test]
    fn test_protection_level_bounds() {
        assert!(HedgeSpecification::new(OptionType::Put, 1.0, 1.0).is_err());
        assert!(HedgeSpecification::new(OptionType::Put, 1.5, 1.0).is_err());
        assert!(HedgeSpecification::new(OptionType::Call, -0.05, 1.0).is_err());
        assert!(HedgeSpecification::new(OptionType::Put, 0.999, 1.0).is_ok());
    }

    #[test]
    fn test_notional_must_be_positive() {
        assert!(HedgeSpecification::new(OptionType::Call, 0.05, 0.0).is_err());
        assert!(HedgeSpecification::new(OptionType::Call, 0.05, -10.0).is_err());
    }

    #[test]
    fn test_strike_override() {
        let hedge = HedgeSpecification::new(OptionType::Call, 0.05, 1.0)
            .unwrap()
            .with_strike(20.5)
            .unwrap();
        assert_eq!(hedge.strike_price(19.0).unwrap(), 20.5);

        let bad = HedgeSpecification::new(OptionType::Call, 0.05, 1.0)
            .unwrap()
            .with_strike(0.0);
        assert!(bad.is_err());
    }
}
