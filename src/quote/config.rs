use crate::analysis::payoff::{DEFAULT_RANGE_FRACTION, MAX_CURVE_POINTS};
use crate::analysis::scenario::ScenarioGrid;
use crate::core::currency::RiskFreeRateTable;
use crate::core::error::{ensure_finite, ensure_positive, EngineError};
use crate::pricing::garman_kohlhagen::DAYS_PER_YEAR;
use crate::simulation::monte_carlo::{MonteCarloRiskSimulator, DEFAULT_BIN_COUNT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors loading an [`EngineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(#[from] EngineError),
}

/// Sampling of the charted payoff curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PayoffCurveConfig {
    pub point_count: usize,
    pub range_fraction: f64,
}

impl Default for PayoffCurveConfig {
    fn default() -> Self {
        Self {
            point_count: 50,
            range_fraction: DEFAULT_RANGE_FRACTION,
        }
    }
}

/// Defaults and limits applied by the [`PricingOrchestrator`].
///
/// Every field has a default, so a JSON config only needs the keys it
/// changes.
///
/// [`PricingOrchestrator`]: crate::quote::orchestrator::PricingOrchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub default_protection_level: f64,
    pub default_time_to_maturity_days: u32,
    /// Used when a request has no volatility and none can be estimated.
    pub default_volatility: f64,
    pub volatility_lookback_days: usize,
    pub min_volatility_observations: usize,
    pub monte_carlo_paths: usize,
    pub max_monte_carlo_paths: usize,
    pub histogram_bins: usize,
    pub scenario_grid: ScenarioGrid,
    pub payoff_curve: PayoffCurveConfig,
    pub risk_free_rates: RiskFreeRateTable,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_protection_level: 0.05,
            default_time_to_maturity_days: 90,
            default_volatility: 0.20,
            volatility_lookback_days: 90,
            min_volatility_observations: 2,
            monte_carlo_paths: 10_000,
            max_monte_carlo_paths: 5_000_000,
            histogram_bins: DEFAULT_BIN_COUNT,
            scenario_grid: ScenarioGrid::default(),
            payoff_curve: PayoffCurveConfig::default(),
            risk_free_rates: RiskFreeRateTable::with_market_defaults(),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON config and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        ensure_finite("default_protection_level", self.default_protection_level)?;
        if !(0.0..1.0).contains(&self.default_protection_level) {
            return Err(EngineError::validation(
                "default_protection_level",
                format!("must lie in [0, 1), got {}", self.default_protection_level),
            ));
        }
        if self.default_time_to_maturity_days == 0 {
            return Err(EngineError::validation(
                "default_time_to_maturity_days",
                "must be positive",
            ));
        }
        ensure_finite("default_volatility", self.default_volatility)?;
        if self.default_volatility < 0.0 {
            return Err(EngineError::validation(
                "default_volatility",
                format!("must be non-negative, got {}", self.default_volatility),
            ));
        }
        if self.volatility_lookback_days == 0 {
            return Err(EngineError::validation("volatility_lookback_days", "must be positive"));
        }
        if self.monte_carlo_paths == 0 || self.monte_carlo_paths > self.max_monte_carlo_paths {
            return Err(EngineError::validation(
                "monte_carlo_paths",
                format!(
                    "must lie in [1, {}], got {}",
                    self.max_monte_carlo_paths, self.monte_carlo_paths
                ),
            ));
        }
        MonteCarloRiskSimulator::new(self.histogram_bins)?;
        self.scenario_grid.validate()?;
        if !(2..=MAX_CURVE_POINTS).contains(&self.payoff_curve.point_count) {
            return Err(EngineError::validation(
                "payoff_curve.point_count",
                format!(
                    "must lie in [2, {}], got {}",
                    MAX_CURVE_POINTS, self.payoff_curve.point_count
                ),
            ));
        }
        ensure_positive("payoff_curve.range_fraction", self.payoff_curve.range_fraction)?;
        if self.payoff_curve.range_fraction >= 1.0 {
            return Err(EngineError::validation(
                "payoff_curve.range_fraction",
                format!("must be below 1, got {}", self.payoff_curve.range_fraction),
            ));
        }
        self.risk_free_rates.validate()?;
        Ok(())
    }

    /// Default maturity on a 365-day year.
    pub fn default_time_to_maturity_years(&self) -> f64 {
        f64::from(self.default_time_to_maturity_days) / DAYS_PER_YEAR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::CurrencyCode;

    #[test]
    fn test_default_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.default_time_to_maturity_years() - 90.0 / 365.0).abs() < 1e-15);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(
            r#"{ "default_volatility": 0.12, "risk_free_rates": { "CHF": 0.01 } }"#,
        )
        .unwrap();
        assert_eq!(config.default_volatility, 0.12);
        assert_eq!(config.monte_carlo_paths, 10_000);
        assert_eq!(config.risk_free_rates.len(), 1);
        assert_eq!(
            config.risk_free_rates.get_rate(&CurrencyCode::new("CHF")).unwrap(),
            0.01
        );
    }

    #[test]
    fn test_invalid_json_values() {
        assert!(matches!(
            EngineConfig::from_json(r#"{ "default_protection_level": 1.2 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{ "monte_carlo_paths": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_unbounded_sizes_rejected() {
        let fine_grid = r#"{ "scenario_grid": { "lower_shift": -0.1, "upper_shift": 0.1, "step": 1e-300 } }"#;
        assert!(matches!(
            EngineConfig::from_json(fine_grid),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{ "payoff_curve": { "point_count": 10001, "range_fraction": 0.15 } }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{ "histogram_bins": 1000000 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{ "histogram_bins": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_round_trip() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(EngineConfig::from_json(&json).unwrap(), config);
    }
}
