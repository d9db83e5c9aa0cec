use crate::core::error::{ensure_finite, ensure_positive, EngineError};
use crate::core::market::{HedgeSpecification, MarketParameters};
use serde::{Deserialize, Serialize};

/// Most points a scenario grid may hold.
pub const MAX_SCENARIO_POINTS: usize = 10_000;

/// Relative spot shocks used to build a scenario table.
///
/// The grid is `spot * (1 + lower_shift + i * step)` for `i = 0..=n`, where
/// `n = round((upper_shift - lower_shift) / step)`. Points are generated from
/// an integer index so identical inputs always give identical rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioGrid {
    pub lower_shift: f64,
    pub upper_shift: f64,
    pub step: f64,
}

impl Default for ScenarioGrid {
    /// -10%, -5%, 0, +5%, +10%.
    fn default() -> Self {
        Self {
            lower_shift: -0.10,
            upper_shift: 0.10,
            step: 0.05,
        }
    }
}

impl ScenarioGrid {
    pub fn new(lower_shift: f64, upper_shift: f64, step: f64) -> Result<Self, EngineError> {
        let grid = Self {
            lower_shift,
            upper_shift,
            step,
        };
        grid.validate()?;
        Ok(grid)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        ensure_finite("scenario_grid.lower_shift", self.lower_shift)?;
        ensure_finite("scenario_grid.upper_shift", self.upper_shift)?;
        ensure_positive("scenario_grid.step", self.step)?;
        if self.lower_shift <= -1.0 {
            return Err(EngineError::validation(
                "scenario_grid.lower_shift",
                format!("must be above -1 to keep rates positive, got {}", self.lower_shift),
            ));
        }
        if self.upper_shift < self.lower_shift {
            return Err(EngineError::validation(
                "scenario_grid.upper_shift",
                format!(
                    "must not be below lower_shift {}, got {}",
                    self.lower_shift, self.upper_shift
                ),
            ));
        }
        if self.point_count().is_none() {
            return Err(EngineError::validation(
                "scenario_grid.step",
                format!(
                    "yields more than {} points over [{}, {}], got step {}",
                    MAX_SCENARIO_POINTS, self.lower_shift, self.upper_shift, self.step
                ),
            ));
        }
        Ok(())
    }

    /// Number of grid points; zero for a grid that fails validation.
    pub fn len(&self) -> usize {
        self.point_count().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn point_count(&self) -> Option<usize> {
        let steps = ((self.upper_shift - self.lower_shift) / self.step).round();
        if !(steps >= 0.0 && steps < MAX_SCENARIO_POINTS as f64) {
            return None;
        }
        (steps as usize).checked_add(1)
    }

    /// Future spot rates in ascending order.
    pub fn rates(&self, spot_rate: f64) -> Result<Vec<f64>, EngineError> {
        self.validate()?;
        ensure_positive("spot_rate", spot_rate)?;
        Ok((0..self.len())
            .map(|i| spot_rate * (1.0 + self.lower_shift + i as f64 * self.step))
            .collect())
    }
}

/// Hedged versus unhedged outcome at one future spot rate.
///
/// Costs are in domestic currency. For an exporter (put) the unhedged
/// "cost" is negative: it is the revenue from converting the receivable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRow {
    pub future_spot_rate: f64,
    pub unhedged_cost: f64,
    pub option_payoff: f64,
    pub net_cost: f64,
    pub savings_vs_unhedged: f64,
}

/// Tabulates hedge outcomes across hypothetical future spot rates.
pub struct ScenarioAnalyzer;

impl ScenarioAnalyzer {
    /// Build one row per rate in `rate_grid`.
    ///
    /// The grid must be strictly increasing and positive, so rows come out
    /// ordered by future spot rate with no ties. The premium
    /// (`price_per_unit * notional`) is paid in every scenario.
    pub fn generate(
        params: &MarketParameters,
        hedge: &HedgeSpecification,
        price_per_unit: f64,
        rate_grid: &[f64],
    ) -> Result<Vec<ScenarioRow>, EngineError> {
        params.validate()?;
        ensure_finite("price_per_unit", price_per_unit)?;
        if price_per_unit < 0.0 {
            return Err(EngineError::validation(
                "price_per_unit",
                format!("must be non-negative, got {price_per_unit}"),
            ));
        }
        validate_grid(rate_grid)?;

        let strike = hedge.strike_price(params.spot_rate)?;
        let option_type = hedge.option_type();
        let notional = hedge.notional_amount();
        let side = option_type.side();
        let total_option_cost = price_per_unit * notional;

        Ok(rate_grid
            .iter()
            .map(|&future_spot_rate| {
                let unhedged_cost = side * notional * future_spot_rate;
                let option_payoff = notional * option_type.intrinsic(future_spot_rate, strike);
                let net_cost = unhedged_cost - option_payoff + total_option_cost;
                ScenarioRow {
                    future_spot_rate,
                    unhedged_cost,
                    option_payoff,
                    net_cost,
                    savings_vs_unhedged: unhedged_cost - net_cost,
                }
            })
            .collect())
    }
}

fn validate_grid(rate_grid: &[f64]) -> Result<(), EngineError> {
    if rate_grid.is_empty() {
        return Err(EngineError::validation("rate_grid", "must not be empty"));
    }
    for rate in rate_grid {
        ensure_positive("rate_grid", *rate)?;
    }
    if rate_grid.windows(2).any(|w| w[1] <= w[0]) {
        return Err(EngineError::validation(
            "rate_grid",
            "must be strictly increasing",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::market::OptionType;
    use approx::assert_relative_eq;

    fn market() -> MarketParameters {
        MarketParameters::new(19.0, 0.20, 0.04, 0.07, 0.25).unwrap()
    }

    #[test]
    fn test_default_grid() {
        let rates = ScenarioGrid::default().rates(19.0).unwrap();
        assert_eq!(rates.len(), 5);
        assert_relative_eq!(rates[0], 17.1, max_relative = 1e-12);
        assert_relative_eq!(rates[2], 19.0, max_relative = 1e-12);
        assert_relative_eq!(rates[4], 20.9, max_relative = 1e-12);
        assert!(rates.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_wide_grid_is_inclusive() {
        let grid = ScenarioGrid::new(-0.20, 0.20, 0.05).unwrap();
        let rates = grid.rates(100.0).unwrap();
        assert_eq!(rates.len(), 9);
        assert_relative_eq!(rates[0], 80.0, max_relative = 1e-12);
        assert_relative_eq!(rates[8], 120.0, max_relative = 1e-12);
    }

    #[test]
    fn test_invalid_grid() {
        assert!(ScenarioGrid::new(-0.1, 0.1, 0.0).is_err());
        assert!(ScenarioGrid::new(0.1, -0.1, 0.05).is_err());
        assert!(ScenarioGrid::new(-1.0, 0.1, 0.05).is_err());
    }

    #[test]
    fn test_oversized_grid_rejected() {
        let err = ScenarioGrid::new(-0.1, 0.1, 1e-300).unwrap_err();
        assert!(err.is_validation());

        let too_fine = ScenarioGrid {
            lower_shift: -0.1,
            upper_shift: 0.1,
            step: 1e-300,
        };
        assert_eq!(too_fine.len(), 0);
        assert!(too_fine.is_empty());
        assert!(too_fine.rates(19.0).is_err());

        // 0.2 / 2e-5 = 10_000 steps, one point over the cap.
        assert!(ScenarioGrid::new(-0.1, 0.1, 2e-5).is_err());
        let finest = ScenarioGrid::new(-0.1, 0.1, 0.2 / 9_999.0).unwrap();
        assert_eq!(finest.len(), MAX_SCENARIO_POINTS);
        assert!(!finest.is_empty());
    }

    #[test]
    fn test_importer_call_scenarios() {
        let hedge = HedgeSpecification::new(OptionType::Call, 0.05, 1_000_000.0).unwrap();
        let rates = ScenarioGrid::default().rates(19.0).unwrap();
        let rows = ScenarioAnalyzer::generate(&market(), &hedge, 0.343, &rates).unwrap();

        // Peso weakens 10%: the call pays above 19.95.
        let worst = rows.last().unwrap();
        assert_relative_eq!(worst.unhedged_cost, 20_900_000.0, max_relative = 1e-12);
        assert_relative_eq!(worst.option_payoff, 950_000.0, max_relative = 1e-12);
        assert_relative_eq!(worst.net_cost, 20_900_000.0 - 950_000.0 + 343_000.0, max_relative = 1e-12);
        assert!(worst.savings_vs_unhedged > 0.0);

        // Peso strengthens: option expires worthless, premium is the only drag.
        let best = rows.first().unwrap();
        assert_eq!(best.option_payoff, 0.0);
        assert_relative_eq!(best.savings_vs_unhedged, -343_000.0, max_relative = 1e-12);
    }

    #[test]
    fn test_exporter_put_scenarios() {
        let params = MarketParameters::new(4000.0, 0.15, 0.11, 0.045, 0.5).unwrap();
        let hedge = HedgeSpecification::new(OptionType::Put, 0.05, 250_000.0).unwrap();
        let rates = ScenarioGrid::default().rates(4000.0).unwrap();
        let rows = ScenarioAnalyzer::generate(&params, &hedge, 60.0, &rates).unwrap();

        // COP appreciates to 3600: put struck at 3800 pays 200 per dollar.
        let low = rows.first().unwrap();
        assert_relative_eq!(low.unhedged_cost, -900_000_000.0, max_relative = 1e-12);
        assert_relative_eq!(low.option_payoff, 50_000_000.0, max_relative = 1e-12);
        // Net revenue is the strike floor less the premium.
        assert_relative_eq!(-low.net_cost, 3800.0 * 250_000.0 - 60.0 * 250_000.0, max_relative = 1e-12);
    }

    #[test]
    fn test_net_cost_identity() {
        let hedge = HedgeSpecification::new(OptionType::Put, 0.03, 75_000.0).unwrap();
        let rates = ScenarioGrid::new(-0.2, 0.2, 0.01).unwrap().rates(19.0).unwrap();
        let rows = ScenarioAnalyzer::generate(&market(), &hedge, 0.21, &rates).unwrap();
        let premium = 0.21 * 75_000.0;
        for row in rows {
            assert_eq!(row.net_cost, row.unhedged_cost - row.option_payoff + premium);
            assert_eq!(row.savings_vs_unhedged, row.unhedged_cost - row.net_cost);
        }
    }

    #[test]
    fn test_rejects_unsorted_grid() {
        let hedge = HedgeSpecification::new(OptionType::Call, 0.05, 1.0).unwrap();
        let err = ScenarioAnalyzer::generate(&market(), &hedge, 0.3, &[19.0, 18.0]).unwrap_err();
        assert!(err.is_validation());
        assert!(ScenarioAnalyzer::generate(&market(), &hedge, 0.3, &[19.0, 19.0]).is_err());
        assert!(ScenarioAnalyzer::generate(&market(), &hedge, 0.3, &[]).is_err());
        assert!(ScenarioAnalyzer::generate(&market(), &hedge, -0.3, &[19.0]).is_err());
    }
}
