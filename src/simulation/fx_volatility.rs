//! Historical volatility estimation from exchange-rate series.
//!
//! Log returns of consecutive observations, sample standard deviation,
//! annualized with the 252 trading-day convention.

use crate::core::error::{ensure_positive, EngineError};
use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

/// Trading days per year used to annualize daily volatility.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// One fixing of an exchange rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateObservation {
    pub date: NaiveDate,
    pub rate: f64,
}

impl RateObservation {
    pub fn new(date: NaiveDate, rate: f64) -> Self {
        Self { date, rate }
    }
}

/// Result of a volatility estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityEstimate {
    /// Annualized volatility, e.g. 0.20 for 20%.
    pub annualized_volatility: f64,
    pub daily_volatility: f64,
    pub lookback_days: usize,
    /// Observations actually used (at most `lookback_days`).
    pub observations: usize,
    pub method: String,
    pub computed_at: DateTime<Utc>,
}

impl VolatilityEstimate {
    pub fn percentage(&self) -> f64 {
        self.annualized_volatility * 100.0
    }
}

/// Estimates annualized volatility from a chronological rate series.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use fx_hedge_engine::simulation::fx_volatility::{RateObservation, VolatilityEstimator};
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let series: Vec<RateObservation> = [19.0, 19.2, 18.9, 19.1]
///     .iter()
///     .enumerate()
///     .map(|(i, r)| RateObservation::new(start + chrono::Days::new(i as u64), *r))
///     .collect();
///
/// let estimate = VolatilityEstimator::default().estimate(&series, 90).unwrap();
/// assert!(estimate.annualized_volatility > 0.0);
/// assert_eq!(estimate.observations, 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolatilityEstimator {
    min_observations: usize,
}

impl Default for VolatilityEstimator {
    fn default() -> Self {
        Self { min_observations: 2 }
    }
}

impl VolatilityEstimator {
    /// Require more history than the two points a single return needs.
    pub fn with_min_observations(min_observations: usize) -> Self {
        Self {
            min_observations: min_observations.max(2),
        }
    }

    pub fn min_observations(&self) -> usize {
        self.min_observations
    }

    /// Estimate volatility from the most recent `lookback_days` observations.
    ///
    /// Fails with a validation error if the series is not strictly
    /// chronological or contains a non-positive rate, and with
    /// `InsufficientData` when fewer than the minimum number of observations
    /// fall in the window. A constant series is valid and yields zero.
    pub fn estimate(
        &self,
        series: &[RateObservation],
        lookback_days: usize,
    ) -> Result<VolatilityEstimate, EngineError> {
        if lookback_days == 0 {
            return Err(EngineError::validation("lookback_days", "must be positive"));
        }
        if let Some(pair) = series.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(EngineError::validation(
                "historical_series",
                format!(
                    "must be in strictly increasing date order, found {} after {}",
                    pair[1].date, pair[0].date
                ),
            ));
        }
        for observation in series {
            ensure_positive("historical_series.rate", observation.rate)?;
        }

        let window = &series[series.len().saturating_sub(lookback_days)..];
        if window.len() < self.min_observations {
            return Err(EngineError::InsufficientData {
                required: self.min_observations,
                available: window.len(),
            });
        }

        let returns: Vec<f64> = window
            .windows(2)
            .map(|w| (w[1].rate / w[0].rate).ln())
            .collect();
        let daily_volatility = sample_std_dev(&returns);
        let annualized_volatility = daily_volatility * TRADING_DAYS_PER_YEAR.sqrt();

        debug!(
            "estimated volatility {:.4} from {} observations ({}-day lookback)",
            annualized_volatility,
            window.len(),
            lookback_days
        );

        Ok(VolatilityEstimate {
            annualized_volatility,
            daily_volatility,
            lookback_days,
            observations: window.len(),
            method: "historical".to_string(),
            computed_at: Utc::now(),
        })
    }
}

/// Sample standard deviation (N - 1 denominator); zero for a single value.
fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (sum_sq / (n - 1.0)).sqrt()
}
