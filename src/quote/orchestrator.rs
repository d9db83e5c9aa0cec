use crate::analysis::payoff::{Breakeven, PayoffCurveBuilder, PayoffPoint};
use crate::analysis::scenario::{ScenarioAnalyzer, ScenarioRow};
use crate::core::currency::CurrencyPair;
use crate::core::error::EngineError;
use crate::core::market::{HedgeSpecification, MarketParameters, OptionType};
use crate::pricing::garman_kohlhagen::{GarmanKohlhagenPricer, Greeks};
use crate::quote::config::EngineConfig;
use crate::simulation::fx_volatility::{RateObservation, VolatilityEstimate, VolatilityEstimator};
use crate::simulation::monte_carlo::{MonteCarloRiskSimulator, SimulationReport};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A hedge quote request.
///
/// Only the spot and the notional are mandatory. Everything else falls back
/// to the orchestrator's [`EngineConfig`]: rates are looked up by currency
/// (foreign = base of the pair, domestic = quote of the pair).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRequest {
    pub spot_rate: f64,
    pub notional_amount: f64,
    #[serde(default)]
    pub option_type: OptionType,
    /// Overrides the strike derived from the protection level.
    #[serde(default)]
    pub strike_price: Option<f64>,
    #[serde(default)]
    pub protection_level: Option<f64>,
    #[serde(default)]
    pub time_to_maturity_years: Option<f64>,
    #[serde(default)]
    pub volatility: Option<f64>,
    #[serde(default)]
    pub domestic_rate: Option<f64>,
    #[serde(default)]
    pub foreign_rate: Option<f64>,
    #[serde(default)]
    pub currency_pair: Option<CurrencyPair>,
}

impl PricingRequest {
    pub fn new(spot_rate: f64, notional_amount: f64, option_type: OptionType) -> Self {
        Self {
            spot_rate,
            notional_amount,
            option_type,
            strike_price: None,
            protection_level: None,
            time_to_maturity_years: None,
            volatility: None,
            domestic_rate: None,
            foreign_rate: None,
            currency_pair: None,
        }
    }

    pub fn with_strike(mut self, strike: f64) -> Self {
        self.strike_price = Some(strike);
        self
    }

    pub fn with_protection_level(mut self, protection_level: f64) -> Self {
        self.protection_level = Some(protection_level);
        self
    }

    pub fn with_maturity(mut self, time_to_maturity_years: f64) -> Self {
        self.time_to_maturity_years = Some(time_to_maturity_years);
        self
    }

    pub fn with_volatility(mut self, volatility: f64) -> Self {
        self.volatility = Some(volatility);
        self
    }

    pub fn with_rates(mut self, domestic_rate: f64, foreign_rate: f64) -> Self {
        self.domestic_rate = Some(domestic_rate);
        self.foreign_rate = Some(foreign_rate);
        self
    }

    pub fn with_currency_pair(mut self, pair: CurrencyPair) -> Self {
        self.currency_pair = Some(pair);
        self
    }
}

/// Where the volatility used for a quote came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "source")]
pub enum VolatilitySource {
    Request,
    Historical { observations: usize },
    ConfigDefault,
}

/// Full analytics for one quote. Built fresh per request and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingResult {
    pub currency_pair: Option<CurrencyPair>,
    pub option_type: OptionType,
    pub market: MarketParameters,
    pub volatility_source: VolatilitySource,
    pub notional_amount: f64,
    pub strike_price: f64,
    /// Distance of the strike from spot in the protected direction. For an
    /// explicit strike this is implied, `side · (K / S − 1)`, and may be
    /// negative for an in-the-money strike.
    pub protection_level: f64,
    pub option_price_per_unit: f64,
    pub total_option_cost: f64,
    /// Premium as a percentage of the notional's domestic value at spot.
    pub cost_percentage: f64,
    /// Strike times notional: the most an importer can pay with the hedge.
    pub max_cost_to_firm: f64,
    pub d1: Option<f64>,
    pub d2: Option<f64>,
    pub greeks: Greeks,
    pub scenarios: Vec<ScenarioRow>,
    pub payoff_curve: Vec<PayoffPoint>,
    pub breakeven: Breakeven,
}

impl PricingResult {
    pub fn breakeven_rate(&self) -> f64 {
        self.breakeven.rate
    }
}

/// Composes pricing, scenarios and payoff analysis into one quote.
///
/// Holds only immutable configuration, so one orchestrator can serve any
/// number of threads.
///
/// # Examples
///
/// ```
/// use fx_hedge_engine::core::market::OptionType;
/// use fx_hedge_engine::quote::config::EngineConfig;
/// use fx_hedge_engine::quote::orchestrator::{PricingOrchestrator, PricingRequest};
///
/// let orchestrator = PricingOrchestrator::new(EngineConfig::default()).unwrap();
/// let request = PricingRequest::new(19.0, 1_000_000.0, OptionType::Call)
///     .with_maturity(0.25)
///     .with_volatility(0.20)
///     .with_rates(0.04, 0.07);
///
/// let result = orchestrator.quote(&request).unwrap();
/// assert!((result.cost_percentage - 1.8).abs() < 0.05);
/// ```
#[derive(Debug, Clone)]
pub struct PricingOrchestrator {
    config: EngineConfig,
}

impl PricingOrchestrator {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Price a hedge with the request's volatility or the configured default.
    pub fn quote(&self, request: &PricingRequest) -> Result<PricingResult, EngineError> {
        let (volatility, source) = match request.volatility {
            Some(v) => (v, VolatilitySource::Request),
            None => (self.config.default_volatility, VolatilitySource::ConfigDefault),
        };
        self.quote_with_volatility(request, volatility, source)
    }

    /// Price a hedge, estimating volatility from rate history.
    ///
    /// A volatility pinned on the request still wins. When the series is too
    /// short the configured default is used instead; any other estimation
    /// failure is returned.
    pub fn quote_with_history(
        &self,
        request: &PricingRequest,
        series: &[RateObservation],
    ) -> Result<PricingResult, EngineError> {
        if request.volatility.is_some() {
            return self.quote(request);
        }
        let (volatility, source) = match self.estimate_volatility(series) {
            Ok(estimate) => (
                estimate.annualized_volatility,
                VolatilitySource::Historical {
                    observations: estimate.observations,
                },
            ),
            Err(EngineError::InsufficientData {
                required,
                available,
            }) => {
                warn!(
                    "volatility estimate needs {} observations, got {}; using default {}",
                    required, available, self.config.default_volatility
                );
                (self.config.default_volatility, VolatilitySource::ConfigDefault)
            }
            Err(err) => return Err(err),
        };
        self.quote_with_volatility(request, volatility, source)
    }

    /// Estimate volatility over the configured lookback.
    pub fn estimate_volatility(
        &self,
        series: &[RateObservation],
    ) -> Result<VolatilityEstimate, EngineError> {
        VolatilityEstimator::with_min_observations(self.config.min_volatility_observations)
            .estimate(series, self.config.volatility_lookback_days)
    }

    /// Monte Carlo risk profile with the configured path count.
    pub fn simulate(
        &self,
        request: &PricingRequest,
        seed: Option<u64>,
    ) -> Result<SimulationReport, EngineError> {
        self.simulate_paths(request, self.config.monte_carlo_paths, seed)
    }

    /// Monte Carlo risk profile with an explicit path count.
    pub fn simulate_paths(
        &self,
        request: &PricingRequest,
        path_count: usize,
        seed: Option<u64>,
    ) -> Result<SimulationReport, EngineError> {
        if path_count > self.config.max_monte_carlo_paths {
            return Err(EngineError::validation(
                "path_count",
                format!(
                    "must not exceed {}, got {}",
                    self.config.max_monte_carlo_paths, path_count
                ),
            ));
        }
        let volatility = request.volatility.unwrap_or(self.config.default_volatility);
        let params = self.market_parameters(request, volatility)?;
        let hedge = self.hedge_specification(request)?;
        let strike = hedge.strike_price(params.spot_rate)?;

        MonteCarloRiskSimulator::new(self.config.histogram_bins)?.simulate(
            &params,
            strike,
            hedge.option_type(),
            hedge.notional_amount(),
            path_count,
            seed,
        )
    }

    /// Resolve request defaults into validated market parameters.
    pub fn market_parameters(
        &self,
        request: &PricingRequest,
        volatility: f64,
    ) -> Result<MarketParameters, EngineError> {
        let rates = &self.config.risk_free_rates;
        let domestic_rate = match (request.domestic_rate, &request.currency_pair) {
            (Some(rate), _) => rate,
            (None, Some(pair)) => rates.get_rate(&pair.quote)?,
            (None, None) => {
                return Err(EngineError::validation(
                    "domestic_rate",
                    "required when no currency pair is given",
                ))
            }
        };
        let foreign_rate = match (request.foreign_rate, &request.currency_pair) {
            (Some(rate), _) => rate,
            (None, Some(pair)) => rates.get_rate(&pair.base)?,
            (None, None) => {
                return Err(EngineError::validation(
                    "foreign_rate",
                    "required when no currency pair is given",
                ))
            }
        };
        let time_to_maturity_years = request
            .time_to_maturity_years
            .unwrap_or_else(|| self.config.default_time_to_maturity_years());

        MarketParameters::new(
            request.spot_rate,
            volatility,
            domestic_rate,
            foreign_rate,
            time_to_maturity_years,
        )
    }

    /// Resolve the hedge terms, applying the default protection level.
    pub fn hedge_specification(
        &self,
        request: &PricingRequest,
    ) -> Result<HedgeSpecification, EngineError> {
        let protection_level = request
            .protection_level
            .unwrap_or(self.config.default_protection_level);
        let hedge =
            HedgeSpecification::new(request.option_type, protection_level, request.notional_amount)?;
        match request.strike_price {
            Some(strike) => hedge.with_strike(strike),
            None => Ok(hedge),
        }
    }

    fn quote_with_volatility(
        &self,
        request: &PricingRequest,
        volatility: f64,
        volatility_source: VolatilitySource,
    ) -> Result<PricingResult, EngineError> {
        let params = self.market_parameters(request, volatility)?;
        let hedge = self.hedge_specification(request)?;
        let strike = hedge.strike_price(params.spot_rate)?;
        let notional = hedge.notional_amount();

        let valuation = GarmanKohlhagenPricer::price(&params, strike, hedge.option_type())?;
        let price = valuation.price_per_unit;
        if valuation.is_degenerate() {
            debug!("σ√T is zero; priced {} at discounted intrinsic value", hedge.option_type());
        }

        let grid = self.config.scenario_grid.rates(params.spot_rate)?;
        let scenarios = ScenarioAnalyzer::generate(&params, &hedge, price, &grid)?;

        let curve_config = self.config.payoff_curve;
        let payoff_curve = PayoffCurveBuilder::build_with_range(
            &params,
            &hedge,
            price,
            curve_config.point_count,
            curve_config.range_fraction,
        )?;
        let breakeven = PayoffCurveBuilder::breakeven(&params, &hedge, price, &payoff_curve)?;
        if !breakeven.within_range {
            debug!("no breakeven inside the charted range, reporting boundary {}", breakeven.rate);
        }

        let protection_level = match hedge.strike_override() {
            Some(_) => hedge.option_type().side() * (strike / params.spot_rate - 1.0),
            None => hedge.protection_level(),
        };
        let total_option_cost = price * notional;
        let result = PricingResult {
            currency_pair: request.currency_pair.clone(),
            option_type: hedge.option_type(),
            market: params,
            volatility_source,
            notional_amount: notional,
            strike_price: strike,
            protection_level,
            option_price_per_unit: price,
            total_option_cost,
            cost_percentage: total_option_cost / (notional * params.spot_rate) * 100.0,
            max_cost_to_firm: strike * notional,
            d1: valuation.d1,
            d2: valuation.d2,
            greeks: valuation.greeks,
            scenarios,
            payoff_curve,
            breakeven,
        };

        info!(
            "quoted {} {} notional {} strike {:.4}: premium {:.6}/unit ({:.2}%)",
            result
                .currency_pair
                .as_ref()
                .map(|p| p.to_string())
                .unwrap_or_else(|| "FX".to_string()),
            result.option_type,
            notional,
            strike,
            price,
            result.cost_percentage
        );
        Ok(result)
    }
}

impl fmt::Display for PricingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Hedge Quote ===")?;
        if let Some(pair) = &self.currency_pair {
            writeln!(f, "Pair:              {}", pair)?;
        }
        writeln!(f, "Option:            {}", self.option_type)?;
        writeln!(f, "Spot:              {:.4}", self.market.spot_rate)?;
        writeln!(
            f,
            "Strike:            {:.4} ({:.1}% protection)",
            self.strike_price,
            self.protection_level * 100.0
        )?;
        writeln!(f, "Notional:          {:.2}", self.notional_amount)?;
        writeln!(f, "Maturity:          {:.4}y", self.market.time_to_maturity_years)?;
        writeln!(f, "Volatility:        {:.2}%", self.market.volatility * 100.0)?;
        writeln!(f, "Premium/unit:      {:.6}", self.option_price_per_unit)?;
        writeln!(f, "Total premium:     {:.2}", self.total_option_cost)?;
        writeln!(f, "Cost:              {:.2}% of notional", self.cost_percentage)?;
        writeln!(f, "Max cost to firm:  {:.2}", self.max_cost_to_firm)?;
        match (self.d1, self.d2) {
            (Some(d1), Some(d2)) => writeln!(f, "d1 / d2:           {:.6} / {:.6}", d1, d2)?,
            _ => writeln!(f, "d1 / d2:           n/a (intrinsic value)")?,
        }

        writeln!(f, "\nGreeks:")?;
        writeln!(f, "  Delta:           {:.6}", self.greeks.delta)?;
        writeln!(f, "  Gamma:           {:.6}", self.greeks.gamma)?;
        writeln!(f, "  Vega (1 vol pt): {:.6}", self.greeks.vega_per_point())?;
        writeln!(f, "  Theta (1 day):   {:.6}", self.greeks.theta)?;

        writeln!(f, "\nScenarios:")?;
        writeln!(
            f,
            "  {:>12} {:>18} {:>18} {:>18} {:>18}",
            "Future spot", "Unhedged", "Option payoff", "Net", "Savings"
        )?;
        for row in &self.scenarios {
            writeln!(
                f,
                "  {:>12.4} {:>18.2} {:>18.2} {:>18.2} {:>18.2}",
                row.future_spot_rate,
                row.unhedged_cost,
                row.option_payoff,
                row.net_cost,
                row.savings_vs_unhedged
            )?;
        }

        if self.breakeven.within_range {
            writeln!(f, "\nBreakeven rate:    {:.4}", self.breakeven.rate)?;
        } else {
            writeln!(
                f,
                "\nBreakeven rate:    beyond charted range (nearest {:.4})",
                self.breakeven.rate
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::CurrencyCode;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use chrono::{Days, NaiveDate};

    fn orchestrator() -> PricingOrchestrator {
        PricingOrchestrator::new(EngineConfig::default()).unwrap()
    }

    fn reference_request() -> PricingRequest {
        PricingRequest::new(19.0, 1_000_000.0, OptionType::Call)
            .with_protection_level(0.05)
            .with_maturity(0.25)
            .with_volatility(0.20)
            .with_rates(0.04, 0.07)
    }

    fn usd_mxn() -> CurrencyPair {
        CurrencyPair::new(CurrencyCode::new("USD"), CurrencyCode::new("MXN"))
    }

    #[test]
    fn test_reference_quote() {
        let result = orchestrator().quote(&reference_request()).unwrap();

        assert_relative_eq!(result.strike_price, 19.95, max_relative = 1e-12);
        assert_abs_diff_eq!(result.option_price_per_unit, 0.343, epsilon = 0.001);
        assert_abs_diff_eq!(result.cost_percentage, 1.8, epsilon = 0.05);
        assert_relative_eq!(
            result.total_option_cost,
            result.option_price_per_unit * 1_000_000.0
        );
        assert_relative_eq!(result.max_cost_to_firm, 19_950_000.0, max_relative = 1e-12);
        assert_eq!(result.scenarios.len(), 5);
        assert_eq!(result.payoff_curve.len(), 50);
        assert!(result.breakeven.within_range);
        assert_eq!(result.volatility_source, VolatilitySource::Request);
    }

    #[test]
    fn test_rates_from_currency_pair() {
        let request = PricingRequest::new(19.0, 1_000_000.0, OptionType::Call)
            .with_currency_pair(usd_mxn());
        let result = orchestrator().quote(&request).unwrap();

        // USD is foreign, MXN domestic.
        assert_eq!(result.market.foreign_rate, 0.045);
        assert_eq!(result.market.domestic_rate, 0.09);
        assert_eq!(result.market.volatility, 0.20);
        assert_relative_eq!(result.market.time_to_maturity_years, 90.0 / 365.0);
        assert_eq!(result.protection_level, 0.05);
        assert_eq!(result.volatility_source, VolatilitySource::ConfigDefault);
        assert_eq!(result.currency_pair, Some(usd_mxn()));
    }

    #[test]
    fn test_missing_rates() {
        let request = PricingRequest::new(19.0, 1.0, OptionType::Call);
        let err = orchestrator().quote(&request).unwrap_err();
        assert!(err.is_validation());

        let unknown = PricingRequest::new(1.0, 1.0, OptionType::Call).with_currency_pair(
            CurrencyPair::new(CurrencyCode::new("CHF"), CurrencyCode::new("SEK")),
        );
        assert!(matches!(
            orchestrator().quote(&unknown).unwrap_err(),
            EngineError::Rate(_)
        ));
    }

    #[test]
    fn test_explicit_strike_wins() {
        let request = reference_request().with_strike(20.5);
        let result = orchestrator().quote(&request).unwrap();
        assert_eq!(result.strike_price, 20.5);
        assert_relative_eq!(result.max_cost_to_firm, 20_500_000.0);
        // The configured 5% no longer describes the strike.
        assert_relative_eq!(result.protection_level, 20.5 / 19.0 - 1.0, max_relative = 1e-12);
        assert!(result.to_string().contains("(7.9% protection)"));

        let mut put = reference_request().with_strike(18.0);
        put.option_type = OptionType::Put;
        let result = orchestrator().quote(&put).unwrap();
        assert_relative_eq!(result.protection_level, 1.0 - 18.0 / 19.0, max_relative = 1e-12);
    }

    #[test]
    fn test_validation_errors_surface() {
        let o = orchestrator();
        assert!(o.quote(&reference_request().with_maturity(0.0)).is_err());
        assert!(o.quote(&reference_request().with_volatility(-0.1)).is_err());
        assert!(o.quote(&reference_request().with_protection_level(1.0)).is_err());
        let mut zero_notional = reference_request();
        zero_notional.notional_amount = 0.0;
        assert!(o.quote(&zero_notional).is_err());
    }

    #[test]
    fn test_zero_volatility_quote() {
        let result = orchestrator()
            .quote(&reference_request().with_volatility(0.0))
            .unwrap();
        assert_eq!(result.option_price_per_unit, 0.0);
        assert!(result.d1.is_none());
        assert_eq!(result.greeks.vega, 0.0);
    }

    fn history(rates: &[f64]) -> Vec<RateObservation> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        rates
            .iter()
            .enumerate()
            .map(|(i, r)| RateObservation::new(start + Days::new(i as u64), *r))
            .collect()
    }

    #[test]
    fn test_quote_with_history() {
        let mut request = reference_request();
        request.volatility = None;
        let series = history(&[19.0, 19.3, 18.8, 19.1, 19.4, 19.0]);
        let result = orchestrator().quote_with_history(&request, &series).unwrap();

        let estimate = orchestrator().estimate_volatility(&series).unwrap();
        assert_eq!(result.market.volatility, estimate.annualized_volatility);
        assert_eq!(
            result.volatility_source,
            VolatilitySource::Historical { observations: 6 }
        );
    }

    #[test]
    fn test_short_history_falls_back_to_default() {
        let mut request = reference_request();
        request.volatility = None;
        let result = orchestrator()
            .quote_with_history(&request, &history(&[19.0]))
            .unwrap();
        assert_eq!(result.market.volatility, 0.20);
        assert_eq!(result.volatility_source, VolatilitySource::ConfigDefault);
    }

    #[test]
    fn test_unsorted_history_is_an_error() {
        let mut request = reference_request();
        request.volatility = None;
        let mut series = history(&[19.0, 19.1, 19.2]);
        series.reverse();
        let err = orchestrator().quote_with_history(&request, &series).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_simulate_uses_config_paths() {
        let config = EngineConfig {
            monte_carlo_paths: 1_000,
            histogram_bins: 12,
            ..Default::default()
        };
        let o = PricingOrchestrator::new(config).unwrap();
        let report = o.simulate(&reference_request(), Some(5)).unwrap();
        assert_eq!(report.statistics.path_count, 1_000);
        assert_eq!(report.bins.len(), 12);
        assert_relative_eq!(report.strike_price, 19.95, max_relative = 1e-12);

        assert!(o.simulate_paths(&reference_request(), 10_000_000, Some(5)).is_err());
    }

    #[test]
    fn test_request_json_defaults() {
        let request: PricingRequest =
            serde_json::from_str(r#"{ "spot_rate": 4000.0, "notional_amount": 250000 }"#).unwrap();
        assert_eq!(request.option_type, OptionType::Call);
        assert!(request.volatility.is_none());
    }

    #[test]
    fn test_display() {
        let text = orchestrator().quote(&reference_request()).unwrap().to_string();
        assert!(text.contains("Hedge Quote"));
        assert!(text.contains("Breakeven rate"));
    }
}
