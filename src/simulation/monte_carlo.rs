//! Monte Carlo distribution of terminal spot rates.
//!
//! Terminal rates follow driftless geometric Brownian motion:
//!
//! ```text
//! S_T = S_0 · exp(-σ²/2 · T + σ·√T · z),   z ~ N(0, 1)
//! ```
//!
//! The drift is zero on purpose: the simulation shows how widely the rate can
//! disperse by maturity, not a risk-neutral expected P&L.

use crate::core::error::{ensure_positive, EngineError};
use crate::core::market::{MarketParameters, OptionType};
use crate::pricing::normal::norm_cdf;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default number of histogram bins.
pub const DEFAULT_BIN_COUNT: usize = 30;

/// Most histogram bins a simulator may produce.
pub const MAX_BIN_COUNT: usize = 1_000;

/// Outcome of one simulated path. Only lives for the duration of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationOutcome {
    pub terminal_spot_rate: f64,
    /// `side · (strike − S_T) · notional`: negative once the rate has moved
    /// past the strike against the unhedged position.
    pub pnl: f64,
    /// The rate finished beyond the strike, where the option pays.
    pub is_protected: bool,
    pub is_loss: bool,
}

impl SimulationOutcome {
    fn new(terminal_spot_rate: f64, strike: f64, option_type: OptionType, notional: f64) -> Self {
        let side = option_type.side();
        let pnl = side * (strike - terminal_spot_rate) * notional;
        Self {
            terminal_spot_rate,
            pnl,
            is_protected: side * (terminal_spot_rate - strike) > 0.0,
            is_loss: pnl < 0.0,
        }
    }

    /// Protected outcomes take precedence over losses.
    ///
    /// A path past the strike is both protected and a loss, so it is counted
    /// once, as protected.
    pub fn class(&self) -> OutcomeClass {
        if self.is_protected {
            OutcomeClass::Protected
        } else if self.is_loss {
            OutcomeClass::Loss
        } else {
            OutcomeClass::Neutral
        }
    }
}

/// Bucket a path falls into for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeClass {
    Protected,
    Neutral,
    Loss,
}

/// Equal-width bin of terminal spot rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub protected: usize,
    pub neutral: usize,
    pub loss: usize,
}

impl HistogramBin {
    pub fn midpoint(&self) -> f64 {
        0.5 * (self.lower + self.upper)
    }

    pub fn total(&self) -> usize {
        self.protected + self.neutral + self.loss
    }
}

/// Summary of a simulation run. Probabilities are percentages of all paths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityStatistics {
    pub path_count: usize,
    pub protected_probability: f64,
    pub loss_probability: f64,
    pub neutral_probability: f64,
    pub expected_spot_rate: f64,
    pub median_spot_rate: f64,
    /// Most favourable terminal rate for the hedger.
    pub best_case_spot_rate: f64,
    /// Least favourable terminal rate for the hedger.
    pub worst_case_spot_rate: f64,
    pub percentile_5_spot_rate: f64,
    pub percentile_95_spot_rate: f64,
    pub max_pnl: f64,
    pub min_pnl: f64,
}

/// Histogram plus statistics for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub option_type: OptionType,
    pub spot_rate: f64,
    pub strike_price: f64,
    pub bins: Vec<HistogramBin>,
    pub statistics: ProbabilityStatistics,
}

/// Simulates terminal spot rates and classifies hedge outcomes.
///
/// Each call owns its random source, so concurrent runs never interfere and
/// a seeded run is reproducible.
///
/// # Examples
///
/// ```
/// use fx_hedge_engine::core::market::{MarketParameters, OptionType};
/// use fx_hedge_engine::simulation::monte_carlo::MonteCarloRiskSimulator;
///
/// let params = MarketParameters::new(19.0, 0.20, 0.04, 0.07, 0.25).unwrap();
/// let simulator = MonteCarloRiskSimulator::default();
/// let report = simulator
///     .simulate(&params, 19.95, OptionType::Call, 1_000_000.0, 5_000, Some(7))
///     .unwrap();
///
/// let total: usize = report.bins.iter().map(|b| b.total()).sum();
/// assert_eq!(total, 5_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonteCarloRiskSimulator {
    bin_count: usize,
}

impl Default for MonteCarloRiskSimulator {
    fn default() -> Self {
        Self {
            bin_count: DEFAULT_BIN_COUNT,
        }
    }
}

impl MonteCarloRiskSimulator {
    pub fn new(bin_count: usize) -> Result<Self, EngineError> {
        if !(1..=MAX_BIN_COUNT).contains(&bin_count) {
            return Err(EngineError::validation(
                "bin_count",
                format!("must lie in [1, {MAX_BIN_COUNT}], got {bin_count}"),
            ));
        }
        Ok(Self { bin_count })
    }

    pub fn bin_count(&self) -> usize {
        self.bin_count
    }

    /// Run `path_count` paths, seeded when `seed` is given.
    pub fn simulate(
        &self,
        params: &MarketParameters,
        strike: f64,
        option_type: OptionType,
        notional: f64,
        path_count: usize,
        seed: Option<u64>,
    ) -> Result<SimulationReport, EngineError> {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.simulate_with_rng(params, strike, option_type, notional, path_count, &mut rng)
    }

    /// Run the simulation against a caller-supplied random source.
    pub fn simulate_with_rng<R: Rng + ?Sized>(
        &self,
        params: &MarketParameters,
        strike: f64,
        option_type: OptionType,
        notional: f64,
        path_count: usize,
        rng: &mut R,
    ) -> Result<SimulationReport, EngineError> {
        params.validate()?;
        ensure_positive("strike_price", strike)?;
        ensure_positive("notional_amount", notional)?;
        if path_count == 0 {
            return Err(EngineError::validation("path_count", "must be positive"));
        }

        debug!(
            "simulating {} paths for {} struck at {} (σ={}, T={})",
            path_count, option_type, strike, params.volatility, params.time_to_maturity_years
        );

        let spot = params.spot_rate;
        let drift = -0.5 * params.volatility.powi(2) * params.time_to_maturity_years;
        let diffusion = params.total_volatility();

        let mut terminals: Vec<f64> = (0..path_count)
            .map(|_| {
                let z: f64 = StandardNormal.sample(rng);
                spot * (drift + diffusion * z).exp()
            })
            .collect();

        let outcomes: Vec<SimulationOutcome> = terminals
            .iter()
            .map(|&s_t| SimulationOutcome::new(s_t, strike, option_type, notional))
            .collect();

        let bins = self.histogram(&outcomes);

        terminals.sort_by(|a, b| a.total_cmp(b));
        let statistics = summarize(&outcomes, &terminals, option_type);

        Ok(SimulationReport {
            option_type,
            spot_rate: spot,
            strike_price: strike,
            bins,
            statistics,
        })
    }

    /// Closed-form probability (in percent) that a path ends protected.
    ///
    /// Under the driftless process `P(S_T > K) = N(d2)` with
    /// `d2 = [ln(S/K) - σ²T/2] / (σ√T)`; a put uses `N(-d2)`.
    pub fn analytic_protected_probability(
        params: &MarketParameters,
        strike: f64,
        option_type: OptionType,
    ) -> Result<f64, EngineError> {
        params.validate()?;
        ensure_positive("strike_price", strike)?;
        let side = option_type.side();
        let vol_sqrt_t = params.total_volatility();
        if vol_sqrt_t == 0.0 {
            let protected = side * (params.spot_rate - strike) > 0.0;
            return Ok(if protected { 100.0 } else { 0.0 });
        }
        let d2 = ((params.spot_rate / strike).ln() - 0.5 * vol_sqrt_t * vol_sqrt_t) / vol_sqrt_t;
        Ok(norm_cdf(side * d2) * 100.0)
    }

    fn histogram(&self, outcomes: &[SimulationOutcome]) -> Vec<HistogramBin> {
        let (min, max) = outcomes.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |acc, o| {
            (acc.0.min(o.terminal_spot_rate), acc.1.max(o.terminal_spot_rate))
        });
        let width = (max - min) / self.bin_count as f64;

        let mut bins: Vec<HistogramBin> = (0..self.bin_count)
            .map(|i| {
                let lower = min + width * i as f64;
                let upper = if i + 1 == self.bin_count {
                    max
                } else {
                    min + width * (i + 1) as f64
                };
                HistogramBin {
                    lower,
                    upper,
                    protected: 0,
                    neutral: 0,
                    loss: 0,
                }
            })
            .collect();

        for outcome in outcomes {
            // All samples share one value when volatility is zero.
            let index = if width > 0.0 {
                (((outcome.terminal_spot_rate - min) / width) as usize).min(self.bin_count - 1)
            } else {
                0
            };
            let bin = &mut bins[index];
            match outcome.class() {
                OutcomeClass::Protected => bin.protected += 1,
                OutcomeClass::Neutral => bin.neutral += 1,
                OutcomeClass::Loss => bin.loss += 1,
            }
        }
        bins
    }
}

fn summarize(
    outcomes: &[SimulationOutcome],
    sorted_terminals: &[f64],
    option_type: OptionType,
) -> ProbabilityStatistics {
    let n = outcomes.len();
    let pct = |count: usize| count as f64 / n as f64 * 100.0;
    let count_class = |class: OutcomeClass| outcomes.iter().filter(|o| o.class() == class).count();

    let lowest = sorted_terminals[0];
    let highest = sorted_terminals[n - 1];
    let (best, worst) = match option_type {
        OptionType::Call => (lowest, highest),
        OptionType::Put => (highest, lowest),
    };

    let (min_pnl, max_pnl) = outcomes.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |acc, o| {
        (acc.0.min(o.pnl), acc.1.max(o.pnl))
    });

    ProbabilityStatistics {
        path_count: n,
        protected_probability: pct(count_class(OutcomeClass::Protected)),
        loss_probability: pct(count_class(OutcomeClass::Loss)),
        neutral_probability: pct(count_class(OutcomeClass::Neutral)),
        expected_spot_rate: sorted_terminals.iter().sum::<f64>() / n as f64,
        median_spot_rate: median(sorted_terminals),
        best_case_spot_rate: best,
        worst_case_spot_rate: worst,
        percentile_5_spot_rate: percentile(sorted_terminals, 5.0),
        percentile_95_spot_rate: percentile(sorted_terminals, 95.0),
        max_pnl,
        min_pnl,
    }
}

fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        0.5 * (sorted[n / 2 - 1] + sorted[n / 2])
    }
}

/// Nearest-rank percentile of sorted data.
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    let rank = (pct / 100.0 * (sorted.len() - 1) as f64).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.statistics;
        writeln!(f, "=== Monte Carlo Risk Profile ===")?;
        writeln!(f, "Option:            {} @ {:.4}", self.option_type, self.strike_price)?;
        writeln!(f, "Spot:              {:.4}", self.spot_rate)?;
        writeln!(f, "Paths:             {}", s.path_count)?;
        writeln!(f, "Protected:         {:.1}%", s.protected_probability)?;
        writeln!(f, "Loss:              {:.1}%", s.loss_probability)?;
        writeln!(f, "Neutral:           {:.1}%", s.neutral_probability)?;
        writeln!(f, "Expected rate:     {:.4}", s.expected_spot_rate)?;
        writeln!(f, "Median rate:       {:.4}", s.median_spot_rate)?;
        writeln!(
            f,
            "5%-95% range:      {:.4} - {:.4}",
            s.percentile_5_spot_rate, s.percentile_95_spot_rate
        )?;
        writeln!(f, "Best / worst:      {:.4} / {:.4}", s.best_case_spot_rate, s.worst_case_spot_rate)?;
        writeln!(f, "P&L range:         {:.2} to {:.2}", s.min_pnl, s.max_pnl)?;

        writeln!(f, "\nDistribution:")?;
        let peak = self.bins.iter().map(|b| b.total()).max().unwrap_or(0).max(1);
        for bin in &self.bins {
            let bar = "#".repeat(bin.total() * 40 / peak);
            writeln!(f, "  {:>10.4} | {:<40} {}", bin.midpoint(), bar, bin.total())?;
        }
        Ok(())
    }
}
