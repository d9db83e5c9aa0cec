//! # fx-hedge-engine
//!
//! Pricing and risk analytics for corporate FX option hedges.
//!
//! An importer buys a call on the foreign currency to cap what it pays; an
//! exporter buys a put to floor what it receives. Given spot, volatility,
//! both interest rates and the hedge terms, the engine prices the option
//! with Garman-Kohlhagen and explains what the hedge buys.
//!
//! ## Architecture
//!
//! - **core**: Market inputs, hedge terms, currencies and errors
//! - **pricing**: Garman-Kohlhagen prices and Greeks
//! - **analysis**: Scenario tables, payoff curves and breakeven
//! - **simulation**: Historical volatility and Monte Carlo risk profiles
//! - **quote**: Request resolution, configuration and reporting summaries
//!
//! All calculations are pure functions of their inputs. The only randomness
//! is the Monte Carlo source, which is owned per run and can be seeded.

pub mod analysis;
pub mod core;
pub mod pricing;
pub mod quote;
pub mod simulation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::core::currency::{CurrencyCode, CurrencyPair, RiskFreeRateTable};
    pub use crate::core::error::EngineError;
    pub use crate::core::market::{HedgeSpecification, MarketParameters, OptionType};
    pub use crate::pricing::garman_kohlhagen::{GarmanKohlhagenPricer, Greeks, OptionValuation};
    pub use crate::quote::config::EngineConfig;
    pub use crate::quote::orchestrator::{PricingOrchestrator, PricingRequest, PricingResult};
    pub use crate::quote::summary::CostSummary;
    pub use crate::simulation::fx_volatility::{RateObservation, VolatilityEstimator};
    pub use crate::simulation::monte_carlo::MonteCarloRiskSimulator;
}
