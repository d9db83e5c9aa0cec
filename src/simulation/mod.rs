//! Historical volatility estimation and Monte Carlo risk simulation.

pub mod fx_volatility;
pub mod monte_carlo;
