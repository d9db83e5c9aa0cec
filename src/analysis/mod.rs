//! Scenario tables and payoff curves for a priced hedge.

pub mod payoff;
pub mod scenario;
