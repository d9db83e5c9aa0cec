//! Closed-form option valuation.

pub mod garman_kohlhagen;
pub mod normal;
