//! Standard normal distribution helpers.

use statrs::function::erf::erfc;
use std::f64::consts::{PI, SQRT_2};

/// Cumulative distribution function N(x).
///
/// Written through `erfc` so the left tail keeps full relative precision.
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Probability density function φ(x).
pub fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}
