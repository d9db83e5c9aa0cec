//! Closed-form European FX option valuation.
//!
//! The Garman-Kohlhagen model is Black-Scholes with the foreign interest
//! rate playing the role of a continuous dividend yield:
//!
//! ```text
//! d1 = [ln(S/K) + (r_d - r_f + σ²/2)·T] / (σ·√T)
//! d2 = d1 - σ·√T
//! C  = S·e^(-r_f·T)·N(d1) - K·e^(-r_d·T)·N(d2)
//! P  = K·e^(-r_d·T)·N(-d2) - S·e^(-r_f·T)·N(-d1)
//! ```

use crate::core::error::{ensure_positive, EngineError};
use crate::core::market::{MarketParameters, OptionType};
use crate::pricing::normal::{norm_cdf, norm_pdf};
use serde::{Deserialize, Serialize};

/// Calendar days used to express theta as a daily figure.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Below this σ√T the d1/d2 division is meaningless and the option is
/// valued at its discounted intrinsic value.
const MIN_TOTAL_VOLATILITY: f64 = 1e-12;

/// Analytic sensitivities of the option price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    /// ∂V/∂S.
    pub delta: f64,
    /// ∂²V/∂S², identical for calls and puts.
    pub gamma: f64,
    /// ∂V/∂σ per 1.00 of volatility.
    pub vega: f64,
    /// Value change per calendar day as maturity approaches.
    pub theta: f64,
}

impl Greeks {
    /// Vega per one volatility point (σ moving by 0.01).
    pub fn vega_per_point(&self) -> f64 {
        self.vega / 100.0
    }
}

/// Price and sensitivities of a single option.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionValuation {
    pub option_type: OptionType,
    pub strike_price: f64,
    /// Premium in domestic currency per unit of foreign notional.
    pub price_per_unit: f64,
    /// `None` when σ√T is zero and the closed form does not apply.
    pub d1: Option<f64>,
    pub d2: Option<f64>,
    pub greeks: Greeks,
}

impl OptionValuation {
    /// True when the discounted intrinsic value branch was taken.
    pub fn is_degenerate(&self) -> bool {
        self.d1.is_none()
    }
}

/// Garman-Kohlhagen pricer.
///
/// Stateless: identical inputs give bit-identical outputs.
///
/// # Examples
///
/// ```
/// use fx_hedge_engine::core::market::{MarketParameters, OptionType};
/// use fx_hedge_engine::pricing::garman_kohlhagen::GarmanKohlhagenPricer;
///
/// let params = MarketParameters::new(19.0, 0.20, 0.04, 0.07, 0.25).unwrap();
/// let call = GarmanKohlhagenPricer::price(&params, 19.95, OptionType::Call).unwrap();
/// assert!((call.price_per_unit - 0.343).abs() < 0.001);
/// ```
pub struct GarmanKohlhagenPricer;

impl GarmanKohlhagenPricer {
    /// Value a European option on the spot rate.
    ///
    /// Fails with a validation error when the market parameters are out of
    /// domain (non-positive maturity, negative volatility, ...) or the strike
    /// is not positive.
    pub fn price(
        params: &MarketParameters,
        strike: f64,
        option_type: OptionType,
    ) -> Result<OptionValuation, EngineError> {
        params.validate()?;
        ensure_positive("strike_price", strike)?;

        let vol_sqrt_t = params.total_volatility();
        if vol_sqrt_t < MIN_TOTAL_VOLATILITY {
            return Ok(Self::intrinsic_limit(params, strike, option_type));
        }

        let s = params.spot_rate;
        let t = params.time_to_maturity_years;
        let sigma = params.volatility;
        let side = option_type.side();
        let df_foreign = params.foreign_discount();
        let df_domestic = params.domestic_discount();

        let d1 = ((s / strike).ln()
            + (params.domestic_rate - params.foreign_rate + 0.5 * sigma * sigma) * t)
            / vol_sqrt_t;
        let d2 = d1 - vol_sqrt_t;

        let n_d1 = norm_cdf(side * d1);
        let n_d2 = norm_cdf(side * d2);
        let pdf_d1 = norm_pdf(d1);

        let spot_leg = s * df_foreign;
        let strike_leg = strike * df_domestic;

        // Cancellation can leave a deep out-of-the-money value a few ulps below zero.
        let price = (side * (spot_leg * n_d1 - strike_leg * n_d2)).max(0.0);

        let delta = side * df_foreign * n_d1;
        let gamma = df_foreign * pdf_d1 / (s * vol_sqrt_t);
        let vega = spot_leg * pdf_d1 * t.sqrt();
        let theta_annual = -spot_leg * pdf_d1 * sigma / (2.0 * t.sqrt())
            + side
                * (params.foreign_rate * spot_leg * n_d1
                    - params.domestic_rate * strike_leg * n_d2);

        Ok(OptionValuation {
            option_type,
            strike_price: strike,
            price_per_unit: price,
            d1: Some(d1),
            d2: Some(d2),
            greeks: Greeks {
                delta,
                gamma,
                vega,
                theta: theta_annual / DAYS_PER_YEAR,
            },
        })
    }

    /// Discounted forward moneyness `S·e^(-r_f·T) - K·e^(-r_d·T)`.
    ///
    /// Call minus put equals this for any volatility.
    pub fn discounted_forward_value(params: &MarketParameters, strike: f64) -> f64 {
        params.spot_rate * params.foreign_discount() - strike * params.domestic_discount()
    }

    fn intrinsic_limit(
        params: &MarketParameters,
        strike: f64,
        option_type: OptionType,
    ) -> OptionValuation {
        let side = option_type.side();
        let moneyness = side * Self::discounted_forward_value(params, strike);
        let in_the_money = moneyness > 0.0;

        let (delta, theta_annual) = if in_the_money {
            let spot_leg = params.spot_rate * params.foreign_discount();
            let strike_leg = strike * params.domestic_discount();
            (
                side * params.foreign_discount(),
                side * (params.foreign_rate * spot_leg - params.domestic_rate * strike_leg),
            )
        } else {
            (0.0, 0.0)
        };

        OptionValuation {
            option_type,
            strike_price: strike,
            price_per_unit: moneyness.max(0.0),
            d1: None,
            d2: None,
            greeks: Greeks {
                delta,
                gamma: 0.0,
                vega: 0.0,
                theta: theta_annual / DAYS_PER_YEAR,
            },
        }
    }
}
