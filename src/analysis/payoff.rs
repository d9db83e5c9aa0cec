use crate::core::error::{ensure_finite, EngineError};
use crate::core::market::{HedgeSpecification, MarketParameters, OptionType};
use serde::{Deserialize, Serialize};

/// Default half-width of the charted range around spot and strike.
pub const DEFAULT_RANGE_FRACTION: f64 = 0.15;

/// Most samples a payoff curve may hold.
pub const MAX_CURVE_POINTS: usize = 10_000;

/// One sample of the hedge P&L profile, relative to converting at today's spot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PayoffPoint {
    pub spot_rate: f64,
    pub unhedged_pnl: f64,
    pub option_payoff: f64,
    pub net_pnl: f64,
}

/// Future spot rate at which the hedged position breaks even.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breakeven {
    pub rate: f64,
    /// False when net P&L never crosses zero inside the sampled range; `rate`
    /// is then the range boundary closest to zero P&L, not an extrapolation.
    pub within_range: bool,
}

/// Builds the continuous payoff curve used for charting and breakeven search.
pub struct PayoffCurveBuilder;

impl PayoffCurveBuilder {
    /// Sample `point_count` evenly spaced rates around spot and strike.
    pub fn build(
        params: &MarketParameters,
        hedge: &HedgeSpecification,
        price_per_unit: f64,
        point_count: usize,
    ) -> Result<Vec<PayoffPoint>, EngineError> {
        Self::build_with_range(params, hedge, price_per_unit, point_count, DEFAULT_RANGE_FRACTION)
    }

    /// Like [`build`](Self::build) with an explicit range.
    ///
    /// The curve spans `min(spot, strike) * (1 - range_fraction)` to
    /// `max(spot, strike) * (1 + range_fraction)`, so the strike kink is
    /// always on the chart.
    pub fn build_with_range(
        params: &MarketParameters,
        hedge: &HedgeSpecification,
        price_per_unit: f64,
        point_count: usize,
        range_fraction: f64,
    ) -> Result<Vec<PayoffPoint>, EngineError> {
        params.validate()?;
        if !(2..=MAX_CURVE_POINTS).contains(&point_count) {
            return Err(EngineError::validation(
                "point_count",
                format!("must lie in [2, {MAX_CURVE_POINTS}], got {point_count}"),
            ));
        }
        ensure_finite("range_fraction", range_fraction)?;
        if range_fraction <= 0.0 || range_fraction >= 1.0 {
            return Err(EngineError::validation(
                "range_fraction",
                format!("must lie in (0, 1), got {range_fraction}"),
            ));
        }

        let profile = PnlProfile::new(params, hedge, price_per_unit)?;
        let lower = params.spot_rate.min(profile.strike) * (1.0 - range_fraction);
        let upper = params.spot_rate.max(profile.strike) * (1.0 + range_fraction);
        let step = (upper - lower) / (point_count - 1) as f64;

        Ok((0..point_count)
            .map(|i| {
                // Pin the last sample to the boundary exactly.
                let rate = if i + 1 == point_count {
                    upper
                } else {
                    lower + step * i as f64
                };
                profile.point(rate)
            })
            .collect())
    }

    /// Locate where `net_pnl` crosses zero on an ordered curve.
    ///
    /// The bracketing segment is solved exactly: net P&L is linear on each
    /// side of the strike, so a segment that straddles the strike is split
    /// there before interpolating.
    pub fn breakeven(
        params: &MarketParameters,
        hedge: &HedgeSpecification,
        price_per_unit: f64,
        curve: &[PayoffPoint],
    ) -> Result<Breakeven, EngineError> {
        let (first, last) = match (curve.first(), curve.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(EngineError::validation("payoff_curve", "must not be empty")),
        };
        let profile = PnlProfile::new(params, hedge, price_per_unit)?;

        if let Some(point) = curve.iter().find(|p| p.net_pnl == 0.0) {
            return Ok(Breakeven {
                rate: point.spot_rate,
                within_range: true,
            });
        }

        for pair in curve.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if !changes_sign(a.net_pnl, b.net_pnl) {
                continue;
            }
            let strike = profile.strike;
            let (lo, hi) = if a.spot_rate < strike && strike < b.spot_rate {
                let kink = profile.point(strike);
                if kink.net_pnl == 0.0 {
                    return Ok(Breakeven {
                        rate: strike,
                        within_range: true,
                    });
                }
                if changes_sign(a.net_pnl, kink.net_pnl) {
                    (*a, kink)
                } else {
                    (kink, *b)
                }
            } else {
                (*a, *b)
            };
            let rate = lo.spot_rate
                + (hi.spot_rate - lo.spot_rate) * (-lo.net_pnl) / (hi.net_pnl - lo.net_pnl);
            return Ok(Breakeven {
                rate,
                within_range: true,
            });
        }

        let nearest = if first.net_pnl.abs() <= last.net_pnl.abs() {
            first
        } else {
            last
        };
        Ok(Breakeven {
            rate: nearest.spot_rate,
            within_range: false,
        })
    }

    /// Net P&L of the hedged position at a single future rate.
    pub fn net_pnl_at(
        params: &MarketParameters,
        hedge: &HedgeSpecification,
        price_per_unit: f64,
        future_spot_rate: f64,
    ) -> Result<f64, EngineError> {
        let profile = PnlProfile::new(params, hedge, price_per_unit)?;
        Ok(profile.point(future_spot_rate).net_pnl)
    }
}

fn changes_sign(a: f64, b: f64) -> bool {
    (a < 0.0 && b > 0.0) || (a > 0.0 && b < 0.0)
}

/// Everything needed to evaluate the P&L at any rate.
struct PnlProfile {
    spot: f64,
    strike: f64,
    option_type: OptionType,
    notional: f64,
    total_option_cost: f64,
}

impl PnlProfile {
    fn new(
        params: &MarketParameters,
        hedge: &HedgeSpecification,
        price_per_unit: f64,
    ) -> Result<Self, EngineError> {
        ensure_finite("price_per_unit", price_per_unit)?;
        if price_per_unit < 0.0 {
            return Err(EngineError::validation(
                "price_per_unit",
                format!("must be non-negative, got {price_per_unit}"),
            ));
        }
        Ok(Self {
            spot: params.spot_rate,
            strike: hedge.strike_price(params.spot_rate)?,
            option_type: hedge.option_type(),
            notional: hedge.notional_amount(),
            total_option_cost: price_per_unit * hedge.notional_amount(),
        })
    }

    fn point(&self, rate: f64) -> PayoffPoint {
        // Importers lose when the rate rises, exporters when it falls.
        let unhedged_pnl = self.option_type.side() * self.notional * (self.spot - rate);
        let option_payoff = self.notional * self.option_type.intrinsic(rate, self.strike);
        PayoffPoint {
            spot_rate: rate,
            unhedged_pnl,
            option_payoff,
            net_pnl: unhedged_pnl + option_payoff - self.total_option_cost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn market() -> MarketParameters {
        MarketParameters::new(19.0, 0.20, 0.04, 0.07, 0.25).unwrap()
    }

    #[test]
    fn test_curve_shape() {
        let hedge = HedgeSpecification::new(OptionType::Call, 0.05, 1_000_000.0).unwrap();
        let curve = PayoffCurveBuilder::build(&market(), &hedge, 0.343, 50).unwrap();

        assert_eq!(curve.len(), 50);
        assert_relative_eq!(curve[0].spot_rate, 19.0 * 0.85, max_relative = 1e-12);
        assert_relative_eq!(curve[49].spot_rate, 19.95 * 1.15, max_relative = 1e-12);
        assert!(curve.windows(2).all(|w| w[0].spot_rate < w[1].spot_rate));
    }

    #[test]
    fn test_call_loss_is_capped_above_strike() {
        let hedge = HedgeSpecification::new(OptionType::Call, 0.05, 1_000_000.0).unwrap();
        let curve = PayoffCurveBuilder::build(&market(), &hedge, 0.343, 40).unwrap();
        let floor = 1_000_000.0 * (19.0 - 19.95) - 343_000.0;
        for point in curve.iter().filter(|p| p.spot_rate > 19.95) {
            assert_relative_eq!(point.net_pnl, floor, max_relative = 1e-9);
        }
        let far = curve.last().unwrap();
        assert!(far.unhedged_pnl < far.net_pnl);
    }

    #[test]
    fn test_call_breakeven() {
        let hedge = HedgeSpecification::new(OptionType::Call, 0.05, 1_000_000.0).unwrap();
        let curve = PayoffCurveBuilder::build(&market(), &hedge, 0.343, 50).unwrap();
        let breakeven = PayoffCurveBuilder::breakeven(&market(), &hedge, 0.343, &curve).unwrap();

        assert!(breakeven.within_range);
        // Rate must fall by the premium per unit before the hedger is ahead.
        assert_abs_diff_eq!(breakeven.rate, 19.0 - 0.343, epsilon = 1e-9);
        let pnl =
            PayoffCurveBuilder::net_pnl_at(&market(), &hedge, 0.343, breakeven.rate).unwrap();
        assert_abs_diff_eq!(pnl, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_put_breakeven() {
        let hedge = HedgeSpecification::new(OptionType::Put, 0.05, 500_000.0).unwrap();
        let curve = PayoffCurveBuilder::build(&market(), &hedge, 0.12, 31).unwrap();
        let breakeven = PayoffCurveBuilder::breakeven(&market(), &hedge, 0.12, &curve).unwrap();

        assert!(breakeven.within_range);
        assert_abs_diff_eq!(breakeven.rate, 19.12, epsilon = 1e-9);
    }

    #[test]
    fn test_breakeven_across_strike_kink() {
        // Two coarse points straddle both the strike and the root.
        let params = MarketParameters::new(100.0, 0.2, 0.0, 0.0, 1.0).unwrap();
        let hedge = HedgeSpecification::new(OptionType::Put, 0.02, 1.0).unwrap();
        let curve = PayoffCurveBuilder::build(&params, &hedge, 1.0, 2).unwrap();
        let breakeven = PayoffCurveBuilder::breakeven(&params, &hedge, 1.0, &curve).unwrap();

        assert!(breakeven.within_range);
        assert_abs_diff_eq!(breakeven.rate, 101.0, epsilon = 1e-9);
    }

    #[test]
    fn test_no_crossing_reports_boundary() {
        // Premium so large the hedge never pays for itself on the chart.
        let hedge = HedgeSpecification::new(OptionType::Call, 0.05, 1.0).unwrap();
        let curve = PayoffCurveBuilder::build(&market(), &hedge, 10.0, 20).unwrap();
        let breakeven = PayoffCurveBuilder::breakeven(&market(), &hedge, 10.0, &curve).unwrap();

        assert!(!breakeven.within_range);
        assert_eq!(breakeven.rate, curve[0].spot_rate);
    }

    #[test]
    fn test_invalid_inputs() {
        let hedge = HedgeSpecification::new(OptionType::Call, 0.05, 1.0).unwrap();
        assert!(PayoffCurveBuilder::build(&market(), &hedge, 0.3, 1).is_err());
        assert!(PayoffCurveBuilder::build(&market(), &hedge, 0.3, MAX_CURVE_POINTS + 1).is_err());
        assert!(PayoffCurveBuilder::build(&market(), &hedge, 0.3, usize::MAX).is_err());
        assert!(PayoffCurveBuilder::build_with_range(&market(), &hedge, 0.3, 10, 1.0).is_err());
        assert!(PayoffCurveBuilder::breakeven(&market(), &hedge, 0.3, &[]).is_err());
    }
}
