use crate::core::currency::CurrencyPair;
use crate::core::market::OptionType;
use crate::quote::orchestrator::PricingResult;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Treasury-facing summary of a quote, rounded for reporting.
///
/// Money amounts are domestic currency rounded to cents, rates to four
/// places and the per-unit premium to six. The analytics themselves stay
/// in `f64`; this is only the presentation layer handed to bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    pub currency_pair: Option<CurrencyPair>,
    pub option_type: OptionType,
    pub notional_amount: Decimal,
    pub spot_rate: Decimal,
    pub strike_price: Decimal,
    pub premium_per_unit: Decimal,
    pub total_premium: Decimal,
    pub cost_percentage: Decimal,
    pub max_cost_to_firm: Decimal,
    pub breakeven_rate: Decimal,
    /// Highest cost across the scenario grid without the hedge.
    pub worst_unhedged_cost: Decimal,
    /// Highest cost across the scenario grid with the hedge, premium included.
    pub worst_hedged_cost: Decimal,
}

impl CostSummary {
    pub fn from_result(result: &PricingResult) -> Self {
        let worst_unhedged = result
            .scenarios
            .iter()
            .map(|row| row.unhedged_cost)
            .fold(f64::NEG_INFINITY, f64::max);
        let worst_hedged = result
            .scenarios
            .iter()
            .map(|row| row.net_cost)
            .fold(f64::NEG_INFINITY, f64::max);

        Self {
            currency_pair: result.currency_pair.clone(),
            option_type: result.option_type,
            notional_amount: to_decimal(result.notional_amount, 2),
            spot_rate: to_decimal(result.market.spot_rate, 4),
            strike_price: to_decimal(result.strike_price, 4),
            premium_per_unit: to_decimal(result.option_price_per_unit, 6),
            total_premium: to_decimal(result.total_option_cost, 2),
            cost_percentage: to_decimal(result.cost_percentage, 4),
            max_cost_to_firm: to_decimal(result.max_cost_to_firm, 2),
            breakeven_rate: to_decimal(result.breakeven.rate, 4),
            worst_unhedged_cost: to_decimal(worst_unhedged, 2),
            worst_hedged_cost: to_decimal(worst_hedged, 2),
        }
    }

    /// What the hedge saves in the worst scenario on the grid.
    pub fn worst_case_savings(&self) -> Decimal {
        self.worst_unhedged_cost - self.worst_hedged_cost
    }
}

/// Non-finite or empty inputs report as zero.
fn to_decimal(value: f64, dp: u32) -> Decimal {
    if !value.is_finite() {
        return Decimal::ZERO;
    }
    Decimal::from_f64_retain(value)
        .unwrap_or(Decimal::ZERO)
        .round_dp(dp)
}

impl std::fmt::Display for CostSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Hedge Cost Summary ===")?;
        if let Some(pair) = &self.currency_pair {
            writeln!(f, "Pair:               {}", pair)?;
        }
        writeln!(f, "Option:             {} @ {}", self.option_type, self.strike_price)?;
        writeln!(f, "Notional:           {}", self.notional_amount)?;
        writeln!(f, "Premium per unit:   {}", self.premium_per_unit)?;
        writeln!(f, "Total premium:      {}", self.total_premium)?;
        writeln!(f, "Cost:               {}%", self.cost_percentage)?;
        writeln!(f, "Max cost to firm:   {}", self.max_cost_to_firm)?;
        writeln!(f, "Breakeven rate:     {}", self.breakeven_rate)?;
        writeln!(f, "Worst case savings: {}", self.worst_case_savings())?;
        Ok(())
    }
}
