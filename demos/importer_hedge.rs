//! Mexican importer hedging a USD payable.
//!
//! Prices a 5% out-of-the-money USD call against MXN, compares outcomes
//! across the default scenario grid and shows how the premium moves with
//! volatility.

use fx_hedge_engine::core::currency::{CurrencyCode, CurrencyPair};
use fx_hedge_engine::core::market::OptionType;
use fx_hedge_engine::quote::config::EngineConfig;
use fx_hedge_engine::quote::orchestrator::{PricingOrchestrator, PricingRequest};
use fx_hedge_engine::quote::summary::CostSummary;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("╔══════════════════════════════════════════╗");
    println!("║  fx-hedge-engine: Importer Call Hedge    ║");
    println!("╚══════════════════════════════════════════╝\n");

    let orchestrator = PricingOrchestrator::new(EngineConfig::default())?;
    let usd_mxn = CurrencyPair::new(CurrencyCode::new("USD"), CurrencyCode::new("MXN"));

    // --- Scenario 1: Three-month payable of USD 1M ---
    println!("━━━ Scenario 1: USD 1M payable in 3 months ━━━\n");

    let request = PricingRequest::new(19.0, 1_000_000.0, OptionType::Call)
        .with_protection_level(0.05)
        .with_maturity(0.25)
        .with_volatility(0.20)
        .with_rates(0.04, 0.07)
        .with_currency_pair(usd_mxn.clone());

    let result = orchestrator.quote(&request)?;
    println!("{}", result);
    println!("{}", CostSummary::from_result(&result));

    // --- Scenario 2: Premium against volatility ---
    println!("━━━ Scenario 2: Premium vs volatility ━━━\n");

    println!("  {:>10} {:>14} {:>10}", "Volatility", "Premium/unit", "Cost");
    for vol in [0.10, 0.15, 0.20, 0.25, 0.30] {
        let quote = orchestrator.quote(&request.clone().with_volatility(vol))?;
        println!(
            "  {:>9.0}% {:>14.6} {:>9.2}%",
            vol * 100.0,
            quote.option_price_per_unit,
            quote.cost_percentage
        );
    }
    println!();

    // --- Scenario 3: Tighter protection costs more ---
    println!("━━━ Scenario 3: Protection level trade-off ━━━\n");

    println!("  {:>10} {:>10} {:>16} {:>18}", "Level", "Strike", "Total premium", "Max cost to firm");
    for level in [0.0, 0.02, 0.05, 0.08, 0.10] {
        let quote = orchestrator.quote(&request.clone().with_protection_level(level))?;
        println!(
            "  {:>9.0}% {:>10.4} {:>16.2} {:>18.2}",
            level * 100.0,
            quote.strike_price,
            quote.total_option_cost,
            quote.max_cost_to_firm
        );
    }

    Ok(())
}
