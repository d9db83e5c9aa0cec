//! Colombian exporter protecting USD receivables.
//!
//! Estimates volatility from a short USD/COP history, prices a USD put with
//! it and runs a seeded Monte Carlo profile of where the rate may land.

use chrono::{Days, NaiveDate};
use fx_hedge_engine::core::currency::CurrencyPair;
use fx_hedge_engine::core::market::OptionType;
use fx_hedge_engine::quote::config::EngineConfig;
use fx_hedge_engine::quote::orchestrator::{PricingOrchestrator, PricingRequest};
use fx_hedge_engine::simulation::fx_volatility::RateObservation;
use fx_hedge_engine::simulation::monte_carlo::MonteCarloRiskSimulator;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("╔══════════════════════════════════════════╗");
    println!("║  fx-hedge-engine: Exporter Risk Profile  ║");
    println!("╚══════════════════════════════════════════╝\n");

    let orchestrator = PricingOrchestrator::new(EngineConfig::default())?;
    let usd_cop = CurrencyPair::parse("USD/COP").ok_or("invalid currency pair")?;

    // Two weeks of fixings.
    let fixings = [
        3_912.5, 3_925.0, 3_941.8, 3_930.2, 3_958.4, 3_972.1, 3_950.6, 3_968.9, 3_990.3,
        3_984.7, 3_975.2, 3_998.6, 4_012.4, 4_000.0,
    ];
    let start = NaiveDate::from_ymd_opt(2024, 5, 1).ok_or("invalid start date")?;
    let history: Vec<RateObservation> = fixings
        .iter()
        .enumerate()
        .map(|(i, rate)| RateObservation::new(start + Days::new(i as u64), *rate))
        .collect();

    // --- Step 1: Historical volatility ---
    println!("━━━ Step 1: Historical volatility ━━━\n");

    let estimate = orchestrator.estimate_volatility(&history)?;
    println!("Observations:      {}", estimate.observations);
    println!("Daily volatility:  {:.4}%", estimate.daily_volatility * 100.0);
    println!("Annualized:        {:.2}%\n", estimate.percentage());

    // --- Step 2: Price the put on USD 250k receivable in 6 months ---
    println!("━━━ Step 2: USD put on a 6-month receivable ━━━\n");

    let request = PricingRequest::new(4_000.0, 250_000.0, OptionType::Put)
        .with_protection_level(0.03)
        .with_maturity(0.5)
        .with_currency_pair(usd_cop);

    let result = orchestrator.quote_with_history(&request, &history)?;
    println!("{}", result);

    // --- Step 3: Where can the rate land? ---
    println!("━━━ Step 3: Monte Carlo risk profile ━━━\n");

    let report = orchestrator.simulate_paths(
        &request.clone().with_volatility(result.market.volatility),
        50_000,
        Some(7),
    )?;
    println!("{}", report);

    let analytic = MonteCarloRiskSimulator::analytic_protected_probability(
        &result.market,
        result.strike_price,
        OptionType::Put,
    )?;
    println!(
        "Protected probability: simulated {:.2}% vs closed form {:.2}%",
        report.statistics.protected_probability, analytic
    );

    Ok(())
}
