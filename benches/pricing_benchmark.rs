use chrono::{Days, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fx_hedge_engine::core::market::{MarketParameters, OptionType};
use fx_hedge_engine::pricing::garman_kohlhagen::GarmanKohlhagenPricer;
use fx_hedge_engine::quote::config::EngineConfig;
use fx_hedge_engine::quote::orchestrator::{PricingOrchestrator, PricingRequest};
use fx_hedge_engine::simulation::fx_volatility::{RateObservation, VolatilityEstimator};
use fx_hedge_engine::simulation::monte_carlo::MonteCarloRiskSimulator;

fn market() -> MarketParameters {
    MarketParameters {
        spot_rate: 19.0,
        volatility: 0.20,
        domestic_rate: 0.04,
        foreign_rate: 0.07,
        time_to_maturity_years: 0.25,
    }
}

fn bench_garman_kohlhagen(c: &mut Criterion) {
    let params = market();

    c.bench_function("garman_kohlhagen_call", |b| {
        b.iter(|| GarmanKohlhagenPricer::price(black_box(&params), black_box(19.95), OptionType::Call))
    });
}

fn bench_full_quote(c: &mut Criterion) {
    let orchestrator = PricingOrchestrator::new(EngineConfig::default()).unwrap();
    let request = PricingRequest::new(19.0, 1_000_000.0, OptionType::Call)
        .with_maturity(0.25)
        .with_volatility(0.20)
        .with_rates(0.04, 0.07);

    c.bench_function("full_quote", |b| {
        b.iter(|| orchestrator.quote(black_box(&request)))
    });
}

fn bench_volatility_one_year(c: &mut Criterion) {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let series: Vec<RateObservation> = (0..252u64)
        .map(|i| {
            let wiggle = ((i as f64) * 0.7).sin() * 0.15;
            RateObservation::new(start + Days::new(i), 19.0 + wiggle)
        })
        .collect();
    let estimator = VolatilityEstimator::default();

    c.bench_function("volatility_252_days", |b| {
        b.iter(|| estimator.estimate(black_box(&series), 252))
    });
}

fn bench_monte_carlo_10k(c: &mut Criterion) {
    let params = market();
    let simulator = MonteCarloRiskSimulator::default();

    c.bench_function("monte_carlo_10k_paths", |b| {
        b.iter(|| {
            simulator.simulate(
                black_box(&params),
                19.95,
                OptionType::Call,
                1_000_000.0,
                10_000,
                Some(42),
            )
        })
    });
}

criterion_group!(
    benches,
    bench_garman_kohlhagen,
    bench_full_quote,
    bench_volatility_one_year,
    bench_monte_carlo_10k
);
criterion_main!(benches);
