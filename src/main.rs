//! fx-hedge CLI
//!
//! Price FX option hedges and profile their risk from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Price a hedge request
//! fx-hedge price --input request.json
//!
//! # Estimate volatility from rate history and use it for the quote
//! fx-hedge price --input request.json --history usdmxn.json --format json
//!
//! # Historical volatility only
//! fx-hedge volatility --input usdmxn.json --lookback 60
//!
//! # Monte Carlo risk profile
//! fx-hedge simulate --input request.json --paths 50000 --seed 7
//! ```
//!
//! Set `RUST_LOG=debug` for engine logging on stderr.

use fx_hedge_engine::quote::config::EngineConfig;
use fx_hedge_engine::quote::orchestrator::{PricingOrchestrator, PricingRequest, PricingResult};
use fx_hedge_engine::quote::summary::CostSummary;
use fx_hedge_engine::simulation::fx_volatility::RateObservation;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::process;

fn print_usage() {
    eprintln!(
        r#"fx-hedge: Garman-Kohlhagen pricing and risk analytics for FX option hedges

USAGE:
    fx-hedge <COMMAND> [OPTIONS]

COMMANDS:
    price       Price a hedge and print scenarios, Greeks and breakeven
    volatility  Estimate annualized volatility from a rate history
    simulate    Run a Monte Carlo risk profile for a hedge
    help        Show this message

OPTIONS (all commands):
    --input <FILE>      Request JSON (price, simulate) or history JSON (volatility)
    --config <FILE>     Engine configuration JSON (defaults apply otherwise)
    --format <FORMAT>   Output format: text (default) or json

OPTIONS (price):
    --history <FILE>    Rate history used when the request has no volatility

OPTIONS (volatility):
    --lookback <N>      Most recent observations to use (default: from config)

OPTIONS (simulate):
    --paths <N>         Number of simulated paths (default: from config)
    --seed <N>          Seed for a reproducible run

EXAMPLES:
    fx-hedge price --input request.json
    fx-hedge price --input request.json --history usdmxn.json --format json
    fx-hedge volatility --input usdmxn.json --lookback 60
    fx-hedge simulate --input request.json --paths 50000 --seed 7"#
    );
}

/// JSON schema for rate history input.
#[derive(Deserialize)]
struct HistoryFile {
    observations: Vec<RateObservation>,
}

/// JSON output schema for a priced hedge.
#[derive(Serialize)]
struct PriceOutput<'a> {
    summary: CostSummary,
    result: &'a PricingResult,
}

#[derive(Default)]
struct Options {
    input: Option<String>,
    config: Option<String>,
    history: Option<String>,
    format: String,
    lookback: Option<usize>,
    paths: Option<usize>,
    seed: Option<u64>,
}

fn parse_options(args: &[String], allowed: &[&str]) -> Options {
    let mut options = Options {
        format: "text".to_string(),
        ..Default::default()
    };
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        if !allowed.contains(&flag) {
            eprintln!("Unknown option: {}", flag);
            process::exit(1);
        }
        i += 1;
        let value = args.get(i).cloned().unwrap_or_else(|| {
            eprintln!("{} requires a value", flag);
            process::exit(1);
        });
        match flag {
            "--input" => options.input = Some(value),
            "--config" => options.config = Some(value),
            "--history" => options.history = Some(value),
            "--format" => {
                if value != "text" && value != "json" {
                    eprintln!("--format requires 'text' or 'json'");
                    process::exit(1);
                }
                options.format = value;
            }
            "--lookback" => options.lookback = Some(parse_number(flag, &value)),
            "--paths" => options.paths = Some(parse_number(flag, &value)),
            "--seed" => options.seed = Some(parse_number(flag, &value)),
            other => {
                eprintln!("Unknown option: {}", other);
                process::exit(1);
            }
        }
        i += 1;
    }
    options
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: &str) -> T {
    value.parse().unwrap_or_else(|_| {
        eprintln!("{} requires a non-negative integer, got '{}'", flag, value);
        process::exit(1);
    })
}

fn load_json<T: DeserializeOwned>(path: &str, expected: &str) -> T {
    let content = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{}': {}", path, e);
        process::exit(1);
    });
    serde_json::from_str(&content).unwrap_or_else(|e| {
        eprintln!("Error parsing JSON in '{}': {}", path, e);
        eprintln!("Expected format:");
        eprintln!("{}", expected);
        process::exit(1);
    })
}

const REQUEST_FORMAT: &str = r#"{
  "spot_rate": 19.0,
  "notional_amount": 1000000,
  "option_type": "call",
  "protection_level": 0.05,
  "time_to_maturity_years": 0.25,
  "volatility": 0.20,
  "currency_pair": { "base": "USD", "quote": "MXN" }
}"#;

const HISTORY_FORMAT: &str = r#"{
  "observations": [
    { "date": "2024-01-02", "rate": 17.02 },
    { "date": "2024-01-03", "rate": 17.11 }
  ]
}"#;

fn required_input(options: &Options) -> String {
    options.input.clone().unwrap_or_else(|| {
        eprintln!("Error: --input <FILE> is required");
        process::exit(1);
    })
}

fn load_config(options: &Options) -> EngineConfig {
    match &options.config {
        Some(path) => EngineConfig::from_file(path).unwrap_or_else(|e| {
            eprintln!("Error loading config '{}': {}", path, e);
            process::exit(1);
        }),
        None => EngineConfig::default(),
    }
}

fn build_orchestrator(config: EngineConfig) -> PricingOrchestrator {
    PricingOrchestrator::new(config).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    })
}

fn print_json<T: Serialize>(value: &T) {
    let json = serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        eprintln!("Error serializing output: {}", e);
        process::exit(1);
    });
    println!("{}", json);
}

fn cmd_price(args: &[String]) {
    let options = parse_options(args, &["--input", "--config", "--format", "--history"]);
    let orchestrator = build_orchestrator(load_config(&options));
    let request: PricingRequest = load_json(&required_input(&options), REQUEST_FORMAT);

    let result = match &options.history {
        Some(path) => {
            let history: HistoryFile = load_json(path, HISTORY_FORMAT);
            orchestrator.quote_with_history(&request, &history.observations)
        }
        None => orchestrator.quote(&request),
    }
    .unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });
    let summary = CostSummary::from_result(&result);

    if options.format == "json" {
        print_json(&PriceOutput {
            summary,
            result: &result,
        });
    } else {
        println!("{}", result);
        println!("{}", summary);
    }
}

fn cmd_volatility(args: &[String]) {
    let options = parse_options(args, &["--input", "--config", "--format", "--lookback"]);
    let history: HistoryFile = load_json(&required_input(&options), HISTORY_FORMAT);

    let mut config = load_config(&options);
    if let Some(lookback) = options.lookback {
        config.volatility_lookback_days = lookback;
    }
    let orchestrator = build_orchestrator(config);

    let estimate = orchestrator
        .estimate_volatility(&history.observations)
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            process::exit(1);
        });

    if options.format == "json" {
        print_json(&estimate);
    } else {
        println!("=== Historical Volatility ===");
        println!("Annualized:        {:.2}%", estimate.percentage());
        println!("Daily:             {:.4}%", estimate.daily_volatility * 100.0);
        println!(
            "Observations:      {} (lookback {})",
            estimate.observations, estimate.lookback_days
        );
        println!("Method:            {}", estimate.method);
        println!("Computed at:       {}", estimate.computed_at);
    }
}

fn cmd_simulate(args: &[String]) {
    let options = parse_options(
        args,
        &["--input", "--config", "--format", "--paths", "--seed"],
    );
    let orchestrator = build_orchestrator(load_config(&options));
    let request: PricingRequest = load_json(&required_input(&options), REQUEST_FORMAT);

    let paths = options
        .paths
        .unwrap_or(orchestrator.config().monte_carlo_paths);
    let report = orchestrator
        .simulate_paths(&request, paths, options.seed)
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            process::exit(1);
        });

    if options.format == "json" {
        print_json(&report);
    } else {
        println!("{}", report);
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "price" => cmd_price(rest),
        "volatility" => cmd_volatility(rest),
        "simulate" => cmd_simulate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
