//! Bank line simulator CLI
//!
//! ```bash
//! # generated workload, fixed seed
//! bank-sim --seed 42 --customers 500
//!
//! # arrivals listing, one `time duration` pair per line
//! bank-sim --input arrivals.txt --metrics
//! ```

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use prometheus_client::encoding::text::encode;
use prometheus_client::registry::Registry;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use bank_sim::config::{ConfigError, SimulationConfig};
use bank_sim::input::{parse_arrivals, InputError};
use bank_sim::metrics::SimulationMetrics;
use bank_sim::{workload, EventSink, NullSink, SimulationEngine, SimulationError, TracingSink};

/// Single-server queue simulator
///
/// Runs a bank-teller style simulation either from an arrivals listing or
/// from a seeded synthetic workload, then prints summary statistics.
#[derive(Parser, Debug)]
#[command(name = "bank-sim")]
#[command(version, about, long_about = None)]
struct Args {
    /// Arrivals listing (`arrival_time service_duration` per line)
    #[arg(short = 'i', long, conflicts_with = "config")]
    input: Option<PathBuf>,

    /// JSON workload config
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Seed for the generated workload (overrides config)
    #[arg(long)]
    seed: Option<u64>,

    /// Number of generated customers (overrides config)
    #[arg(short = 'n', long)]
    customers: Option<usize>,

    /// Stop before processing events scheduled after this time
    #[arg(long)]
    max_time: Option<u64>,

    /// Stop after processing this many events
    #[arg(long)]
    max_events: Option<u64>,

    /// Do not log individual events
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Print Prometheus text metrics after the summary
    #[arg(long)]
    metrics: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Input { path: PathBuf, source: InputError },

    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error("failed to encode output: {0}")]
    Encode(String),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,bank_sim=info")),
        )
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(customers) = args.customers {
        config.customers = customers;
    }
    if args.max_time.is_some() {
        config.max_time = args.max_time;
    }
    if args.max_events.is_some() {
        config.max_events = args.max_events;
    }

    let events = match &args.input {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|source| CliError::Read {
                path: path.clone(),
                source,
            })?;
            parse_arrivals(&text).map_err(|source| CliError::Input {
                path: path.clone(),
                source,
            })?
        }
        None => {
            config.validate()?;
            workload::generate(&config.workload(), config.seed).map_err(ConfigError::from)?
        }
    };
    info!(arrivals = events.len(), seed = config.seed, "Starting simulation");

    let mut registry = Registry::default();
    let metrics = SimulationMetrics::new(&mut registry);
    let log_sink: Box<dyn EventSink> = if args.quiet {
        Box::new(NullSink)
    } else {
        Box::new(TracingSink)
    };
    let sinks: Vec<Box<dyn EventSink>> = vec![log_sink, Box::new(metrics)];

    let mut engine =
        SimulationEngine::with_sink(Box::new(sinks)).with_stop_condition(config.stop_condition());
    engine.seed(events)?;
    let stats = engine.run_to_completion()?;
    info!(
        events = stats.events_processed.total(),
        pending = engine.pending_events(),
        "Simulation stopped"
    );

    if args.json {
        let text = serde_json::to_string_pretty(&stats).map_err(|e| CliError::Encode(e.to_string()))?;
        println!("{text}");
    } else {
        println!("Final statistics:");
        println!("  Simulated time:        {}", stats.current_time);
        println!(
            "  Events processed:      {} ({} arrivals, {} departures)",
            stats.events_processed.total(),
            stats.events_processed.arrivals,
            stats.events_processed.departures
        );
        println!("  Customers who waited:  {}", stats.customers_served);
        println!("  Total wait time:       {}", stats.total_wait_time);
        match stats.average_wait() {
            Some(avg) => println!("  Average wait:          {avg:.2}"),
            None => println!("  Average wait:          n/a"),
        }
        match stats.utilization() {
            Some(u) => println!("  Server utilization:    {:.1}%", u * 100.0),
            None => println!("  Server utilization:    n/a"),
        }
        println!("  Longest line:          {}", stats.max_line_length);
    }

    if args.metrics {
        let mut text = String::new();
        encode(&mut text, &registry).map_err(|e| CliError::Encode(e.to_string()))?;
        print!("{text}");
    }
    Ok(())
}
