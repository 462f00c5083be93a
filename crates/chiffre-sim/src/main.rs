//! Drives a population of wallets sharing one scarcity field and prints a
//! JSON report of where balances, memories and the field ended up.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chiffre_metrics::ChiffreMetrics;
use chiffre_sim::{Economy, SimulationProfile};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "chiffre-sim", about = "Simulate coupled stochastic wallets")]
struct Args {
    /// JSON profile; omitted fields take their defaults.
    #[arg(long)]
    profile: Option<PathBuf>,
    #[arg(long)]
    wallets: Option<usize>,
    #[arg(long)]
    cycles: Option<u64>,
    #[arg(long)]
    workers: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,
    /// Append the Prometheus text exposition after the report.
    #[arg(long)]
    metrics: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_profile(args: &Args) -> Result<SimulationProfile> {
    let mut profile = match &args.profile {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading profile {}", path.display()))?;
            SimulationProfile::from_json_str(&raw)
                .with_context(|| format!("parsing profile {}", path.display()))?
        }
        None => SimulationProfile::default(),
    };

    if let Some(wallets) = args.wallets {
        profile.wallets = wallets;
    }
    if let Some(cycles) = args.cycles {
        profile.cycles = cycles;
    }
    if let Some(workers) = args.workers {
        profile.workers = workers;
    }
    if let Some(seed) = args.seed {
        profile.seed = seed;
    }
    profile.validate().context("profile after command-line overrides")?;
    Ok(profile)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.json_logs);

    let profile = load_profile(&args)?;
    let mut economy = Economy::new(profile).context("building economy")?;
    let report = economy.run().context("running simulation")?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if args.metrics {
        let metrics = ChiffreMetrics::new()?;
        metrics.observe_population(&report.field, &report.snapshots());
        print!("{}", metrics.render()?);
    }
    Ok(())
}
