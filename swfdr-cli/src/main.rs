//! swfdr: covariate-conditioned q-values and science-wise FDR.
//!
//! CLI entry point using clap for argument parsing.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "swfdr",
    version,
    about = "Covariate-conditioned pi0 and q-values, and science-wise FDR from published p-values",
    long_about = "Estimates the probability that each null hypothesis is true as a function of\n\
                   per-test covariates, converts it to q-values, and fits the censored mixture\n\
                   model behind the science-wise false discovery rate."
)]
struct Cli {
    /// Number of threads to use
    #[arg(long, default_value = "1", global = true)]
    threads: usize,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate pi0(x) for every test
    Pi0(commands::pi0::Pi0Args),

    /// Estimate pi0(x) and q-values
    Qvalue(commands::qvalue::QvalueArgs),

    /// Estimate the science-wise FDR from a censored p-value corpus
    Rate(commands::rate::RateArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    rayon::ThreadPoolBuilder::new()
        .num_threads(cli.threads)
        .build_global()
        .ok();

    tracing::info!("swfdr v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Using {} threads", cli.threads);

    match cli.command {
        Commands::Pi0(args) => commands::pi0::run(args),
        Commands::Qvalue(args) => commands::qvalue::run(args),
        Commands::Rate(args) => commands::rate::run(args),
    }
}
