//! Science-wise false discovery rate from a censored p-value corpus.
//!
//! swfdr rate --input ... --pvalue-col ... --truncated-col ... --rounded-col ... --output ...

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use clap::Args;
use tracing::info;

use swfdr_core::censored::{estimate_swfdr, BfgsConfig, EmConfig};
use swfdr_io::corpus::parse_corpus;
use swfdr_io::output::{write_bin_summary, write_corpus_results};

use super::{create_output, write_json};

#[derive(Args)]
pub struct RateArgs {
    /// Delimited corpus file with a header line
    #[arg(long)]
    input: String,

    /// P-value column name
    #[arg(long, default_value = "pvalue")]
    pvalue_col: String,

    /// Truncation flag column name
    #[arg(long, default_value = "pvalueTruncated")]
    truncated_col: String,

    /// Rounding flag column name
    #[arg(long, default_value = "pRounded")]
    rounded_col: String,

    /// Starting null proportion
    #[arg(long, default_value = "0.5")]
    pi0: f64,

    /// Starting Beta shape alpha
    #[arg(long, default_value = "1.0")]
    alpha: f64,

    /// Starting Beta shape beta
    #[arg(long, default_value = "50.0")]
    beta: f64,

    /// EM iterations
    #[arg(long, default_value = "100")]
    iterations: usize,

    /// Stop early once no parameter changes by more than this
    #[arg(long)]
    tol: Option<f64>,

    /// Per-observation output file (tab-separated)
    #[arg(long)]
    output: String,

    /// Optional JSON file with the full estimate
    #[arg(long)]
    json: Option<String>,
}

pub fn run(args: RateArgs) -> Result<()> {
    let corpus = parse_corpus(Path::new(&args.input), &args.pvalue_col, &args.truncated_col, &args.rounded_col)?;
    info!("Loaded {} published p-values", corpus.pvalues.len());

    let config = EmConfig {
        pi0: args.pi0,
        alpha: args.alpha,
        beta: args.beta,
        iterations: args.iterations,
        tol: args.tol,
        optimizer: BfgsConfig::default(),
    };
    let estimate = estimate_swfdr(&corpus.pvalues, &corpus.truncated, &corpus.rounded, &config)?;

    let mut writer = create_output(&args.output)?;
    write_corpus_results(&mut writer, &corpus, &estimate.z)?;
    writer.flush()?;
    info!("Results written to {}", args.output);

    println!("Science-wise FDR: {:.4}", estimate.pi0);
    println!("Alternative Beta({:.4}, {:.4})", estimate.alpha, estimate.beta);
    println!("EM iterations: {}", estimate.iterations);
    write_bin_summary(&mut std::io::stdout().lock(), &estimate.bins)?;

    if let Some(path) = &args.json {
        write_json(path, &estimate)?;
    }
    Ok(())
}
