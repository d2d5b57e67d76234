//! Estimate π₀(x) for every test.
//!
//! swfdr pi0 --input ... --pvalue-col ... --covar-cols ... --output ...

use std::io::Write;

use anyhow::Result;
use clap::Args;
use tracing::info;

use swfdr_core::pi0::estimate_pi0;
use swfdr_io::output::write_pvalue_results;

use super::{create_output, write_json, Pi0Options, Pi0Summary};

#[derive(Args)]
pub struct Pi0Args {
    #[command(flatten)]
    options: Pi0Options,
}

pub fn run(args: Pi0Args) -> Result<()> {
    let config = args.options.config()?;
    let loaded = args.options.load()?;

    let estimate = estimate_pi0(&loaded.pvalues, loaded.design.as_ref(), &config)?;

    let mut writer = create_output(args.options.output())?;
    write_pvalue_results(&mut writer, &loaded.table, &loaded.rows, &estimate.pi0, None)?;
    writer.flush()?;
    info!("Results written to {}", args.options.output());

    let summary = Pi0Summary::new(&estimate.pi0);
    println!("Tests: {}", summary.n_tests);
    println!("pi0 mean: {:.4} (range {:.4} - {:.4})", summary.mean, summary.min, summary.max);

    if let Some(path) = args.options.json() {
        write_json(path, &summary)?;
    }
    Ok(())
}
