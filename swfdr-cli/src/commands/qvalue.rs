//! Estimate π₀(x) and q-values.
//!
//! swfdr qvalue --input ... --pvalue-col ... --covar-cols ... --output ... [--pfdr]

use std::io::Write;

use anyhow::Result;
use clap::Args;
use tracing::info;

use swfdr_core::qvalue::{estimate_qvalues, HitCount, QValueConfig};
use swfdr_io::output::{write_hit_counts, write_pvalue_results};

use super::{create_output, write_json, Pi0Options, Pi0Summary};

#[derive(Args)]
pub struct QvalueArgs {
    #[command(flatten)]
    options: Pi0Options,

    /// Use the positive false discovery rate
    #[arg(long, default_value = "false")]
    pfdr: bool,
}

#[derive(serde::Serialize)]
struct QvalueSummary {
    pi0: Pi0Summary,
    pfdr: bool,
    significance: Vec<HitCount>,
}

pub fn run(args: QvalueArgs) -> Result<()> {
    let config = QValueConfig {
        pi0: args.options.config()?,
        pfdr: args.pfdr,
    };
    let loaded = args.options.load()?;

    let estimate = estimate_qvalues(&loaded.pvalues, loaded.design.as_ref(), &config)?;

    let mut writer = create_output(args.options.output())?;
    write_pvalue_results(
        &mut writer,
        &loaded.table,
        &loaded.rows,
        &estimate.pi0.pi0,
        Some(estimate.qvalues.as_slice()),
    )?;
    writer.flush()?;
    info!("Results written to {}", args.options.output());

    write_hit_counts(&mut std::io::stdout().lock(), &estimate.significance)?;

    if let Some(path) = args.options.json() {
        let summary = QvalueSummary {
            pi0: Pi0Summary::new(&estimate.pi0.pi0),
            pfdr: args.pfdr,
            significance: estimate.significance,
        };
        write_json(path, &summary)?;
    }
    Ok(())
}
