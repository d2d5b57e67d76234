//! Subcommands and the options they share.

pub mod pi0;
pub mod qvalue;
pub mod rate;

use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};

use swfdr_core::pi0::{default_lambda, Pi0Config};
use swfdr_core::regression::IrlsConfig;
use swfdr_io::table::{parse_pvalue_table, PValueTable};
use swfdr_linalg::DenseMatrix;

/// Input and π₀ options shared by `pi0` and `qvalue`.
#[derive(Args)]
pub struct Pi0Options {
    /// Delimited input file with a header line
    #[arg(long)]
    input: String,

    /// P-value column name
    #[arg(long, default_value = "pvalue")]
    pvalue_col: String,

    /// Covariate column names (comma-separated)
    #[arg(long, default_value = "")]
    covar_cols: String,

    /// Test identifier column name
    #[arg(long)]
    id_col: Option<String>,

    /// Regression per threshold: logistic or linear
    #[arg(long, default_value = "logistic")]
    regression: String,

    /// Smoother: unit-interval-spline or general-spline
    #[arg(long, default_value = "unit-interval-spline")]
    smoothing: String,

    /// Smoothing degrees of freedom (at least 3)
    #[arg(long, default_value = "3.0")]
    smooth_df: f64,

    /// Threshold grid (comma-separated); default 0.05, 0.10, ..., 0.95
    #[arg(long)]
    lambda: Option<String>,

    /// Report raw smoothed pi0 without clipping to [0, 1]
    #[arg(long, default_value = "false")]
    no_threshold: bool,

    /// Maximum IRLS iterations per regression
    #[arg(long, default_value = "50")]
    max_iter: usize,

    /// Output file (tab-separated)
    #[arg(long)]
    output: String,

    /// Optional JSON summary file
    #[arg(long)]
    json: Option<String>,
}

/// Tests with a complete row, ready for estimation.
pub struct LoadedTable {
    pub table: PValueTable,
    pub rows: Vec<usize>,
    pub pvalues: Vec<f64>,
    pub design: Option<DenseMatrix>,
}

impl Pi0Options {
    pub fn config(&self) -> Result<Pi0Config> {
        let lambda = match &self.lambda {
            Some(list) => parse_list(list).context("Invalid --lambda")?,
            None => default_lambda(),
        };
        Ok(Pi0Config {
            lambda,
            regression: self.regression.parse().map_err(anyhow::Error::msg)?,
            smoothing: self.smoothing.parse().map_err(anyhow::Error::msg)?,
            smooth_df: self.smooth_df,
            threshold: !self.no_threshold,
            irls: IrlsConfig {
                max_iter: self.max_iter,
                ..IrlsConfig::default()
            },
        })
    }

    pub fn load(&self) -> Result<LoadedTable> {
        let covar_cols: Vec<String> = self
            .covar_cols
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let table = parse_pvalue_table(Path::new(&self.input), &self.pvalue_col, &covar_cols, self.id_col.as_deref())?;
        let rows = table.complete_rows();
        if rows.len() < table.len() {
            warn!("Dropping {} rows with missing values", table.len() - rows.len());
        }
        info!("Loaded {} tests with {} covariates", rows.len(), covar_cols.len());
        let pvalues = table.pvalues_for(&rows);
        let design = table.design_matrix(&rows);
        Ok(LoadedTable {
            table,
            rows,
            pvalues,
            design,
        })
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn json(&self) -> Option<&str> {
        self.json.as_deref()
    }
}

/// Comma-separated numbers.
fn parse_list(list: &str) -> Result<Vec<f64>> {
    list.split(',')
        .map(|s| {
            s.trim()
                .parse::<f64>()
                .with_context(|| format!("'{}' is not a number", s.trim()))
        })
        .collect()
}

pub fn create_output(path: &str) -> Result<BufWriter<std::fs::File>> {
    let file = std::fs::File::create(path).with_context(|| format!("Failed to create output file: {}", path))?;
    Ok(BufWriter::new(file))
}

pub fn write_json<T: serde::Serialize>(path: &str, value: &T) -> Result<()> {
    let writer = create_output(path)?;
    serde_json::to_writer_pretty(writer, value).with_context(|| format!("Failed to write JSON summary: {}", path))?;
    info!("JSON summary written to {}", path);
    Ok(())
}

/// Spread of a π₀ vector for summaries.
#[derive(serde::Serialize)]
pub struct Pi0Summary {
    pub n_tests: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl Pi0Summary {
    pub fn new(pi0: &[f64]) -> Self {
        let n = pi0.len();
        Self {
            n_tests: n,
            mean: pi0.iter().sum::<f64>() / n.max(1) as f64,
            min: pi0.iter().copied().fold(f64::INFINITY, f64::min),
            max: pi0.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}
