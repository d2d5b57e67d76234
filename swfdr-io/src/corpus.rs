//! Censored corpus reader: p-values with truncation and rounding flags.

use std::path::Path;

use anyhow::{bail, Context, Result};
use swfdr_core::censored::WINDOW;
use tracing::warn;

use crate::table::{parse_value, RawTable};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorpusTable {
    pub pvalues: Vec<f64>,
    pub truncated: Vec<bool>,
    pub rounded: Vec<bool>,
}

/// Parse a 0/1, true/false, T/F or yes/no flag.
pub fn parse_flag(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" => Some(true),
        "0" | "false" | "f" | "no" | "n" => Some(false),
        _ => None,
    }
}

/// Parse a corpus file. Rows with a missing p-value are skipped, and so
/// are rows reported above the 0.05 window, which the mixture does not
/// model.
pub fn parse_corpus(path: &Path, pvalue_col: &str, truncated_col: &str, rounded_col: &str) -> Result<CorpusTable> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read corpus file: {}", path.display()))?;
    let raw = RawTable::parse(&contents)?;
    let p_idx = raw.column(pvalue_col)?;
    let t_idx = raw.column(truncated_col)?;
    let r_idx = raw.column(rounded_col)?;

    let mut corpus = CorpusTable::default();
    let mut skipped = 0;
    let mut outside = 0;
    for (line, fields) in &raw.rows {
        let p = parse_value(RawTable::field(fields, p_idx, *line)?);
        if p.is_nan() {
            skipped += 1;
            continue;
        }
        if p > WINDOW {
            outside += 1;
            continue;
        }
        let flag = |idx: usize, name: &str| -> Result<bool> {
            let raw_flag = RawTable::field(fields, idx, *line)?;
            match parse_flag(raw_flag) {
                Some(v) => Ok(v),
                None => bail!("Line {}: cannot read '{}' as a {} flag", line, raw_flag, name),
            }
        };
        corpus.truncated.push(flag(t_idx, truncated_col)?);
        corpus.rounded.push(flag(r_idx, rounded_col)?);
        corpus.pvalues.push(p);
    }
    if skipped > 0 {
        warn!("Skipped {} corpus rows with a missing p-value", skipped);
    }
    if outside > 0 {
        warn!("Dropped {} corpus rows with p above {}", outside, WINDOW);
    }
    Ok(corpus)
}
