//! Delimited p-value/covariate table parser.
//!
//! Reads a header line followed by one test per line. Columns are split
//! on tabs, commas or runs of spaces, detected from the header.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use swfdr_linalg::DenseMatrix;

/// Column delimiter of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Tab,
    Comma,
    Whitespace,
}

impl Delimiter {
    pub fn detect(header: &str) -> Self {
        if header.contains('\t') {
            Delimiter::Tab
        } else if header.contains(',') {
            Delimiter::Comma
        } else {
            Delimiter::Whitespace
        }
    }

    pub fn split<'a>(&self, line: &'a str) -> Vec<&'a str> {
        match self {
            Delimiter::Tab => line.split('\t').map(str::trim).collect(),
            Delimiter::Comma => line.split(',').map(str::trim).collect(),
            Delimiter::Whitespace => line.split_whitespace().collect(),
        }
    }
}

/// Header fields and data lines (1-based line number, fields) of a file.
pub(crate) struct RawTable<'a> {
    pub headers: Vec<&'a str>,
    pub rows: Vec<(usize, Vec<&'a str>)>,
}

impl<'a> RawTable<'a> {
    pub fn parse(contents: &'a str) -> Result<Self> {
        let mut lines = contents.lines();
        let header_line = lines.next().ok_or_else(|| anyhow!("Empty input file"))?;
        let delim = Delimiter::detect(header_line);
        let headers = delim.split(header_line.trim());
        let rows = lines
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| (i + 2, delim.split(line.trim())))
            .collect();
        Ok(Self { headers, rows })
    }

    pub fn column(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|&h| h == name)
            .ok_or_else(|| anyhow!("Column '{}' not found in header", name))
    }

    /// Field `idx` of a row, failing on short lines.
    pub fn field(fields: &[&'a str], idx: usize, line: usize) -> Result<&'a str> {
        match fields.get(idx) {
            Some(&f) => Ok(f),
            None => bail!(
                "Line {} has too few fields (expected at least {})",
                line,
                idx + 1
            ),
        }
    }
}

/// Parsed p-values and covariates, in file order.
#[derive(Debug, Clone)]
pub struct PValueTable {
    /// Test identifiers, when an ID column was named.
    pub ids: Option<Vec<String>>,
    /// P-values (NaN for missing).
    pub pvalues: Vec<f64>,
    /// covariates[i][j] = test i, covariate j (NaN for missing).
    pub covariates: Vec<Vec<f64>>,
    pub covariate_names: Vec<String>,
}

/// Parse a p-value table.
///
/// # Arguments
/// - `path`: Path to the delimited file
/// - `pvalue_col`: Name of the p-value column
/// - `covar_cols`: Names of covariate columns (may be empty)
/// - `id_col`: Name of an identifier column, if any
pub fn parse_pvalue_table(
    path: &Path,
    pvalue_col: &str,
    covar_cols: &[String],
    id_col: Option<&str>,
) -> Result<PValueTable> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read p-value table: {}", path.display()))?;
    let raw = RawTable::parse(&contents)?;

    let p_idx = raw.column(pvalue_col)?;
    let id_idx = id_col.map(|name| raw.column(name)).transpose()?;
    let covar_indices: Vec<usize> = covar_cols
        .iter()
        .map(|name| raw.column(name))
        .collect::<Result<Vec<_>>>()?;

    let mut ids = id_idx.map(|_| Vec::with_capacity(raw.rows.len()));
    let mut pvalues = Vec::with_capacity(raw.rows.len());
    let mut covariates = Vec::with_capacity(raw.rows.len());

    for (line, fields) in &raw.rows {
        pvalues.push(parse_value(RawTable::field(fields, p_idx, *line)?));
        if let (Some(ids), Some(idx)) = (ids.as_mut(), id_idx) {
            ids.push(RawTable::field(fields, idx, *line)?.to_string());
        }
        let row: Vec<f64> = covar_indices
            .iter()
            .map(|&ci| fields.get(ci).map_or(f64::NAN, |s| parse_value(s)))
            .collect();
        covariates.push(row);
    }

    Ok(PValueTable {
        ids,
        pvalues,
        covariates,
        covariate_names: covar_cols.to_vec(),
    })
}

/// Parse a numeric field, treating NA/missing as NaN.
pub fn parse_value(s: &str) -> f64 {
    match s {
        "NA" | "na" | "Na" | "." | "" | "-" | "NaN" | "nan" => f64::NAN,
        _ => s.parse().unwrap_or(f64::NAN),
    }
}

impl PValueTable {
    pub fn len(&self) -> usize {
        self.pvalues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pvalues.is_empty()
    }

    /// Rows with a present p-value and all covariates present.
    pub fn complete_rows(&self) -> Vec<usize> {
        (0..self.len())
            .filter(|&i| !self.pvalues[i].is_nan() && self.covariates[i].iter().all(|v| !v.is_nan()))
            .collect()
    }

    /// P-values for the given rows.
    pub fn pvalues_for(&self, rows: &[usize]) -> Vec<f64> {
        rows.iter().map(|&i| self.pvalues[i]).collect()
    }

    /// Covariate design (no intercept) for the given rows, or `None` when
    /// the table has no covariate columns.
    pub fn design_matrix(&self, rows: &[usize]) -> Option<DenseMatrix> {
        if self.covariate_names.is_empty() {
            return None;
        }
        let selected: Vec<Vec<f64>> = rows.iter().map(|&i| self.covariates[i].clone()).collect();
        Some(DenseMatrix::from_rows(&selected))
    }

    /// Identifier for a row: its ID when present, else its 1-based position.
    pub fn id(&self, row: usize) -> String {
        match &self.ids {
            Some(ids) => ids[row].clone(),
            None => (row + 1).to_string(),
        }
    }
}
