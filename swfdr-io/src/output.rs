//! Tab-separated result writers.

use std::io::Write;

use anyhow::Result;
use swfdr_core::censored::BinSummary;
use swfdr_core::qvalue::HitCount;

use crate::corpus::CorpusTable;
use crate::table::PValueTable;

fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NA".to_string()
    } else {
        format!("{:.6e}", v)
    }
}

/// One line per row: id, p-value, π₀ and (optionally) q-value.
pub fn write_pvalue_results(
    writer: &mut impl Write,
    table: &PValueTable,
    rows: &[usize],
    pi0: &[f64],
    qvalues: Option<&[f64]>,
) -> Result<()> {
    if qvalues.is_some() {
        writeln!(writer, "id\tpvalue\tpi0\tqvalue")?;
    } else {
        writeln!(writer, "id\tpvalue\tpi0")?;
    }
    for (k, &row) in rows.iter().enumerate() {
        write!(writer, "{}\t{}\t{}", table.id(row), format_value(table.pvalues[row]), format_value(pi0[k]))?;
        if let Some(q) = qvalues {
            write!(writer, "\t{}", format_value(q[k]))?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// One line per corpus entry with its posterior null probability
/// (NA for rounded entries).
pub fn write_corpus_results(writer: &mut impl Write, corpus: &CorpusTable, z: &[Option<f64>]) -> Result<()> {
    writeln!(writer, "pvalue\ttruncated\trounded\tz")?;
    for (i, zi) in z.iter().enumerate() {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            corpus.pvalues[i],
            u8::from(corpus.truncated[i]),
            u8::from(corpus.rounded[i]),
            zi.map_or_else(|| "NA".to_string(), format_value)
        )?;
    }
    Ok(())
}

pub fn write_bin_summary(writer: &mut impl Write, bins: &[BinSummary]) -> Result<()> {
    writeln!(writer, "lower\tupper\tobserved\texpected_null")?;
    for bin in bins {
        writeln!(
            writer,
            "{}\t{}\t{}\t{:.3}",
            bin.lower, bin.upper, bin.observed, bin.expected_null
        )?;
    }
    Ok(())
}

pub fn write_hit_counts(writer: &mut impl Write, hits: &[HitCount]) -> Result<()> {
    writeln!(writer, "cutoff\tpvalues\tqvalues")?;
    for hit in hits {
        writeln!(writer, "{}\t{}\t{}", hit.cutoff, hit.pvalues, hit.qvalues)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_pvalue_results() {
        let table = PValueTable {
            ids: Some(vec!["a".into(), "b".into(), "c".into()]),
            pvalues: vec![0.01, f64::NAN, 0.5],
            covariates: vec![vec![]; 3],
            covariate_names: vec![],
        };
        let mut buf = Vec::new();
        write_pvalue_results(&mut buf, &table, &[0, 2], &[0.8, 0.9], Some(&[0.02, 0.6][..])).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "id\tpvalue\tpi0\tqvalue");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("a\t1.000000e-2\t8.000000e-1\t2.000000e-2"));
        assert!(lines[2].starts_with("c\t"));
    }

    #[test]
    fn test_write_corpus_results_marks_rounded() {
        let corpus = CorpusTable {
            pvalues: vec![0.01, 0.02],
            truncated: vec![true, false],
            rounded: vec![false, true],
        };
        let mut buf = Vec::new();
        write_corpus_results(&mut buf, &corpus, &[Some(0.25), None]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().nth(1), Some("0.01\t1\t0\t2.500000e-1"));
        assert_eq!(text.lines().nth(2), Some("0.02\t0\t1\tNA"));
    }

    #[test]
    fn test_write_bins_and_hits() {
        let bins = [BinSummary {
            lower: 0.005,
            upper: 0.015,
            observed: 12,
            expected_null: 3.25,
        }];
        let hits = [HitCount {
            cutoff: 0.05,
            pvalues: 10,
            qvalues: 4,
        }];
        let mut buf = Vec::new();
        write_bin_summary(&mut buf, &bins).unwrap();
        write_hit_counts(&mut buf, &hits).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("0.005\t0.015\t12\t3.250"));
        assert!(text.contains("0.05\t10\t4"));
    }
}
