//! swfdr-io: File I/O for swfdr-rs
//!
//! Reads delimited tables of p-values with covariates and censored
//! corpora with truncation/rounding flags, and writes tab-separated
//! results.

pub mod corpus;
pub mod output;
pub mod table;

pub use corpus::{parse_corpus, CorpusTable};
pub use table::{parse_pvalue_table, PValueTable};
