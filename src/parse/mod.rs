//! Log parsing: block extraction and metric line grammars
//!
//! A harness log is narrowed to its newest result block by
//! [`extract_latest_block`], then one of two line grammars turns the block
//! into [`Record`]s:
//!
//! - [`Grammar::Csv`]: `threads,hash_bits,throughput` rows, with or without
//!   a column header
//! - [`Grammar::Counter`]: `perf stat` output introduced by
//!   `>>> Running ... with N threads and M hashbits` run headers
//!
//! Malformed lines are discarded and counted, never propagated. Each parse
//! call owns its state, so nothing carries over from one file to the next.
//!
//! ## Example
//!
//! ```rust
//! use trueno_perflog::parse::{extract_latest_block, parse_region, Grammar, DEFAULT_BLOCK_MARKER};
//!
//! let log = "\
//! Independent Experiment Results (Throughput MT/s):
//! Threads,HashBits,Throughput
//! 1,3,10.0
//! Independent Experiment Results (Throughput MT/s):
//! Threads,HashBits,Throughput
//! 1,3,12.5
//! 2,3,24.0
//! ";
//!
//! let block = extract_latest_block(log, DEFAULT_BLOCK_MARKER);
//! let outcome = parse_region(Grammar::Csv, block.lines().iter().copied());
//! assert_eq!(outcome.records.len(), 2);
//! assert_eq!(outcome.discarded, 0);
//! ```

mod block;
mod counter;
mod csv;

pub use block::{extract_latest_block, Block, DEFAULT_BLOCK_MARKER};
pub use counter::{
    classify_counter_line, normalize_grouped_number, parse_counter_region, CounterLine,
};
pub use csv::{parse_csv_line, parse_csv_region};

use serde::{Deserialize, Serialize};

use crate::experiment::Record;

/// Line grammar of a log region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grammar {
    /// Throughput rows: `threads,hash_bits,value`
    #[default]
    Csv,
    /// Performance-counter blocks from `perf stat`
    Counter,
}

/// Records parsed from one region, plus the count of rejected lines
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutcome {
    /// Parsed records in file order (not deduplicated)
    pub records: Vec<Record>,
    /// Lines that looked like data but were rejected
    pub discarded: usize,
}

impl ParseOutcome {
    /// Check if no records were parsed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parse a region with the given grammar
pub fn parse_region<'a, I>(grammar: Grammar, lines: I) -> ParseOutcome
where
    I: IntoIterator<Item = &'a str>,
{
    match grammar {
        Grammar::Csv => parse_csv_region(lines),
        Grammar::Counter => parse_counter_region(lines),
    }
}
