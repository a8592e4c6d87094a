//! CSV grammar for throughput logs
//!
//! Two layouts are accepted:
//!
//! - headerless `threads,hash_bits,throughput` triples, one per line
//! - a header naming the columns (`Threads,HashBits,Throughput(MT/s)`,
//!   `Method,Threads,HashBits,Throughput(MT/s)`, ...), after which rows are
//!   mapped by column position
//!
//! Repeated header lines re-map the columns. Rows with the wrong field
//! count, a non-numeric field, zero threads or a non-finite throughput are
//! discarded.

use super::ParseOutcome;
use crate::experiment::Record;

/// Column positions announced by a header line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnMap {
    threads: usize,
    hash_bits: usize,
    value: usize,
    width: usize,
}

impl ColumnMap {
    /// Layout of headerless triples
    const TRIPLE: Self = Self {
        threads: 0,
        hash_bits: 1,
        value: 2,
        width: 3,
    };

    /// Interpret `line` as a header, if it names all three columns
    fn from_header(line: &str) -> Option<Self> {
        let mut threads = None;
        let mut hash_bits = None;
        let mut value = None;
        let fields: Vec<String> = line
            .split(',')
            .map(|field| field.trim().to_ascii_lowercase())
            .collect();

        for (index, name) in fields.iter().enumerate() {
            match name.as_str() {
                "threads" => threads = Some(index),
                "hashbits" | "hash_bits" => hash_bits = Some(index),
                _ if name.starts_with("throughput") => value = Some(index),
                _ => {}
            }
        }

        Some(Self {
            threads: threads?,
            hash_bits: hash_bits?,
            value: value?,
            width: fields.len(),
        })
    }

    fn parse_row(&self, line: &str) -> Option<Record> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != self.width {
            return None;
        }

        let threads: u32 = fields[self.threads].parse().ok()?;
        let hash_bits: u32 = fields[self.hash_bits].parse().ok()?;
        let value: f64 = fields[self.value].parse().ok()?;
        if threads == 0 || !value.is_finite() {
            return None;
        }

        Some(Record::throughput(threads, hash_bits, value))
    }
}

/// Parse a single headerless `threads,hash_bits,value` line
///
/// # Returns
/// `None` unless the line has exactly three comma-separated fields with
/// integer `threads` (>= 1), integer `hash_bits` and a finite numeric
/// `value`.
///
/// # Examples
///
/// ```rust
/// use trueno_perflog::parse::parse_csv_line;
///
/// let record = parse_csv_line("4,12,183.27").unwrap();
/// assert_eq!((record.threads(), record.hash_bits()), (4, 12));
/// assert!(parse_csv_line("Threads,HashBits,Throughput").is_none());
/// assert!(parse_csv_line("4,12").is_none());
/// ```
#[must_use]
pub fn parse_csv_line(line: &str) -> Option<Record> {
    ColumnMap::TRIPLE.parse_row(line.trim())
}

/// Parse a region of throughput rows
///
/// Blank lines and header lines are skipped without being counted; every
/// other line that fails to parse counts as discarded. A leading UTF-8
/// byte-order mark is ignored.
pub fn parse_csv_region<'a, I>(lines: I) -> ParseOutcome
where
    I: IntoIterator<Item = &'a str>,
{
    let mut outcome = ParseOutcome::default();
    let mut columns = ColumnMap::TRIPLE;

    for line in lines {
        let line = line.trim_start_matches('\u{feff}').trim();
        if line.is_empty() {
            continue;
        }

        if let Some(header) = ColumnMap::from_header(line) {
            columns = header;
            continue;
        }

        match columns.parse_row(line) {
            Some(record) => outcome.records.push(record),
            None => outcome.discarded += 1,
        }
    }

    outcome
}
