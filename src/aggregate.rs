//! Aggregation of parsed records
//!
//! Groups records by `(threads, hash_bits)` or `(metric, threads, hash_bits)`
//! and reduces each group to its arithmetic mean, the shape the plotting
//! layer consumes: one line per thread count, mean value over hash bits.
//!
//! Output rows are sorted by key, so repeated runs over the same records
//! produce identical tables.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::experiment::Record;

/// Default fraction of a range added on each side by [`AxisBounds::padded`]
pub const DEFAULT_MARGIN: f64 = 0.05;

/// Grouping key selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grouping {
    /// Group by `(threads, hash_bits)` (throughput logs)
    #[default]
    ThreadsHashBits,
    /// Group by `(metric, threads, hash_bits)` (counter logs)
    MetricThreadsHashBits,
}

/// One aggregated group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    /// Metric name (`None` when grouped by threads and hash bits only)
    pub metric: Option<String>,
    /// Thread count
    pub threads: u32,
    /// Hash-bit width
    pub hash_bits: u32,
    /// Number of records in the group
    pub count: usize,
    /// Arithmetic mean of the group's values
    pub mean: f64,
}

/// Line series for one thread count: `(hash_bits, mean)` points
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    /// Thread count of the series
    pub threads: u32,
    /// Points ordered by hash bits
    pub points: Vec<(u32, f64)>,
}

/// Grouped means, sorted by `(metric, threads, hash_bits)`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryTable {
    grouping: Grouping,
    rows: Vec<SummaryRow>,
}

impl SummaryTable {
    /// Grouping used to build the table
    #[must_use]
    pub const fn grouping(&self) -> Grouping {
        self.grouping
    }

    /// Rows in key order
    #[must_use]
    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    /// Number of groups
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no groups
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct metric names, sorted
    #[must_use]
    pub fn metrics(&self) -> Vec<&str> {
        let mut metrics: Vec<&str> = self
            .rows
            .iter()
            .filter_map(|row| row.metric.as_deref())
            .collect();
        metrics.dedup();
        metrics
    }

    /// Line series for `metric`, one per thread count in ascending order
    ///
    /// Pass `None` for tables grouped by threads and hash bits only.
    #[must_use]
    pub fn series(&self, metric: Option<&str>) -> Vec<Series> {
        let mut series: Vec<Series> = Vec::new();
        for row in self.rows.iter().filter(|row| row.metric.as_deref() == metric) {
            match series.last_mut() {
                Some(last) if last.threads == row.threads => {
                    last.points.push((row.hash_bits, row.mean));
                }
                _ => series.push(Series {
                    threads: row.threads,
                    points: vec![(row.hash_bits, row.mean)],
                }),
            }
        }
        series
    }
}

/// Group records and compute the mean value of each group
///
/// Empty input yields an empty table.
///
/// # Examples
///
/// ```rust
/// use trueno_perflog::aggregate::{summarize, Grouping};
/// use trueno_perflog::experiment::Record;
///
/// let records = vec![Record::throughput(2, 5, 10.0), Record::throughput(2, 5, 20.0)];
/// let table = summarize(&records, Grouping::ThreadsHashBits);
/// assert_eq!(table.rows()[0].count, 2);
/// assert!((table.rows()[0].mean - 15.0).abs() < f64::EPSILON);
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize<'a, I>(records: I, grouping: Grouping) -> SummaryTable
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut groups: BTreeMap<(Option<&str>, u32, u32), (f64, usize)> = BTreeMap::new();
    for record in records {
        let metric = match grouping {
            Grouping::ThreadsHashBits => None,
            Grouping::MetricThreadsHashBits => Some(record.metric()),
        };
        let entry = groups
            .entry((metric, record.threads(), record.hash_bits()))
            .or_insert((0.0, 0));
        entry.0 += record.value();
        entry.1 += 1;
    }

    let rows = groups
        .into_iter()
        .map(|((metric, threads, hash_bits), (sum, count))| SummaryRow {
            metric: metric.map(str::to_string),
            threads,
            hash_bits,
            count,
            mean: sum / count as f64,
        })
        .collect();

    SummaryTable { grouping, rows }
}

/// Closed numeric range
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisRange {
    /// Lower bound
    pub min: f64,
    /// Upper bound
    pub max: f64,
}

impl AxisRange {
    fn point(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    fn include(&mut self, value: f64) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Widen by `fraction` of the span on each side, or by 1.0 when the
    /// span is zero
    #[must_use]
    pub fn padded(self, fraction: f64) -> Self {
        let span = self.max - self.min;
        let margin = if span > 0.0 { span * fraction } else { 1.0 };
        Self {
            min: self.min - margin,
            max: self.max + margin,
        }
    }
}

/// Global display bounds across every loaded record
///
/// Computed over all groups of a run so every chart shares one range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisBounds {
    /// Hash-bit range (x axis)
    pub hash_bits: AxisRange,
    /// Value range (y axis)
    pub value: AxisRange,
}

impl AxisBounds {
    /// Compute bounds over `records`, `None` when there are none
    #[must_use]
    pub fn from_records<'a, I>(records: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut records = records.into_iter();
        let first = records.next()?;
        let mut bounds = Self {
            hash_bits: AxisRange::point(f64::from(first.hash_bits())),
            value: AxisRange::point(first.value()),
        };
        for record in records {
            bounds.hash_bits.include(f64::from(record.hash_bits()));
            bounds.value.include(record.value());
        }
        Some(bounds)
    }

    /// Pad both ranges (see [`AxisRange::padded`])
    #[must_use]
    pub fn padded(self, fraction: f64) -> Self {
        Self {
            hash_bits: self.hash_bits.padded(fraction),
            value: self.value.padded(fraction),
        }
    }
}
