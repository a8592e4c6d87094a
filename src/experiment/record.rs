//! Record - a single normalized measurement

use serde::{Deserialize, Serialize};

/// Metric name given to every record parsed from a throughput log.
pub const THROUGHPUT_METRIC: &str = "Throughput";

/// Record represents one measurement parsed from a harness log.
///
/// The categorical keys `threads` and `hash_bits` identify the
/// configuration under test, `metric` names the measured quantity
/// (a perf counter such as `cpu-cycles`, or [`THROUGHPUT_METRIC`]).
///
/// Records never carry the timestamp of the file they came from; file
/// freshness is only used to choose which file to parse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    threads: u32,
    hash_bits: u32,
    metric: String,
    value: f64,
}

impl Record {
    /// Create a new record.
    ///
    /// # Arguments
    ///
    /// * `threads` - Concurrency level under test (>= 1)
    /// * `hash_bits` - Hash-bit width of the partitioning run
    /// * `metric` - Measured quantity (e.g., "cpu-cycles")
    /// * `value` - Normalized numeric value
    #[must_use]
    pub fn new(threads: u32, hash_bits: u32, metric: impl Into<String>, value: f64) -> Self {
        Self {
            threads,
            hash_bits,
            metric: metric.into(),
            value,
        }
    }

    /// Create a throughput record (metric [`THROUGHPUT_METRIC`]).
    #[must_use]
    pub fn throughput(threads: u32, hash_bits: u32, value: f64) -> Self {
        Self::new(threads, hash_bits, THROUGHPUT_METRIC, value)
    }

    /// Get the thread count.
    #[must_use]
    pub const fn threads(&self) -> u32 {
        self.threads
    }

    /// Get the hash-bit width.
    #[must_use]
    pub const fn hash_bits(&self) -> u32 {
        self.hash_bits
    }

    /// Get the metric name.
    #[must_use]
    pub fn metric(&self) -> &str {
        &self.metric
    }

    /// Get the measured value.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }
}
