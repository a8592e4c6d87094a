//! # Trueno-PerfLog: Benchmark Log Ingestion and Normalization
//!
//! **Version**: 0.1.0
//!
//! Trueno-PerfLog turns the append-only text logs of a throughput /
//! performance-counter benchmarking harness into clean tabular records and
//! grouped summaries ready for plotting.
//!
//! ## Pipeline
//!
//! ```text
//! file names ──> timestamp ──> latest RunFile per ExperimentGroup
//!                                   │
//!                    read ──> newest block ──> line grammar ──> Records
//!                                                                 │
//!                                            mean per group <── aggregate
//! ```
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Jidoka**: A malformed line or file stops nothing; it is discarded
//!   and reported as a diagnostic
//! - **Poka-Yoke**: "Last marker wins" and "latest timestamp wins" are
//!   explicit, tested rules
//! - **Heijunka**: No hidden state; every ingestion pass builds a fresh
//!   result, so re-runs are idempotent
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use trueno_perflog::aggregate::Grouping;
//! use trueno_perflog::Pipeline;
//!
//! let pipeline = Pipeline::builder().year(2025).build()?;
//! let set = pipeline.ingest_directory("results")?;
//!
//! for (group, table) in set.summaries(Grouping::ThreadsHashBits) {
//!     println!("{group}: {} groups", table.len());
//! }
//! for group in set.unavailable() {
//!     println!("{group}: data not available");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod aggregate;
pub mod config;
pub mod error;
pub mod experiment;
pub mod ingest;
pub mod parse;
pub mod storage;
pub mod timestamp;

pub use error::{Error, Result};

use std::path::Path;

use config::{FamilyConfig, IngestConfig};
use experiment::ExperimentSet;
use ingest::{FileBatch, ParsedFile};
use parse::Grammar;

/// Configured ingestion pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    config: IngestConfig,
}

impl Pipeline {
    /// Create a new pipeline builder (harness defaults)
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Create a pipeline from a configuration
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid
    pub fn from_config(config: IngestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the configuration
    #[must_use]
    pub const fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Load the latest run of every experiment group in `dir`
    ///
    /// # Errors
    ///
    /// Returns error if `dir` cannot be listed
    pub fn ingest_directory(&self, dir: impl AsRef<Path>) -> Result<ExperimentSet> {
        ingest::ingest_directory(dir, &self.config)
    }

    /// Parse a single file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<ParsedFile> {
        ingest::parse_run_file(path, self.config.grammar, self.config.block_marker.as_deref())
    }

    /// Parse several files, continuing past unreadable ones
    #[must_use]
    pub fn parse_files<P: AsRef<Path>>(&self, paths: &[P]) -> FileBatch {
        ingest::parse_files(paths, self.config.grammar, self.config.block_marker.as_deref())
    }
}

/// Pipeline builder
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    config: IngestConfig,
}

impl PipelineBuilder {
    /// Replace the experiment families
    #[must_use]
    pub fn families(mut self, families: Vec<FamilyConfig>) -> Self {
        self.config.families = families;
        self
    }

    /// Set the line grammar
    #[must_use]
    pub fn grammar(mut self, grammar: Grammar) -> Self {
        self.config.grammar = grammar;
        self
    }

    /// Set the block marker phrase
    #[must_use]
    pub fn block_marker(mut self, marker: impl Into<String>) -> Self {
        self.config.block_marker = Some(marker.into());
        self
    }

    /// Parse whole files instead of their newest block
    #[must_use]
    pub fn whole_file(mut self) -> Self {
        self.config.block_marker = None;
        self
    }

    /// Set an explicit year for file name timestamps
    #[must_use]
    pub fn year(mut self, year: i32) -> Self {
        self.config.year = Some(year);
        self
    }

    /// Build the pipeline
    ///
    /// # Errors
    ///
    /// Returns error if the resulting configuration is invalid
    pub fn build(self) -> Result<Pipeline> {
        Pipeline::from_config(self.config)
    }
}
