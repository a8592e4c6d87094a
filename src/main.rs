//! Trueno-PerfLog command line interface
//!
//! Prints JSON reports on stdout for the plotting layer. Logs go to stderr
//! (`RUST_LOG` filter, `info` by default).
//!
//! ```text
//! trueno-perflog throughput --dir results --year 2025
//! trueno-perflog perf perf/*_perf.txt
//! trueno-perflog csv results/independent_results.txt results/concurrent_results.txt
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use trueno_perflog::aggregate::{summarize, AxisBounds, Grouping, Series, DEFAULT_MARGIN};
use trueno_perflog::config::IngestConfig;
use trueno_perflog::experiment::{GroupData, Record, THROUGHPUT_METRIC};
use trueno_perflog::ingest::{parse_files, run_label, Diagnostic, FileBatch, ParsedFile};
use trueno_perflog::parse::{Grammar, DEFAULT_BLOCK_MARKER};
use trueno_perflog::storage::RecordStore;
use trueno_perflog::Pipeline;

#[derive(Parser, Debug)]
#[command(
    name = "trueno-perflog",
    version,
    about = "Normalize benchmark harness logs into plot-ready JSON"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Latest run of every experiment group (family x affinity)
    Throughput {
        /// Directory holding the run files
        #[arg(long, default_value = ".")]
        dir: PathBuf,
        /// JSON ingestion config (default: harness layout)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Year for file name timestamps (default: current year)
        #[arg(long)]
        year: Option<i32>,
        /// Fraction of the range added around the shared axis bounds
        #[arg(long, default_value_t = DEFAULT_MARGIN)]
        margin: f64,
        /// Also write every loaded record to this Parquet file
        #[arg(long)]
        parquet: Option<PathBuf>,
    },
    /// `perf stat` logs, summarized per metric
    Perf {
        /// Perf log files
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Also write every parsed record to this Parquet file
        #[arg(long)]
        parquet: Option<PathBuf>,
    },
    /// Loose throughput files (header CSV or bare triples)
    Csv {
        /// Throughput files
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Parse only the block after the last result marker
        #[arg(long)]
        latest_block: bool,
        /// Fraction of the range added around the shared axis bounds
        #[arg(long, default_value_t = DEFAULT_MARGIN)]
        margin: f64,
        /// Also write every parsed record to this Parquet file
        #[arg(long)]
        parquet: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct GroupReport<'a> {
    family: &'a str,
    variant: &'a str,
    available: bool,
    file: Option<&'a Path>,
    records: usize,
    discarded: usize,
    series: Vec<Series>,
}

#[derive(Serialize)]
struct ThroughputReport<'a> {
    groups: Vec<GroupReport<'a>>,
    bounds: Option<AxisBounds>,
    diagnostics: &'a [Diagnostic],
}

#[derive(Serialize)]
struct MetricReport {
    metric: String,
    series: Vec<Series>,
}

#[derive(Serialize)]
struct FileReport<'a> {
    label: String,
    file: &'a Path,
    records: usize,
    discarded: usize,
    metrics: Vec<MetricReport>,
}

#[derive(Serialize)]
struct BatchReport<'a> {
    files: Vec<FileReport<'a>>,
    bounds: Option<AxisBounds>,
    diagnostics: &'a [Diagnostic],
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let report = match cli.command {
        Command::Throughput {
            dir,
            config,
            year,
            margin,
            parquet,
        } => throughput(&dir, config.as_deref(), year, margin, parquet.as_deref())?,
        Command::Perf { files, parquet } => perf(&files, parquet.as_deref())?,
        Command::Csv {
            files,
            latest_block,
            margin,
            parquet,
        } => csv(&files, latest_block, margin, parquet.as_deref())?,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn throughput(
    dir: &Path,
    config: Option<&Path>,
    year: Option<i32>,
    margin: f64,
    parquet: Option<&Path>,
) -> Result<serde_json::Value> {
    let mut config = match config {
        Some(path) => IngestConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => IngestConfig::default(),
    };
    if year.is_some() {
        config.year = year;
    }

    let pipeline = Pipeline::from_config(config)?;
    let set = pipeline
        .ingest_directory(dir)
        .with_context(|| format!("ingesting {}", dir.display()))?;

    let groups = set
        .iter()
        .map(|(group, data)| {
            let discarded = match data {
                GroupData::Available { discarded, .. } => *discarded,
                GroupData::Unavailable { .. } => 0,
            };
            GroupReport {
                family: group.family(),
                variant: group.variant(),
                available: data.is_available(),
                file: data.run_file().map(|run_file| run_file.path()),
                records: data.records().len(),
                discarded,
                series: summarize(data.records(), Grouping::ThreadsHashBits).series(None),
            }
        })
        .collect();

    if let Some(path) = parquet {
        let records: Vec<Record> = set.records().cloned().collect();
        write_parquet(&records, path)?;
    }

    let report = ThroughputReport {
        groups,
        bounds: set.axis_bounds().map(|bounds| bounds.padded(margin)),
        diagnostics: set.diagnostics(),
    };
    Ok(serde_json::to_value(report)?)
}

fn perf(files: &[PathBuf], parquet: Option<&Path>) -> Result<serde_json::Value> {
    let batch = parse_files(files, Grammar::Counter, None);
    if let Some(path) = parquet {
        write_batch_parquet(&batch, path)?;
    }

    let reports = batch
        .files
        .iter()
        .map(|file| {
            let table = summarize(&file.outcome.records, Grouping::MetricThreadsHashBits);
            let metrics = table
                .metrics()
                .into_iter()
                .map(|metric| MetricReport {
                    metric: metric.to_string(),
                    series: table.series(Some(metric)),
                })
                .collect();
            file_report(file, metrics)
        })
        .collect();

    let report = BatchReport {
        files: reports,
        bounds: None,
        diagnostics: &batch.diagnostics,
    };
    Ok(serde_json::to_value(report)?)
}

fn csv(
    files: &[PathBuf],
    latest_block: bool,
    margin: f64,
    parquet: Option<&Path>,
) -> Result<serde_json::Value> {
    let marker = latest_block.then_some(DEFAULT_BLOCK_MARKER);
    let batch = parse_files(files, Grammar::Csv, marker);
    if let Some(path) = parquet {
        write_batch_parquet(&batch, path)?;
    }

    let reports = batch
        .files
        .iter()
        .map(|file| {
            let table = summarize(&file.outcome.records, Grouping::ThreadsHashBits);
            let metrics = vec![MetricReport {
                metric: THROUGHPUT_METRIC.to_string(),
                series: table.series(None),
            }];
            file_report(file, metrics)
        })
        .collect();

    let report = BatchReport {
        files: reports,
        bounds: batch.axis_bounds().map(|bounds| bounds.padded(margin)),
        diagnostics: &batch.diagnostics,
    };
    Ok(serde_json::to_value(report)?)
}

fn file_report(file: &ParsedFile, metrics: Vec<MetricReport>) -> FileReport<'_> {
    FileReport {
        label: run_label(&file.path),
        file: &file.path,
        records: file.outcome.records.len(),
        discarded: file.outcome.discarded,
        metrics,
    }
}

fn write_batch_parquet(batch: &FileBatch, path: &Path) -> Result<()> {
    let records: Vec<Record> = batch.records().cloned().collect();
    write_parquet(&records, path)
}

fn write_parquet(records: &[Record], path: &Path) -> Result<()> {
    RecordStore::from_records(records)?
        .write_parquet(path)
        .with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), rows = records.len(), "wrote parquet");
    Ok(())
}
