//! Ingestion pipeline
//!
//! For every experiment group: list candidate files, select the latest by
//! file name timestamp, read it, isolate its newest block and parse it.
//!
//! Failures are contained per file. Anything with a defined degraded
//! behavior (no timestamp, no matching file, unreadable file inside a
//! multi-file pass, no block marker, rejected lines) becomes a
//! [`Diagnostic`] and processing continues with the next file.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::aggregate::AxisBounds;
use crate::config::{compile_pattern, IngestConfig};
use crate::experiment::{select_latest, ExperimentGroup, ExperimentSet, GroupData, Record, RunFile};
use crate::parse::{extract_latest_block, parse_region, Block, Grammar, ParseOutcome};
use crate::{Error, Result};

/// Non-fatal condition reported alongside ingestion results
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// File name has no parseable timestamp; excluded from selection
    UnresolvedTimestamp {
        /// Offending file
        path: PathBuf,
    },
    /// No rankable file matched the group's pattern
    NoMatchingFile {
        /// Group left without data
        group: ExperimentGroup,
        /// Pattern that was searched
        pattern: String,
    },
    /// No block marker found; the whole file was parsed
    NoMarker {
        /// File without marker
        path: PathBuf,
    },
    /// Lines rejected by the grammar
    DiscardedLines {
        /// File containing the lines
        path: PathBuf,
        /// Number of rejected lines
        count: usize,
    },
    /// File parsed but produced no records
    EmptyFile {
        /// Empty file
        path: PathBuf,
    },
    /// File could not be read
    ReadFailed {
        /// Unreadable file
        path: PathBuf,
        /// I/O error message
        message: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedTimestamp { path } => {
                write!(f, "{}: no timestamp in file name, skipped", path.display())
            }
            Self::NoMatchingFile { group, pattern } => {
                write!(f, "{group}: no file found for pattern {pattern}")
            }
            Self::NoMarker { path } => {
                write!(f, "{}: no block marker, parsed whole file", path.display())
            }
            Self::DiscardedLines { path, count } => {
                write!(f, "{}: discarded {count} malformed line(s)", path.display())
            }
            Self::EmptyFile { path } => write!(f, "{}: no valid data", path.display()),
            Self::ReadFailed { path, message } => {
                write!(f, "{}: read failed: {message}", path.display())
            }
        }
    }
}

/// Result of parsing one file
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFile {
    /// Source file
    pub path: PathBuf,
    /// Number of block markers found (0 when parsed as a whole)
    pub marker_count: usize,
    /// Parsed records and rejected line count
    pub outcome: ParseOutcome,
}

impl ParsedFile {
    /// Diagnostics describing how this file degraded, if at all
    #[must_use]
    pub fn diagnostics(&self, marker: Option<&str>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        if marker.is_some() && self.marker_count == 0 {
            diagnostics.push(Diagnostic::NoMarker {
                path: self.path.clone(),
            });
        }
        if self.outcome.discarded > 0 {
            diagnostics.push(Diagnostic::DiscardedLines {
                path: self.path.clone(),
                count: self.outcome.discarded,
            });
        }
        if self.outcome.is_empty() {
            diagnostics.push(Diagnostic::EmptyFile {
                path: self.path.clone(),
            });
        }
        diagnostics
    }
}

/// Parse log text already in memory
///
/// With a `marker`, only the block after its last occurrence is parsed
/// (whole text when absent); without one the whole text is parsed.
#[must_use]
pub fn parse_text(text: &str, grammar: Grammar, marker: Option<&str>) -> (ParseOutcome, usize) {
    let block = marker.map_or_else(
        || Block::whole(text),
        |marker| extract_latest_block(text, marker),
    );
    let outcome = parse_region(grammar, block.lines().iter().copied());
    (outcome, block.marker_count())
}

/// Read and parse one run file
///
/// # Errors
/// Returns [`Error::FileRead`] if the file cannot be read as UTF-8 text.
/// Every other condition degrades (see [`ParsedFile::diagnostics`]).
pub fn parse_run_file(
    path: impl AsRef<Path>,
    grammar: Grammar,
    marker: Option<&str>,
) -> Result<ParsedFile> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| Error::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let (outcome, marker_count) = parse_text(&text, grammar, marker);
    debug!(
        path = %path.display(),
        records = outcome.records.len(),
        discarded = outcome.discarded,
        marker_count,
        "parsed run file"
    );

    Ok(ParsedFile {
        path: path.to_path_buf(),
        marker_count,
        outcome,
    })
}

/// Files parsed independently of experiment groups
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileBatch {
    /// Successfully read files, in input order
    pub files: Vec<ParsedFile>,
    /// Conditions reported while loading
    pub diagnostics: Vec<Diagnostic>,
}

impl FileBatch {
    /// Iterate over every record of every file
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.files.iter().flat_map(|file| file.outcome.records.iter())
    }

    /// Global bounds across all files
    #[must_use]
    pub fn axis_bounds(&self) -> Option<AxisBounds> {
        AxisBounds::from_records(self.records())
    }
}

/// Parse a list of files, continuing past unreadable ones
///
/// Unreadable files are reported as [`Diagnostic::ReadFailed`] and left out
/// of [`FileBatch::files`].
#[must_use]
pub fn parse_files<P>(paths: &[P], grammar: Grammar, marker: Option<&str>) -> FileBatch
where
    P: AsRef<Path>,
{
    let mut batch = FileBatch::default();
    for path in paths {
        match parse_run_file(path, grammar, marker) {
            Ok(parsed) => {
                for diagnostic in parsed.diagnostics(marker) {
                    report(&diagnostic);
                    batch.diagnostics.push(diagnostic);
                }
                batch.files.push(parsed);
            }
            Err(e) => {
                let diagnostic = read_failed(path.as_ref(), &e);
                report(&diagnostic);
                batch.diagnostics.push(diagnostic);
            }
        }
    }
    batch
}

/// Load the latest run file of every configured experiment group in `dir`
///
/// Returns a freshly built [`ExperimentSet`]; nothing is cached between
/// calls.
///
/// # Errors
/// Returns error if the configuration is invalid or `dir` cannot be listed.
/// Per-file problems never fail the call.
pub fn ingest_directory(dir: impl AsRef<Path>, config: &IngestConfig) -> Result<ExperimentSet> {
    config.validate()?;
    let dir = dir.as_ref();
    let entries = list_files(dir)?;
    let resolver = config.resolver();
    let marker = config.block_marker.as_deref();

    let mut set = ExperimentSet::new();
    for family in &config.families {
        for variant in &family.variants {
            let group = ExperimentGroup::new(&family.name, &variant.name);
            let matcher = compile_pattern(&variant.pattern)?;

            let candidates: Vec<RunFile> = entries
                .iter()
                .filter(|path| {
                    path.file_name()
                        .and_then(|name| name.to_str())
                        .is_some_and(|name| matcher.is_match(name))
                })
                .map(|path| RunFile::resolve(path, &resolver))
                .collect();

            for candidate in candidates.iter().filter(|c| !c.is_rankable()) {
                let diagnostic = Diagnostic::UnresolvedTimestamp {
                    path: candidate.path().to_path_buf(),
                };
                report(&diagnostic);
                set.push_diagnostic(diagnostic);
            }

            let unavailable = GroupData::Unavailable {
                pattern: variant.pattern.clone(),
            };

            let Some(run_file) = select_latest(candidates) else {
                let diagnostic = Diagnostic::NoMatchingFile {
                    group: group.clone(),
                    pattern: variant.pattern.clone(),
                };
                report(&diagnostic);
                set.push_diagnostic(diagnostic);
                set.insert(group, unavailable);
                continue;
            };

            match parse_run_file(run_file.path(), config.grammar, marker) {
                Ok(parsed) => {
                    info!(
                        group = %group,
                        path = %run_file.path().display(),
                        records = parsed.outcome.records.len(),
                        "loaded latest run file"
                    );
                    for diagnostic in parsed.diagnostics(marker) {
                        report(&diagnostic);
                        set.push_diagnostic(diagnostic);
                    }
                    set.insert(
                        group,
                        GroupData::Available {
                            run_file,
                            records: parsed.outcome.records,
                            discarded: parsed.outcome.discarded,
                        },
                    );
                }
                Err(e) => {
                    let diagnostic = read_failed(run_file.path(), &e);
                    report(&diagnostic);
                    set.push_diagnostic(diagnostic);
                    set.insert(group, unavailable);
                }
            }
        }
    }

    Ok(set)
}

/// Human-readable label for a run file
///
/// Strips the harness suffixes `_perf.txt` and `_results.txt`, otherwise
/// the extension.
#[must_use]
pub fn run_label(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    for suffix in ["_perf.txt", "_results.txt"] {
        if let Some(label) = name.strip_suffix(suffix) {
            return label.to_string();
        }
    }

    path.file_stem()
        .map_or(name.clone(), |stem| stem.to_string_lossy().into_owned())
}

/// Regular files directly inside `dir` (symlinks followed), sorted by path
///
/// Entries whose metadata cannot be read are skipped; only failing to open
/// `dir` itself is an error.
fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|source| Error::FileRead {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        match std::fs::metadata(&path) {
            Ok(metadata) if metadata.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => debug!(path = %path.display(), error = %e, "skipping entry without metadata"),
        }
    }
    files.sort();
    Ok(files)
}

fn read_failed(path: &Path, error: &Error) -> Diagnostic {
    let message = match error {
        Error::FileRead { source, .. } => source.to_string(),
        other => other.to_string(),
    };
    Diagnostic::ReadFailed {
        path: path.to_path_buf(),
        message,
    }
}

fn report(diagnostic: &Diagnostic) {
    match diagnostic {
        Diagnostic::NoMarker { .. } => debug!("{diagnostic}"),
        _ => warn!("{diagnostic}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::DEFAULT_BLOCK_MARKER;

    #[test]
    fn test_parse_text_latest_block() {
        let text = "\
Results (Throughput MT/s):
Threads,HashBits,Throughput
1,3,1.0
Results (Throughput MT/s):
Threads,HashBits,Throughput
1,3,2.0
";
        let (outcome, markers) = parse_text(text, Grammar::Csv, Some(DEFAULT_BLOCK_MARKER));
        assert_eq!(markers, 2);
        assert_eq!(outcome.records, vec![Record::throughput(1, 3, 2.0)]);
    }

    #[test]
    fn test_parse_text_without_marker_parses_everything() {
        let text = "Results (Throughput MT/s):\n1,3,1.0\nResults (Throughput MT/s):\n1,3,2.0\n";
        let (outcome, markers) = parse_text(text, Grammar::Csv, None);
        assert_eq!(markers, 0);
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.discarded, 2);
    }

    #[test]
    fn test_parsed_file_diagnostics() {
        let parsed = ParsedFile {
            path: PathBuf::from("a.txt"),
            marker_count: 0,
            outcome: ParseOutcome {
                records: Vec::new(),
                discarded: 3,
            },
        };
        let diagnostics = parsed.diagnostics(Some(DEFAULT_BLOCK_MARKER));
        assert_eq!(diagnostics.len(), 3);
        assert!(parsed.diagnostics(None).iter().all(|d| !matches!(d, Diagnostic::NoMarker { .. })));
    }

    #[test]
    fn test_run_label() {
        assert_eq!(run_label("perf/independent_cpu_aff_perf.txt"), "independent_cpu_aff");
        assert_eq!(run_label("results/concurrent_numa_results.txt"), "concurrent_numa");
        assert_eq!(run_label("indep_no.csv"), "indep_no");
    }

    #[test]
    fn test_diagnostic_display() {
        let diagnostic = Diagnostic::NoMatchingFile {
            group: ExperimentGroup::new("concurrent", "numa_affinity"),
            pattern: "concurrent_numa_*.txt".to_string(),
        };
        assert_eq!(
            diagnostic.to_string(),
            "concurrent/numa_affinity: no file found for pattern concurrent_numa_*.txt"
        );
    }
}
