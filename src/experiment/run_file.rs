//! Run File - one harness output file and its freshness

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::timestamp::TimestampResolver;

/// Run File represents one candidate input file for an experiment group.
///
/// The timestamp comes from the file name suffix and is only used to rank
/// candidates against each other.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunFile {
    path: PathBuf,
    timestamp: Option<NaiveDateTime>,
}

impl RunFile {
    /// Create a run file with an already resolved timestamp.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, timestamp: Option<NaiveDateTime>) -> Self {
        Self {
            path: path.into(),
            timestamp,
        }
    }

    /// Create a run file, resolving its timestamp from the file name.
    #[must_use]
    pub fn resolve(path: impl Into<PathBuf>, resolver: &TimestampResolver) -> Self {
        let path = path.into();
        let timestamp = resolver.resolve(&path);
        Self { path, timestamp }
    }

    /// Get the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the resolved timestamp, if the file name carried one.
    #[must_use]
    pub const fn timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamp
    }

    /// Whether this file can take part in latest-file selection.
    #[must_use]
    pub const fn is_rankable(&self) -> bool {
        self.timestamp.is_some()
    }
}

/// Select the most recent run file.
///
/// Files without a resolved timestamp rank below every resolved one and are
/// never selected, so a candidate set made only of such files yields `None`.
/// Equal timestamps are broken by path: the lexicographically greatest path
/// wins.
#[must_use]
pub fn select_latest<I>(candidates: I) -> Option<RunFile>
where
    I: IntoIterator<Item = RunFile>,
{
    candidates
        .into_iter()
        .filter(RunFile::is_rankable)
        .max_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.path.cmp(&b.path))
        })
}
