//! Experiment Group - a family/variant pair and its selected data

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Record, RunFile};

/// Experiment Group identifies one experiment variant.
///
/// `family` is the experiment family token (e.g., "independent",
/// "concurrent"), `variant` the affinity or mode token (e.g.,
/// "`cpu_affinity`"). Groups order by family, then variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExperimentGroup {
    family: String,
    variant: String,
}

impl ExperimentGroup {
    /// Create a new experiment group key.
    #[must_use]
    pub fn new(family: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            variant: variant.into(),
        }
    }

    /// Get the experiment family.
    #[must_use]
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Get the affinity/variant token.
    #[must_use]
    pub fn variant(&self) -> &str {
        &self.variant
    }
}

impl fmt::Display for ExperimentGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.family, self.variant)
    }
}

/// Data loaded for one experiment group.
///
/// A group whose pattern matched no rankable file, or whose selected file
/// could not be read, is `Unavailable`; renderers show a placeholder for it.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GroupData {
    /// The latest run file was parsed.
    Available {
        /// File selected as latest for the group
        run_file: RunFile,
        /// Records parsed from the file, in file order
        records: Vec<Record>,
        /// Number of lines rejected while parsing
        discarded: usize,
    },
    /// No data for this group.
    Unavailable {
        /// File pattern that was searched
        pattern: String,
    },
}

impl GroupData {
    /// Whether records were loaded for the group.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available { .. })
    }

    /// Get the loaded records (empty when unavailable).
    #[must_use]
    pub fn records(&self) -> &[Record] {
        match self {
            Self::Available { records, .. } => records,
            Self::Unavailable { .. } => &[],
        }
    }

    /// Get the selected run file, if any.
    #[must_use]
    pub const fn run_file(&self) -> Option<&RunFile> {
        match self {
            Self::Available { run_file, .. } => Some(run_file),
            Self::Unavailable { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_display() {
        let group = ExperimentGroup::new("independent", "cpu_affinity");
        assert_eq!(group.to_string(), "independent/cpu_affinity");
    }

    #[test]
    fn test_group_ordering() {
        let a = ExperimentGroup::new("concurrent", "numa_affinity");
        let b = ExperimentGroup::new("independent", "cpu_affinity");
        assert!(a < b);
    }

    #[test]
    fn test_unavailable_has_no_records() {
        let data = GroupData::Unavailable {
            pattern: "independent_numa_*.txt".to_string(),
        };
        assert!(!data.is_available());
        assert!(data.records().is_empty());
        assert!(data.run_file().is_none());
    }

    #[test]
    fn test_group_data_serialization_tag() {
        let data = GroupData::Unavailable {
            pattern: "x_*.txt".to_string(),
        };
        let json = serde_json::to_string(&data).unwrap();
        assert!(json.contains("\"status\":\"unavailable\""));
    }
}
