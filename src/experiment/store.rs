//! Experiment Set - the result of one ingestion pass
//!
//! Built fresh by every ingestion call and returned by value, so re-running
//! ingestion over unchanged files yields an identical set.

use std::collections::BTreeMap;

use super::{ExperimentGroup, GroupData, Record};
use crate::aggregate::{summarize, AxisBounds, Grouping, SummaryTable};
use crate::ingest::Diagnostic;

/// Mapping from experiment group to its loaded data, plus the diagnostics
/// collected while loading.
///
/// ## Design
///
/// Groups are kept in a `BTreeMap` so iteration order is deterministic
/// (family, then variant).
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExperimentSet {
    groups: BTreeMap<ExperimentGroup, GroupData>,
    diagnostics: Vec<Diagnostic>,
}

impl ExperimentSet {
    /// Create a new empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the set holds no groups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Get the number of groups (available or not).
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Insert the data for a group, replacing any previous entry.
    pub fn insert(&mut self, group: ExperimentGroup, data: GroupData) {
        self.groups.insert(group, data);
    }

    /// Record a diagnostic.
    pub fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Get the data for a group.
    #[must_use]
    pub fn get(&self, group: &ExperimentGroup) -> Option<&GroupData> {
        self.groups.get(group)
    }

    /// Iterate over all groups in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&ExperimentGroup, &GroupData)> {
        self.groups.iter()
    }

    /// Iterate over the groups that have data.
    pub fn available(&self) -> impl Iterator<Item = (&ExperimentGroup, &GroupData)> {
        self.groups.iter().filter(|(_, data)| data.is_available())
    }

    /// Get the groups reported as "data unavailable".
    #[must_use]
    pub fn unavailable(&self) -> Vec<&ExperimentGroup> {
        self.groups
            .iter()
            .filter(|(_, data)| !data.is_available())
            .map(|(group, _)| group)
            .collect()
    }

    /// Iterate over every loaded record across all groups.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.groups.values().flat_map(GroupData::records)
    }

    /// Get the diagnostics collected during ingestion.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Summarize each available group.
    ///
    /// Unavailable groups are left out; look them up with
    /// [`unavailable`](Self::unavailable).
    #[must_use]
    pub fn summaries(&self, grouping: Grouping) -> BTreeMap<ExperimentGroup, SummaryTable> {
        self.available()
            .map(|(group, data)| (group.clone(), summarize(data.records(), grouping)))
            .collect()
    }

    /// Global hash-bit and value bounds across all loaded groups.
    ///
    /// Used to give every chart of a run the same display range.
    #[must_use]
    pub fn axis_bounds(&self) -> Option<AxisBounds> {
        AxisBounds::from_records(self.records())
    }
}
