//! Block extraction: isolate the newest run appended to a log
//!
//! The harness appends to its log files instead of truncating them, so a
//! file holds one result block per invocation:
//!
//! ```text
//! Independent Experiment Results (Throughput MT/s):   <- marker (run 1)
//! Threads,HashBits,Throughput
//! 1,3,10.00
//! Independent Experiment Results (Throughput MT/s):   <- marker (run 2)
//! Threads,HashBits,Throughput                         <- block of run 2
//! 1,3,12.00                                           <-
//! ```
//!
//! Tie-break rule: the LAST marker wins. Only the block that starts after it
//! is returned, stale runs above it are never parsed.

/// Marker line written by the harness before every throughput table.
pub const DEFAULT_BLOCK_MARKER: &str = "Results (Throughput MT/s):";

/// Lines of the selected block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block<'a> {
    lines: Vec<&'a str>,
    marker_line: Option<usize>,
    marker_count: usize,
}

impl<'a> Block<'a> {
    /// Whole text as a single unlabeled block
    #[must_use]
    pub fn whole(text: &'a str) -> Self {
        Self {
            lines: text.lines().collect(),
            marker_line: None,
            marker_count: 0,
        }
    }

    /// Lines of the block, excluding the marker line itself
    #[must_use]
    pub fn lines(&self) -> &[&'a str] {
        &self.lines
    }

    /// Zero-based line index of the marker that opened the block
    ///
    /// `None` when the file had no marker and the whole file is the block.
    #[must_use]
    pub const fn marker_line(&self) -> Option<usize> {
        self.marker_line
    }

    /// Number of marker lines found in the file
    #[must_use]
    pub const fn marker_count(&self) -> usize {
        self.marker_count
    }

    /// Check if the block has no lines
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Extract the most recently appended block of `text`
///
/// A marker line is any line containing `marker`. With no marker in the
/// file (or an empty `marker`), the whole file is returned as one block.
/// Otherwise the block runs from the line after the last marker to the end
/// of the file; a marker on the final line gives an empty block.
#[must_use]
pub fn extract_latest_block<'a>(text: &'a str, marker: &str) -> Block<'a> {
    if marker.is_empty() {
        return Block::whole(text);
    }

    let lines: Vec<&str> = text.lines().collect();
    let mut marker_count = 0;
    let mut last_marker = None;
    for (index, line) in lines.iter().enumerate() {
        if line.contains(marker) {
            marker_count += 1;
            last_marker = Some(index);
        }
    }

    let Some(start) = last_marker else {
        return Block {
            lines,
            marker_line: None,
            marker_count: 0,
        };
    };

    // No marker follows the last one, so the block ends at EOF.
    Block {
        lines: lines[start + 1..].to_vec(),
        marker_line: Some(start),
        marker_count,
    }
}
