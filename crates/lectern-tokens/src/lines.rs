//! Byte offset to line number mapping.

use std::ops::Range;

/// Line start offsets of a source document.
#[derive(Debug)]
pub(crate) struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub(crate) fn new(source: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    /// Zero-based line containing `offset`.
    pub(crate) fn line(&self, offset: usize) -> usize {
        self.starts.partition_point(|&start| start <= offset) - 1
    }

    /// Lines covered by a byte range, end exclusive.
    pub(crate) fn span(&self, range: &Range<usize>) -> (usize, usize) {
        let start = self.line(range.start);
        let end = if range.end > range.start {
            self.line(range.end - 1) + 1
        } else {
            start + 1
        };
        (start, end)
    }
}
