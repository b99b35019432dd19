//! Batch partitioning
//!
//! Splits an ordered record sequence into bounded, order-preserving batches.
//! Batches are produced lazily, so only one batch is materialised at a time
//! on top of the input itself.

use crate::models::Record;

/// Lazy iterator over fixed-size batches
///
/// Every batch holds at most `batch_size` records; only the last may be
/// shorter. Empty input yields no batches.
#[derive(Debug)]
pub struct Batches {
    records: std::vec::IntoIter<Record>,
    batch_size: usize,
}

impl Batches {
    /// Partition `records` into batches of `batch_size` (clamped to at least 1)
    pub fn new(records: Vec<Record>, batch_size: usize) -> Self {
        Self {
            records: records.into_iter(),
            batch_size: batch_size.max(1),
        }
    }

    /// Effective batch size
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

impl Iterator for Batches {
    type Item = Vec<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let batch: Vec<Record> = self.records.by_ref().take(self.batch_size).collect();
        if batch.is_empty() { None } else { Some(batch) }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = batch_count(self.records.len(), self.batch_size);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Batches {}

/// Number of batches `total` records split into
pub fn batch_count(total: usize, batch_size: usize) -> usize {
    total.div_ceil(batch_size.max(1))
}

/// Partition `records` into lazily produced batches
pub fn partition(records: Vec<Record>, batch_size: usize) -> Batches {
    Batches::new(records, batch_size)
}
