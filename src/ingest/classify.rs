//! Duplicate classification
//!
//! Decides, per record, whether a batch member is written or rejected. A key
//! is taken if it is in the run's [`KeySet`] (store snapshot plus keys from
//! earlier batches) or was claimed by an earlier record of the same batch.

use std::collections::HashSet;

use crate::database::Collection;
use crate::models::{DuplicateEntry, KeySet, Record};

use super::error::RejectReason;

/// Outcome of classifying one batch
#[derive(Debug, Default)]
pub struct Classification {
    /// Records to write, in input order
    pub valid: Vec<Record>,
    /// Natural keys of `valid`, index-aligned
    pub claimed: Vec<String>,
    /// Rejected duplicates, in input order
    pub duplicates: Vec<DuplicateEntry>,
    /// Records without a usable natural key
    pub malformed: usize,
}

impl Classification {
    /// Number of records rejected for `reason`
    pub fn rejected(&self, reason: RejectReason) -> usize {
        match reason {
            RejectReason::Duplicate => self.duplicates.len(),
            RejectReason::Malformed => self.malformed,
        }
    }

    /// Number of records classified
    pub fn total(&self) -> usize {
        self.valid.len() + self.duplicates.len() + self.malformed
    }
}

/// Split a batch into records to write and records to reject
///
/// Pure and in-memory. The same key never appears twice in the result's
/// `valid` set; on a collision the first occurrence wins.
pub fn classify_batch(
    batch: Vec<Record>,
    known: &KeySet,
    collection: &Collection,
    display_field: &str,
) -> Classification {
    let mut result = Classification::default();
    let mut claimed_here: HashSet<String> = HashSet::with_capacity(batch.len());

    for (position, record) in batch.into_iter().enumerate() {
        let Some(key) = collection.key_of(&record) else {
            tracing::debug!(
                position,
                key_field = %collection.key_field,
                reason = %RejectReason::Malformed,
                "Skipping record without natural key"
            );
            result.malformed += 1;
            continue;
        };

        if known.contains(&key) || claimed_here.contains(&key) {
            result
                .duplicates
                .push(DuplicateEntry::new(key, record.display_name(display_field)));
            continue;
        }

        claimed_here.insert(key.clone());
        result.claimed.push(key);
        result.valid.push(record);
    }

    result
}
