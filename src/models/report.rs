//! Ingestion report types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A record rejected because its natural key was already used
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateEntry {
    /// The natural key that collided
    pub natural_key: String,
    /// Display name of the rejected record
    pub display_name: String,
}

impl DuplicateEntry {
    /// Create a new duplicate entry
    pub fn new(natural_key: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            natural_key: natural_key.into(),
            display_name: display_name.into(),
        }
    }
}

/// Why the store refused a record at write time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WriteFailureKind {
    /// Unique index violation (e.g. a concurrent run inserted the same key)
    DuplicateKey,
    /// Any other store-side rejection
    Other,
}

/// A record the store rejected during a bulk insert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteFailure {
    /// Natural key of the rejected record
    pub natural_key: String,
    /// Failure classification
    pub kind: WriteFailureKind,
    /// Store error message
    pub message: String,
}

impl WriteFailure {
    /// Unique index violation for `natural_key`
    pub fn duplicate_key(natural_key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            natural_key: natural_key.into(),
            kind: WriteFailureKind::DuplicateKey,
            message: message.into(),
        }
    }

    /// Any other rejection for `natural_key`
    pub fn other(natural_key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            natural_key: natural_key.into(),
            kind: WriteFailureKind::Other,
            message: message.into(),
        }
    }
}

/// Final summary of an ingestion run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionReport {
    /// Human-readable summary line
    pub message: String,
    /// Identifier of this run
    pub run_id: Uuid,
    /// Tag stamped onto every accepted record
    pub tag: String,
    /// Number of input records
    pub total_records: usize,
    /// Records actually written by the store
    pub inserted_count: usize,
    /// Records rejected as duplicates
    pub skipped_duplicates: usize,
    /// Records dropped for lacking a natural key
    pub malformed_count: usize,
    /// Records the store refused at write time
    pub failed_count: usize,
    /// Every duplicate, in input order
    pub duplicate_entries: Vec<DuplicateEntry>,
    /// Write failures (limited to the first 100)
    pub write_failures: Vec<WriteFailure>,
    /// Number of batches processed
    pub batches: usize,
    /// Run start time
    pub started_at: DateTime<Utc>,
    /// Run completion time
    pub completed_at: DateTime<Utc>,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

impl IngestionReport {
    /// Sum of every outcome class
    pub fn resolved_count(&self) -> usize {
        self.inserted_count + self.skipped_duplicates + self.malformed_count + self.failed_count
    }

    /// Check that every input record landed in exactly one outcome class
    pub fn is_balanced(&self) -> bool {
        self.resolved_count() == self.total_records
    }

    /// True when no record failed at write time
    pub fn is_clean(&self) -> bool {
        self.failed_count == 0
    }

    /// Format duration as human-readable string
    pub fn duration_string(&self) -> String {
        let secs = self.duration_ms / 1000;
        if secs == 0 {
            format!("{}ms", self.duration_ms)
        } else if secs < 60 {
            format!("{}s", secs)
        } else if secs < 3600 {
            format!("{}m {}s", secs / 60, secs % 60)
        } else {
            format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
        }
    }
}
