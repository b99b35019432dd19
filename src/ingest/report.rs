//! Ingestion report building

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;

use crate::models::{DuplicateEntry, IngestionReport, WriteFailure};

use super::writer::BatchWrite;

/// Maximum number of write failures kept in a report
pub const MAX_REPORTED_FAILURES: usize = 100;

/// Snapshot of a run's progress, emitted after every batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// Batches completed so far
    pub batches_done: usize,
    /// Batches in the run
    pub batches_total: usize,
    /// Input records resolved so far
    pub processed: usize,
    /// Input records in the run
    pub total: usize,
    /// Records inserted so far
    pub inserted: usize,
    /// Duplicates skipped so far
    pub skipped: usize,
    /// Malformed records so far
    pub malformed: usize,
    /// Write failures so far
    pub failed: usize,
}

impl Progress {
    /// Percentage of input records resolved (0-100)
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        ((self.processed.min(self.total) * 100) / self.total) as u8
    }

    /// True once every batch has been processed
    pub fn is_complete(&self) -> bool {
        self.batches_done >= self.batches_total
    }
}

/// Accumulates per-batch outcomes into an [`IngestionReport`]
#[derive(Debug)]
pub struct ReportBuilder {
    run_id: Uuid,
    tag: String,
    total: usize,
    batches_total: usize,
    batches_done: usize,
    inserted: usize,
    malformed: usize,
    failed: usize,
    duplicates: Vec<DuplicateEntry>,
    failures: Vec<WriteFailure>,
    started_at: DateTime<Utc>,
    clock: Instant,
}

impl ReportBuilder {
    /// Start a report for a run of `total` records in `batches_total` batches
    pub fn new(run_id: Uuid, tag: impl Into<String>, total: usize, batches_total: usize) -> Self {
        Self {
            run_id,
            tag: tag.into(),
            total,
            batches_total,
            batches_done: 0,
            inserted: 0,
            malformed: 0,
            failed: 0,
            duplicates: Vec::new(),
            failures: Vec::new(),
            started_at: Utc::now(),
            clock: Instant::now(),
        }
    }

    /// Append duplicates rejected by the classifier
    pub fn record_duplicates(&mut self, duplicates: Vec<DuplicateEntry>) {
        self.duplicates.extend(duplicates);
    }

    /// Count records dropped for lacking a natural key
    pub fn record_malformed(&mut self, count: usize) {
        self.malformed += count;
    }

    /// Fold in the outcome of a batch write
    pub fn record_write(&mut self, write: BatchWrite) {
        self.inserted += write.inserted;
        self.failed += write.failed;
        for failure in write.failures {
            self.add_failure(failure);
        }
    }

    /// Add a write failure (limited to 100)
    fn add_failure(&mut self, failure: WriteFailure) {
        if self.failures.len() < MAX_REPORTED_FAILURES {
            self.failures.push(failure);
        }
    }

    /// Mark a batch as done and return the progress so far
    pub fn finish_batch(&mut self) -> Progress {
        self.batches_done += 1;
        self.progress()
    }

    /// Current progress
    pub fn progress(&self) -> Progress {
        Progress {
            batches_done: self.batches_done,
            batches_total: self.batches_total,
            processed: self.processed(),
            total: self.total,
            inserted: self.inserted,
            skipped: self.duplicates.len(),
            malformed: self.malformed,
            failed: self.failed,
        }
    }

    fn processed(&self) -> usize {
        self.inserted + self.duplicates.len() + self.malformed + self.failed
    }

    /// Render the final report
    pub fn finish(self) -> IngestionReport {
        let completed_at = Utc::now();
        let duration_ms = self.clock.elapsed().as_millis() as u64;
        let message = summary_message(
            self.total,
            self.inserted,
            self.duplicates.len(),
            self.malformed,
            self.failed,
        );

        IngestionReport {
            message,
            run_id: self.run_id,
            tag: self.tag,
            total_records: self.total,
            inserted_count: self.inserted,
            skipped_duplicates: self.duplicates.len(),
            malformed_count: self.malformed,
            failed_count: self.failed,
            duplicate_entries: self.duplicates,
            write_failures: self.failures,
            batches: self.batches_done,
            started_at: self.started_at,
            completed_at,
            duration_ms,
        }
    }
}

fn summary_message(
    total: usize,
    inserted: usize,
    skipped: usize,
    malformed: usize,
    failed: usize,
) -> String {
    if total == 0 {
        return "No records to ingest".to_string();
    }

    let mut message = format!("Inserted {} of {} records", inserted, total);
    let mut extras = Vec::new();
    if skipped > 0 {
        extras.push(format!("{} duplicates skipped", skipped));
    }
    if malformed > 0 {
        extras.push(format!("{} malformed", malformed));
    }
    if failed > 0 {
        extras.push(format!("{} failed", failed));
    }
    if !extras.is_empty() {
        message.push_str(&format!(" ({})", extras.join(", ")));
    }
    message
}
