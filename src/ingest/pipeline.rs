//! Ingestion orchestration
//!
//! Sequences one run as a small state machine:
//!
//! ```text
//! Init -> Snapshot -> (Classify -> Write -> Merge)* -> Done
//!   \________\______________________________________-> Failed
//! ```
//!
//! `Failed` is only reachable before the first write. Once writing starts the
//! run always completes and reports per-record outcomes.

use uuid::Uuid;

use crate::database::{DatabaseResult, RecordStore};
use crate::models::{IngestionReport, Record};
use crate::validation::validate_input;

use super::classify::{Classification, classify_batch};
use super::config::IngestConfig;
use super::error::IngestResult;
use super::partition::partition;
use super::report::{Progress, ReportBuilder};
use super::snapshot::load_key_snapshot;
use super::writer::BatchWriter;

/// Callback invoked with the run's progress after every batch
pub type ProgressObserver = Box<dyn Fn(&Progress) + Send + Sync>;

/// Phase of an ingestion run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    Snapshot,
    Classify,
    Write,
    Merge,
    Done,
    Failed,
}

impl RunState {
    /// Check whether `next` may follow this state
    pub fn can_transition_to(self, next: RunState) -> bool {
        use RunState::*;
        matches!(
            (self, next),
            (Init, Snapshot)
                | (Init, Failed)
                | (Snapshot, Classify)
                | (Snapshot, Done)
                | (Snapshot, Failed)
                | (Classify, Write)
                | (Write, Merge)
                | (Merge, Classify)
                | (Merge, Done)
        )
    }

    /// True for `Done` and `Failed`
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Done | RunState::Failed)
    }
}

fn advance(state: &mut RunState, next: RunState, run_id: Uuid) {
    debug_assert!(
        state.can_transition_to(next),
        "invalid transition {:?} -> {:?}",
        state,
        next
    );
    tracing::debug!(%run_id, from = ?*state, to = ?next, "Run state transition");
    *state = next;
}

/// Deduplicating bulk ingestion over a [`RecordStore`]
///
/// Each call to [`run`](Self::run) owns its own key set, so runs never share
/// in-memory state. Runs racing on the same collection are only separated by
/// the store's unique index and surface as duplicate-key write failures.
pub struct IngestionPipeline<S: RecordStore> {
    store: S,
    config: IngestConfig,
    observer: Option<ProgressObserver>,
}

impl<S: RecordStore> IngestionPipeline<S> {
    /// Create a new pipeline with the given store
    pub fn new(store: S, config: IngestConfig) -> Self {
        Self {
            store,
            config,
            observer: None,
        }
    }

    /// Register a progress observer
    pub fn with_progress<F>(mut self, observer: F) -> Self
    where
        F: Fn(&Progress) + Send + Sync + 'static,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Get reference to the record store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the run configuration
    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Initialize the store (run migrations)
    pub async fn initialize(&self) -> DatabaseResult<()> {
        self.store.initialize().await
    }

    /// Ingest `records` into the configured collection
    ///
    /// # Arguments
    /// * `records` - Records in input order
    /// * `tag` - Value stamped onto every accepted record; the run id is used
    ///   when `None`
    ///
    /// # Returns
    /// The run report, or an error when the input is invalid or the key
    /// snapshot cannot be read. In both error cases nothing was written.
    pub async fn run(&self, records: Vec<Record>, tag: Option<&str>) -> IngestResult<IngestionReport> {
        let run_id = Uuid::new_v4();
        let tag = tag.map_or_else(|| run_id.to_string(), str::to_string);
        let collection = &self.config.collection;
        let mut state = RunState::Init;

        tracing::info!(
            %run_id,
            collection = %collection.name,
            records = records.len(),
            batch_size = self.config.batch_size,
            "Starting ingestion run"
        );

        if let Err(e) = validate_input(&records, &self.config.required_fields) {
            advance(&mut state, RunState::Failed, run_id);
            tracing::warn!(%run_id, error = %e, "Ingestion input rejected");
            return Err(e.into());
        }

        advance(&mut state, RunState::Snapshot, run_id);
        let mut known = match load_key_snapshot(&self.store, collection).await {
            Ok(keys) => keys,
            Err(e) => {
                advance(&mut state, RunState::Failed, run_id);
                return Err(e);
            }
        };

        let total = records.len();
        let batches = partition(records, self.config.batch_size);
        let mut report = ReportBuilder::new(run_id, tag.as_str(), total, batches.len());
        let writer = BatchWriter::new(&self.store, collection, &self.config.tag_field, &tag);

        for (index, batch) in batches.enumerate() {
            advance(&mut state, RunState::Classify, run_id);
            let Classification {
                valid,
                claimed,
                duplicates,
                malformed,
            } = classify_batch(batch, &known, collection, &self.config.display_field);
            report.record_duplicates(duplicates);
            report.record_malformed(malformed);

            advance(&mut state, RunState::Write, run_id);
            let written = writer.write(valid, &claimed).await;
            report.record_write(written);

            // Merge every claimed key, including ones whose write failed
            advance(&mut state, RunState::Merge, run_id);
            known.merge(claimed);

            let progress = report.finish_batch();
            tracing::info!(
                %run_id,
                batch = index + 1,
                batches = progress.batches_total,
                inserted = progress.inserted,
                skipped = progress.skipped,
                failed = progress.failed,
                "Batch complete"
            );
            if let Some(observer) = &self.observer {
                observer(&progress);
            }
        }

        advance(&mut state, RunState::Done, run_id);
        let report = report.finish();

        tracing::info!(
            %run_id,
            inserted = report.inserted_count,
            skipped = report.skipped_duplicates,
            malformed = report.malformed_count,
            failed = report.failed_count,
            duration = %report.duration_string(),
            "Ingestion run complete"
        );

        Ok(report)
    }
}
