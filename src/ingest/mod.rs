//! Bulk record ingestion
//!
//! Imports a batch of externally-sourced records into a collection whose
//! store enforces uniqueness on a natural key. A run:
//!
//! 1. validates the input (fails fast, no store access)
//! 2. loads every existing key once ([`snapshot`])
//! 3. splits the input into batches ([`partition`])
//! 4. per batch, rejects duplicates against the snapshot and the keys
//!    accepted so far ([`classify`]), writes the rest with
//!    independent-record semantics ([`writer`]) and merges the batch's keys
//! 5. renders an [`IngestionReport`](crate::models::IngestionReport)
//!    ([`report`])
//!
//! Batches run strictly in sequence.

pub mod classify;
pub mod config;
pub mod error;
pub mod partition;
pub mod pipeline;
pub mod report;
pub mod snapshot;
pub mod writer;

pub use classify::{Classification, classify_batch};
pub use config::{IngestConfig, IngestConfigBuilder};
pub use error::{IngestError, IngestResult, RejectReason};
pub use partition::{Batches, batch_count, partition};
pub use pipeline::{IngestionPipeline, ProgressObserver, RunState};
pub use report::{MAX_REPORTED_FAILURES, Progress, ReportBuilder};
pub use snapshot::load_key_snapshot;
pub use writer::{BatchWrite, BatchWriter};
