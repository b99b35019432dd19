//! Ingestion data model

pub mod keyset;
pub mod record;
pub mod report;

pub use keyset::KeySet;
pub use record::Record;
pub use report::{DuplicateEntry, IngestionReport, WriteFailure, WriteFailureKind};
