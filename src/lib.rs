//! CRM Ingest - deduplicating bulk record ingestion
//!
//! Provides unified interfaces for:
//! - Loading externally-sourced records (JSON, JSONL, YAML)
//! - Input validation
//! - Batched, deduplicating ingestion with per-record failure reporting
//! - Record stores (in-memory, DuckDB, PostgreSQL)
//! - Configuration files with environment overrides

#[cfg(feature = "cli")]
pub mod cli;
pub mod database;
pub mod import;
pub mod ingest;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use database::{
    BulkInsertOptions, BulkInsertOutcome, Collection, DatabaseConfig, DatabaseError,
    DatabaseResult, MemoryStore, RecordStore,
};
#[cfg(feature = "duckdb-backend")]
pub use database::DuckDBBackend;
#[cfg(feature = "postgres-backend")]
pub use database::PostgresBackend;
pub use import::{LoadError, discover_files, load_all, load_records};
pub use ingest::{
    IngestConfig, IngestError, IngestResult, IngestionPipeline, Progress, RejectReason,
};
pub use validation::{ValidationError, ValidationResult};

// Re-export models
pub use models::{DuplicateEntry, IngestionReport, KeySet, Record, WriteFailure, WriteFailureKind};
