//! Record store abstraction for bulk ingestion
//!
//! This module provides the storage layer the ingestion pipeline writes to:
//! - Memory: in-process store for tests and dry integrations
//! - DuckDB: embedded database for the native CLI
//! - PostgreSQL: for server deployments
//!
//! Every backend enforces a unique index on `(collection, natural_key)`,
//! answers the full key snapshot in one read, and offers a bulk insert whose
//! unordered mode lets one record fail without aborting its siblings.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{KeySet, Record, WriteFailure};

// Re-export implementations based on features
#[cfg(feature = "duckdb-backend")]
pub mod duckdb;

#[cfg(feature = "postgres-backend")]
pub mod postgres;

pub mod config;
pub mod memory;
pub mod schema;

#[cfg(feature = "duckdb-backend")]
pub use self::duckdb::DuckDBBackend;

#[cfg(feature = "postgres-backend")]
pub use self::postgres::PostgresBackend;

pub use config::DatabaseConfig;
pub use memory::MemoryStore;
pub use schema::DatabaseSchema;

/// Error type for database operations
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Database not initialized
    #[error("Database not initialized. Run 'db init' first.")]
    NotInitialized,

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(String),
}

/// Result type for database operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// A named collection and the field its unique index covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Collection name (e.g. "leads")
    pub name: String,
    /// Record field holding the natural key (e.g. "phoneNumber")
    pub key_field: String,
}

impl Collection {
    /// Create a new collection descriptor
    pub fn new(name: impl Into<String>, key_field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key_field: key_field.into(),
        }
    }

    /// Natural key of a record in this collection
    pub fn key_of(&self, record: &Record) -> Option<String> {
        record.natural_key(&self.key_field)
    }
}

/// Options for a bulk insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkInsertOptions {
    /// When true the insert stops at the first failing record; when false
    /// every record is attempted independently
    pub ordered: bool,
}

impl BulkInsertOptions {
    /// Independent-record semantics: one failure never blocks the others
    pub fn unordered() -> Self {
        Self { ordered: false }
    }

    /// Stop at the first failure
    pub fn ordered() -> Self {
        Self { ordered: true }
    }
}

impl Default for BulkInsertOptions {
    fn default() -> Self {
        Self::unordered()
    }
}

/// Result of a bulk insert
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkInsertOutcome {
    /// Number of records the store actually wrote
    pub inserted: usize,
    /// Records the store refused
    pub failures: Vec<WriteFailure>,
}

impl BulkInsertOutcome {
    /// Check if every record was written
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Record store trait for ingestion backends
///
/// This trait defines the collaborator interface of the ingestion pipeline.
/// All operations are async; backends that are synchronous underneath
/// (DuckDB, memory) simply complete immediately.
#[async_trait(?Send)]
pub trait RecordStore: Send + Sync {
    /// Initialize storage (run migrations)
    ///
    /// Creates all required tables and indexes if they don't exist.
    async fn initialize(&self) -> DatabaseResult<()>;

    /// Load every natural key present in a collection
    ///
    /// Must be a single bulk read, not one lookup per key.
    async fn find_keys(&self, collection: &Collection) -> DatabaseResult<KeySet>;

    /// Insert records into a collection
    ///
    /// # Arguments
    /// * `collection` - Target collection and its key field
    /// * `records` - Records to write
    /// * `options` - Ordering semantics
    ///
    /// # Returns
    /// The inserted count and any per-record failures. With
    /// `options.ordered == false` a per-record failure never aborts the call.
    /// An `Err` means the call as a whole could not be carried out.
    async fn bulk_insert(
        &self,
        collection: &Collection,
        records: &[Record],
        options: BulkInsertOptions,
    ) -> DatabaseResult<BulkInsertOutcome>;

    /// Count records stored in a collection
    async fn count(&self, collection: &Collection) -> DatabaseResult<u64>;

    /// Check if the store is healthy and accessible
    async fn health_check(&self) -> DatabaseResult<bool>;

    /// Get the backend type name ("memory", "duckdb" or "postgres")
    fn backend_type(&self) -> &'static str;

    /// Close the store
    async fn close(&self) -> DatabaseResult<()>;
}

/// Boxed stores, for backends chosen at runtime
#[async_trait(?Send)]
impl<T: RecordStore + ?Sized> RecordStore for Box<T> {
    async fn initialize(&self) -> DatabaseResult<()> {
        (**self).initialize().await
    }

    async fn find_keys(&self, collection: &Collection) -> DatabaseResult<KeySet> {
        (**self).find_keys(collection).await
    }

    async fn bulk_insert(
        &self,
        collection: &Collection,
        records: &[Record],
        options: BulkInsertOptions,
    ) -> DatabaseResult<BulkInsertOutcome> {
        (**self).bulk_insert(collection, records, options).await
    }

    async fn count(&self, collection: &Collection) -> DatabaseResult<u64> {
        (**self).count(collection).await
    }

    async fn health_check(&self) -> DatabaseResult<bool> {
        (**self).health_check().await
    }

    fn backend_type(&self) -> &'static str {
        (**self).backend_type()
    }

    async fn close(&self) -> DatabaseResult<()> {
        (**self).close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_insert_options_default_unordered() {
        assert!(!BulkInsertOptions::default().ordered);
        assert!(BulkInsertOptions::ordered().ordered);
    }

    #[test]
    fn test_collection_key_of() {
        let leads = Collection::new("leads", "phoneNumber");
        let record = Record::new().with("phoneNumber", " 555 ");
        assert_eq!(leads.key_of(&record), Some("555".to_string()));
    }

    #[tokio::test]
    async fn test_boxed_store_delegates() {
        let store: Box<dyn RecordStore> = Box::new(MemoryStore::new());
        let leads = Collection::new("leads", "phoneNumber");
        store
            .bulk_insert(
                &leads,
                &[Record::new().with("phoneNumber", "1")],
                BulkInsertOptions::unordered(),
            )
            .await
            .unwrap();
        assert_eq!(store.backend_type(), "memory");
        assert_eq!(store.count(&leads).await.unwrap(), 1);
    }

    #[test]
    fn test_outcome_complete() {
        let mut outcome = BulkInsertOutcome::default();
        assert!(outcome.is_complete());
        outcome.failures.push(WriteFailure::other("1", "x"));
        assert!(!outcome.is_complete());
    }
}
