//! DuckDB database backend implementation
//!
//! Provides an embedded record store using DuckDB for the native CLI.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::schema::{DatabaseSchema, SCHEMA_VERSION, record_sql};
use super::{
    BulkInsertOptions, BulkInsertOutcome, Collection, DatabaseError, DatabaseResult, RecordStore,
};
use crate::models::{KeySet, Record, WriteFailure};

const INSERT_RECORD_SQL: &str =
    "INSERT INTO ingested_records (collection, natural_key, document) VALUES ($1, $2, $3::JSON)";

/// DuckDB database backend
///
/// Supports both file-based persistence and in-memory mode.
pub struct DuckDBBackend {
    /// Path to the database file (None for in-memory)
    db_path: Option<PathBuf>,
    /// DuckDB connection (wrapped in Mutex for thread safety)
    connection: Mutex<duckdb::Connection>,
}

impl DuckDBBackend {
    /// Create a new DuckDB backend with a file-based database
    ///
    /// # Arguments
    /// * `db_path` - Path to the DuckDB database file
    pub fn new(db_path: impl AsRef<Path>) -> DatabaseResult<Self> {
        let path = db_path.as_ref().to_path_buf();
        let connection = duckdb::Connection::open(&path).map_err(|e| {
            DatabaseError::ConnectionFailed(format!("Failed to open DuckDB: {}", e))
        })?;

        Ok(Self {
            db_path: Some(path),
            connection: Mutex::new(connection),
        })
    }

    /// Create an in-memory DuckDB backend
    ///
    /// Useful for testing where persistence is not needed.
    pub fn in_memory() -> DatabaseResult<Self> {
        let connection = duckdb::Connection::open_in_memory().map_err(|e| {
            DatabaseError::ConnectionFailed(format!("Failed to create in-memory DuckDB: {}", e))
        })?;

        Ok(Self {
            db_path: None,
            connection: Mutex::new(connection),
        })
    }

    /// Get the database file path (None for in-memory)
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Check if this is an in-memory database
    pub fn is_in_memory(&self) -> bool {
        self.db_path.is_none()
    }

    /// Current schema version, if the schema has been created
    pub fn schema_version(&self) -> DatabaseResult<Option<i32>> {
        let conn = self.lock()?;
        conn.query_row(DatabaseSchema::check_schema_version_sql(), [], |row| {
            row.get::<_, Option<i32>>(0)
        })
        .map_err(|e| DatabaseError::QueryFailed(format!("Schema version check failed: {}", e)))
    }

    fn lock(&self) -> DatabaseResult<std::sync::MutexGuard<'_, duckdb::Connection>> {
        self.connection
            .lock()
            .map_err(|e| DatabaseError::ConnectionFailed(format!("Lock error: {}", e)))
    }

    /// Execute multiple SQL statements
    fn execute_batch(&self, sql: &str) -> DatabaseResult<()> {
        self.lock()?
            .execute_batch(sql)
            .map_err(|e| DatabaseError::MigrationFailed(format!("Batch execute failed: {}", e)))
    }

    /// DuckDB reports unique index violations as constraint errors
    fn is_unique_violation(error: &duckdb::Error) -> bool {
        let message = error.to_string();
        message.contains("Duplicate key") || message.contains("Constraint Error")
    }
}

#[async_trait(?Send)]
impl RecordStore for DuckDBBackend {
    async fn initialize(&self) -> DatabaseResult<()> {
        // Create tables
        self.execute_batch(DatabaseSchema::create_tables_sql())?;

        // Create indexes
        self.execute_batch(DatabaseSchema::create_indexes_sql())?;

        // Record schema version
        let conn = self.lock()?;
        conn.execute(DatabaseSchema::record_schema_version_sql(), [SCHEMA_VERSION])
            .map_err(|e| {
                DatabaseError::MigrationFailed(format!("Failed to record schema version: {}", e))
            })?;

        Ok(())
    }

    async fn find_keys(&self, collection: &Collection) -> DatabaseResult<KeySet> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(record_sql::SELECT_KEYS)
            .map_err(|e| DatabaseError::QueryFailed(format!("Prepare failed: {}", e)))?;

        let rows = stmt
            .query_map(duckdb::params![collection.name], |row| row.get::<_, String>(0))
            .map_err(|e| DatabaseError::QueryFailed(format!("Query failed: {}", e)))?;

        let mut keys = KeySet::new();
        for key in rows {
            let key =
                key.map_err(|e| DatabaseError::QueryFailed(format!("Row fetch error: {}", e)))?;
            keys.insert(key);
        }

        Ok(keys)
    }

    async fn bulk_insert(
        &self,
        collection: &Collection,
        records: &[Record],
        options: BulkInsertOptions,
    ) -> DatabaseResult<BulkInsertOutcome> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(INSERT_RECORD_SQL)
            .map_err(|e| DatabaseError::QueryFailed(format!("Prepare failed: {}", e)))?;

        let mut outcome = BulkInsertOutcome::default();

        // Each row runs in its own implicit transaction, so a rejected row
        // leaves its siblings untouched.
        for record in records {
            let failure = match collection.key_of(record) {
                None => Some(WriteFailure::other(
                    "",
                    format!("record lacks natural key '{}'", collection.key_field),
                )),
                Some(key) => {
                    let document = record
                        .to_json_string()
                        .map_err(|e| DatabaseError::SerializationError(e.to_string()))?;

                    match stmt.execute(duckdb::params![collection.name, key, document]) {
                        Ok(_) => {
                            outcome.inserted += 1;
                            None
                        }
                        Err(e) if Self::is_unique_violation(&e) => {
                            Some(WriteFailure::duplicate_key(key, e.to_string()))
                        }
                        Err(e) => Some(WriteFailure::other(key, e.to_string())),
                    }
                }
            };

            if let Some(failure) = failure {
                outcome.failures.push(failure);
                if options.ordered {
                    break;
                }
            }
        }

        Ok(outcome)
    }

    async fn count(&self, collection: &Collection) -> DatabaseResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(record_sql::COUNT, duckdb::params![collection.name], |row| row.get(0))
            .map_err(|e| DatabaseError::QueryFailed(format!("Count failed: {}", e)))?;
        Ok(count.max(0) as u64)
    }

    async fn health_check(&self) -> DatabaseResult<bool> {
        let conn = self.lock()?;
        let healthy: i32 = conn
            .query_row("SELECT 1", [], |row| row.get(0))
            .map_err(|e| DatabaseError::QueryFailed(format!("Health check failed: {}", e)))?;
        Ok(healthy == 1)
    }

    fn backend_type(&self) -> &'static str {
        "duckdb"
    }

    async fn close(&self) -> DatabaseResult<()> {
        // DuckDB connection is closed when dropped
        Ok(())
    }
}
