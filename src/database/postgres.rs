//! PostgreSQL database backend implementation
//!
//! Provides a PostgreSQL record store for server deployments.
//! Uses connection pooling via deadpool-postgres.

use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use tokio_postgres::error::SqlState;

use super::schema::{DatabaseSchema, SCHEMA_VERSION, record_sql};
use super::{
    BulkInsertOptions, BulkInsertOutcome, Collection, DatabaseError, DatabaseResult, RecordStore,
};
use crate::models::{KeySet, Record, WriteFailure};

const INSERT_RECORD_SQL: &str = "INSERT INTO ingested_records (collection, natural_key, document) VALUES ($1, $2, $3::text::json)";

/// PostgreSQL database backend
pub struct PostgresBackend {
    /// Connection string
    connection_string: String,
    /// Connection pool
    pool: Pool,
}

impl PostgresBackend {
    /// Create a new PostgreSQL backend
    ///
    /// # Arguments
    /// * `connection_string` - PostgreSQL connection string
    /// * `pool_size` - Maximum number of pooled connections
    ///
    /// Connections are opened lazily; call `health_check` to verify the
    /// server is reachable.
    pub fn new(connection_string: &str, pool_size: usize) -> DatabaseResult<Self> {
        let mut config = Config::new();
        config.url = Some(connection_string.to_string());
        config.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        config.pool = Some(PoolConfig::new(pool_size.max(1)));

        let pool = config
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| {
                DatabaseError::ConnectionFailed(format!("Failed to create PostgreSQL pool: {}", e))
            })?;

        Ok(Self {
            connection_string: connection_string.to_string(),
            pool,
        })
    }

    /// Get the connection string (masked for security)
    pub fn connection_string_masked(&self) -> String {
        // Mask password in connection string
        if let Some(at_pos) = self.connection_string.find('@')
            && let Some(colon_pos) = self.connection_string[..at_pos].rfind(':')
        {
            let prefix = &self.connection_string[..colon_pos + 1];
            let suffix = &self.connection_string[at_pos..];
            return format!("{}****{}", prefix, suffix);
        }
        self.connection_string.clone()
    }

    async fn client(&self) -> DatabaseResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(|e| {
            DatabaseError::ConnectionFailed(format!("Failed to connect to PostgreSQL: {}", e))
        })
    }
}

#[async_trait(?Send)]
impl RecordStore for PostgresBackend {
    async fn initialize(&self) -> DatabaseResult<()> {
        let client = self.client().await?;

        // Create tables
        client
            .batch_execute(DatabaseSchema::create_tables_sql())
            .await
            .map_err(|e| {
                DatabaseError::MigrationFailed(format!("Failed to create tables: {}", e))
            })?;

        // Create indexes
        client
            .batch_execute(DatabaseSchema::create_indexes_sql())
            .await
            .map_err(|e| {
                DatabaseError::MigrationFailed(format!("Failed to create indexes: {}", e))
            })?;

        // Record schema version
        client
            .execute(DatabaseSchema::record_schema_version_sql(), &[&SCHEMA_VERSION])
            .await
            .map_err(|e| {
                DatabaseError::MigrationFailed(format!("Failed to record schema version: {}", e))
            })?;

        Ok(())
    }

    async fn find_keys(&self, collection: &Collection) -> DatabaseResult<KeySet> {
        let client = self.client().await?;

        let rows = client
            .query(record_sql::SELECT_KEYS, &[&collection.name])
            .await
            .map_err(|e| DatabaseError::QueryFailed(format!("Query failed: {}", e)))?;

        rows.iter()
            .map(|row| {
                row.try_get::<_, String>(0)
                    .map_err(|e| DatabaseError::QueryFailed(format!("Row fetch error: {}", e)))
            })
            .collect()
    }

    async fn bulk_insert(
        &self,
        collection: &Collection,
        records: &[Record],
        options: BulkInsertOptions,
    ) -> DatabaseResult<BulkInsertOutcome> {
        let client = self.client().await?;

        let stmt = client
            .prepare_cached(INSERT_RECORD_SQL)
            .await
            .map_err(|e| DatabaseError::QueryFailed(format!("Prepare failed: {}", e)))?;

        let mut outcome = BulkInsertOutcome::default();

        // Autocommit per row: a unique violation only rolls back that row.
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

                    match client
                        .execute(&stmt, &[&collection.name, &key, &document])
                        .await
                    {
                        Ok(_) => {
                            outcome.inserted += 1;
                            None
                        }
                        Err(e) if e.code() == Some(&SqlState::UNIQUE_VIOLATION) => {
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
        let client = self.client().await?;
        let row = client
            .query_one(record_sql::COUNT, &[&collection.name])
            .await
            .map_err(|e| DatabaseError::QueryFailed(format!("Count failed: {}", e)))?;
        let count: i64 = row
            .try_get(0)
            .map_err(|e| DatabaseError::QueryFailed(format!("Row fetch error: {}", e)))?;
        Ok(count.max(0) as u64)
    }

    async fn health_check(&self) -> DatabaseResult<bool> {
        let client = self.client().await?;
        let row = client
            .query_one("SELECT 1", &[])
            .await
            .map_err(|e| DatabaseError::QueryFailed(format!("Health check failed: {}", e)))?;
        let healthy: i32 = row
            .try_get(0)
            .map_err(|e| DatabaseError::QueryFailed(format!("Row fetch error: {}", e)))?;
        Ok(healthy == 1)
    }

    fn backend_type(&self) -> &'static str {
        "postgres"
    }

    async fn close(&self) -> DatabaseResult<()> {
        self.pool.close();
        Ok(())
    }
}
