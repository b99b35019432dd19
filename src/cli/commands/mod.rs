//! CLI command implementations

pub mod db;
pub mod ingest;
pub mod keys;

use std::path::Path;

use crate::cli::error::CliError;
use crate::database::{DatabaseError, RecordStore};
use crate::database::config::{DatabaseBackendType, DatabaseConfig};

/// Create the runtime the command handlers block on
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::IoError(format!("Failed to create runtime: {}", e)))
}

/// Load the workspace configuration, requiring `db init` to have run
pub(crate) fn load_initialized_config(workspace: &Path) -> Result<DatabaseConfig, CliError> {
    let config = DatabaseConfig::load(workspace)
        .map_err(|e| CliError::IoError(format!("Failed to load config: {}", e)))?;

    if !DatabaseConfig::is_initialized(workspace) {
        return Err(CliError::DatabaseError(
            DatabaseError::NotInitialized.to_string(),
        ));
    }

    Ok(config)
}

/// Open the record store the configuration points at
pub(crate) fn open_store(
    config: &DatabaseConfig,
    workspace: &Path,
) -> Result<Box<dyn RecordStore>, CliError> {
    match config.database.backend {
        DatabaseBackendType::DuckDB => {
            #[cfg(feature = "duckdb-backend")]
            {
                use crate::database::DuckDBBackend;

                let db_path = config.get_duckdb_path(workspace);
                let backend = DuckDBBackend::new(&db_path)
                    .map_err(|e| CliError::DatabaseError(format!("Failed to open database: {}", e)))?;
                Ok(Box::new(backend))
            }
            #[cfg(not(feature = "duckdb-backend"))]
            {
                let _ = workspace;
                Err(CliError::InvalidArgument(
                    "DuckDB backend not enabled. Build with --features duckdb-backend".to_string(),
                ))
            }
        }
        DatabaseBackendType::Postgres => {
            #[cfg(feature = "postgres-backend")]
            {
                use crate::database::PostgresBackend;

                let conn_str = config.get_postgres_connection_string().ok_or_else(|| {
                    CliError::InvalidArgument(
                        "PostgreSQL connection string not configured".to_string(),
                    )
                })?;
                let backend = PostgresBackend::new(conn_str, config.postgres.pool_size)
                    .map_err(|e| CliError::DatabaseError(format!("Failed to connect: {}", e)))?;
                Ok(Box::new(backend))
            }
            #[cfg(not(feature = "postgres-backend"))]
            {
                Err(CliError::InvalidArgument(
                    "PostgreSQL backend not enabled. Build with --features postgres-backend"
                        .to_string(),
                ))
            }
        }
    }
}
