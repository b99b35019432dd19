//! Database management CLI commands

use std::path::PathBuf;

use super::{load_initialized_config, open_store, runtime};
use crate::cli::error::CliError;
use crate::database::Collection;
use crate::database::config::{CONFIG_FILENAME, DatabaseBackendType, DatabaseConfig};

/// `db init` arguments
#[derive(Debug, Clone)]
pub struct DbInitArgs {
    /// Workspace directory holding the config file
    pub workspace: PathBuf,
    /// Backend name ("duckdb" or "postgres")
    pub backend: String,
    /// PostgreSQL connection string
    pub connection_string: Option<String>,
}

/// `db status` arguments
#[derive(Debug, Clone)]
pub struct DbStatusArgs {
    /// Workspace directory holding the config file
    pub workspace: PathBuf,
}

/// Write the config file and create the schema
pub fn handle_db_init(args: &DbInitArgs) -> Result<(), CliError> {
    let backend: DatabaseBackendType = args
        .backend
        .parse()
        .map_err(|e: String| CliError::InvalidArgument(e))?;

    let config = match backend {
        DatabaseBackendType::DuckDB => DatabaseConfig::new(),
        DatabaseBackendType::Postgres => {
            let conn_str = args.connection_string.clone().ok_or_else(|| {
                CliError::InvalidArgument(
                    "--connection-string is required for the postgres backend".to_string(),
                )
            })?;
            DatabaseConfig::postgres(conn_str)
        }
    };

    if !args.workspace.exists() {
        return Err(CliError::FileNotFound(args.workspace.clone()));
    }

    let store = open_store(&config, &args.workspace)?;
    runtime()?.block_on(async {
        store
            .initialize()
            .await
            .map_err(|e| CliError::DatabaseError(format!("Failed to initialize: {}", e)))
    })?;

    config
        .save(&args.workspace)
        .map_err(|e| CliError::IoError(format!("Failed to save config: {}", e)))?;

    println!("Initialized {} database", store.backend_type());
    if backend == DatabaseBackendType::DuckDB {
        println!(
            "  Database: {}",
            config.get_duckdb_path(&args.workspace).display()
        );
    }
    println!(
        "  Config:   {}",
        args.workspace.join(CONFIG_FILENAME).display()
    );

    Ok(())
}

/// Print backend, health and record count
pub fn handle_db_status(args: &DbStatusArgs) -> Result<(), CliError> {
    let config = load_initialized_config(&args.workspace)?;
    let store = open_store(&config, &args.workspace)?;
    let collection = Collection::new(
        config.ingest.collection.as_str(),
        config.ingest.key_field.as_str(),
    );

    runtime()?.block_on(async {
        let healthy = store.health_check().await.unwrap_or(false);

        println!("Backend:    {}", store.backend_type());
        println!("Healthy:    {}", if healthy { "yes" } else { "no" });

        if healthy {
            let count = store
                .count(&collection)
                .await
                .map_err(|e| CliError::DatabaseError(format!("Count failed: {}", e)))?;
            println!("Collection: {} ({} records)", collection.name, count);
        }

        Ok(())
    })
}
