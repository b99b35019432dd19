//! CLI binary entry point for crm-ingest

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use crm_ingest::cli::commands::db::{DbInitArgs, DbStatusArgs, handle_db_init, handle_db_status};
#[cfg(feature = "cli")]
use crm_ingest::cli::commands::ingest::{IngestArgs, handle_ingest};
#[cfg(feature = "cli")]
use crm_ingest::cli::commands::keys::{KeysArgs, handle_keys};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "crm-ingest")]
#[command(about = "Deduplicating bulk record ingestion for CRM collections")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Database management commands
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },

    /// Ingest records from JSON, JSONL or YAML files
    Ingest {
        /// Input files, or glob patterns relative to the workspace
        #[arg(required = true)]
        inputs: Vec<String>,
        /// Workspace directory
        #[arg(short, long, default_value = ".")]
        workspace: PathBuf,
        /// Target collection (overrides config)
        #[arg(short, long)]
        collection: Option<String>,
        /// Natural key field (overrides config)
        #[arg(long)]
        key_field: Option<String>,
        /// Field shown next to skipped duplicates (overrides config)
        #[arg(long)]
        display_field: Option<String>,
        /// Tag stamped onto accepted records (defaults to the run id)
        #[arg(short, long)]
        tag: Option<String>,
        /// Records per batch (overrides config)
        #[arg(short, long)]
        batch_size: Option<usize>,
        /// Field the first record must carry (repeatable, overrides config)
        #[arg(long = "required-field")]
        required_fields: Vec<String>,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show the natural keys stored in a collection
    Keys {
        /// Workspace directory
        #[arg(short, long, default_value = ".")]
        workspace: PathBuf,
        /// Collection (overrides config)
        #[arg(short, long)]
        collection: Option<String>,
        /// Print every key instead of the count
        #[arg(short, long)]
        list: bool,
    },
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum DbCommands {
    /// Write the config file and create the schema
    Init {
        /// Workspace directory
        #[arg(default_value = ".")]
        workspace: PathBuf,
        /// Database backend: duckdb or postgres
        #[arg(short, long, default_value = "duckdb")]
        backend: String,
        /// PostgreSQL connection string (postgres backend only)
        #[arg(long)]
        connection_string: Option<String>,
    },

    /// Show backend health and record count
    Status {
        /// Workspace directory
        #[arg(default_value = ".")]
        workspace: PathBuf,
    },
}

#[cfg(feature = "cli")]
fn main() {
    // Logs go to stderr; stdout carries the report
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Db { command } => match command {
            DbCommands::Init {
                workspace,
                backend,
                connection_string,
            } => {
                let args = DbInitArgs {
                    workspace,
                    backend,
                    connection_string,
                };
                handle_db_init(&args)
            }
            DbCommands::Status { workspace } => {
                let args = DbStatusArgs { workspace };
                handle_db_status(&args)
            }
        },

        Commands::Ingest {
            inputs,
            workspace,
            collection,
            key_field,
            display_field,
            tag,
            batch_size,
            required_fields,
            format,
            quiet,
        } => {
            let args = IngestArgs {
                inputs,
                workspace,
                collection,
                key_field,
                display_field,
                tag,
                batch_size,
                required_fields,
                format,
                quiet,
            };
            handle_ingest(&args)
        }

        Commands::Keys {
            workspace,
            collection,
            list,
        } => {
            let args = KeysArgs {
                workspace,
                collection,
                list,
            };
            handle_keys(&args)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature is not enabled. Build with --features cli");
    std::process::exit(1);
}
