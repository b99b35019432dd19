//! CLI-specific error types

use std::path::PathBuf;
use thiserror::Error;

use crate::import::LoadError;
use crate::ingest::IngestError;

/// CLI-specific error type
#[derive(Error, Debug)]
pub enum CliError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("No files matched pattern: {0}")]
    NoFilesMatched(String),

    #[error("Load error: {0}")]
    LoadError(#[from] LoadError),

    #[error("Ingestion failed: {0}")]
    IngestError(#[from] IngestError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
