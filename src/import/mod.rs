//! Record loading
//!
//! Reads externally-sourced records from disk before an ingestion run:
//! - JSON (a single object or an array of objects)
//! - JSONL / NDJSON (one object per line)
//! - YAML (a single mapping or a sequence of mappings)
//!
//! Every loaded item must be an object; anything else fails the whole load.

pub mod json;
pub mod yaml;

use std::fs;
use std::path::{Path, PathBuf};

use crate::models::Record;

pub use json::{parse_json_str, parse_jsonl_str};
pub use yaml::parse_yaml_str;

/// Error while loading records
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error reading {path}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse JSON in {path} at record {record}: {error}")]
    JsonParse {
        path: PathBuf,
        record: usize,
        error: String,
    },

    #[error("Failed to parse YAML in {path}: {error}")]
    YamlParse { path: PathBuf, error: String },

    #[error("Record {record} in {path} is not an object")]
    NotAnObject { path: PathBuf, record: usize },

    #[error("Invalid glob pattern: {0}")]
    InvalidPattern(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
}

/// Supported payload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    Json,
    JsonLines,
    Yaml,
}

impl RecordFormat {
    /// Detect the format from a file extension
    ///
    /// Files without a known extension are sniffed: an array, or a single
    /// document that parses whole, means JSON; anything else is JSONL.
    pub fn detect(path: &Path, content: &str) -> Result<Self, LoadError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "json" => Ok(Self::Json),
            "jsonl" | "ndjson" => Ok(Self::JsonLines),
            "yaml" | "yml" => Ok(Self::Yaml),
            "" | "txt" => {
                let trimmed = content.trim_start();
                if trimmed.starts_with('[')
                    || (trimmed.starts_with('{')
                        && serde_json::from_str::<serde_json::Value>(trimmed).is_ok())
                {
                    Ok(Self::Json)
                } else {
                    Ok(Self::JsonLines)
                }
            }
            other => Err(LoadError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Load every record from a file, in file order
pub fn load_records(path: &Path) -> Result<Vec<Record>, LoadError> {
    let content = fs::read_to_string(path).map_err(|e| LoadError::Io {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    let records = match RecordFormat::detect(path, &content)? {
        RecordFormat::Json => parse_json_str(&content, path)?,
        RecordFormat::JsonLines => parse_jsonl_str(&content, path)?,
        RecordFormat::Yaml => parse_yaml_str(&content, path)?,
    };

    tracing::debug!(path = %path.display(), records = records.len(), "Loaded records");
    Ok(records)
}

/// Discover files matching a glob pattern under a base directory
///
/// Absolute patterns and patterns starting with `.` are used as-is.
/// Results are sorted by path.
pub fn discover_files(base_path: &Path, pattern: &str) -> Result<Vec<PathBuf>, LoadError> {
    let full_pattern = if pattern.starts_with('/') || pattern.starts_with('.') {
        pattern.to_string()
    } else {
        format!("{}/{}", base_path.display(), pattern)
    };

    let entries = glob::glob(&full_pattern)
        .map_err(|e| LoadError::InvalidPattern(format!("{}: {}", pattern, e)))?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => {
                // Log but continue
                tracing::warn!("Error accessing path: {}", e);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Load and concatenate records from several files, in the given order
pub fn load_all(paths: &[PathBuf]) -> Result<Vec<Record>, LoadError> {
    let mut records = Vec::new();
    for path in paths {
        records.extend(load_records(path)?);
    }
    Ok(records)
}

/// Convert parsed values into records, rejecting non-objects
pub(crate) fn into_records(
    values: Vec<serde_json::Value>,
    path: &Path,
) -> Result<Vec<Record>, LoadError> {
    values
        .into_iter()
        .enumerate()
        .map(|(record, value)| {
            Record::from_value(value).ok_or_else(|| LoadError::NotAnObject {
                path: path.to_path_buf(),
                record,
            })
        })
        .collect()
}
