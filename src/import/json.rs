//! JSON and JSONL record parsing

use std::path::Path;

use serde_json::Value;

use super::{LoadError, into_records};
use crate::models::Record;

/// Parse a JSON document holding one object or an array of objects
pub fn parse_json_str(content: &str, path: &Path) -> Result<Vec<Record>, LoadError> {
    let value: Value = serde_json::from_str(content).map_err(|e| LoadError::JsonParse {
        path: path.to_path_buf(),
        record: 0,
        error: e.to_string(),
    })?;

    match value {
        Value::Array(items) => into_records(items, path),
        other => into_records(vec![other], path),
    }
}

/// Parse newline-delimited JSON, skipping blank lines
///
/// `record` in a parse error is the 0-based line index.
pub fn parse_jsonl_str(content: &str, path: &Path) -> Result<Vec<Record>, LoadError> {
    let mut records = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let trimmed = line.trim();

        // Skip empty lines
        if trimmed.is_empty() {
            continue;
        }

        let value: Value = serde_json::from_str(trimmed).map_err(|e| LoadError::JsonParse {
            path: path.to_path_buf(),
            record: index,
            error: e.to_string(),
        })?;

        let record = Record::from_value(value).ok_or_else(|| LoadError::NotAnObject {
            path: path.to_path_buf(),
            record: index,
        })?;
        records.push(record);
    }

    Ok(records)
}
