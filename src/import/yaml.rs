//! YAML record parsing

use std::path::Path;

use serde_json::Value;

use super::{LoadError, into_records};
use crate::models::Record;

/// Parse a YAML document holding one mapping or a sequence of mappings
pub fn parse_yaml_str(content: &str, path: &Path) -> Result<Vec<Record>, LoadError> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let value: Value = serde_yaml::from_str(content).map_err(|e| LoadError::YamlParse {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    match value {
        Value::Array(items) => into_records(items, path),
        Value::Null => Ok(Vec::new()),
        other => into_records(vec![other], path),
    }
}
