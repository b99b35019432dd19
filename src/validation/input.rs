//! Input validation for ingestion runs.
//!
//! These checks run before the pipeline touches the store. A run that fails
//! any of them is rejected as a whole; no partial run is attempted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Record;

/// Maximum length for field names
pub const MAX_FIELD_NAME_LENGTH: usize = 255;

/// Maximum length for collection names
pub const MAX_COLLECTION_NAME_LENGTH: usize = 63;

/// Errors that can occur during input validation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ValidationError {
    /// The payload contained no records
    #[error("Input cannot be empty: no records to ingest")]
    EmptyInput,

    /// The first record lacks one or more required fields
    #[error("First record is missing required fields: {}", .fields.join(", "))]
    MissingRequiredFields { fields: Vec<String> },

    /// Input is empty when a value is required
    #[error("{0} cannot be empty")]
    Empty(&'static str),

    /// Input exceeds maximum allowed length
    #[error("{field} exceeds maximum length (max: {max}, got: {actual})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    /// Input contains invalid characters
    #[error("{field} contains invalid characters: {reason}")]
    InvalidCharacters { field: &'static str, reason: String },

    /// A numeric setting is out of range
    #[error("{field} must be at least {min} (got {actual})")]
    OutOfRange {
        field: &'static str,
        min: usize,
        actual: usize,
    },
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate an inbound record set before ingestion.
///
/// # Rules
///
/// - The sequence must not be empty
/// - The first record must contain every field in `required_fields`
///
/// Only the first record is checked; later records with gaps are handled by
/// the pipeline (a missing natural key drops the record as malformed).
pub fn validate_input(records: &[Record], required_fields: &[String]) -> ValidationResult<()> {
    let Some(first) = records.first() else {
        return Err(ValidationError::EmptyInput);
    };

    let missing: Vec<String> = required_fields
        .iter()
        .filter(|field| !first.contains_field(field))
        .cloned()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingRequiredFields { fields: missing })
    }
}

/// Validate a record field name (key field, display field, tag field).
///
/// # Rules
///
/// - Must not be empty
/// - Must not exceed 255 characters
/// - Must not contain whitespace or control characters
pub fn validate_field_name(label: &'static str, name: &str) -> ValidationResult<()> {
    if name.is_empty() {
        return Err(ValidationError::Empty(label));
    }

    if name.len() > MAX_FIELD_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: label,
            max: MAX_FIELD_NAME_LENGTH,
            actual: name.len(),
        });
    }

    if let Some(c) = name.chars().find(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::InvalidCharacters {
            field: label,
            reason: format!("invalid character: {:?}", c),
        });
    }

    Ok(())
}

/// Validate a collection name.
///
/// # Rules
///
/// - Must not be empty
/// - Must not exceed 63 characters
/// - May contain ASCII letters, digits, underscores, and hyphens
pub fn validate_collection_name(name: &str) -> ValidationResult<()> {
    if name.is_empty() {
        return Err(ValidationError::Empty("collection name"));
    }

    if name.len() > MAX_COLLECTION_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "collection name",
            max: MAX_COLLECTION_NAME_LENGTH,
            actual: name.len(),
        });
    }

    for c in name.chars() {
        if !c.is_ascii_alphanumeric() && c != '_' && c != '-' {
            return Err(ValidationError::InvalidCharacters {
                field: "collection name",
                reason: format!("invalid character: '{}'", c),
            });
        }
    }

    Ok(())
}

/// Validate a batch size (must be at least 1).
pub fn validate_batch_size(batch_size: usize) -> ValidationResult<()> {
    if batch_size == 0 {
        return Err(ValidationError::OutOfRange {
            field: "batch size",
            min: 1,
            actual: batch_size,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required() -> Vec<String> {
        vec!["name".to_string(), "phoneNumber".to_string()]
    }

    #[test]
    fn test_empty_input_rejected() {
        assert_eq!(
            validate_input(&[], &required()),
            Err(ValidationError::EmptyInput)
        );
    }

    #[test]
    fn test_first_record_missing_fields() {
        let records = vec![Record::new().with("name", "x")];
        let err = validate_input(&records, &required()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingRequiredFields {
                fields: vec!["phoneNumber".to_string()]
            }
        );
        assert!(err.to_string().contains("phoneNumber"));
    }

    #[test]
    fn test_only_first_record_checked() {
        let records = vec![
            Record::new().with("name", "x").with("phoneNumber", "1"),
            Record::new(),
        ];
        assert!(validate_input(&records, &required()).is_ok());
    }

    #[test]
    fn test_null_field_counts_as_present() {
        let records = vec![
            Record::new()
                .with("name", "x")
                .with("phoneNumber", serde_json::Value::Null),
        ];
        assert!(validate_input(&records, &required()).is_ok());
    }

    #[test]
    fn test_validate_field_name() {
        assert!(validate_field_name("key field", "phoneNumber").is_ok());
        assert!(validate_field_name("key field", "").is_err());
        assert!(validate_field_name("key field", "phone number").is_err());
        assert!(validate_field_name("key field", &"a".repeat(256)).is_err());
    }

    #[test]
    fn test_validate_collection_name() {
        assert!(validate_collection_name("leads").is_ok());
        assert!(validate_collection_name("crm-leads_2024").is_ok());
        assert!(validate_collection_name("").is_err());
        assert!(validate_collection_name("leads; drop").is_err());
    }

    #[test]
    fn test_validate_batch_size() {
        assert!(validate_batch_size(1).is_ok());
        assert!(matches!(
            validate_batch_size(0),
            Err(ValidationError::OutOfRange { .. })
        ));
    }
}
