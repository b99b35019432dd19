//! Validation functionality
//!
//! Provides fail-fast checks that run before an ingestion run touches the
//! store:
//! - Input validation (non-empty payload, required fields on the first record)
//! - Setting validation (field names, collection names, batch size)

pub mod input;

pub use input::{
    ValidationError, ValidationResult, validate_batch_size, validate_collection_name,
    validate_field_name, validate_input,
};
