//! Ingestion error types

use serde::{Deserialize, Serialize};

use crate::database::DatabaseError;
use crate::validation::ValidationError;

/// Fatal errors that abort an ingestion run
///
/// Both variants are raised before the first write, so a failed run never
/// leaves partial data behind. Everything after the snapshot is absorbed
/// into the report instead.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The payload was rejected before any store access
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// The key snapshot could not be read
    #[error("Failed to load existing keys: {0}")]
    StoreRead(#[source] DatabaseError),
}

/// Result type for ingestion operations
pub type IngestResult<T> = Result<T, IngestError>;

/// Why a record was left out of a batch's write set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RejectReason {
    /// Natural key already in the store or claimed earlier in the run
    Duplicate,
    /// No usable natural key
    Malformed,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::Duplicate => write!(f, "duplicate"),
            RejectReason::Malformed => write!(f, "malformed"),
        }
    }
}
