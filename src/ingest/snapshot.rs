//! Key snapshot loading

use crate::database::{Collection, RecordStore};
use crate::models::KeySet;

use super::error::{IngestError, IngestResult};

/// Load every natural key already present in `collection`
///
/// One bulk read per run. A failed read is fatal: the run must not write
/// anything when it cannot tell which keys are taken.
pub async fn load_key_snapshot<S>(store: &S, collection: &Collection) -> IngestResult<KeySet>
where
    S: RecordStore + ?Sized,
{
    let keys = store.find_keys(collection).await.map_err(|e| {
        tracing::warn!(collection = %collection.name, error = %e, "Key snapshot failed");
        IngestError::StoreRead(e)
    })?;

    tracing::info!(
        collection = %collection.name,
        backend = store.backend_type(),
        keys = keys.len(),
        "Loaded key snapshot"
    );

    Ok(keys)
}
