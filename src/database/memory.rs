//! In-memory record store
//!
//! Holds collections in a process-local map and enforces the same unique
//! index as the SQL backends. Supports failure injection so the pipeline's
//! error paths can be exercised without a database.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::{
    BulkInsertOptions, BulkInsertOutcome, Collection, DatabaseError, DatabaseResult, RecordStore,
};
use crate::models::{KeySet, Record, WriteFailure};

#[derive(Default)]
struct MemoryState {
    collections: HashMap<String, HashMap<String, Record>>,
    rejected_keys: HashSet<String>,
    fail_reads: bool,
    fail_writes: bool,
    bulk_insert_calls: usize,
}

/// In-memory record store
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a collection, bypassing the unique index check
    pub fn seed(&self, collection: &Collection, records: Vec<Record>) -> DatabaseResult<()> {
        let mut state = self.lock()?;
        let docs = state
            .collections
            .entry(collection.name.clone())
            .or_default();
        for record in records {
            let key = collection.key_of(&record).ok_or_else(|| {
                DatabaseError::InvalidInput(format!(
                    "seed record lacks '{}'",
                    collection.key_field
                ))
            })?;
            docs.insert(key, record);
        }
        Ok(())
    }

    /// Make every subsequent key snapshot fail
    pub fn fail_reads(&self, fail: bool) -> DatabaseResult<()> {
        self.lock()?.fail_reads = fail;
        Ok(())
    }

    /// Make every subsequent bulk insert fail as a whole
    pub fn fail_writes(&self, fail: bool) -> DatabaseResult<()> {
        self.lock()?.fail_writes = fail;
        Ok(())
    }

    /// Make inserts of this natural key fail with a non-duplicate error
    pub fn reject_key(&self, key: impl Into<String>) -> DatabaseResult<()> {
        self.lock()?.rejected_keys.insert(key.into());
        Ok(())
    }

    /// Fetch a stored record by natural key
    pub fn get(&self, collection: &Collection, key: &str) -> DatabaseResult<Option<Record>> {
        Ok(self
            .lock()?
            .collections
            .get(&collection.name)
            .and_then(|docs| docs.get(key))
            .cloned())
    }

    /// Number of bulk insert calls received so far
    pub fn bulk_insert_calls(&self) -> DatabaseResult<usize> {
        Ok(self.lock()?.bulk_insert_calls)
    }

    fn lock(&self) -> DatabaseResult<std::sync::MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|e| DatabaseError::ConnectionFailed(format!("Lock error: {}", e)))
    }
}

#[async_trait(?Send)]
impl RecordStore for MemoryStore {
    async fn initialize(&self) -> DatabaseResult<()> {
        Ok(())
    }

    async fn find_keys(&self, collection: &Collection) -> DatabaseResult<KeySet> {
        let state = self.lock()?;
        if state.fail_reads {
            return Err(DatabaseError::QueryFailed(format!(
                "Injected read failure on collection {}",
                collection.name
            )));
        }

        Ok(state
            .collections
            .get(&collection.name)
            .map(|docs| docs.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn bulk_insert(
        &self,
        collection: &Collection,
        records: &[Record],
        options: BulkInsertOptions,
    ) -> DatabaseResult<BulkInsertOutcome> {
        let mut guard = self.lock()?;
        let state = &mut *guard;
        state.bulk_insert_calls += 1;
        if state.fail_writes {
            return Err(DatabaseError::ConnectionFailed(
                "Injected write failure".to_string(),
            ));
        }

        let docs = state
            .collections
            .entry(collection.name.clone())
            .or_default();
        let mut outcome = BulkInsertOutcome::default();

        for record in records {
            let failure = match collection.key_of(record) {
                None => Some(WriteFailure::other(
                    "",
                    format!("record lacks natural key '{}'", collection.key_field),
                )),
                Some(key) if state.rejected_keys.contains(&key) => Some(WriteFailure::other(
                    key,
                    "Injected write failure",
                )),
                Some(key) if docs.contains_key(&key) => Some(WriteFailure::duplicate_key(
                    key.clone(),
                    format!("duplicate key {} in collection {}", key, collection.name),
                )),
                Some(key) => {
                    docs.insert(key, record.clone());
                    outcome.inserted += 1;
                    None
                }
            };

            if let Some(failure) = failure {
                outcome.failures.push(failure);
                if options.ordered {
                    break;
                }
            }
        }

        Ok(outcome)
    }

    async fn count(&self, collection: &Collection) -> DatabaseResult<u64> {
        Ok(self
            .lock()?
            .collections
            .get(&collection.name)
            .map(|docs| docs.len() as u64)
            .unwrap_or(0))
    }

    async fn health_check(&self) -> DatabaseResult<bool> {
        Ok(self.lock().is_ok())
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }

    async fn close(&self) -> DatabaseResult<()> {
        Ok(())
    }
}
