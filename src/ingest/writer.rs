//! Batch writing

use crate::database::{BulkInsertOptions, Collection, RecordStore};
use crate::models::{Record, WriteFailure};

/// Outcome of writing one batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchWrite {
    /// Records the store actually wrote
    pub inserted: usize,
    /// Records that were attempted but not written
    pub failed: usize,
    /// Failure details reported for this batch
    pub failures: Vec<WriteFailure>,
}

/// Persists the write set of each batch
///
/// Uses unordered bulk inserts so one rejected record never blocks its
/// siblings. Store errors are absorbed into [`BatchWrite`]; the writer never
/// fails the run.
pub struct BatchWriter<'a, S: RecordStore + ?Sized> {
    store: &'a S,
    collection: &'a Collection,
    tag_field: &'a str,
    tag: &'a str,
}

impl<'a, S: RecordStore + ?Sized> BatchWriter<'a, S> {
    /// Create a writer for one run
    pub fn new(store: &'a S, collection: &'a Collection, tag_field: &'a str, tag: &'a str) -> Self {
        Self {
            store,
            collection,
            tag_field,
            tag,
        }
    }

    /// Stamp the run tag onto `records` and insert them in one call
    ///
    /// `keys` are the natural keys of `records`, index-aligned. When the
    /// whole call fails, every record becomes a failure of kind `other`.
    pub async fn write(&self, mut records: Vec<Record>, keys: &[String]) -> BatchWrite {
        if records.is_empty() {
            return BatchWrite::default();
        }

        for record in &mut records {
            record.set_tag(self.tag_field, self.tag);
        }

        let attempted = records.len();
        match self
            .store
            .bulk_insert(self.collection, &records, BulkInsertOptions::unordered())
            .await
        {
            Ok(outcome) => {
                for failure in &outcome.failures {
                    tracing::warn!(
                        collection = %self.collection.name,
                        natural_key = %failure.natural_key,
                        kind = ?failure.kind,
                        "Record rejected by store: {}",
                        failure.message
                    );
                }

                let inserted = outcome.inserted.min(attempted);
                BatchWrite {
                    inserted,
                    failed: attempted - inserted,
                    failures: outcome.failures,
                }
            }
            Err(e) => {
                tracing::warn!(
                    collection = %self.collection.name,
                    records = attempted,
                    error = %e,
                    "Bulk insert failed"
                );

                let message = e.to_string();
                BatchWrite {
                    inserted: 0,
                    failed: attempted,
                    failures: keys
                        .iter()
                        .map(|key| WriteFailure::other(key.clone(), message.clone()))
                        .collect(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::models::WriteFailureKind;

    fn leads() -> Collection {
        Collection::new("leads", "phoneNumber")
    }

    fn lead(phone: &str) -> Record {
        Record::new().with("phoneNumber", phone)
    }

    fn keys(phones: &[&str]) -> Vec<String> {
        phones.iter().map(|p| p.to_string()).collect()
    }

    #[tokio::test]
    async fn test_write_stamps_tag() {
        let store = MemoryStore::new();
        let collection = leads();
        let writer = BatchWriter::new(&store, &collection, "source", "import-42");

        let result = writer.write(vec![lead("1"), lead("2")], &keys(&["1", "2"])).await;
        assert_eq!(result.inserted, 2);
        assert_eq!(result.failed, 0);

        let stored = store.get(&collection, "1").unwrap().unwrap();
        assert_eq!(
            stored.get("source"),
            Some(&serde_json::Value::String("import-42".into()))
        );
    }

    #[tokio::test]
    async fn test_empty_write_skips_store() {
        let store = MemoryStore::new();
        let collection = leads();
        let writer = BatchWriter::new(&store, &collection, "source", "t");

        let result = writer.write(Vec::new(), &[]).await;
        assert_eq!(result, BatchWrite::default());
        assert_eq!(store.bulk_insert_calls().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_block_siblings() {
        let store = MemoryStore::new();
        store.reject_key("2").unwrap();
        let collection = leads();
        let writer = BatchWriter::new(&store, &collection, "source", "t");

        let result = writer
            .write(vec![lead("1"), lead("2"), lead("3")], &keys(&["1", "2", "3"]))
            .await;
        assert_eq!(result.inserted, 2);
        assert_eq!(result.failed, 1);
        assert_eq!(result.failures[0].natural_key, "2");
        assert_eq!(result.failures[0].kind, WriteFailureKind::Other);
    }

    #[tokio::test]
    async fn test_race_surfaces_as_duplicate_key_failure() {
        let store = MemoryStore::new();
        let collection = leads();
        // Another run inserted the key after this run's snapshot
        store.seed(&collection, vec![lead("1")]).unwrap();
        let writer = BatchWriter::new(&store, &collection, "source", "t");

        let result = writer.write(vec![lead("1")], &keys(&["1"])).await;
        assert_eq!(result.inserted, 0);
        assert_eq!(result.failures[0].kind, WriteFailureKind::DuplicateKey);
    }

    #[tokio::test]
    async fn test_whole_call_error_is_absorbed() {
        let store = MemoryStore::new();
        store.fail_writes(true).unwrap();
        let collection = leads();
        let writer = BatchWriter::new(&store, &collection, "source", "t");

        let result = writer.write(vec![lead("1"), lead("2")], &keys(&["1", "2"])).await;
        assert_eq!(result.inserted, 0);
        assert_eq!(result.failed, 2);
        assert_eq!(result.failures.len(), 2);
        assert!(
            result
                .failures
                .iter()
                .all(|f| f.kind == WriteFailureKind::Other)
        );
    }
}
