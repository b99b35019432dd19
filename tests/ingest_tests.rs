//! Integration tests for the ingestion pipeline

use std::sync::{Arc, Mutex};

use crm_ingest::database::{Collection, MemoryStore, RecordStore};
use crm_ingest::ingest::{IngestConfig, IngestError, IngestionPipeline, Progress};
use crm_ingest::models::{DuplicateEntry, IngestionReport, Record, WriteFailureKind};
use crm_ingest::validation::ValidationError;

fn leads() -> Collection {
    Collection::new("leads", "phoneNumber")
}

fn lead(phone: &str, name: &str) -> Record {
    Record::new()
        .with("name", name)
        .with("email", format!("{}@example.com", name.to_lowercase()))
        .with("phoneNumber", phone)
}

fn numbered(range: std::ops::Range<usize>) -> Vec<Record> {
    range
        .map(|i| lead(&format!("555-{:04}", i), &format!("Lead {}", i)))
        .collect()
}

fn config(batch_size: usize) -> IngestConfig {
    IngestConfig::builder()
        .batch_size(batch_size)
        .required_fields(["name", "email", "phoneNumber"])
        .build()
        .unwrap()
}

fn pipeline(store: MemoryStore, batch_size: usize) -> IngestionPipeline<MemoryStore> {
    IngestionPipeline::new(store, config(batch_size))
}

fn assert_balanced(report: &IngestionReport) {
    assert_eq!(
        report.inserted_count
            + report.skipped_duplicates
            + report.malformed_count
            + report.failed_count,
        report.total_records,
        "report does not account for every record: {:?}",
        report
    );
    assert!(report.is_balanced());
}

#[tokio::test]
async fn test_all_unique_records_inserted() {
    let pipeline = pipeline(MemoryStore::new(), 7);

    let report = pipeline.run(numbered(0..50), Some("expo")).await.unwrap();

    assert_eq!(report.total_records, 50);
    assert_eq!(report.inserted_count, 50);
    assert_eq!(report.skipped_duplicates, 0);
    assert!(report.duplicate_entries.is_empty());
    assert_eq!(report.batches, 8);
    assert_eq!(pipeline.store().count(&leads()).await.unwrap(), 50);
    assert_balanced(&report);
}

#[tokio::test]
async fn test_existing_keys_rejected_for_any_batch_size() {
    for batch_size in [1, 2, 3, 10, 500] {
        let store = MemoryStore::new();
        store.seed(&leads(), numbered(0..3)).unwrap();
        let pipeline = pipeline(store, batch_size);

        let report = pipeline.run(numbered(0..6), None).await.unwrap();

        assert_eq!(report.inserted_count, 3, "batch size {}", batch_size);
        assert_eq!(report.skipped_duplicates, 3, "batch size {}", batch_size);
        let skipped: Vec<&str> = report
            .duplicate_entries
            .iter()
            .map(|d| d.natural_key.as_str())
            .collect();
        assert_eq!(skipped, vec!["555-0000", "555-0001", "555-0002"]);
        assert_balanced(&report);
    }
}

#[tokio::test]
async fn test_intra_batch_duplicates_first_occurrence_wins() {
    let pipeline = pipeline(MemoryStore::new(), 10);
    let records = vec![
        lead("111", "First"),
        lead("222", "Other"),
        lead("111", "Second"),
    ];

    let report = pipeline.run(records, None).await.unwrap();

    assert_eq!(report.inserted_count, 2);
    assert_eq!(
        report.duplicate_entries,
        vec![DuplicateEntry::new("111", "Second")]
    );
    let stored = pipeline.store().get(&leads(), "111").unwrap().unwrap();
    assert_eq!(stored.display_name("name"), "First");
}

#[tokio::test]
async fn test_cross_batch_duplicates_rejected() {
    let pipeline = pipeline(MemoryStore::new(), 2);
    let records = vec![
        lead("111", "a"),
        lead("222", "b"),
        lead("333", "c"),
        lead("111", "d"),
        lead("222", "e"),
    ];

    let report = pipeline.run(records, None).await.unwrap();

    assert_eq!(report.inserted_count, 3);
    assert_eq!(report.skipped_duplicates, 2);
    assert_eq!(
        report.duplicate_entries,
        vec![DuplicateEntry::new("111", "d"), DuplicateEntry::new("222", "e")]
    );
    assert_balanced(&report);
}

#[tokio::test]
async fn test_reference_scenario() {
    let pipeline = pipeline(MemoryStore::new(), 2);
    let records = vec![lead("A", "x"), lead("B", "y"), lead("A", "z")];

    let report = pipeline.run(records, None).await.unwrap();

    assert_eq!(report.inserted_count, 2);
    assert_eq!(report.skipped_duplicates, 1);
    assert_eq!(report.duplicate_entries, vec![DuplicateEntry::new("A", "z")]);
    assert_eq!(report.batches, 2);
    assert_balanced(&report);
}

#[tokio::test]
async fn test_malformed_records_excluded() {
    let pipeline = pipeline(MemoryStore::new(), 3);
    let mut records = numbered(0..4);
    records.push(Record::new().with("name", "No Phone"));
    records.push(lead("   ", "Blank Phone"));
    records.push(
        Record::new()
            .with("name", "Bool Phone")
            .with("phoneNumber", true),
    );

    let report = pipeline.run(records, None).await.unwrap();

    assert_eq!(report.total_records, 7);
    assert_eq!(report.malformed_count, 3);
    assert_eq!(report.inserted_count, 4);
    assert!(report.inserted_count + report.skipped_duplicates < report.total_records);
    assert_balanced(&report);
}

#[tokio::test]
async fn test_numeric_phone_numbers_deduplicate_against_strings() {
    let pipeline = pipeline(MemoryStore::new(), 10);
    let records = vec![
        lead("5550100", "String"),
        Record::new()
            .with("name", "Number")
            .with("email", "n@example.com")
            .with("phoneNumber", 5550100),
    ];

    let report = pipeline.run(records, None).await.unwrap();

    assert_eq!(report.inserted_count, 1);
    assert_eq!(
        report.duplicate_entries,
        vec![DuplicateEntry::new("5550100", "Number")]
    );
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let store = MemoryStore::new();
    store.seed(&leads(), numbered(0..20)).unwrap();
    let pipeline = pipeline(store, 6);

    let first = pipeline.run(numbered(0..20), Some("first")).await.unwrap();
    let second = pipeline.run(numbered(0..20), Some("second")).await.unwrap();

    assert_eq!(first.inserted_count, 0);
    assert_eq!(second.inserted_count, 0);
    assert_eq!(first.duplicate_entries, second.duplicate_entries);
    assert_eq!(first.duplicate_entries.len(), 20);
    assert_eq!(pipeline.store().count(&leads()).await.unwrap(), 20);
}

#[tokio::test]
async fn test_second_run_sees_first_run_inserts() {
    let pipeline = pipeline(MemoryStore::new(), 4);

    let first = pipeline.run(numbered(0..10), None).await.unwrap();
    let second = pipeline.run(numbered(5..15), None).await.unwrap();

    assert_eq!(first.inserted_count, 10);
    assert_eq!(second.inserted_count, 5);
    assert_eq!(second.skipped_duplicates, 5);
    assert_ne!(first.run_id, second.run_id);
}

#[tokio::test]
async fn test_single_write_failure_only_costs_one_record() {
    let baseline = pipeline(MemoryStore::new(), 5)
        .run(numbered(0..12), None)
        .await
        .unwrap();

    let store = MemoryStore::new();
    store.reject_key("555-0007").unwrap();
    let pipeline = pipeline(store, 5);
    let report = pipeline.run(numbered(0..12), None).await.unwrap();

    assert_eq!(report.inserted_count, baseline.inserted_count - 1);
    assert_eq!(report.failed_count, 1);
    assert_eq!(report.write_failures[0].natural_key, "555-0007");
    assert_eq!(report.write_failures[0].kind, WriteFailureKind::Other);
    assert!(pipeline.store().get(&leads(), "555-0008").unwrap().is_some());
    assert_balanced(&report);
}

#[tokio::test]
async fn test_failed_batch_does_not_stop_run() {
    let store = MemoryStore::new();
    store.fail_writes(true).unwrap();
    let pipeline = pipeline(store, 4);

    let report = pipeline.run(numbered(0..10), None).await.unwrap();

    assert_eq!(report.inserted_count, 0);
    assert_eq!(report.failed_count, 10);
    assert_eq!(report.batches, 3);
    assert_eq!(pipeline.store().bulk_insert_calls().unwrap(), 3);
    assert!(
        report
            .write_failures
            .iter()
            .all(|f| f.kind == WriteFailureKind::Other)
    );
    assert_balanced(&report);
}

#[tokio::test]
async fn test_failed_write_keys_still_block_later_duplicates() {
    let store = MemoryStore::new();
    store.reject_key("111").unwrap();
    let pipeline = pipeline(store, 1);

    let report = pipeline
        .run(vec![lead("111", "a"), lead("111", "b")], None)
        .await
        .unwrap();

    assert_eq!(report.failed_count, 1);
    assert_eq!(report.duplicate_entries, vec![DuplicateEntry::new("111", "b")]);
    assert_balanced(&report);
}

#[tokio::test]
async fn test_snapshot_failure_aborts_before_writes() {
    let store = MemoryStore::new();
    store.fail_reads(true).unwrap();
    let pipeline = pipeline(store, 10);

    let err = pipeline.run(numbered(0..5), None).await.unwrap_err();

    assert!(matches!(err, IngestError::StoreRead(_)));
    assert_eq!(pipeline.store().bulk_insert_calls().unwrap(), 0);
    assert_eq!(pipeline.store().count(&leads()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_empty_input_rejected_without_store_access() {
    let store = MemoryStore::new();
    // A store read would fail, so reaching the snapshot would change the error
    store.fail_reads(true).unwrap();
    let pipeline = pipeline(store, 10);

    let err = pipeline.run(Vec::new(), None).await.unwrap_err();

    assert!(matches!(
        err,
        IngestError::Validation(ValidationError::EmptyInput)
    ));
    assert_eq!(pipeline.store().bulk_insert_calls().unwrap(), 0);
}

#[tokio::test]
async fn test_missing_required_fields_rejected_without_store_access() {
    let store = MemoryStore::new();
    store.fail_reads(true).unwrap();
    let pipeline = pipeline(store, 10);
    let records = vec![Record::new().with("name", "Ada").with("phoneNumber", "1")];

    let err = pipeline.run(records, None).await.unwrap_err();

    match err {
        IngestError::Validation(ValidationError::MissingRequiredFields { fields }) => {
            assert_eq!(fields, vec!["email"]);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_only_first_record_checked_for_required_fields() {
    let pipeline = pipeline(MemoryStore::new(), 10);
    let records = vec![
        lead("1", "Complete"),
        Record::new().with("phoneNumber", "2"),
    ];

    let report = pipeline.run(records, None).await.unwrap();
    assert_eq!(report.inserted_count, 2);
}

#[tokio::test]
async fn test_progress_reported_per_batch() {
    let seen: Arc<Mutex<Vec<Progress>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let pipeline = pipeline(MemoryStore::new(), 4)
        .with_progress(move |progress| sink.lock().unwrap().push(*progress));

    let report = pipeline.run(numbered(0..10), None).await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), report.batches);
    let percents: Vec<u8> = seen.iter().map(Progress::percent).collect();
    assert_eq!(percents, vec![40, 80, 100]);
    assert!(seen.windows(2).all(|w| w[0].processed < w[1].processed));
    assert!(seen.last().unwrap().is_complete());
}

#[tokio::test]
async fn test_tag_stamped_on_every_inserted_record() {
    let pipeline = pipeline(MemoryStore::new(), 3);

    let report = pipeline.run(numbered(0..5), Some("spring-fair")).await.unwrap();

    assert_eq!(report.tag, "spring-fair");
    for i in 0..5 {
        let stored = pipeline
            .store()
            .get(&leads(), &format!("555-{:04}", i))
            .unwrap()
            .unwrap();
        assert_eq!(
            stored.get("source"),
            Some(&serde_json::Value::String("spring-fair".to_string()))
        );
    }
}

#[tokio::test]
async fn test_report_serializes_camel_case() {
    let pipeline = pipeline(MemoryStore::new(), 10);
    let report = pipeline
        .run(vec![lead("1", "a"), lead("1", "b")], None)
        .await
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["insertedCount"], 1);
    assert_eq!(json["skippedDuplicates"], 1);
    assert_eq!(json["duplicateEntries"][0]["naturalKey"], "1");
    assert_eq!(json["duplicateEntries"][0]["displayName"], "b");
    assert!(json.get("runId").is_some());
}

#[cfg(feature = "duckdb-backend")]
mod duckdb_backend {
    use super::*;
    use crm_ingest::database::DuckDBBackend;

    #[tokio::test]
    async fn test_pipeline_over_duckdb() {
        let backend = DuckDBBackend::in_memory().unwrap();
        backend.initialize().await.unwrap();
        let pipeline = IngestionPipeline::new(backend, config(3));

        let first = pipeline.run(numbered(0..7), None).await.unwrap();
        let second = pipeline.run(numbered(5..9), None).await.unwrap();

        assert_eq!(first.inserted_count, 7);
        assert_eq!(second.inserted_count, 2);
        assert_eq!(second.skipped_duplicates, 2);
        assert_eq!(pipeline.store().count(&leads()).await.unwrap(), 9);
        assert_balanced(&second);
    }

    #[tokio::test]
    async fn test_duckdb_file_persists_between_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crm.duckdb");

        {
            let backend = DuckDBBackend::new(&path).unwrap();
            backend.initialize().await.unwrap();
            let pipeline = IngestionPipeline::new(backend, config(10));
            pipeline.run(numbered(0..3), None).await.unwrap();
        }

        let backend = DuckDBBackend::new(&path).unwrap();
        let pipeline = IngestionPipeline::new(backend, config(10));
        let report = pipeline.run(numbered(0..3), None).await.unwrap();
        assert_eq!(report.inserted_count, 0);
        assert_eq!(report.skipped_duplicates, 3);
    }
}
