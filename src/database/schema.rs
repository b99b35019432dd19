//! Database schema definitions
//!
//! Provides SQL schema definitions that work with both DuckDB and PostgreSQL.
//! Every collection shares one table; the primary key on
//! `(collection, natural_key)` is the unique index the ingestion pipeline
//! relies on to catch cross-run races.

/// Schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

/// Database schema helper
pub struct DatabaseSchema;

impl DatabaseSchema {
    /// Get the initial schema creation SQL
    ///
    /// This SQL is compatible with both DuckDB and PostgreSQL.
    pub fn create_tables_sql() -> &'static str {
        r#"
-- Ingested documents, one row per accepted record
CREATE TABLE IF NOT EXISTS ingested_records (
    collection TEXT NOT NULL,
    natural_key TEXT NOT NULL,
    document JSON NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY (collection, natural_key)
);

-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#
    }

    /// Get index creation SQL
    pub fn create_indexes_sql() -> &'static str {
        r#"
-- Recent-first listing per collection
CREATE INDEX IF NOT EXISTS idx_ingested_records_created ON ingested_records(collection, created_at);
"#
    }

    /// Insert a record into schema_version table
    pub fn record_schema_version_sql() -> &'static str {
        "INSERT INTO schema_version (version) VALUES ($1) ON CONFLICT (version) DO NOTHING"
    }

    /// Check current schema version
    pub fn check_schema_version_sql() -> &'static str {
        "SELECT MAX(version) as version FROM schema_version"
    }
}

/// SQL for reading ingested records
pub mod record_sql {
    /// All natural keys of one collection
    pub const SELECT_KEYS: &str =
        "SELECT natural_key FROM ingested_records WHERE collection = $1";

    /// Row count of one collection
    pub const COUNT: &str = "SELECT COUNT(*) FROM ingested_records WHERE collection = $1";
}
