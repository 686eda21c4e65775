//! # Database Schema
//!
//! SQL for the SQLite key-value backend.
//!
//! ```text
//! ┌─────────────────────┐    ┌─────────────────┐
//! │         kv          │    │ schema_version  │
//! ├─────────────────────┤    ├─────────────────┤
//! │ key   (PK)          │    │ version         │
//! │ value (JSON text)   │    └─────────────────┘
//! │ updated_at          │
//! └─────────────────────┘
//! ```

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// SQL to create all tables
pub const CREATE_TABLES: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY
);

-- One row per collection; value holds the whole serialized list
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    -- Unix seconds of the last overwrite
    updated_at INTEGER NOT NULL
);
"#;
