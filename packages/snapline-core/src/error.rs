//! # Error Handling
//!
//! Error types for Snapline Core.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Core Errors                                                       │
//! │  │   ├── NotInitialized        - Core not initialized                  │
//! │  │   ├── AlreadyInitialized    - Core already initialized              │
//! │  │   └── InvalidConfig         - Rejected configuration value          │
//! │  │                                                                      │
//! │  ├── Identity Errors                                                   │
//! │  │   ├── NoUser                - No local user has been stored         │
//! │  │   └── InvalidProfile        - Profile update rejected               │
//! │  │                                                                      │
//! │  ├── Storage Errors                                                    │
//! │  │   ├── StorageReadError      - Backend read failed                   │
//! │  │   ├── StorageWriteError     - Backend write failed                  │
//! │  │   └── DatabaseError         - SQLite error                          │
//! │  │                                                                      │
//! │  └── Internal Errors                                                   │
//! │      ├── SerializationError    - Encoding a collection failed          │
//! │      └── DeserializationError  - Stored blob could not be decoded      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Where Errors Stop
//!
//! Everything below [`FeedStore`](crate::FeedStore) returns
//! [`Result<T>`]. The facade itself collapses failures into defaults
//! (empty list, `None`, `false`) after logging them, so UI callers only ever
//! observe "nothing changed".

use thiserror::Error;

/// Result type alias for Snapline Core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Snapline Core
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Core Lifecycle Errors (100-199)
    // ========================================================================

    /// Core has not been initialized
    #[error("Snapline Core has not been initialized. Call SnaplineCore::initialize() first.")]
    NotInitialized,

    /// Core has already been initialized
    #[error("Snapline Core has already been initialized.")]
    AlreadyInitialized,

    /// A configuration value was rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ========================================================================
    // Identity Errors (200-299)
    // ========================================================================

    /// No local user is stored on this device
    #[error("No user stored on this device. Run initialize_demo_data() or save a user first.")]
    NoUser,

    /// Profile update was rejected
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    // ========================================================================
    // Storage Errors (400-499)
    // ========================================================================

    /// Failed to read from storage
    #[error("Failed to read from storage: {0}")]
    StorageReadError(String),

    /// Failed to write to storage
    #[error("Failed to write to storage: {0}")]
    StorageWriteError(String),

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(String),

    // ========================================================================
    // Internal Errors (900-999)
    // ========================================================================

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

impl Error {
    /// Get the numeric error code
    ///
    /// Error codes are organized by category:
    /// - 100-199: Core lifecycle
    /// - 200-299: Identity
    /// - 400-499: Storage
    /// - 900-999: Internal
    pub fn code(&self) -> i32 {
        match self {
            // Core (100-199)
            Error::NotInitialized => 100,
            Error::AlreadyInitialized => 101,
            Error::InvalidConfig(_) => 102,

            // Identity (200-299)
            Error::NoUser => 200,
            Error::InvalidProfile(_) => 201,

            // Storage (400-499)
            Error::StorageReadError(_) => 401,
            Error::StorageWriteError(_) => 402,
            Error::DatabaseError(_) => 405,

            // Internal (900-999)
            Error::SerializationError(_) => 902,
            Error::DeserializationError(_) => 903,
        }
    }

    /// Check if this error is recoverable
    ///
    /// Storage I/O failures may succeed on retry; a corrupt blob or a
    /// missing user will not.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::StorageReadError(_) | Error::StorageWriteError(_) | Error::DatabaseError(_)
        )
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            Error::DeserializationError(err.to_string())
        } else {
            Error::SerializationError(err.to_string())
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
