//! # Storage Error Types
//!
//! Error types shared by both back ends.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     Error Propagation                                │
//! │                                                                     │
//! │  SQLite error (sqlx::Error)       File error (std::io / serde)     │
//! │       │                                │                            │
//! │       └────────────┬───────────────────┘                            │
//! │                    ▼                                                │
//! │  StorageError (this module) ← adds context and categorization      │
//! │                    │                                                │
//! │                    ▼                                                │
//! │  Request handler maps to a conflict / 5xx response                 │
//! │                                                                     │
//! │  NOTE: a missing record is NOT an error. get/update/delete on an   │
//! │  unknown id return Ok(None) / Ok(false).                            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Duplicate username
    /// - Duplicate work-order numero or invoice number
    #[error("duplicate {field}: already exists")]
    UniqueViolation { field: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Vehicle referencing a non-existent customer
    /// - Work order referencing a non-existent vehicle
    #[error("foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// File back end I/O failure on a write path.
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// File back end document (de)serialization failure on a write path.
    #[error("document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Password hashing or secret encryption failed.
    #[error(transparent)]
    Crypto(#[from] lavadero_core::CryptoError),

    /// Internal storage error.
    #[error("internal storage error: {0}")]
    Internal(String),
}

/// Convert sqlx errors to StorageError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::Database  → analyze message for constraint type
/// sqlx::Error::PoolTimedOut / PoolClosed → ConnectionFailed
/// Other                  → Internal
/// ```
impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite constraint messages:
                // UNIQUE: "UNIQUE constraint failed: <table>.<column>"
                // FK:     "FOREIGN KEY constraint failed"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    StorageError::UniqueViolation { field }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    StorageError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    StorageError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => {
                StorageError::ConnectionFailed("pool timed out".to_string())
            }

            sqlx::Error::PoolClosed => StorageError::ConnectionFailed("pool is closed".to_string()),

            _ => StorageError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StorageError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StorageError::MigrationFailed(err.to_string())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
