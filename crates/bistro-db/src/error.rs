//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StorageError (bistro-core) ← Gateway boundary, driver-agnostic        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BookingError → AppError (front desk) → operator message               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use bistro_core::{StorageError, ValidationError};
use thiserror::Error;

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - Updating a client id that doesn't exist
    /// - `fetch_one` returns no rows
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - A second reservation for the same (table_numeral, reserved_for)
    /// - Any UNIQUE index violation
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Reservation referencing a non-existent client id
    /// - Reservation referencing a non-existent table numeral
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file doesn't exist and can't be created
    /// - File permissions issue
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed (busy database, aborted commit).
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// A stored row violates entity invariants.
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// sqlx::Error::Io             → DbError::ConnectionFailed
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite error messages for constraints:
                // UNIQUE constraint: "UNIQUE constraint failed: <table>.<column>, ..."
                // FK constraint: "FOREIGN KEY constraint failed"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("database is locked") || msg.contains("database is busy") {
                    DbError::TransactionFailed(msg.to_string())
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            sqlx::Error::Io(e) => DbError::ConnectionFailed(e.to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// A row that fails entity validation on the way out of storage.
impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::CorruptRecord(err.to_string())
    }
}

/// Gateway boundary: the engine only ever sees `StorageError`.
impl From<DbError> for StorageError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UniqueViolation { field, .. } => StorageError::UniqueViolation(field),
            DbError::ForeignKeyViolation { message } => StorageError::ForeignKeyViolation(message),
            DbError::ConnectionFailed(e) => StorageError::Unavailable(e),
            DbError::MigrationFailed(e) => StorageError::Unavailable(e),
            DbError::PoolExhausted => {
                StorageError::Unavailable("connection pool exhausted".to_string())
            }
            DbError::TransactionFailed(e) => StorageError::TransactionAborted(e),
            DbError::CorruptRecord(e) => StorageError::Corrupt(e),
            DbError::NotFound { entity, id } => StorageError::NotFound { entity, id },
            DbError::QueryFailed(e) | DbError::Internal(e) => StorageError::Query(e),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_mapping() {
        let unique: StorageError = DbError::duplicate("reservations.table_numeral", "1").into();
        assert_eq!(
            unique,
            StorageError::UniqueViolation("reservations.table_numeral".to_string())
        );

        let busy: StorageError = DbError::TransactionFailed("database is locked".into()).into();
        assert!(busy.is_retryable());

        let missing: StorageError = DbError::not_found("Client", "999").into();
        assert_eq!(
            missing,
            StorageError::NotFound {
                entity: "Client".to_string(),
                id: "999".to_string()
            }
        );

        let closed: StorageError = DbError::PoolExhausted.into();
        assert!(matches!(closed, StorageError::Unavailable(_)));
    }

    #[test]
    fn test_validation_becomes_corrupt_record() {
        let err: DbError = ValidationError::Required {
            field: "name".to_string(),
        }
        .into();
        assert!(matches!(err, DbError::CorruptRecord(_)));
    }
}
