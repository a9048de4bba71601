//! # Front-Desk Error Handling
//!
//! Converts library errors into operator-facing errors.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BookingError / ValidationError / DbError / ConfigError                │
//! │       │                                                                 │
//! │       ▼  From impls (storage details logged, not shown)                 │
//! │  AppError { code: ErrorCode, message: String }                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  stderr: "error [CONFLICT]: table already occupied (table 1)"          │
//! │  exit code 1                                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use serde::Serialize;

use bistro_core::{BookingError, ValidationError};
use bistro_db::DbError;

use crate::config::ConfigError;

/// Error reported to the operator.
///
/// ## Serialization
/// With `--json`, failures print as:
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "reservation not found: 42"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for operator output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input failed a field rule
    ValidationError,

    /// Reservation, table, or client absent
    NotFound,

    /// Table occupied or slot already claimed
    Conflict,

    /// Database unavailable or transaction aborted
    StorageError,

    /// Bad environment configuration
    ConfigError,

    /// Output could not be produced
    InternalError,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::StorageError => "STORAGE_ERROR",
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AppError {
    /// Creates a new error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        AppError {
            code,
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error [{}]: {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {}

/// Converts engine errors to operator errors.
impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Validation(e) => e.into(),
            BookingError::NotFound { entity, id } => {
                AppError::new(ErrorCode::NotFound, format!("{} not found: {}", entity, id))
            }
            BookingError::Conflict(reason) => AppError::new(ErrorCode::Conflict, reason.to_string()),
            BookingError::Storage(e) => {
                // Log the actual error but return a generic message
                tracing::error!(error = %e, "Storage failure");
                let message = if e.is_retryable() {
                    "Storage is busy, please try again"
                } else {
                    "Storage operation failed"
                };
                AppError::new(ErrorCode::StorageError, message)
            }
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::new(ErrorCode::ValidationError, err.to_string())
    }
}

/// Startup failures opening or seeding the database.
impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        tracing::error!(error = %err, "Database error");
        match err {
            DbError::ConnectionFailed(_) | DbError::PoolExhausted => {
                AppError::new(ErrorCode::StorageError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                AppError::new(ErrorCode::StorageError, "Database migration failed")
            }
            _ => AppError::new(ErrorCode::StorageError, "Database operation failed"),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::new(ErrorCode::ConfigError, err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::internal(format!("Could not render output: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bistro_core::{ConflictReason, StorageError, TableNumber};

    #[test]
    fn test_booking_errors_map_to_codes() {
        let conflict: AppError = BookingError::Conflict(ConflictReason::TableOccupied {
            table: TableNumber::new(1).unwrap(),
        })
        .into();
        assert_eq!(conflict.code, ErrorCode::Conflict);
        assert_eq!(conflict.message, "table already occupied (table 1)");

        let missing: AppError = BookingError::not_found("reservation", 42).into();
        assert_eq!(missing.code, ErrorCode::NotFound);
        assert_eq!(missing.to_string(), "error [NOT_FOUND]: reservation not found: 42");

        let invalid: AppError = BookingError::Validation(ValidationError::Required {
            field: "name".to_string(),
        })
        .into();
        assert_eq!(invalid.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_storage_details_are_hidden() {
        let err: AppError =
            BookingError::Storage(StorageError::Query("no such column: nmae".to_string())).into();
        assert_eq!(err.code, ErrorCode::StorageError);
        assert!(!err.message.contains("nmae"));

        let busy: AppError =
            BookingError::Storage(StorageError::TransactionAborted("locked".to_string())).into();
        assert!(busy.message.contains("try again"));
    }

    #[test]
    fn test_json_shape() {
        let err = AppError::new(ErrorCode::ConfigError, "Invalid value for BISTRO_SEED_TABLES");
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(
            json,
            r#"{"code":"CONFIG_ERROR","message":"Invalid value for BISTRO_SEED_TABLES"}"#
        );
    }
}
