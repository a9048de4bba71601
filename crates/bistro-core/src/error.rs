//! # Error Types
//!
//! Domain-specific error types for bistro-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bistro-core errors (this file)                                        │
//! │  ├── BookingError     - What every engine operation returns            │
//! │  ├── ValidationError  - Malformed input field                          │
//! │  ├── ConflictReason   - Table occupied / duplicate slot                │
//! │  └── StorageError     - Gateway failures (engine-agnostic)             │
//! │                                                                         │
//! │  bistro-db errors (separate crate)                                     │
//! │  └── DbError          - sqlx failures, converted into StorageError     │
//! │                                                                         │
//! │  front-desk errors (app)                                               │
//! │  └── AppError         - code + message printed to the operator         │
//! │                                                                         │
//! │  Flow: DbError → StorageError → BookingError → AppError → Operator     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Retry Policy
//! | Variant      | Caller action                                  |
//! |--------------|------------------------------------------------|
//! | `Validation` | Fix the input. Never retried automatically.    |
//! | `NotFound`   | Show the message. Not retried.                 |
//! | `Conflict`   | Offer another table or time. Not retried.      |
//! | `Storage`    | May retry with backoff if `is_retryable()`.    |

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::types::TableNumber;

// =============================================================================
// Booking Error
// =============================================================================

/// Errors surfaced by booking, cancellation, and queries.
#[derive(Debug, Error)]
pub enum BookingError {
    /// An input field failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A referenced table, reservation, or client does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A business rule rejected the booking.
    ///
    /// ## User Workflow
    /// ```text
    /// book(table 1, tomorrow 20:00)
    ///      │
    ///      ▼
    /// Table 1 already backs a reservation
    ///      │
    ///      ▼
    /// Conflict(TableOccupied { table: 1 })
    ///      │
    ///      ▼
    /// Front desk: "table 1 already occupied", pick another table
    /// ```
    #[error("Conflict: {0}")]
    Conflict(ConflictReason),

    /// The datastore failed or aborted the transaction.
    #[error("Storage failure: {0}")]
    Storage(#[from] StorageError),
}

impl BookingError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        BookingError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// True when the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        match self {
            BookingError::Storage(e) => e.is_retryable(),
            _ => false,
        }
    }
}

impl From<ConflictReason> for BookingError {
    fn from(reason: ConflictReason) -> Self {
        BookingError::Conflict(reason)
    }
}

/// Why a booking conflicted with existing state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConflictReason {
    /// The table already backs an active reservation.
    #[error("table already occupied (table {table})")]
    TableOccupied { table: TableNumber },

    /// A reservation already claims this exact (table, time) slot.
    #[error("duplicate slot (table {table} at {at})")]
    DuplicateSlot { table: TableNumber, at: NaiveDateTime },
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when input doesn't meet field requirements.
/// Raised before any storage is touched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Invalid format (e.g., phone with letters, unparseable date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// A reservation time is not strictly after the current time.
    #[error("{field} must be in the future (got {value}, now {now})")]
    NotInFuture {
        field: String,
        value: NaiveDateTime,
        now: NaiveDateTime,
    },

    /// An entity that must already be stored has no identity yet.
    #[error("{entity} must be saved before it can be referenced")]
    NotPersisted { entity: String },
}

// =============================================================================
// Storage Error
// =============================================================================

/// Storage failures reported through the persistence gateway.
///
/// Storage engines convert their own errors into this type so the engine
/// never depends on a concrete driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The datastore cannot be reached (closed pool, exhausted pool, I/O).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The transaction was aborted and nothing was committed.
    #[error("transaction aborted: {0}")]
    TransactionAborted(String),

    /// A unique constraint rejected the write.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A write addressed a record that does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A foreign key constraint rejected the write.
    #[error("foreign key violated: {0}")]
    ForeignKeyViolation(String),

    /// A query failed for another reason.
    #[error("query failed: {0}")]
    Query(String),

    /// A stored row no longer satisfies the entity invariants.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl StorageError {
    /// True for transient failures the caller may retry with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StorageError::Unavailable(_) | StorageError::TransactionAborted(_)
        )
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for engine results.
pub type BookingResult<T> = Result<T, BookingError>;

/// Convenience type alias for gateway results.
pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// Unit Tests
// =============================================================================
