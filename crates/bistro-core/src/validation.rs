//! # Validation Module
//!
//! Field rules for clients, tables, and reservations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Front desk (CLI)                                             │
//! │  ├── Argument parsing (numbers, dates)                                 │
//! │  └── Immediate operator feedback                                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Entities + Booking Engine (Rust)                             │
//! │  ├── THIS MODULE: every constructor and setter calls in here           │
//! │  └── Runs before any storage access                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints on numeral / capacity / discount                │
//! │  ├── UNIQUE (table_numeral, reserved_for)                              │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bistro_core::validation::{validate_phone, validate_table_number};
//!
//! assert!(validate_phone("11999999999").is_ok());
//! assert!(validate_table_number(21).is_err());
//! ```

use chrono::NaiveDateTime;

use crate::error::ValidationError;
use crate::{
    DISPLAY_TIME_FORMAT, MAX_DISCOUNT_PCT, MAX_TABLE_CAPACITY, MAX_TABLE_NUMBER,
    MIN_TABLE_CAPACITY, MIN_TABLE_NUMBER, PHONE_DIGITS,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest client name accepted.
const MAX_NAME_LEN: usize = 120;

/// Longest search fragment accepted.
const MAX_SEARCH_LEN: usize = 100;

// =============================================================================
// Client Validators
// =============================================================================

/// Validates a client name.
///
/// ## Rules
/// - Must not be empty or whitespace only
/// - At most 120 characters
pub fn validate_client_name(name: &str) -> ValidationResult<()> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::InvalidFormat {
            field: "name".to_string(),
            reason: format!("must be at most {} characters", MAX_NAME_LEN),
        });
    }

    Ok(())
}

/// Validates a client phone number.
///
/// ## Rules
/// - Exactly 11 ASCII digits, nothing else (no spaces, dashes, or `+`)
///
/// ## Example
/// ```rust
/// use bistro_core::validation::validate_phone;
///
/// assert!(validate_phone("11999999999").is_ok());
/// assert!(validate_phone("123").is_err());
/// assert!(validate_phone("(11)9999-9999").is_err());
/// ```
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    if phone.is_empty() {
        return Err(ValidationError::Required {
            field: "phone".to_string(),
        });
    }

    if phone.len() != PHONE_DIGITS || !phone.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: format!("must be exactly {} digits", PHONE_DIGITS),
        });
    }

    Ok(())
}

/// Validates a VIP discount percentage.
///
/// ## Rules
/// - Finite number in `[0, 100]`
pub fn validate_discount(pct: f64) -> ValidationResult<()> {
    if !pct.is_finite() || !(0.0..=MAX_DISCOUNT_PCT).contains(&pct) {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: MAX_DISCOUNT_PCT as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Table Validators
// =============================================================================

/// Validates a table numeral.
///
/// ## Rules
/// - Between 1 and 20 inclusive
pub fn validate_table_number(number: u32) -> ValidationResult<()> {
    if !(MIN_TABLE_NUMBER..=MAX_TABLE_NUMBER).contains(&number) {
        return Err(ValidationError::OutOfRange {
            field: "table number".to_string(),
            min: MIN_TABLE_NUMBER as i64,
            max: MAX_TABLE_NUMBER as i64,
        });
    }

    Ok(())
}

/// Validates a table seating capacity.
///
/// ## Rules
/// - Between 1 and 10 inclusive
pub fn validate_capacity(capacity: u32) -> ValidationResult<()> {
    if !(MIN_TABLE_CAPACITY..=MAX_TABLE_CAPACITY).contains(&capacity) {
        return Err(ValidationError::OutOfRange {
            field: "capacity".to_string(),
            min: MIN_TABLE_CAPACITY as i64,
            max: MAX_TABLE_CAPACITY as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Time Validators
// =============================================================================

/// Validates that a reservation time is strictly after `now`.
///
/// Both values are local wall-clock times; no timezone conversion happens.
///
/// ## Example
/// ```rust
/// use bistro_core::validation::validate_booking_time;
/// use chrono::NaiveDate;
///
/// let now = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap().and_hms_opt(12, 0, 0).unwrap();
/// let later = now + chrono::Duration::minutes(1);
///
/// assert!(validate_booking_time(later, now).is_ok());
/// assert!(validate_booking_time(now, now).is_err());
/// ```
pub fn validate_booking_time(when: NaiveDateTime, now: NaiveDateTime) -> ValidationResult<()> {
    if when <= now {
        return Err(ValidationError::NotInFuture {
            field: "reservation time".to_string(),
            value: when,
            now,
        });
    }

    Ok(())
}

/// Parses a reservation time typed at the front desk (`dd/MM/yyyy HH:mm`).
///
/// ## Example
/// ```rust
/// use bistro_core::validation::parse_booking_time;
///
/// let when = parse_booking_time("24/12/2030 19:00").unwrap();
/// assert_eq!(when.to_string(), "2030-12-24 19:00:00");
/// assert!(parse_booking_time("2030-12-24").is_err());
/// ```
pub fn parse_booking_time(text: &str) -> ValidationResult<NaiveDateTime> {
    let text = text.trim();

    if text.is_empty() {
        return Err(ValidationError::Required {
            field: "reservation time".to_string(),
        });
    }

    NaiveDateTime::parse_from_str(text, DISPLAY_TIME_FORMAT).map_err(|_| {
        ValidationError::InvalidFormat {
            field: "reservation time".to_string(),
            reason: "expected dd/mm/yyyy hh:mm".to_string(),
        }
    })
}

// =============================================================================
// Query Validators
// =============================================================================

/// Validates a client-name search fragment.
///
/// ## Rules
/// - Can be empty (matches every reservation)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed fragment.
pub fn validate_search_fragment(fragment: &str) -> ValidationResult<String> {
    let fragment = fragment.trim();

    if fragment.chars().count() > MAX_SEARCH_LEN {
        return Err(ValidationError::InvalidFormat {
            field: "search".to_string(),
            reason: format!("must be at most {} characters", MAX_SEARCH_LEN),
        });
    }

    Ok(fragment.to_string())
}

// =============================================================================
// Unit Tests
// =============================================================================
