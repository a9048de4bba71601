//! # bistro-core: Reservation Domain for Bistro
//!
//! This crate holds the restaurant's reservation model: clients, tables,
//! reservations, the rules every field must satisfy, and the contract the
//! booking engine uses to reach storage.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bistro Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/front-desk (CLI)                           │   │
//! │  │      tables ──► book ──► list / search ──► cancel               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  bistro-engine                                  │   │
//! │  │        BookingEngine (book, cancel) + ReservationQueries        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │  PersistenceGateway (trait)           │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bistro-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │ validation│  │   error   │  │  gateway  │  │   │
//! │  │   │  Client   │  │   rules   │  │ Booking   │  │  traits   │  │   │
//! │  │   │  Table    │  │  checks   │  │ Storage   │  │           │  │   │
//! │  │   │Reservation│  │           │  │ Validation│  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • NO CLOCK                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                ▲                                        │
//! │  ┌─────────────────────────────┴───────────────────────────────────┐   │
//! │  │                 bistro-db (implements the gateway)              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//!
//! 1. **No partially-valid entities**: constructors and setters validate
//!    every field; an invalid value never lands in a struct.
//! 2. **Variants, not hierarchies**: VIP clients and VIP tables are the same
//!    types with an optional VIP payload.
//! 3. **Explicit time**: anything that compares against "now" takes it as a
//!    parameter, so the rules stay pure.
//!
//! ## Example Usage
//!
//! ```rust
//! use bistro_core::{Client, Table};
//!
//! let client = Client::regular("Ana Silva", "11999999999").unwrap();
//! let table = Table::regular(1, 4).unwrap();
//!
//! assert!(!client.is_vip());
//! assert!(table.is_available());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod gateway;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{
    BookingError, BookingResult, ConflictReason, StorageError, StorageResult, ValidationError,
};
pub use gateway::{GatewayTransaction, PersistenceGateway};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Lowest table numeral on the floor plan.
pub const MIN_TABLE_NUMBER: u32 = 1;

/// Highest table numeral on the floor plan.
pub const MAX_TABLE_NUMBER: u32 = 20;

/// Smallest seating capacity a table may declare.
pub const MIN_TABLE_CAPACITY: u32 = 1;

/// Largest seating capacity a table may declare.
pub const MAX_TABLE_CAPACITY: u32 = 10;

/// Exact number of digits in a client phone number (area code + number).
pub const PHONE_DIGITS: usize = 11;

/// Upper bound for a VIP discount percentage.
pub const MAX_DISCOUNT_PCT: f64 = 100.0;

/// Display format used by the front desk for reservation times.
pub const DISPLAY_TIME_FORMAT: &str = "%d/%m/%Y %H:%M";
