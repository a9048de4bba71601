//! # Repository Module
//!
//! SQL for the three Bistro entities.
//!
//! ## Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Layout                                    │
//! │                                                                         │
//! │  db.tables().list_available()          SqliteTransaction               │
//! │       │                                      │                          │
//! │       ▼                                      ▼                          │
//! │  TableRepository (owns a pool clone)    &mut *tx                        │
//! │       │                                      │                          │
//! │       └──────────────┬───────────────────────┘                          │
//! │                      ▼                                                  │
//! │  table::fetch / table::upsert / ...  (generic over sqlx::Executor)     │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │                 SQLite Database                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every query lives in exactly one free function that accepts any
//! SQLite executor, so the same SQL serves both the pool and an open
//! transaction. The repository structs are thin pool-bound wrappers.
//!
//! Rows are decoded into flat `*Row` structs and then converted into
//! domain entities through the core `TryFrom` record conversions; a row
//! that breaks an entity rule surfaces as [`DbError::CorruptRecord`].
//!
//! [`DbError::CorruptRecord`]: crate::DbError::CorruptRecord
//!
//! ## Available Repositories
//!
//! - [`client::ClientRepository`] - Client insert/update and lookup
//! - [`table::TableRepository`] - Table upsert, listing, and seeding support
//! - [`reservation::ReservationRepository`] - Hydrated reservation reads

pub mod client;
pub mod reservation;
pub mod table;

use crate::error::{DbError, DbResult};

/// Narrows an SQLite INTEGER into the `u32` fields core records use.
pub(crate) fn column_u32(column: &'static str, value: i64) -> DbResult<u32> {
    u32::try_from(value)
        .map_err(|_| DbError::CorruptRecord(format!("{column} out of range: {value}")))
}
