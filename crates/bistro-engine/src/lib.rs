//! # bistro-engine: Booking Engine
//!
//! The reservation lifecycle: `book`, `cancel`, and the read-side queries.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bistro Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      front-desk (CLI)                            │   │
//! │  └───────────────────────────────┬─────────────────────────────────┘   │
//! │                                  │                                      │
//! │  ┌───────────────────────────────▼─────────────────────────────────┐   │
//! │  │                   bistro-engine (THIS CRATE)                     │   │
//! │  │   BookingEngine ── TableLocks ── Clock                           │   │
//! │  │   ReservationQueries                                             │   │
//! │  └───────────────────────────────┬─────────────────────────────────┘   │
//! │                                  │ Arc<dyn PersistenceGateway>          │
//! │               ┌──────────────────┴──────────────────┐                   │
//! │               ▼                                     ▼                   │
//! │  ┌─────────────────────────┐          ┌─────────────────────────┐      │
//! │  │ bistro-db::Database     │          │ memory::MemoryGateway   │      │
//! │  │ (SQLite)                │          │ (tests, demos)          │      │
//! │  └─────────────────────────┘          └─────────────────────────┘      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use bistro_core::Client;
//! use bistro_engine::BookingEngine;
//!
//! let engine = BookingEngine::new(Arc::new(db));
//! let client = Client::regular("Ana Silva", "11999999999")?;
//! let reservation = engine.book(client, 1, tomorrow_at_seven).await?;
//! engine.cancel(reservation.id()).await?;
//! ```

pub mod clock;
pub mod engine;
pub mod locks;
pub mod memory;
pub mod query;

pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::BookingEngine;
pub use locks::TableLocks;
pub use memory::MemoryGateway;
pub use query::ReservationQueries;
