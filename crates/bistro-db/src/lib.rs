//! # bistro-db: Database Layer for Bistro
//!
//! This crate provides the SQLite implementation of the persistence gateway
//! the booking engine consumes. It uses sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bistro Data Flow                                 │
//! │                                                                         │
//! │  BookingEngine::book(client, 1, tomorrow 19:00)                        │
//! │       │                                                                 │
//! │       ▼  Arc<dyn PersistenceGateway>                                    │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     bistro-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ ClientRepo    │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ TableRepo     │    │ 001_init.sql │  │   │
//! │  │   │ gateway.rs    │    │ ReservationRe │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (bistro.db)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - SQL for clients, tables, and reservations
//! - [`gateway`] - `PersistenceGateway` implementation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use bistro_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("bistro.db")).await?;
//! db.seed_default_tables().await?;
//!
//! let gateway: Arc<dyn bistro_core::PersistenceGateway> = Arc::new(db.clone());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod gateway;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use gateway::SqliteTransaction;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::client::ClientRepository;
pub use repository::reservation::ReservationRepository;
pub use repository::table::TableRepository;
