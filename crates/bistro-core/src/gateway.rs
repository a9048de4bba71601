//! # Persistence Gateway
//!
//! The narrow storage contract the booking engine consumes.
//!
//! ## Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Persistence Gateway                                │
//! │                                                                         │
//! │  PersistenceGateway (shared handle, Send + Sync)                       │
//! │  ├── begin() ─────────────► GatewayTransaction (one unit of work)      │
//! │  │                          ├── load_table / save_table                │
//! │  │                          ├── save_client                            │
//! │  │                          ├── find_reservation                       │
//! │  │                          ├── count_reservations_for                 │
//! │  │                          ├── insert_reservation / delete_reservation│
//! │  │                          └── commit() | rollback()                  │
//! │  │                                                                      │
//! │  └── read/maintenance calls outside a transaction                      │
//! │      load_table, save_table, list_tables, list_available_tables,       │
//! │      load_client, save_client, list_clients,                           │
//! │      find_reservation, list_reservations, count_reservations_for       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Transaction Rules
//! - Nothing written through a [`GatewayTransaction`] is visible to other
//!   callers before `commit`.
//! - Dropping a transaction without `commit` discards its writes.
//! - While a transaction is open its owner must not call the shared
//!   gateway; implementations backed by a single connection would wait on
//!   themselves.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::error::StorageResult;
use crate::types::{
    Client, ClientId, NewReservation, Reservation, ReservationId, Table, TableNumber,
};

/// Handle to the datastore, constructed at process start and shared.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Opens a transactional scope.
    async fn begin(&self) -> StorageResult<Box<dyn GatewayTransaction>>;

    /// Loads a table by numeral.
    async fn load_table(&self, number: TableNumber) -> StorageResult<Option<Table>>;

    /// Upserts a table keyed by numeral.
    async fn save_table(&self, table: &Table) -> StorageResult<()>;

    /// All tables ordered by numeral.
    async fn list_tables(&self) -> StorageResult<Vec<Table>>;

    /// Unoccupied tables ordered by numeral.
    async fn list_available_tables(&self) -> StorageResult<Vec<Table>>;

    /// Loads a client by id.
    async fn load_client(&self, id: ClientId) -> StorageResult<Option<Client>>;

    /// Inserts a new client (returning the generated id) or updates an
    /// existing one (returning its id).
    async fn save_client(&self, client: &Client) -> StorageResult<ClientId>;

    /// All clients ordered by name.
    async fn list_clients(&self) -> StorageResult<Vec<Client>>;

    /// Loads a reservation hydrated with its client and table.
    async fn find_reservation(&self, id: ReservationId) -> StorageResult<Option<Reservation>>;

    /// All active reservations ordered by time ascending, hydrated.
    async fn list_reservations(&self) -> StorageResult<Vec<Reservation>>;

    /// Number of active reservations claiming the exact slot.
    async fn count_reservations_for(
        &self,
        table: TableNumber,
        at: NaiveDateTime,
    ) -> StorageResult<i64>;
}

/// One atomic unit of work against the datastore.
#[async_trait]
pub trait GatewayTransaction: Send {
    async fn load_table(&mut self, number: TableNumber) -> StorageResult<Option<Table>>;

    async fn save_table(&mut self, table: &Table) -> StorageResult<()>;

    async fn save_client(&mut self, client: &Client) -> StorageResult<ClientId>;

    async fn find_reservation(&mut self, id: ReservationId)
        -> StorageResult<Option<Reservation>>;

    async fn count_reservations_for(
        &mut self,
        table: TableNumber,
        at: NaiveDateTime,
    ) -> StorageResult<i64>;

    /// Inserts the reservation record and returns its generated id.
    async fn insert_reservation(
        &mut self,
        reservation: &NewReservation,
    ) -> StorageResult<ReservationId>;

    /// Deletes a reservation record. Returns false if no record matched.
    async fn delete_reservation(&mut self, id: ReservationId) -> StorageResult<bool>;

    /// Makes every write in this scope durable and visible.
    async fn commit(self: Box<Self>) -> StorageResult<()>;

    /// Discards every write in this scope.
    async fn rollback(self: Box<Self>) -> StorageResult<()>;
}
