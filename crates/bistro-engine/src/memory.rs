//! # In-Memory Gateway
//!
//! A process-local [`PersistenceGateway`] for tests and demos.
//!
//! ## Transaction Model
//! ```text
//! begin() ──► lock shared State (OwnedMutexGuard) ──► clone into working copy
//!                 │
//!                 ├── reads/writes hit the working copy only
//!                 │
//!                 ├── commit()   ──► *guard = working ──► unlock
//!                 └── rollback() / drop ──► working discarded ──► unlock
//! ```
//!
//! One transaction runs at a time, like a single SQLite writer. The shared
//! methods also take the state lock, so calling them while holding a
//! transaction waits forever; see the rules on [`PersistenceGateway`].
//!
//! The slot index from the SQL schema is enforced here too: inserting a
//! second reservation for the same `(table, time)` fails with
//! [`StorageError::UniqueViolation`].

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use tokio::sync::{Mutex, OwnedMutexGuard};

use bistro_core::{
    Client, ClientId, GatewayTransaction, NewReservation, PersistenceGateway, Reservation,
    ReservationId, StorageError, StorageResult, Table, TableNumber,
};

/// A reservation row: references only, hydrated on read.
#[derive(Debug, Clone)]
struct StoredReservation {
    client_id: ClientId,
    table: TableNumber,
    reserved_for: NaiveDateTime,
}

#[derive(Debug, Clone, Default)]
struct State {
    clients: BTreeMap<ClientId, Client>,
    tables: BTreeMap<TableNumber, Table>,
    reservations: BTreeMap<ReservationId, StoredReservation>,
    last_client_id: i64,
    last_reservation_id: i64,
}

impl State {
    fn save_client(&mut self, client: &Client) -> StorageResult<ClientId> {
        let id = match client.id() {
            Some(id) if self.clients.contains_key(&id) => id,
            Some(id) => {
                return Err(StorageError::NotFound {
                    entity: "Client".to_string(),
                    id: id.to_string(),
                })
            }
            None => {
                self.last_client_id += 1;
                ClientId::new(self.last_client_id)
            }
        };
        self.clients.insert(id, client.clone().with_id(id));
        Ok(id)
    }

    fn count_for(&self, table: TableNumber, at: NaiveDateTime) -> i64 {
        self.reservations
            .values()
            .filter(|r| r.table == table && r.reserved_for == at)
            .count() as i64
    }

    fn hydrate(&self, id: ReservationId, stored: &StoredReservation) -> StorageResult<Reservation> {
        let client = self.clients.get(&stored.client_id).cloned().ok_or_else(|| {
            StorageError::Corrupt(format!("reservation {id} references missing client"))
        })?;
        let table = self.tables.get(&stored.table).cloned().ok_or_else(|| {
            StorageError::Corrupt(format!("reservation {id} references missing table"))
        })?;

        Reservation::restore(id, client, table, stored.reserved_for)
            .map_err(|e| StorageError::Corrupt(e.to_string()))
    }

    fn find(&self, id: ReservationId) -> StorageResult<Option<Reservation>> {
        self.reservations
            .get(&id)
            .map(|stored| self.hydrate(id, stored))
            .transpose()
    }

    fn list(&self) -> StorageResult<Vec<Reservation>> {
        let mut rows: Vec<_> = self.reservations.iter().collect();
        rows.sort_by_key(|(id, r)| (r.reserved_for, **id));
        rows.into_iter()
            .map(|(id, stored)| self.hydrate(*id, stored))
            .collect()
    }

    fn insert(&mut self, pending: &NewReservation) -> StorageResult<ReservationId> {
        if !self.clients.contains_key(&pending.client_id()) {
            return Err(StorageError::ForeignKeyViolation(
                "reservations.client_id".to_string(),
            ));
        }
        if !self.tables.contains_key(&pending.table_number()) {
            return Err(StorageError::ForeignKeyViolation(
                "reservations.table_numeral".to_string(),
            ));
        }
        if self.count_for(pending.table_number(), pending.reserved_for()) > 0 {
            return Err(StorageError::UniqueViolation(
                "reservations.table_numeral, reservations.reserved_for".to_string(),
            ));
        }

        self.last_reservation_id += 1;
        let id = ReservationId::new(self.last_reservation_id);
        self.reservations.insert(
            id,
            StoredReservation {
                client_id: pending.client_id(),
                table: pending.table_number(),
                reserved_for: pending.reserved_for(),
            },
        );
        Ok(id)
    }
}

/// Knobs shared between the gateway and its open transactions.
#[derive(Debug, Default)]
struct Faults {
    fail_table_saves: AtomicBool,
}

impl Faults {
    fn check_table_save(&self) -> StorageResult<()> {
        if self.fail_table_saves.load(Ordering::SeqCst) {
            return Err(StorageError::TransactionAborted(
                "injected table save failure".to_string(),
            ));
        }
        Ok(())
    }
}

/// In-memory storage for development and testing.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    state: Arc<Mutex<State>>,
    faults: Arc<Faults>,
    calls: AtomicUsize,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway pre-loaded with the given tables.
    pub fn with_tables(tables: impl IntoIterator<Item = Table>) -> Self {
        let mut state = State::default();
        for table in tables {
            state.tables.insert(table.number(), table);
        }

        MemoryGateway {
            state: Arc::new(Mutex::new(state)),
            ..Self::default()
        }
    }

    /// Makes every subsequent `save_table` fail with a retryable error.
    pub fn fail_table_saves(&self, fail: bool) {
        self.faults.fail_table_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of gateway calls made so far, `begin` included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    async fn begin(&self) -> StorageResult<Box<dyn GatewayTransaction>> {
        self.touch();
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();

        Ok(Box::new(MemoryTransaction {
            guard,
            working,
            faults: self.faults.clone(),
        }))
    }

    async fn load_table(&self, number: TableNumber) -> StorageResult<Option<Table>> {
        self.touch();
        Ok(self.state.lock().await.tables.get(&number).cloned())
    }

    async fn save_table(&self, table: &Table) -> StorageResult<()> {
        self.touch();
        self.faults.check_table_save()?;
        self.state
            .lock()
            .await
            .tables
            .insert(table.number(), table.clone());
        Ok(())
    }

    async fn list_tables(&self) -> StorageResult<Vec<Table>> {
        self.touch();
        Ok(self.state.lock().await.tables.values().cloned().collect())
    }

    async fn list_available_tables(&self) -> StorageResult<Vec<Table>> {
        self.touch();
        Ok(self
            .state
            .lock()
            .await
            .tables
            .values()
            .filter(|t| t.is_available())
            .cloned()
            .collect())
    }

    async fn load_client(&self, id: ClientId) -> StorageResult<Option<Client>> {
        self.touch();
        Ok(self.state.lock().await.clients.get(&id).cloned())
    }

    async fn save_client(&self, client: &Client) -> StorageResult<ClientId> {
        self.touch();
        self.state.lock().await.save_client(client)
    }

    async fn list_clients(&self) -> StorageResult<Vec<Client>> {
        self.touch();
        let mut clients: Vec<Client> = self.state.lock().await.clients.values().cloned().collect();
        clients.sort_by(|a, b| a.name().cmp(b.name()).then(a.id().cmp(&b.id())));
        Ok(clients)
    }

    async fn find_reservation(&self, id: ReservationId) -> StorageResult<Option<Reservation>> {
        self.touch();
        self.state.lock().await.find(id)
    }

    async fn list_reservations(&self) -> StorageResult<Vec<Reservation>> {
        self.touch();
        self.state.lock().await.list()
    }

    async fn count_reservations_for(
        &self,
        table: TableNumber,
        at: NaiveDateTime,
    ) -> StorageResult<i64> {
        self.touch();
        Ok(self.state.lock().await.count_for(table, at))
    }
}

/// Snapshot transaction over [`MemoryGateway`].
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<State>,
    working: State,
    faults: Arc<Faults>,
}

#[async_trait]
impl GatewayTransaction for MemoryTransaction {
    async fn load_table(&mut self, number: TableNumber) -> StorageResult<Option<Table>> {
        Ok(self.working.tables.get(&number).cloned())
    }

    async fn save_table(&mut self, table: &Table) -> StorageResult<()> {
        self.faults.check_table_save()?;
        self.working.tables.insert(table.number(), table.clone());
        Ok(())
    }

    async fn save_client(&mut self, client: &Client) -> StorageResult<ClientId> {
        self.working.save_client(client)
    }

    async fn find_reservation(
        &mut self,
        id: ReservationId,
    ) -> StorageResult<Option<Reservation>> {
        self.working.find(id)
    }

    async fn count_reservations_for(
        &mut self,
        table: TableNumber,
        at: NaiveDateTime,
    ) -> StorageResult<i64> {
        Ok(self.working.count_for(table, at))
    }

    async fn insert_reservation(
        &mut self,
        pending: &NewReservation,
    ) -> StorageResult<ReservationId> {
        self.working.insert(pending)
    }

    async fn delete_reservation(&mut self, id: ReservationId) -> StorageResult<bool> {
        Ok(self.working.reservations.remove(&id).is_some())
    }

    async fn commit(self: Box<Self>) -> StorageResult<()> {
        let MemoryTransaction {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StorageResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bistro_core::default_floor_plan;

    #[tokio::test]
    async fn test_uncommitted_writes_are_invisible() {
        let gateway = MemoryGateway::with_tables(default_floor_plan());

        let mut tx = gateway.begin().await.unwrap();
        tx.save_client(&Client::regular("Ana", "11999999999").unwrap())
            .await
            .unwrap();
        tx.rollback().await.unwrap();
        assert!(gateway.list_clients().await.unwrap().is_empty());

        let mut tx = gateway.begin().await.unwrap();
        let id = tx
            .save_client(&Client::regular("Ana", "11999999999").unwrap())
            .await
            .unwrap();
        tx.commit().await.unwrap();
        assert_eq!(gateway.load_client(id).await.unwrap().unwrap().name(), "Ana");
    }

    #[tokio::test]
    async fn test_injected_table_failure() {
        let gateway = MemoryGateway::with_tables(default_floor_plan());
        gateway.fail_table_saves(true);

        let table = Table::regular(1, 4).unwrap();
        let err = gateway.save_table(&table).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(gateway.calls(), 1);
    }
}
