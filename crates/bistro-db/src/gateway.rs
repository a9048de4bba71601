//! # SQLite Persistence Gateway
//!
//! Implements the core [`PersistenceGateway`] contract on top of
//! [`Database`].
//!
//! ## Transaction Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  gateway.begin()                                                        │
//! │       │  pool.begin()  +  claim write lock                              │
//! │       ▼                                                                 │
//! │  SqliteTransaction { tx: sqlx::Transaction<'static, Sqlite> }          │
//! │       │                                                                 │
//! │       ├── load_table / save_table / ... ──► repository fns (&mut *tx)  │
//! │       │                                                                 │
//! │       ├── commit()   ──► COMMIT                                         │
//! │       ├── rollback() ──► ROLLBACK                                       │
//! │       └── dropped    ──► ROLLBACK (sqlx drop guard)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every [`DbError`] is converted into a driver-agnostic [`StorageError`]
//! at this boundary.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::Sqlite;
use tracing::{debug, warn};

use crate::error::DbError;
use crate::pool::Database;
use crate::repository::{client, reservation, table};
use bistro_core::{
    Client, ClientId, GatewayTransaction, NewReservation, PersistenceGateway, Reservation,
    ReservationId, StorageError, StorageResult, Table, TableNumber,
};

fn storage(err: impl Into<DbError>) -> StorageError {
    StorageError::from(err.into())
}

#[async_trait]
impl PersistenceGateway for Database {
    async fn begin(&self) -> StorageResult<Box<dyn GatewayTransaction>> {
        let mut tx = self.pool().begin().await.map_err(storage)?;

        // Claim the write lock now; a deferred read-to-write upgrade fails
        // with SQLITE_BUSY instead of waiting on busy_timeout.
        sqlx::query("UPDATE tables SET occupied = occupied WHERE 0")
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

        debug!("Opened storage transaction");
        Ok(Box::new(SqliteTransaction { tx }))
    }

    async fn load_table(&self, number: TableNumber) -> StorageResult<Option<Table>> {
        Ok(table::fetch(self.pool(), number).await?)
    }

    async fn save_table(&self, t: &Table) -> StorageResult<()> {
        Ok(table::upsert(self.pool(), t).await?)
    }

    async fn list_tables(&self) -> StorageResult<Vec<Table>> {
        Ok(table::list(self.pool()).await?)
    }

    async fn list_available_tables(&self) -> StorageResult<Vec<Table>> {
        Ok(table::list_available(self.pool()).await?)
    }

    async fn load_client(&self, id: ClientId) -> StorageResult<Option<Client>> {
        Ok(client::fetch(self.pool(), id).await?)
    }

    async fn save_client(&self, c: &Client) -> StorageResult<ClientId> {
        Ok(client::save(self.pool(), c).await?)
    }

    async fn list_clients(&self) -> StorageResult<Vec<Client>> {
        Ok(client::list(self.pool()).await?)
    }

    async fn find_reservation(&self, id: ReservationId) -> StorageResult<Option<Reservation>> {
        Ok(reservation::fetch(self.pool(), id).await?)
    }

    async fn list_reservations(&self) -> StorageResult<Vec<Reservation>> {
        Ok(reservation::list(self.pool()).await?)
    }

    async fn count_reservations_for(
        &self,
        number: TableNumber,
        at: NaiveDateTime,
    ) -> StorageResult<i64> {
        Ok(reservation::count_for(self.pool(), number, at).await?)
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// An open SQLite transaction handed out by [`Database::begin`].
///
/// [`Database::begin`]: PersistenceGateway::begin
pub struct SqliteTransaction {
    tx: sqlx::Transaction<'static, Sqlite>,
}

#[async_trait]
impl GatewayTransaction for SqliteTransaction {
    async fn load_table(&mut self, number: TableNumber) -> StorageResult<Option<Table>> {
        Ok(table::fetch(&mut *self.tx, number).await?)
    }

    async fn save_table(&mut self, t: &Table) -> StorageResult<()> {
        Ok(table::upsert(&mut *self.tx, t).await?)
    }

    async fn save_client(&mut self, c: &Client) -> StorageResult<ClientId> {
        Ok(client::save(&mut *self.tx, c).await?)
    }

    async fn find_reservation(
        &mut self,
        id: ReservationId,
    ) -> StorageResult<Option<Reservation>> {
        Ok(reservation::fetch(&mut *self.tx, id).await?)
    }

    async fn count_reservations_for(
        &mut self,
        number: TableNumber,
        at: NaiveDateTime,
    ) -> StorageResult<i64> {
        Ok(reservation::count_for(&mut *self.tx, number, at).await?)
    }

    async fn insert_reservation(
        &mut self,
        pending: &NewReservation,
    ) -> StorageResult<ReservationId> {
        Ok(reservation::insert(&mut *self.tx, pending).await?)
    }

    async fn delete_reservation(&mut self, id: ReservationId) -> StorageResult<bool> {
        Ok(reservation::delete(&mut *self.tx, id).await?)
    }

    async fn commit(self: Box<Self>) -> StorageResult<()> {
        self.tx.commit().await.map_err(|e| {
            warn!(error = %e, "Commit failed");
            StorageError::TransactionAborted(e.to_string())
        })?;
        debug!("Committed storage transaction");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StorageResult<()> {
        self.tx.rollback().await.map_err(storage)?;
        debug!("Rolled back storage transaction");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DbConfig;
    use chrono::{Duration, NaiveDate};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.seed_default_tables().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_commit_makes_writes_visible() {
        let db = seeded().await;
        let one = TableNumber::new(1).unwrap();

        let mut tx = db.begin().await.unwrap();
        let client_id = tx
            .save_client(&Client::regular("Ana", "11999999999").unwrap())
            .await
            .unwrap();
        let mut table = tx.load_table(one).await.unwrap().unwrap();
        table.occupy().unwrap();
        tx.save_table(&table).await.unwrap();

        let client = Client::regular("Ana", "11999999999").unwrap().with_id(client_id);
        let pending =
            NewReservation::new(client, table, now() + Duration::days(1), now()).unwrap();
        let id = tx.insert_reservation(&pending).await.unwrap();
        tx.commit().await.unwrap();

        let stored = db.find_reservation(id).await.unwrap().unwrap();
        assert!(stored.table().is_occupied());
        assert!(db.load_table(one).await.unwrap().unwrap().is_occupied());
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let db = seeded().await;
        let two = TableNumber::new(2).unwrap();

        let mut tx = db.begin().await.unwrap();
        let mut table = tx.load_table(two).await.unwrap().unwrap();
        table.occupy().unwrap();
        tx.save_table(&table).await.unwrap();
        tx.save_client(&Client::regular("Bruno", "21988887777").unwrap())
            .await
            .unwrap();
        tx.rollback().await.unwrap();

        assert!(db.load_table(two).await.unwrap().unwrap().is_available());
        assert!(db.list_clients().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let db = seeded().await;

        {
            let mut tx = db.begin().await.unwrap();
            tx.save_client(&Client::regular("Carla", "31977776666").unwrap())
                .await
                .unwrap();
        }

        assert!(db.list_clients().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_slot_maps_to_unique_violation() {
        let db = seeded().await;
        let at = now() + Duration::days(1);
        let client_id = db
            .save_client(&Client::regular("Ana", "11999999999").unwrap())
            .await
            .unwrap();
        let client = db.load_client(client_id).await.unwrap().unwrap();
        let table = db.load_table(TableNumber::new(3).unwrap()).await.unwrap().unwrap();
        let pending = NewReservation::new(client, table, at, now()).unwrap();

        let mut tx = db.begin().await.unwrap();
        tx.insert_reservation(&pending).await.unwrap();
        let err = tx.insert_reservation(&pending).await.unwrap_err();
        assert!(matches!(err, StorageError::UniqueViolation(_)));
        tx.rollback().await.unwrap();

        assert_eq!(
            db.count_reservations_for(pending.table_number(), at).await.unwrap(),
            0
        );
    }
}
