//! # Booking Engine
//!
//! Decides whether a booking is admissible and keeps table occupancy
//! consistent with the set of active reservations.
//!
//! ## Booking Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  book(client, table, when)                                              │
//! │   1. validate numeral + future time ─────────────── no storage touched  │
//! │   ┌─ lock table ─────────────────────────────────────────────────────┐  │
//! │   │ ┌─ begin ────────────────────────────────────────────────────┐   │  │
//! │   │ │ 2. load table            absent   → NotFound               │   │  │
//! │   │ │ 3. occupied?             yes      → Conflict(TableOccupied)│   │  │
//! │   │ │ 4. slot already claimed? yes      → Conflict(DuplicateSlot)│   │  │
//! │   │ │ 5. save client (id assigned if new)                        │   │  │
//! │   │ │ 6. insert reservation + save table occupied                │   │  │
//! │   │ └─ commit (any error above → rollback) ──────────────────────┘   │  │
//! │   └──────────────────────────────────────────────────────────────────┘  │
//! │   7. return committed Reservation                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Cancellation Flow
//! ```text
//! cancel(id)
//!   1. find reservation (to learn its table)  absent → NotFound
//!   lock table, begin
//!     re-read reservation inside the transaction (a concurrent cancel may
//!     have won)                               absent → NotFound
//!   2. delete reservation
//!   3. save table released
//!   commit (any error → rollback)
//! ```
//!
//! Occupancy is whole-table: a table backing any active reservation blocks
//! new bookings at every time. The engine never retries; storage failures
//! reach the caller as [`BookingError::Storage`].

use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{debug, error, info, warn};

use bistro_core::validation::validate_booking_time;
use bistro_core::{
    BookingError, BookingResult, Client, ConflictReason, GatewayTransaction, NewReservation,
    PersistenceGateway, Reservation, ReservationId, StorageError, Table, TableNumber,
};

use crate::clock::{Clock, SystemClock};
use crate::locks::TableLocks;
use crate::query::ReservationQueries;

/// The reservation core.
///
/// One engine is shared by every caller; it is `Send + Sync` and all
/// methods take `&self`.
pub struct BookingEngine {
    gateway: Arc<dyn PersistenceGateway>,
    queries: ReservationQueries,
    locks: TableLocks,
    clock: Arc<dyn Clock>,
}

impl BookingEngine {
    /// Creates an engine that validates against the host clock.
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self::with_clock(gateway, Arc::new(SystemClock))
    }

    pub fn with_clock(gateway: Arc<dyn PersistenceGateway>, clock: Arc<dyn Clock>) -> Self {
        BookingEngine {
            queries: ReservationQueries::new(gateway.clone()),
            gateway,
            locks: TableLocks::new(),
            clock,
        }
    }

    /// Read-only queries over the same gateway.
    pub fn queries(&self) -> &ReservationQueries {
        &self.queries
    }

    // =========================================================================
    // Booking
    // =========================================================================

    /// Books `table` for `client` at `when`.
    ///
    /// ## Arguments
    /// * `client` - New (no id) or existing client; saved as part of the booking
    /// * `table` - Table numeral, 1..=20
    /// * `when` - Local wall-clock time, strictly after now
    ///
    /// ## Returns
    /// * `Ok(Reservation)` - Committed; the table is now occupied
    /// * `Err(Validation)` - Bad numeral or time; storage was not touched
    /// * `Err(NotFound)` - No table with this numeral
    /// * `Err(Conflict)` - Table occupied, or the slot is already claimed
    /// * `Err(Storage)` - Nothing was committed
    pub async fn book(
        &self,
        client: Client,
        table: u32,
        when: NaiveDateTime,
    ) -> BookingResult<Reservation> {
        let number = TableNumber::new(table)?;
        let now = self.clock.now();
        validate_booking_time(when, now)?;

        debug!(table = %number, at = %when, client = %client.name(), "Booking requested");

        let _guard = self.locks.acquire(number).await;
        let mut tx = self.gateway.begin().await?;

        match book_in(&mut tx, client, number, when, now).await {
            Ok(reservation) => {
                tx.commit().await.map_err(|e| storage_failure("book", e))?;
                info!(
                    reservation_id = %reservation.id(),
                    table = %number,
                    at = %when,
                    "Reservation booked"
                );
                Ok(reservation)
            }
            Err(e) => {
                abandon(tx, "book").await;
                log_rejection("book", &e);
                Err(e)
            }
        }
    }

    // =========================================================================
    // Cancellation
    // =========================================================================

    /// Cancels a reservation and frees its table.
    ///
    /// ## Returns
    /// * `Ok(Reservation)` - The reservation as it was before deletion
    /// * `Err(NotFound)` - Unknown id; nothing changed
    /// * `Err(Storage)` - Nothing was committed
    pub async fn cancel(&self, id: ReservationId) -> BookingResult<Reservation> {
        let number = self
            .gateway
            .find_reservation(id)
            .await?
            .ok_or_else(|| BookingError::not_found("reservation", id))?
            .table_number();

        debug!(reservation_id = %id, table = %number, "Cancellation requested");

        let _guard = self.locks.acquire(number).await;
        let mut tx = self.gateway.begin().await?;

        match cancel_in(&mut tx, id, number).await {
            Ok(cancelled) => {
                tx.commit().await.map_err(|e| storage_failure("cancel", e))?;
                info!(reservation_id = %id, table = %number, "Reservation cancelled");
                Ok(cancelled)
            }
            Err(e) => {
                abandon(tx, "cancel").await;
                log_rejection("cancel", &e);
                Err(e)
            }
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// All active reservations ordered by time ascending.
    pub async fn list(&self) -> BookingResult<Vec<Reservation>> {
        self.queries.list().await
    }

    /// Case-insensitive client-name search, ordered by time ascending.
    pub async fn search_by_client_name(&self, fragment: &str) -> BookingResult<Vec<Reservation>> {
        self.queries.search_by_client_name(fragment).await
    }

    pub async fn list_available_tables(&self) -> BookingResult<Vec<Table>> {
        self.queries.list_available_tables().await
    }
}

// =============================================================================
// Transaction Bodies
// =============================================================================

async fn book_in(
    tx: &mut Box<dyn GatewayTransaction>,
    mut client: Client,
    number: TableNumber,
    when: NaiveDateTime,
    now: NaiveDateTime,
) -> BookingResult<Reservation> {
    let mut table = tx
        .load_table(number)
        .await?
        .ok_or_else(|| BookingError::not_found("table", number))?;

    if table.is_occupied() {
        return Err(ConflictReason::TableOccupied { table: number }.into());
    }

    // Catches a stale occupancy flag.
    if tx.count_reservations_for(number, when).await? > 0 {
        return Err(ConflictReason::DuplicateSlot { table: number, at: when }.into());
    }

    let client_id = tx.save_client(&client).await.map_err(|e| match e {
        StorageError::NotFound { id, .. } => BookingError::not_found("client", id),
        other => BookingError::Storage(other),
    })?;
    client.assign_id(client_id);

    table.occupy()?;
    let pending = NewReservation::new(client, table, when, now)?;

    let id = tx
        .insert_reservation(&pending)
        .await
        .map_err(|e| match e {
            StorageError::UniqueViolation(_) => {
                BookingError::Conflict(ConflictReason::DuplicateSlot { table: number, at: when })
            }
            other => BookingError::Storage(other),
        })?;
    tx.save_table(pending.table()).await?;

    Ok(pending.into_reservation(id))
}

async fn cancel_in(
    tx: &mut Box<dyn GatewayTransaction>,
    id: ReservationId,
    number: TableNumber,
) -> BookingResult<Reservation> {
    let existing = tx
        .find_reservation(id)
        .await?
        .ok_or_else(|| BookingError::not_found("reservation", id))?;

    if !tx.delete_reservation(id).await? {
        return Err(BookingError::not_found("reservation", id));
    }

    let mut table = tx
        .load_table(number)
        .await?
        .ok_or_else(|| BookingError::not_found("table", number))?;
    if !table.release() {
        warn!(table = %number, reservation_id = %id, "Cancelled reservation on a table not marked occupied");
    }
    tx.save_table(&table).await?;

    Ok(existing)
}

// =============================================================================
// Helpers
// =============================================================================

/// Rolls back after a failed body. A failed rollback is logged, not raised;
/// the caller gets the original error.
async fn abandon(tx: Box<dyn GatewayTransaction>, op: &'static str) {
    if let Err(e) = tx.rollback().await {
        error!(op = op, error = %e, "Rollback failed");
    }
}

fn storage_failure(op: &'static str, e: StorageError) -> BookingError {
    error!(op = op, error = %e, "Commit failed");
    BookingError::Storage(e)
}

fn log_rejection(op: &'static str, e: &BookingError) {
    match e {
        BookingError::Storage(inner) => error!(op = op, error = %inner, "Storage failure"),
        other => warn!(op = op, reason = %other, "Request rejected"),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::memory::MemoryGateway;
    use bistro_core::{default_floor_plan, ClientId, ValidationError};
    use chrono::{Duration, NaiveDate};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn ana() -> Client {
        Client::regular("Ana Silva", "11999999999").unwrap()
    }

    fn setup() -> (Arc<MemoryGateway>, BookingEngine) {
        let gateway = Arc::new(MemoryGateway::with_tables(default_floor_plan()));
        let engine = BookingEngine::with_clock(gateway.clone(), Arc::new(FixedClock(now())));
        (gateway, engine)
    }

    #[tokio::test]
    async fn test_book_occupies_table() {
        let (gateway, engine) = setup();
        let at = now() + Duration::days(1);

        let reservation = engine.book(ana(), 1, at).await.unwrap();
        assert!(reservation.client().id().is_some());
        assert!(reservation.table().is_occupied());
        assert_eq!(reservation.reserved_for(), at);

        let one = TableNumber::new(1).unwrap();
        assert!(gateway.load_table(one).await.unwrap().unwrap().is_occupied());
    }

    #[tokio::test]
    async fn test_occupied_table_conflicts_at_any_time() {
        let (_, engine) = setup();
        engine.book(ana(), 1, now() + Duration::days(1)).await.unwrap();

        for offset in [Duration::hours(1), Duration::days(1), Duration::days(30)] {
            let err = engine.book(ana(), 1, now() + offset).await.unwrap_err();
            assert!(matches!(
                err,
                BookingError::Conflict(ConflictReason::TableOccupied { .. })
            ));
        }
        assert_eq!(engine.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_validation_happens_before_storage() {
        let (gateway, engine) = setup();

        let err = engine.book(ana(), 21, now() + Duration::days(1)).await.unwrap_err();
        assert!(matches!(err, BookingError::Validation(ValidationError::OutOfRange { .. })));

        let err = engine.book(ana(), 0, now() + Duration::days(1)).await.unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));

        let err = engine.book(ana(), 1, now()).await.unwrap_err();
        assert!(matches!(err, BookingError::Validation(ValidationError::NotInFuture { .. })));

        let err = engine.book(ana(), 1, now() - Duration::minutes(1)).await.unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));

        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_table_is_not_found() {
        let (_, engine) = setup();
        // 15 is a valid numeral but not on the default floor plan
        let err = engine.book(ana(), 15, now() + Duration::days(1)).await.unwrap_err();
        assert!(matches!(err, BookingError::NotFound { entity: "table", .. }));
        assert!(engine.queries().list_clients().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stale_flag_caught_as_duplicate_slot() {
        let (gateway, engine) = setup();
        let at = now() + Duration::days(1);
        let first = engine.book(ana(), 2, at).await.unwrap();

        // Clear the flag behind the engine's back.
        let mut table = first.table().clone();
        table.release();
        gateway.save_table(&table).await.unwrap();

        let err = engine.book(ana(), 2, at).await.unwrap_err();
        match err {
            BookingError::Conflict(ConflictReason::DuplicateSlot { table, at: slot }) => {
                assert_eq!(table.get(), 2);
                assert_eq!(slot, at);
            }
            other => panic!("expected duplicate slot, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_failed_table_save_rolls_back_booking() {
        let (gateway, engine) = setup();
        gateway.fail_table_saves(true);

        let err = engine.book(ana(), 3, now() + Duration::days(1)).await.unwrap_err();
        assert!(err.is_retryable());

        gateway.fail_table_saves(false);
        assert!(engine.list().await.unwrap().is_empty());
        assert!(engine.queries().list_clients().await.unwrap().is_empty());
        assert_eq!(engine.list_available_tables().await.unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_cancel_frees_table() {
        let (_, engine) = setup();
        let booked = engine.book(ana(), 4, now() + Duration::days(1)).await.unwrap();

        let cancelled = engine.cancel(booked.id()).await.unwrap();
        assert_eq!(cancelled.id(), booked.id());

        assert!(engine.list().await.unwrap().is_empty());
        let tables = engine.list_available_tables().await.unwrap();
        assert!(tables.iter().any(|t| t.number().get() == 4));

        // Freed table can be booked again.
        engine.book(ana(), 4, now() + Duration::days(2)).await.unwrap();
    }

    #[tokio::test]
    async fn test_cancel_unknown_changes_nothing() {
        let (gateway, engine) = setup();
        engine.book(ana(), 5, now() + Duration::days(1)).await.unwrap();
        let before = engine.list().await.unwrap();

        let err = engine.cancel(ReservationId::new(999)).await.unwrap_err();
        assert!(matches!(err, BookingError::NotFound { entity: "reservation", .. }));

        assert_eq!(engine.list().await.unwrap(), before);
        let five = TableNumber::new(5).unwrap();
        assert!(gateway.load_table(five).await.unwrap().unwrap().is_occupied());
    }

    #[tokio::test]
    async fn test_failed_release_keeps_reservation() {
        let (gateway, engine) = setup();
        let booked = engine.book(ana(), 6, now() + Duration::days(1)).await.unwrap();

        gateway.fail_table_saves(true);
        let err = engine.cancel(booked.id()).await.unwrap_err();
        assert!(matches!(err, BookingError::Storage(_)));
        gateway.fail_table_saves(false);

        assert_eq!(engine.list().await.unwrap().len(), 1);
        let six = TableNumber::new(6).unwrap();
        assert!(gateway.load_table(six).await.unwrap().unwrap().is_occupied());
    }

    #[tokio::test]
    async fn test_returning_client_keeps_id() {
        let (_, engine) = setup();
        let first = engine.book(ana(), 7, now() + Duration::days(1)).await.unwrap();
        let returning = first.client().clone();

        let second = engine.book(returning, 8, now() + Duration::days(1)).await.unwrap();
        assert_eq!(second.client().id(), first.client().id());
        assert_eq!(engine.queries().list_clients().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_client_id_without_record_is_not_found() {
        let (gateway, engine) = setup();
        let ghost = ana().with_id(ClientId::new(999));

        let err = engine.book(ghost, 1, now() + Duration::days(1)).await.unwrap_err();
        match err {
            BookingError::NotFound { entity, id } => {
                assert_eq!(entity, "client");
                assert_eq!(id, "999");
            }
            other => panic!("expected client not found, got {other}"),
        }

        let one = TableNumber::new(1).unwrap();
        assert!(gateway.load_table(one).await.unwrap().unwrap().is_available());
        assert!(engine.list().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_bookings_single_winner() {
        let (_, engine) = setup();
        let engine = Arc::new(engine);
        let at = now() + Duration::days(1);

        let attempts: Vec<_> = (0..16)
            .map(|i| {
                let engine = engine.clone();
                tokio::spawn(async move {
                    let client = Client::regular(format!("Guest {i}"), "11999999999").unwrap();
                    engine.book(client, 9, at + Duration::minutes(i)).await
                })
            })
            .collect();

        let mut wins = 0;
        let mut conflicts = 0;
        for attempt in attempts {
            match attempt.await.unwrap() {
                Ok(_) => wins += 1,
                Err(BookingError::Conflict(_)) => conflicts += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(wins, 1);
        assert_eq!(conflicts, 15);
        assert_eq!(engine.list().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_cancels_single_winner() {
        let (gateway, engine) = setup();
        let engine = Arc::new(engine);
        let booked = engine.book(ana(), 4, now() + Duration::days(1)).await.unwrap();

        let attempts: Vec<_> = (0..8)
            .map(|_| {
                let engine = engine.clone();
                let id = booked.id();
                tokio::spawn(async move { engine.cancel(id).await })
            })
            .collect();

        let mut wins = 0;
        let mut missing = 0;
        for attempt in attempts {
            match attempt.await.unwrap() {
                Ok(_) => wins += 1,
                Err(BookingError::NotFound { entity: "reservation", .. }) => missing += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(wins, 1);
        assert_eq!(missing, 7);
        assert!(engine.list().await.unwrap().is_empty());
        let four = TableNumber::new(4).unwrap();
        assert!(gateway.load_table(four).await.unwrap().unwrap().is_available());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_interleaved_book_and_cancel_keep_occupancy_consistent() {
        let (gateway, engine) = setup();
        let engine = Arc::new(engine);
        let three = TableNumber::new(3).unwrap();
        let first = engine.book(ana(), 3, now() + Duration::days(1)).await.unwrap();

        let attempts: Vec<_> = (1..=12i64)
            .map(|i| {
                let engine = engine.clone();
                let first_id = first.id();
                tokio::spawn(async move {
                    if i % 2 == 0 {
                        // Cancels walk the ids successive bookings receive.
                        let target = ReservationId::new(first_id.get() + i / 2 - 1);
                        engine.cancel(target).await.map(|_| ())
                    } else {
                        let client = Client::regular(format!("Guest {i}"), "11999999999").unwrap();
                        engine
                            .book(client, 3, now() + Duration::days(1) + Duration::minutes(i))
                            .await
                            .map(|_| ())
                    }
                })
            })
            .collect();

        for attempt in attempts {
            match attempt.await.unwrap() {
                Ok(())
                | Err(BookingError::Conflict(_))
                | Err(BookingError::NotFound { entity: "reservation", .. }) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        let on_three = engine
            .list()
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.table_number() == three)
            .count();
        let occupied = gateway.load_table(three).await.unwrap().unwrap().is_occupied();

        assert!(on_three <= 1);
        assert_eq!(occupied, on_three == 1);
    }
}
