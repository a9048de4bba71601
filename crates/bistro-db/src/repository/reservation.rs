//! # Reservation Repository
//!
//! Database operations for reservations.
//!
//! ## Hydration
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  reservations r ─┬─ JOIN clients c ON c.id = r.client_id               │
//! │                  └─ JOIN tables  t ON t.numeral = r.table_numeral      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ReservationRow (flat, prefixed columns)                               │
//! │       │  TryFrom                                                        │
//! │       ▼                                                                 │
//! │  Reservation { id, client: Client, table: Table, reserved_for }        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A reservation is never returned without its client and table. The
//! `idx_reservations_slot` unique index rejects a second reservation for
//! the same table and instant; that failure reaches callers as
//! [`DbError::UniqueViolation`].

use chrono::NaiveDateTime;
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use super::column_u32;
use crate::error::{DbError, DbResult};
use bistro_core::{
    Client, ClientId, ClientRecord, NewReservation, Reservation, ReservationId, Table,
    TableNumber, TableRecord,
};

/// One joined reservation row.
#[derive(Debug, sqlx::FromRow)]
struct ReservationRow {
    id: i64,
    reserved_for: NaiveDateTime,
    client_id: i64,
    client_name: String,
    client_phone: String,
    client_discount: Option<f64>,
    table_numeral: i64,
    table_capacity: i64,
    table_occupied: bool,
    table_vip: bool,
    table_exclusive_view: Option<bool>,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = DbError;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        let client = Client::try_from(ClientRecord {
            id: Some(ClientId::new(row.client_id)),
            name: row.client_name,
            phone: row.client_phone,
            discount: row.client_discount,
        })?;

        let table = Table::try_from(TableRecord {
            number: column_u32("tables.numeral", row.table_numeral)?,
            capacity: column_u32("tables.capacity", row.table_capacity)?,
            occupied: row.table_occupied,
            vip: row.table_vip,
            exclusive_view: row.table_exclusive_view,
        })?;

        let reservation =
            Reservation::restore(ReservationId::new(row.id), client, table, row.reserved_for)?;
        Ok(reservation)
    }
}

const HYDRATED_SELECT: &str = r#"
    SELECT
        r.id,
        r.reserved_for,
        c.id AS client_id,
        c.name AS client_name,
        c.phone AS client_phone,
        c.discount AS client_discount,
        t.numeral AS table_numeral,
        t.capacity AS table_capacity,
        t.occupied AS table_occupied,
        t.vip AS table_vip,
        t.exclusive_view AS table_exclusive_view
    FROM reservations r
    INNER JOIN clients c ON c.id = r.client_id
    INNER JOIN tables t ON t.numeral = r.table_numeral
"#;

// =============================================================================
// Queries
// =============================================================================

pub(crate) async fn fetch<'e, E>(executor: E, id: ReservationId) -> DbResult<Option<Reservation>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("{HYDRATED_SELECT} WHERE r.id = ?1");
    let row = sqlx::query_as::<_, ReservationRow>(&sql)
        .bind(id.get())
        .fetch_optional(executor)
        .await?;

    row.map(Reservation::try_from).transpose()
}

/// All reservations ordered by time ascending. Ties keep insertion order.
pub(crate) async fn list<'e, E>(executor: E) -> DbResult<Vec<Reservation>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("{HYDRATED_SELECT} ORDER BY r.reserved_for ASC, r.id ASC");
    let rows = sqlx::query_as::<_, ReservationRow>(&sql)
        .fetch_all(executor)
        .await?;

    debug!(count = rows.len(), "Listed reservations");
    rows.into_iter().map(Reservation::try_from).collect()
}

/// Number of reservations claiming exactly `(table, at)`.
pub(crate) async fn count_for<'e, E>(
    executor: E,
    table: TableNumber,
    at: NaiveDateTime,
) -> DbResult<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM reservations WHERE table_numeral = ?1 AND reserved_for = ?2",
    )
    .bind(i64::from(table.get()))
    .bind(at)
    .fetch_one(executor)
    .await?;

    Ok(count)
}

/// Inserts the reservation record and returns the generated id.
///
/// ## Errors
/// * `DbError::UniqueViolation` - The slot is already taken
/// * `DbError::ForeignKeyViolation` - Client or table row missing
pub(crate) async fn insert<'e, E>(executor: E, reservation: &NewReservation) -> DbResult<ReservationId>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO reservations (client_id, table_numeral, reserved_for)
        VALUES (?1, ?2, ?3)
        RETURNING id
        "#,
    )
    .bind(reservation.client_id().get())
    .bind(i64::from(reservation.table_number().get()))
    .bind(reservation.reserved_for())
    .fetch_one(executor)
    .await?;

    debug!(
        reservation_id = id,
        table = %reservation.table_number(),
        "Inserted reservation"
    );
    Ok(ReservationId::new(id))
}

/// Deletes a reservation. Returns false if no row matched.
pub(crate) async fn delete<'e, E>(executor: E, id: ReservationId) -> DbResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM reservations WHERE id = ?1")
        .bind(id.get())
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Repository
// =============================================================================

/// Pool-bound, read-only reservation access.
///
/// Writes go through a [`SqliteTransaction`](crate::SqliteTransaction) so
/// the table flag and the reservation row always change together.
#[derive(Debug, Clone)]
pub struct ReservationRepository {
    pool: SqlitePool,
}

impl ReservationRepository {
    /// Creates a new ReservationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReservationRepository { pool }
    }

    /// Gets a hydrated reservation by id.
    pub async fn get_by_id(&self, id: ReservationId) -> DbResult<Option<Reservation>> {
        fetch(&self.pool, id).await
    }

    /// All reservations ordered by time ascending.
    pub async fn list(&self) -> DbResult<Vec<Reservation>> {
        list(&self.pool).await
    }

    /// Number of reservations claiming exactly `(table, at)`.
    pub async fn count_for(&self, table: TableNumber, at: NaiveDateTime) -> DbResult<i64> {
        count_for(&self.pool, table, at).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
