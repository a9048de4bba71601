//! # Table Repository
//!
//! Database operations for dining tables.
//!
//! Tables are keyed by numeral, so the write path is a single upsert:
//! inserting a new numeral and updating an existing one are the same call.

use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use super::column_u32;
use crate::error::{DbError, DbResult};
use bistro_core::{Table, TableNumber, TableRecord};

/// Raw `tables` row.
#[derive(Debug, sqlx::FromRow)]
struct TableRow {
    numeral: i64,
    capacity: i64,
    occupied: bool,
    vip: bool,
    exclusive_view: Option<bool>,
}

impl TryFrom<TableRow> for Table {
    type Error = DbError;

    fn try_from(row: TableRow) -> Result<Self, Self::Error> {
        let table = Table::try_from(TableRecord {
            number: column_u32("tables.numeral", row.numeral)?,
            capacity: column_u32("tables.capacity", row.capacity)?,
            occupied: row.occupied,
            vip: row.vip,
            exclusive_view: row.exclusive_view,
        })?;
        Ok(table)
    }
}

const TABLE_COLUMNS: &str = "numeral, capacity, occupied, vip, exclusive_view";

// =============================================================================
// Queries
// =============================================================================

pub(crate) async fn fetch<'e, E>(executor: E, number: TableNumber) -> DbResult<Option<Table>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {TABLE_COLUMNS} FROM tables WHERE numeral = ?1");
    let row = sqlx::query_as::<_, TableRow>(&sql)
        .bind(i64::from(number.get()))
        .fetch_optional(executor)
        .await?;

    row.map(Table::try_from).transpose()
}

/// Inserts the table, or overwrites every column of the row with its numeral.
pub(crate) async fn upsert<'e, E>(executor: E, table: &Table) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let record = TableRecord::from(table.clone());

    sqlx::query(
        r#"
        INSERT INTO tables (numeral, capacity, occupied, vip, exclusive_view)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT (numeral) DO UPDATE SET
            capacity = excluded.capacity,
            occupied = excluded.occupied,
            vip = excluded.vip,
            exclusive_view = excluded.exclusive_view
        "#,
    )
    .bind(i64::from(record.number))
    .bind(i64::from(record.capacity))
    .bind(record.occupied)
    .bind(record.vip)
    .bind(record.exclusive_view)
    .execute(executor)
    .await?;

    debug!(table = record.number, occupied = record.occupied, "Saved table");
    Ok(())
}

pub(crate) async fn list<'e, E>(executor: E) -> DbResult<Vec<Table>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {TABLE_COLUMNS} FROM tables ORDER BY numeral");
    let rows = sqlx::query_as::<_, TableRow>(&sql)
        .fetch_all(executor)
        .await?;

    rows.into_iter().map(Table::try_from).collect()
}

pub(crate) async fn list_available<'e, E>(executor: E) -> DbResult<Vec<Table>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {TABLE_COLUMNS} FROM tables WHERE occupied = 0 ORDER BY numeral");
    let rows = sqlx::query_as::<_, TableRow>(&sql)
        .fetch_all(executor)
        .await?;

    rows.into_iter().map(Table::try_from).collect()
}

// =============================================================================
// Repository
// =============================================================================

/// Pool-bound table operations.
#[derive(Debug, Clone)]
pub struct TableRepository {
    pool: SqlitePool,
}

impl TableRepository {
    /// Creates a new TableRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TableRepository { pool }
    }

    /// Gets a table by numeral.
    pub async fn get(&self, number: TableNumber) -> DbResult<Option<Table>> {
        fetch(&self.pool, number).await
    }

    /// Inserts or overwrites a table keyed by numeral.
    pub async fn save(&self, table: &Table) -> DbResult<()> {
        upsert(&self.pool, table).await
    }

    /// All tables ordered by numeral.
    pub async fn list(&self) -> DbResult<Vec<Table>> {
        list(&self.pool).await
    }

    /// Unoccupied tables ordered by numeral.
    pub async fn list_available(&self) -> DbResult<Vec<Table>> {
        list_available(&self.pool).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
