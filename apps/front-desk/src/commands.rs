//! # Front-Desk Commands
//!
//! One function per subcommand. Each returns an [`Output`] that `main`
//! renders as text or JSON; nothing here prints.
//!
//! ```text
//! front-desk book --name "Ana Silva" --phone 11999999999 --table 1 --at "02/03/2026 19:00"
//!      │
//!      ▼
//! Client::regular(..)?  parse_booking_time(..)?     ← ValidationError, no storage
//!      │
//!      ▼
//! engine.book(client, 1, when).await?               ← Conflict / NotFound / Storage
//!      │
//!      ▼
//! Output::Booked(reservation)
//! ```

use clap::Subcommand;
use serde::Serialize;
use tracing::debug;

use bistro_core::validation::parse_booking_time;
use bistro_core::{Client, Reservation, ReservationId, Table};
use bistro_db::Database;
use bistro_engine::BookingEngine;

use crate::error::AppError;

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List tables.
    Tables {
        /// Only tables that are not occupied.
        #[arg(long)]
        available: bool,
    },

    /// Book a table.
    Book {
        /// Client name.
        #[arg(long)]
        name: String,

        /// Client phone, 11 digits.
        #[arg(long)]
        phone: String,

        /// VIP discount percentage (0-100). Omit for a regular client.
        #[arg(long)]
        discount: Option<f64>,

        /// Table numeral (1-20).
        #[arg(long)]
        table: u32,

        /// Reservation time, "dd/mm/yyyy hh:mm" local time.
        #[arg(long)]
        at: String,
    },

    /// Cancel a reservation and free its table.
    Cancel {
        /// Reservation id.
        id: i64,
    },

    /// List active reservations by time.
    List,

    /// Find reservations by client name (case-insensitive).
    Search {
        /// Part of the client's name.
        text: String,
    },

    /// List clients by name.
    Clients,

    /// Install the default floor plan on an empty database.
    Seed,
}

/// Result of one command.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Output {
    Tables(Vec<Table>),
    Booked(Reservation),
    Cancelled(Reservation),
    Reservations(Vec<Reservation>),
    Clients(Vec<Client>),
    Seeded { tables: usize },
}

/// Runs one command against the engine.
pub async fn execute(
    command: Command,
    engine: &BookingEngine,
    db: &Database,
) -> Result<Output, AppError> {
    debug!(?command, "Executing command");

    let output = match command {
        Command::Tables { available } => {
            let tables = if available {
                engine.list_available_tables().await?
            } else {
                engine.queries().list_tables().await?
            };
            Output::Tables(tables)
        }
        Command::Book {
            name,
            phone,
            discount,
            table,
            at,
        } => {
            let client = match discount {
                Some(pct) => Client::vip(name, phone, pct)?,
                None => Client::regular(name, phone)?,
            };
            let when = parse_booking_time(&at)?;
            Output::Booked(engine.book(client, table, when).await?)
        }
        Command::Cancel { id } => Output::Cancelled(engine.cancel(ReservationId::new(id)).await?),
        Command::List => Output::Reservations(engine.list().await?),
        Command::Search { text } => Output::Reservations(engine.search_by_client_name(&text).await?),
        Command::Clients => Output::Clients(engine.queries().list_clients().await?),
        Command::Seed => Output::Seeded {
            tables: db.seed_default_tables().await?,
        },
    };

    Ok(output)
}

// =============================================================================
// Rendering
// =============================================================================

impl Output {
    pub fn to_json(&self) -> Result<String, AppError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_text(&self) -> String {
        match self {
            Output::Tables(tables) if tables.is_empty() => "no tables".to_string(),
            Output::Tables(tables) => lines(tables.iter().map(table_line)),
            Output::Booked(r) => format!("booked {}", reservation_line(r)),
            Output::Cancelled(r) => format!(
                "cancelled #{} (table {} is free again)",
                r.id(),
                r.table_number()
            ),
            Output::Reservations(list) if list.is_empty() => "no reservations".to_string(),
            Output::Reservations(list) => lines(list.iter().map(reservation_line)),
            Output::Clients(clients) if clients.is_empty() => "no clients".to_string(),
            Output::Clients(clients) => lines(clients.iter().map(client_line)),
            Output::Seeded { tables: 0 } => "floor plan already present".to_string(),
            Output::Seeded { tables } => format!("seeded {} tables", tables),
        }
    }
}

fn lines(items: impl Iterator<Item = String>) -> String {
    items.collect::<Vec<_>>().join("\n")
}

fn table_line(t: &Table) -> String {
    let mut line = format!(
        "table {:>2}  seats {:>2}  {:<9}",
        t.number().get(),
        t.capacity(),
        t.status().to_string()
    );
    if t.is_vip() {
        line.push_str("  VIP");
        if t.has_exclusive_view() {
            line.push_str(" (exclusive view)");
        }
    }
    line.trim_end().to_string()
}

fn reservation_line(r: &Reservation) -> String {
    format!(
        "#{}  {}  table {:>2}  {} ({})",
        r.id(),
        r.display_time(),
        r.table_number().get(),
        r.client().name(),
        r.client().phone()
    )
}

fn client_line(c: &Client) -> String {
    let id = c.id().map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
    match c.discount_pct() {
        Some(pct) => format!("#{}  {}  {}  VIP {}%", id, c.name(), c.phone(), pct),
        None => format!("#{}  {}  {}", id, c.name(), c.phone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use bistro_db::DbConfig;
    use bistro_engine::FixedClock;
    use chrono::NaiveDate;
    use std::sync::Arc;

    async fn setup() -> (Database, BookingEngine) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let engine = BookingEngine::with_clock(Arc::new(db.clone()), Arc::new(FixedClock(now)));
        (db, engine)
    }

    fn book(table: u32, at: &str) -> Command {
        Command::Book {
            name: "Ana Silva".to_string(),
            phone: "11999999999".to_string(),
            discount: None,
            table,
            at: at.to_string(),
        }
    }

    #[tokio::test]
    async fn test_seed_book_list_cancel() {
        let (db, engine) = setup().await;

        let seeded = execute(Command::Seed, &engine, &db).await.unwrap();
        assert_eq!(seeded.to_text(), "seeded 10 tables");

        let booked = execute(book(1, "02/03/2026 19:00"), &engine, &db).await.unwrap();
        assert_eq!(
            booked.to_text(),
            "booked #1  02/03/2026 19:00  table  1  Ana Silva (11999999999)"
        );

        let listed = execute(Command::List, &engine, &db).await.unwrap();
        assert_eq!(listed.to_text().lines().count(), 1);

        let free = execute(Command::Tables { available: true }, &engine, &db)
            .await
            .unwrap();
        assert!(!free.to_text().contains("table  1 "));

        let cancelled = execute(Command::Cancel { id: 1 }, &engine, &db).await.unwrap();
        assert_eq!(cancelled.to_text(), "cancelled #1 (table 1 is free again)");

        let empty = execute(Command::List, &engine, &db).await.unwrap();
        assert_eq!(empty.to_text(), "no reservations");
    }

    #[tokio::test]
    async fn test_bad_input_is_validation_error() {
        let (db, engine) = setup().await;
        db.seed_default_tables().await.unwrap();

        let bad_time = execute(book(1, "2026-03-02 19:00"), &engine, &db).await.unwrap_err();
        assert_eq!(bad_time.code, ErrorCode::ValidationError);

        let mut bad_phone = book(1, "02/03/2026 19:00");
        if let Command::Book { phone, .. } = &mut bad_phone {
            *phone = "123".to_string();
        }
        let err = execute(bad_phone, &engine, &db).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = execute(book(21, "02/03/2026 19:00"), &engine, &db).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_conflict_and_not_found_codes() {
        let (db, engine) = setup().await;
        db.seed_default_tables().await.unwrap();

        execute(book(2, "02/03/2026 19:00"), &engine, &db).await.unwrap();
        let err = execute(book(2, "02/03/2026 21:00"), &engine, &db).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);

        let err = execute(Command::Cancel { id: 77 }, &engine, &db).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_json_output_is_tagged() {
        let (db, engine) = setup().await;
        let out = execute(Command::Seed, &engine, &db).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&out.to_json().unwrap()).unwrap();
        assert_eq!(value["kind"], "seeded");
        assert_eq!(value["data"]["tables"], 10);

        let out = execute(Command::Tables { available: false }, &engine, &db)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&out.to_json().unwrap()).unwrap();
        assert_eq!(value["data"].as_array().unwrap().len(), 10);
        assert_eq!(value["data"][8]["exclusive_view"], true);
    }
}
