//! # Query Layer
//!
//! Read-only views over reservations, tables, and clients.
//!
//! Queries take no table lock and open no transaction: each one is a
//! single gateway read and observes only committed state.

use std::sync::Arc;

use tracing::debug;

use bistro_core::validation::validate_search_fragment;
use bistro_core::{
    BookingError, BookingResult, Client, ClientId, PersistenceGateway, Reservation, ReservationId,
    Table,
};

/// Listing and lookup operations.
///
/// ## Usage
/// ```rust,ignore
/// let queries = ReservationQueries::new(gateway.clone());
/// for r in queries.search_by_client_name("ana").await? {
///     println!("#{} table {} at {}", r.id(), r.table_number(), r.display_time());
/// }
/// ```
#[derive(Clone)]
pub struct ReservationQueries {
    gateway: Arc<dyn PersistenceGateway>,
}

impl ReservationQueries {
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        ReservationQueries { gateway }
    }

    /// All active reservations ordered by time ascending, hydrated.
    pub async fn list(&self) -> BookingResult<Vec<Reservation>> {
        Ok(self.gateway.list_reservations().await?)
    }

    /// Reservations whose client name contains `fragment`, ignoring case.
    ///
    /// ## Behavior
    /// - The fragment is trimmed; an empty fragment matches everything
    /// - Case folding is Unicode-aware (`"JOÃO"` matches `"joão"`)
    /// - Ordered by time ascending, as [`list`](Self::list)
    pub async fn search_by_client_name(&self, fragment: &str) -> BookingResult<Vec<Reservation>> {
        let needle = validate_search_fragment(fragment)?.to_lowercase();

        let matches: Vec<Reservation> = self
            .gateway
            .list_reservations()
            .await?
            .into_iter()
            .filter(|r| r.client().name().to_lowercase().contains(&needle))
            .collect();

        debug!(fragment = %needle, count = matches.len(), "Searched reservations by client name");
        Ok(matches)
    }

    /// Hydrated reservation by id.
    pub async fn find_reservation(&self, id: ReservationId) -> BookingResult<Reservation> {
        self.gateway
            .find_reservation(id)
            .await?
            .ok_or_else(|| BookingError::not_found("reservation", id))
    }

    /// All tables ordered by numeral.
    pub async fn list_tables(&self) -> BookingResult<Vec<Table>> {
        Ok(self.gateway.list_tables().await?)
    }

    /// Unoccupied tables ordered by numeral.
    pub async fn list_available_tables(&self) -> BookingResult<Vec<Table>> {
        Ok(self.gateway.list_available_tables().await?)
    }

    /// All clients ordered by name.
    pub async fn list_clients(&self) -> BookingResult<Vec<Client>> {
        Ok(self.gateway.list_clients().await?)
    }

    pub async fn find_client(&self, id: ClientId) -> BookingResult<Client> {
        self.gateway
            .load_client(id)
            .await?
            .ok_or_else(|| BookingError::not_found("client", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::memory::MemoryGateway;
    use crate::BookingEngine;
    use bistro_core::default_floor_plan;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    async fn booked(names: &[(&str, u32, i64)]) -> BookingEngine {
        let gateway = Arc::new(MemoryGateway::with_tables(default_floor_plan()));
        let engine = BookingEngine::with_clock(gateway, Arc::new(FixedClock(now())));
        for (name, table, hours) in names {
            let client = Client::regular(*name, "11999999999").unwrap();
            engine
                .book(client, *table, now() + Duration::hours(*hours))
                .await
                .unwrap();
        }
        engine
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_substring() {
        let engine = booked(&[("Ana Silva", 1, 5), ("Mariana Costa", 2, 3), ("Bruno", 3, 1)]).await;

        let hits = engine.queries().search_by_client_name("  ANA ").await.unwrap();
        let names: Vec<&str> = hits.iter().map(|r| r.client().name()).collect();
        assert_eq!(names, ["Mariana Costa", "Ana Silva"]);

        let all = engine.queries().search_by_client_name("").await.unwrap();
        assert_eq!(all.len(), 3);

        let none = engine.queries().search_by_client_name("zé").await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_search_folds_non_ascii_case() {
        let engine = booked(&[("João Pereira", 4, 2)]).await;
        let hits = engine.queries().search_by_client_name("JOÃO").await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_lookups_report_not_found() {
        let engine = booked(&[]).await;
        let queries = engine.queries();

        let missing = queries.find_reservation(ReservationId::new(42)).await;
        assert!(matches!(missing, Err(BookingError::NotFound { entity: "reservation", .. })));

        let missing = queries.find_client(ClientId::new(42)).await;
        assert!(matches!(missing, Err(BookingError::NotFound { entity: "client", .. })));
    }

    #[tokio::test]
    async fn test_available_tables_shrink_after_booking() {
        let engine = booked(&[("Ana Silva", 9, 2)]).await;
        let queries = engine.queries();

        assert_eq!(queries.list_tables().await.unwrap().len(), 10);
        let available = queries.list_available_tables().await.unwrap();
        assert_eq!(available.len(), 9);
        assert!(available.iter().all(|t| t.number().get() != 9));
        assert_eq!(queries.list_clients().await.unwrap().len(), 1);
    }
}
