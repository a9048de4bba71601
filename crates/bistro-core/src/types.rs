//! # Domain Types
//!
//! Core domain types used throughout Bistro.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Client      │   │      Table      │   │   Reservation   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (assigned)  │   │  number (1..20) │   │  id (assigned)  │       │
//! │  │  name           │   │  capacity 1..10 │   │  client ──────► │       │
//! │  │  phone (11 dig) │   │  occupied       │   │  table  ──────► │       │
//! │  │  vip: discount? │   │  vip: view?     │   │  reserved_for   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Table state machine:                                                   │
//! │     Available ──(book)──► Occupied ──(cancel)──► Available              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! - `Client` and `Reservation` ids are assigned by storage on first insert.
//! - `Table` is keyed by its numeral, a business key chosen by the restaurant.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{ConflictReason, ValidationError};
use crate::validation::{
    validate_booking_time, validate_capacity, validate_client_name, validate_discount,
    validate_phone, validate_table_number, ValidationResult,
};
use crate::DISPLAY_TIME_FORMAT;

// =============================================================================
// Identifiers
// =============================================================================

/// Storage-assigned client identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
pub struct ClientId(i64);

impl ClientId {
    #[inline]
    pub const fn new(raw: i64) -> Self {
        ClientId(raw)
    }

    #[inline]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Storage-assigned reservation identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
pub struct ReservationId(i64);

impl ReservationId {
    #[inline]
    pub const fn new(raw: i64) -> Self {
        ReservationId(raw)
    }

    #[inline]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A table numeral, guaranteed to be within the floor plan (1..=20).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct TableNumber(u8);

impl TableNumber {
    /// Validates and wraps a numeral.
    pub fn new(number: u32) -> ValidationResult<Self> {
        validate_table_number(number)?;
        Ok(TableNumber(number as u8))
    }

    #[inline]
    pub const fn get(self) -> u32 {
        self.0 as u32
    }
}

impl TryFrom<u32> for TableNumber {
    type Error = ValidationError;

    fn try_from(number: u32) -> Result<Self, Self::Error> {
        TableNumber::new(number)
    }
}

impl From<TableNumber> for u32 {
    fn from(number: TableNumber) -> Self {
        number.get()
    }
}

impl fmt::Display for TableNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Client
// =============================================================================

/// A restaurant client. VIP clients carry a discount percentage.
///
/// ## Invariants
/// - `name` is not blank
/// - `phone` is exactly 11 ASCII digits
/// - a VIP discount is within `[0, 100]`
///
/// Every constructor and setter re-validates, so a `Client` value is always
/// valid. The discount is carried data only; booking never branches on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ClientRecord", into = "ClientRecord")]
pub struct Client {
    id: Option<ClientId>,
    name: String,
    phone: String,
    vip: Option<VipProfile>,
}

/// VIP payload attached to a client.
#[derive(Debug, Clone, Copy, PartialEq)]
struct VipProfile {
    discount_pct: f64,
}

impl Client {
    /// Creates a regular (non-VIP) client that has not been stored yet.
    pub fn regular(name: impl Into<String>, phone: impl Into<String>) -> ValidationResult<Self> {
        let name = name.into();
        let phone = phone.into();
        validate_client_name(&name)?;
        validate_phone(&phone)?;

        Ok(Client {
            id: None,
            name,
            phone,
            vip: None,
        })
    }

    /// Creates a VIP client with a discount percentage.
    pub fn vip(
        name: impl Into<String>,
        phone: impl Into<String>,
        discount_pct: f64,
    ) -> ValidationResult<Self> {
        let mut client = Client::regular(name, phone)?;
        client.set_discount(Some(discount_pct))?;
        Ok(client)
    }

    /// Storage identity, `None` until the client is first saved.
    #[inline]
    pub fn id(&self) -> Option<ClientId> {
        self.id
    }

    /// Returns the identity or fails if the client was never saved.
    pub fn require_id(&self) -> ValidationResult<ClientId> {
        self.id.ok_or_else(|| ValidationError::NotPersisted {
            entity: "client".to_string(),
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn phone(&self) -> &str {
        &self.phone
    }

    /// VIP discount percentage, `None` for regular clients.
    #[inline]
    pub fn discount_pct(&self) -> Option<f64> {
        self.vip.map(|v| v.discount_pct)
    }

    #[inline]
    pub fn is_vip(&self) -> bool {
        self.vip.is_some()
    }

    /// Records the identity assigned by storage.
    pub fn assign_id(&mut self, id: ClientId) {
        self.id = Some(id);
    }

    /// Builder form of [`Client::assign_id`].
    pub fn with_id(mut self, id: ClientId) -> Self {
        self.assign_id(id);
        self
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> ValidationResult<()> {
        let name = name.into();
        validate_client_name(&name)?;
        self.name = name;
        Ok(())
    }

    pub fn set_phone(&mut self, phone: impl Into<String>) -> ValidationResult<()> {
        let phone = phone.into();
        validate_phone(&phone)?;
        self.phone = phone;
        Ok(())
    }

    /// Sets or clears the VIP discount. `None` turns the client regular.
    pub fn set_discount(&mut self, discount_pct: Option<f64>) -> ValidationResult<()> {
        match discount_pct {
            Some(pct) => {
                validate_discount(pct)?;
                self.vip = Some(VipProfile { discount_pct: pct });
            }
            None => self.vip = None,
        }
        Ok(())
    }
}

/// Flat, storage-shaped view of a client.
///
/// Used for serde and for hydrating rows; converting back into a
/// [`Client`] re-runs every field rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub id: Option<ClientId>,
    pub name: String,
    pub phone: String,
    pub discount: Option<f64>,
}

impl TryFrom<ClientRecord> for Client {
    type Error = ValidationError;

    fn try_from(record: ClientRecord) -> Result<Self, Self::Error> {
        let mut client = Client::regular(record.name, record.phone)?;
        client.set_discount(record.discount)?;
        client.id = record.id;
        Ok(client)
    }
}

impl From<Client> for ClientRecord {
    fn from(client: Client) -> Self {
        ClientRecord {
            id: client.id,
            discount: client.discount_pct(),
            name: client.name,
            phone: client.phone,
        }
    }
}

// =============================================================================
// Table
// =============================================================================

/// Occupancy state of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    /// No active reservation references the table.
    Available,
    /// Exactly one active reservation references the table.
    Occupied,
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableStatus::Available => f.write_str("available"),
            TableStatus::Occupied => f.write_str("occupied"),
        }
    }
}

/// A dining table. VIP tables may have an exclusive view.
///
/// ## Invariants
/// - `number` within 1..=20
/// - `capacity` within 1..=10
/// - occupied iff exactly one active reservation references it; the booking
///   engine is the only caller of [`Table::occupy`] and [`Table::release`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TableRecord", into = "TableRecord")]
pub struct Table {
    number: TableNumber,
    capacity: u8,
    occupied: bool,
    vip: Option<VipSeating>,
}

/// VIP payload attached to a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct VipSeating {
    exclusive_view: bool,
}

impl Table {
    /// Creates an available regular table.
    pub fn regular(number: u32, capacity: u32) -> ValidationResult<Self> {
        let number = TableNumber::new(number)?;
        validate_capacity(capacity)?;

        Ok(Table {
            number,
            capacity: capacity as u8,
            occupied: false,
            vip: None,
        })
    }

    /// Creates an available VIP table.
    pub fn vip(number: u32, capacity: u32, exclusive_view: bool) -> ValidationResult<Self> {
        let mut table = Table::regular(number, capacity)?;
        table.vip = Some(VipSeating { exclusive_view });
        Ok(table)
    }

    #[inline]
    pub fn number(&self) -> TableNumber {
        self.number
    }

    #[inline]
    pub fn capacity(&self) -> u32 {
        self.capacity as u32
    }

    #[inline]
    pub fn is_occupied(&self) -> bool {
        self.occupied
    }

    #[inline]
    pub fn is_available(&self) -> bool {
        !self.occupied
    }

    pub fn status(&self) -> TableStatus {
        if self.occupied {
            TableStatus::Occupied
        } else {
            TableStatus::Available
        }
    }

    #[inline]
    pub fn is_vip(&self) -> bool {
        self.vip.is_some()
    }

    /// True only for VIP tables with an exclusive view.
    #[inline]
    pub fn has_exclusive_view(&self) -> bool {
        self.vip.map(|v| v.exclusive_view).unwrap_or(false)
    }

    pub fn set_capacity(&mut self, capacity: u32) -> ValidationResult<()> {
        validate_capacity(capacity)?;
        self.capacity = capacity as u8;
        Ok(())
    }

    /// Available → Occupied. Fails if the table already backs a reservation.
    pub fn occupy(&mut self) -> Result<(), ConflictReason> {
        if self.occupied {
            return Err(ConflictReason::TableOccupied { table: self.number });
        }
        self.occupied = true;
        Ok(())
    }

    /// Occupied → Available. Returns false if the table was already free.
    pub fn release(&mut self) -> bool {
        std::mem::replace(&mut self.occupied, false)
    }
}

/// Flat, storage-shaped view of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRecord {
    pub number: u32,
    pub capacity: u32,
    pub occupied: bool,
    pub vip: bool,
    pub exclusive_view: Option<bool>,
}

impl TryFrom<TableRecord> for Table {
    type Error = ValidationError;

    fn try_from(record: TableRecord) -> Result<Self, Self::Error> {
        let mut table = if record.vip {
            Table::vip(
                record.number,
                record.capacity,
                record.exclusive_view.unwrap_or(false),
            )?
        } else {
            Table::regular(record.number, record.capacity)?
        };
        table.occupied = record.occupied;
        Ok(table)
    }
}

impl From<Table> for TableRecord {
    fn from(table: Table) -> Self {
        TableRecord {
            number: table.number.get(),
            capacity: table.capacity(),
            occupied: table.occupied,
            vip: table.is_vip(),
            exclusive_view: table.vip.map(|v| v.exclusive_view),
        }
    }
}

/// The house floor plan installed on first start.
///
/// Tables 1-8 seat four. Table 9 is a VIP six-top with an exclusive view;
/// table 10 is a VIP four-top without one.
pub fn default_floor_plan() -> Vec<Table> {
    let mut tables: Vec<Table> = (1..=8u8)
        .map(|n| Table {
            number: TableNumber(n),
            capacity: 4,
            occupied: false,
            vip: None,
        })
        .collect();

    tables.push(Table {
        number: TableNumber(9),
        capacity: 6,
        occupied: false,
        vip: Some(VipSeating {
            exclusive_view: true,
        }),
    });
    tables.push(Table {
        number: TableNumber(10),
        capacity: 4,
        occupied: false,
        vip: Some(VipSeating {
            exclusive_view: false,
        }),
    });

    tables
}

// =============================================================================
// Reservation
// =============================================================================

/// The (table, time) pair a reservation claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub table: TableNumber,
    pub at: NaiveDateTime,
}

/// A validated reservation that has not been inserted yet.
///
/// ## Invariants
/// - the client has a storage identity
/// - `reserved_for` was strictly after "now" when this value was built
#[derive(Debug, Clone, PartialEq)]
pub struct NewReservation {
    client_id: ClientId,
    client: Client,
    table: Table,
    reserved_for: NaiveDateTime,
}

impl NewReservation {
    pub fn new(
        client: Client,
        table: Table,
        reserved_for: NaiveDateTime,
        now: NaiveDateTime,
    ) -> ValidationResult<Self> {
        let client_id = client.require_id()?;
        validate_booking_time(reserved_for, now)?;

        Ok(NewReservation {
            client_id,
            client,
            table,
            reserved_for,
        })
    }

    #[inline]
    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    #[inline]
    pub fn client(&self) -> &Client {
        &self.client
    }

    #[inline]
    pub fn table(&self) -> &Table {
        &self.table
    }

    #[inline]
    pub fn table_number(&self) -> TableNumber {
        self.table.number()
    }

    #[inline]
    pub fn reserved_for(&self) -> NaiveDateTime {
        self.reserved_for
    }

    /// Attaches the identity assigned by storage.
    pub fn into_reservation(self, id: ReservationId) -> Reservation {
        Reservation {
            id,
            client: self.client,
            table: self.table,
            reserved_for: self.reserved_for,
        }
    }
}

/// A committed reservation, hydrated with its client and table.
///
/// Reservations are immutable once committed; cancellation deletes them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reservation {
    id: ReservationId,
    client: Client,
    table: Table,
    reserved_for: NaiveDateTime,
}

impl Reservation {
    /// Rebuilds a stored reservation.
    ///
    /// No future-time check: a stored reservation may already be in the past.
    pub fn restore(
        id: ReservationId,
        client: Client,
        table: Table,
        reserved_for: NaiveDateTime,
    ) -> ValidationResult<Self> {
        client.require_id()?;

        Ok(Reservation {
            id,
            client,
            table,
            reserved_for,
        })
    }

    #[inline]
    pub fn id(&self) -> ReservationId {
        self.id
    }

    #[inline]
    pub fn client(&self) -> &Client {
        &self.client
    }

    #[inline]
    pub fn table(&self) -> &Table {
        &self.table
    }

    #[inline]
    pub fn table_number(&self) -> TableNumber {
        self.table.number()
    }

    #[inline]
    pub fn reserved_for(&self) -> NaiveDateTime {
        self.reserved_for
    }

    pub fn slot(&self) -> Slot {
        Slot {
            table: self.table.number(),
            at: self.reserved_for,
        }
    }

    /// Reservation time as shown at the front desk (`dd/MM/yyyy HH:mm`).
    pub fn display_time(&self) -> String {
        self.reserved_for.format(DISPLAY_TIME_FORMAT).to_string()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_client_construction_validates() {
        let client = Client::regular("Ana Silva", "11999999999").unwrap();
        assert_eq!(client.name(), "Ana Silva");
        assert_eq!(client.id(), None);
        assert!(!client.is_vip());

        assert!(Client::regular("", "11999999999").is_err());
        assert!(Client::regular("Ana", "123").is_err());
        assert!(Client::vip("Ana", "11999999999", 120.0).is_err());
    }

    #[test]
    fn test_client_setters_revalidate() {
        let mut client = Client::vip("Bruno", "21988887777", 10.0).unwrap();
        assert_eq!(client.discount_pct(), Some(10.0));

        assert!(client.set_phone("2198888").is_err());
        assert_eq!(client.phone(), "21988887777");

        assert!(client.set_discount(Some(-5.0)).is_err());
        assert_eq!(client.discount_pct(), Some(10.0));

        client.set_discount(None).unwrap();
        assert!(!client.is_vip());
    }

    #[test]
    fn test_client_deserialize_rejects_invalid() {
        let ok: Client = serde_json::from_str(
            r#"{"id":3,"name":"Ana","phone":"11999999999","discount":null}"#,
        )
        .unwrap();
        assert_eq!(ok.id(), Some(ClientId::new(3)));

        let bad = serde_json::from_str::<Client>(
            r#"{"id":null,"name":"Ana","phone":"123","discount":null}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_table_construction_validates() {
        assert!(Table::regular(1, 4).is_ok());
        assert!(Table::regular(0, 4).is_err());
        assert!(Table::regular(21, 4).is_err());
        assert!(Table::regular(5, 0).is_err());
        assert!(Table::regular(5, 11).is_err());

        let vip = Table::vip(9, 6, true).unwrap();
        assert!(vip.is_vip());
        assert!(vip.has_exclusive_view());
    }

    #[test]
    fn test_table_state_machine() {
        let mut table = Table::regular(3, 2).unwrap();
        assert_eq!(table.status(), TableStatus::Available);

        table.occupy().unwrap();
        assert_eq!(table.status(), TableStatus::Occupied);

        let again = table.occupy();
        assert_eq!(
            again,
            Err(ConflictReason::TableOccupied {
                table: TableNumber::new(3).unwrap()
            })
        );

        assert!(table.release());
        assert!(!table.release());
        assert!(table.is_available());
    }

    #[test]
    fn test_table_record_roundtrip_keeps_vip_payload() {
        let record = TableRecord {
            number: 10,
            capacity: 4,
            occupied: true,
            vip: true,
            exclusive_view: Some(false),
        };
        let table = Table::try_from(record.clone()).unwrap();
        assert!(table.is_vip());
        assert!(table.is_occupied());
        assert_eq!(TableRecord::from(table), record);
    }

    #[test]
    fn test_default_floor_plan() {
        let plan = default_floor_plan();
        assert_eq!(plan.len(), 10);
        assert!(plan[..8].iter().all(|t| !t.is_vip() && t.capacity() == 4));
        assert!(plan[8].has_exclusive_view());
        assert_eq!(plan[8].capacity(), 6);
        assert!(plan[9].is_vip() && !plan[9].has_exclusive_view());
        assert!(plan.iter().all(Table::is_available));
    }

    #[test]
    fn test_new_reservation_requires_saved_client_and_future_time() {
        let client = Client::regular("Ana", "11999999999").unwrap();
        let table = Table::regular(1, 4).unwrap();
        let tomorrow = now() + Duration::days(1);

        let unsaved = NewReservation::new(client.clone(), table.clone(), tomorrow, now());
        assert!(matches!(unsaved, Err(ValidationError::NotPersisted { .. })));

        let saved = client.with_id(ClientId::new(1));
        let past = NewReservation::new(saved.clone(), table.clone(), now(), now());
        assert!(matches!(past, Err(ValidationError::NotInFuture { .. })));

        let pending = NewReservation::new(saved, table, tomorrow, now()).unwrap();
        let reservation = pending.into_reservation(ReservationId::new(7));
        assert_eq!(reservation.id().get(), 7);
        assert_eq!(reservation.slot().at, tomorrow);
        assert_eq!(reservation.display_time(), "02/03/2026 12:00");
    }
}
