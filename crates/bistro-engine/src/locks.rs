//! # Per-Table Locks
//!
//! Serializes booking and cancellation per table numeral.
//!
//! ```text
//! book(table 1) ──┐                       ┌── holds guard ──► commit ──► drop
//! book(table 1) ──┼──► TableLocks[1] ─────┤
//! cancel(res 7) ──┘   (tokio Mutex)       └── waits ...
//!
//! book(table 2) ─────► TableLocks[2] ──── runs in parallel with table 1
//! ```
//!
//! The registry grows by at most one entry per table numeral and is never
//! pruned; the floor plan caps that at twenty.

use std::sync::Arc;

use bistro_core::TableNumber;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of one async mutex per table numeral.
#[derive(Debug, Default)]
pub struct TableLocks {
    slots: DashMap<TableNumber, Arc<Mutex<()>>>,
}

/// Held for the whole check-then-act section of one engine call.
pub type TableGuard = OwnedMutexGuard<()>;

impl TableLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other caller holds `table`, then returns the guard.
    pub async fn acquire(&self, table: TableNumber) -> TableGuard {
        // The map entry must be released before awaiting the mutex.
        let slot = self.slots.entry(table).or_default().value().clone();
        slot.lock_owned().await
    }

    /// Number of tables that have been locked at least once.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn table(n: u32) -> TableNumber {
        TableNumber::new(n).unwrap()
    }

    #[tokio::test]
    async fn test_same_table_is_exclusive() {
        let locks = Arc::new(TableLocks::new());
        let guard = locks.acquire(table(1)).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _g = locks.acquire(table(1)).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_tables_do_not_block() {
        let locks = TableLocks::new();
        let _one = locks.acquire(table(1)).await;
        let _two = locks.acquire(table(2)).await;
        assert_eq!(locks.len(), 2);
    }
}
