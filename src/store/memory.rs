//! In-process row store for dry runs and tests.
//!
//! Clones share one table, so a test can keep a handle and inspect what the
//! reconciler wrote after moving the store into the roster actor.

use std::sync::{Arc, Mutex};

use super::{RowStore, StoreError};
use crate::lock_or_recover;
use crate::roster::Row;

#[derive(Debug, Default)]
struct MemoryTable {
    rows: Vec<Row>,
    writes: u64,
    fail_next_fetch: Option<String>,
    fail_next_write: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MemoryRowStore {
    name: String,
    table: Arc<Mutex<MemoryTable>>,
}

impl MemoryRowStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_rows(name, Vec::new())
    }

    pub fn with_rows(name: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            table: Arc::new(Mutex::new(MemoryTable {
                rows,
                ..MemoryTable::default()
            })),
        }
    }

    /// Current rows exactly as last written.
    pub fn snapshot(&self) -> Vec<Row> {
        lock_or_recover(&self.table, "memory store snapshot")
            .rows
            .clone()
    }

    /// Number of successful writes since creation.
    pub fn write_count(&self) -> u64 {
        lock_or_recover(&self.table, "memory store write count").writes
    }

    /// Make the next fetch fail with `reason`.
    pub fn fail_next_fetch(&self, reason: impl Into<String>) {
        lock_or_recover(&self.table, "memory store fail fetch").fail_next_fetch = Some(reason.into());
    }

    /// Make the next write fail with `reason`.
    pub fn fail_next_write(&self, reason: impl Into<String>) {
        lock_or_recover(&self.table, "memory store fail write").fail_next_write = Some(reason.into());
    }
}

impl RowStore for MemoryRowStore {
    fn fetch_range(&self) -> Result<Vec<Row>, StoreError> {
        let mut table = lock_or_recover(&self.table, "memory store fetch");
        if let Some(reason) = table.fail_next_fetch.take() {
            return Err(StoreError::fetch(self.describe(), reason));
        }
        Ok(table.rows.clone())
    }

    fn write_range(&mut self, rows: &[Row]) -> Result<(), StoreError> {
        let mut table = lock_or_recover(&self.table, "memory store write");
        if let Some(reason) = table.fail_next_write.take() {
            return Err(StoreError::write(self.describe(), reason));
        }
        table.rows = rows.to_vec();
        table.writes += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("memory:{}", self.name)
    }
}
