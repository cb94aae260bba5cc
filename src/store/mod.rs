//! Row store seam: fetch and overwrite the full roster range of an external table.
//!
//! The store offers no partial-row update and no compare-and-swap. Callers must
//! serialize read-modify-write cycles themselves (see [`crate::roster::actor`]).

pub mod a1;
pub mod memory;
pub mod sheet_file;

use std::fmt;

use crate::roster::Row;

pub use a1::{A1Range, A1RangeError};
pub use memory::MemoryRowStore;
pub use sheet_file::SheetFileStore;

/// Full-range access to a sheet-shaped table of roster rows.
pub trait RowStore: Send {
    /// Every non-blank row in the configured range, in stored order.
    fn fetch_range(&self) -> Result<Vec<Row>, StoreError>;

    /// Replace the configured range with `rows`, erasing whatever was stored before.
    fn write_range(&mut self, rows: &[Row]) -> Result<(), StoreError>;

    /// Short label (table and range) for log records.
    fn describe(&self) -> String;
}

impl<S: RowStore + ?Sized> RowStore for Box<S> {
    fn fetch_range(&self) -> Result<Vec<Row>, StoreError> {
        (**self).fetch_range()
    }

    fn write_range(&mut self, rows: &[Row]) -> Result<(), StoreError> {
        (**self).write_range(rows)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Table unreachable, unreadable, or returned something that is not a grid.
    Fetch { table: String, reason: String },
    /// Table rejected or failed the write.
    Write { table: String, reason: String },
}

impl StoreError {
    pub fn fetch(table: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Fetch {
            table: table.into(),
            reason: reason.to_string(),
        }
    }

    pub fn write(table: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Write {
            table: table.into(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch { table, reason } => write!(f, "failed to fetch {table}: {reason}"),
            Self::Write { table, reason } => write!(f, "failed to write {table}: {reason}"),
        }
    }
}

impl std::error::Error for StoreError {}
