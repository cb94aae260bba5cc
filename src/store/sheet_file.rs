//! File-backed sheet store.
//!
//! Each table id maps to `<dir>/<table_id>.json`, a document holding one 2-D string
//! grid per sheet title. Reads and writes address the grid through an [`A1Range`],
//! the same way a spreadsheet values API does. Cells outside the range are left
//! alone. A missing file reads as an empty table.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use super::{A1Range, RowStore, StoreError};
use crate::roster::{Row, ROW_WIDTH};

const DEFAULT_SHEET: &str = "Sheet1";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SheetDocument {
    #[serde(default)]
    pub(crate) sheets: BTreeMap<String, Vec<Vec<String>>>,
}

#[derive(Debug, Clone)]
pub struct SheetFileStore {
    path: PathBuf,
    table_id: String,
    range: A1Range,
    blank_padding_rows: usize,
}

impl SheetFileStore {
    /// Every write blanks the rows previously stored inside the range, so a shrinking
    /// table leaves no residue. `blank_padding_rows` further blank rows follow the
    /// data; zero instead trims the emptied rows off the end of the grid.
    pub fn new(
        dir: impl AsRef<Path>,
        table_id: &str,
        range: A1Range,
        blank_padding_rows: usize,
    ) -> Result<Self> {
        let table_id = table_id.trim();
        if table_id.is_empty() {
            bail!("table id must not be empty");
        }
        if table_id
            .chars()
            .any(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
            || table_id.starts_with('.')
        {
            bail!("table id {table_id:?} may only contain letters, digits, '-', '_' and '.'");
        }
        Ok(Self {
            path: dir.as_ref().join(format!("{table_id}.json")),
            table_id: table_id.to_string(),
            range,
            blank_padding_rows,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sheet_name(&self) -> &str {
        self.range.sheet().unwrap_or(DEFAULT_SHEET)
    }

    fn load(&self) -> io::Result<SheetDocument> {
        match fs::read_to_string(&self.path) {
            Ok(body) => serde_json::from_str(&body)
                .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(SheetDocument::default()),
            Err(err) => Err(err),
        }
    }

    fn save(&self, document: &SheetDocument) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string_pretty(document)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, body)?;
        fs::rename(&staging, &self.path)
    }

    fn overwrite_range(&self, grid: &mut Vec<Vec<String>>, rows: &[Row]) -> Result<(), String> {
        let capacity = self.range.capacity();
        if let Some(capacity) = capacity {
            if rows.len() > capacity {
                return Err(format!(
                    "{} rows do not fit range {} ({capacity} rows)",
                    rows.len(),
                    self.range
                ));
            }
        }

        let first_row = self.range.first_row();
        let first_col = self.range.first_col();
        let last_col = self.range.last_col();

        // Blank everything previously stored in the range, never past its last row.
        let stored = grid.len().saturating_sub(first_row);
        let mut span = (rows.len() + self.blank_padding_rows).max(stored);
        if let Some(capacity) = capacity {
            span = span.min(capacity);
        }

        for offset in 0..span {
            let index = first_row + offset;
            if grid.len() <= index {
                grid.resize_with(index + 1, Vec::new);
            }
            let cells = &mut grid[index];
            if cells.len() <= last_col {
                cells.resize(last_col + 1, String::new());
            }
            let values = rows.get(offset).map(Row::to_cells);
            for (col, cell) in cells[first_col..=last_col].iter_mut().enumerate() {
                *cell = match &values {
                    Some(values) if col < ROW_WIDTH => values[col].clone(),
                    _ => String::new(),
                };
            }
        }

        if self.blank_padding_rows == 0 {
            trim_grid(grid, first_row..first_row + span);
        }
        Ok(())
    }
}

/// Drop trailing empty cells on the rows in `written`, then trailing empty rows.
fn trim_grid(grid: &mut Vec<Vec<String>>, written: Range<usize>) {
    let end = written.end.min(grid.len());
    for cells in &mut grid[written.start.min(end)..end] {
        while cells.last().is_some_and(String::is_empty) {
            cells.pop();
        }
    }
    while grid.last().is_some_and(Vec::is_empty) {
        grid.pop();
    }
}

impl RowStore for SheetFileStore {
    fn fetch_range(&self) -> Result<Vec<Row>, StoreError> {
        let document = self
            .load()
            .map_err(|err| StoreError::fetch(self.describe(), err))?;
        let Some(grid) = document.sheets.get(self.sheet_name()) else {
            return Ok(Vec::new());
        };

        let first_col = self.range.first_col();
        let last_col = self.range.last_col();
        let end = match self.range.last_row() {
            Some(last) => grid.len().min(last + 1),
            None => grid.len(),
        };
        let rows = grid
            .iter()
            .take(end)
            .skip(self.range.first_row())
            .filter_map(|cells| {
                let window = cells
                    .iter()
                    .skip(first_col)
                    .take(last_col + 1 - first_col)
                    .cloned();
                Row::from_cells(window)
            })
            .collect();
        Ok(rows)
    }

    fn write_range(&mut self, rows: &[Row]) -> Result<(), StoreError> {
        let mut document = self
            .load()
            .map_err(|err| StoreError::write(self.describe(), err))?;
        let grid = document
            .sheets
            .entry(self.sheet_name().to_string())
            .or_default();
        self.overwrite_range(grid, rows)
            .map_err(|reason| StoreError::write(self.describe(), reason))?;
        self.save(&document)
            .map_err(|err| StoreError::write(self.describe(), err))
    }

    fn describe(&self) -> String {
        format!("{}!{}", self.table_id, self.range)
    }
}
