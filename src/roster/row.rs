//! Fixed four-column roster row as it lives in the row store.

/// Number of roster columns: id, name, address, timestamp.
pub const ROW_WIDTH: usize = 4;

/// One roster entry.
///
/// `id` is the canonical decimal form of the member id and never changes once the
/// row exists. `address` and `timestamp` start empty and are only touched by the
/// reconciler when the member is added, renamed, or records an address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub id: String,
    pub name: String,
    pub address: String,
    pub timestamp: String,
}

impl Row {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: String::new(),
            timestamp: String::new(),
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    /// Build a row from raw cells as a spreadsheet range returns them.
    ///
    /// Spreadsheet backends drop trailing empty cells, so short rows are padded with
    /// empty strings and cells past the fourth column are ignored. Returns `None`
    /// for a row with no content at all.
    pub fn from_cells<I>(cells: I) -> Option<Self>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut fields: [String; ROW_WIDTH] = Default::default();
        for (slot, cell) in fields.iter_mut().zip(cells) {
            *slot = cell.into();
        }
        if fields.iter().all(|cell| cell.trim().is_empty()) {
            return None;
        }
        let [id, name, address, timestamp] = fields;
        Some(Self {
            id: id.trim().to_string(),
            name,
            address,
            timestamp,
        })
    }

    pub fn to_cells(&self) -> [String; ROW_WIDTH] {
        [
            self.id.clone(),
            self.name.clone(),
            self.address.clone(),
            self.timestamp.clone(),
        ]
    }
}

/// Sort rows ascending by `id` compared as strings.
///
/// The persisted table has always been ordered lexicographically (`"10"` sorts before
/// `"2"`); existing sheets depend on it, so ids are never compared numerically here.
/// The sort is stable, which keeps the first fetched copy of a duplicated id in front.
pub fn sort_by_id(rows: &mut [Row]) {
    rows.sort_by(|a, b| a.id.cmp(&b.id));
}

pub(crate) fn is_sorted_by_id(rows: &[Row]) -> bool {
    rows.windows(2).all(|pair| pair[0].id <= pair[1].id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_cells_pads_short_rows() {
        let row = Row::from_cells(["42", "alice"]).expect("row");
        assert_eq!(row, Row::new("42", "alice"));
    }

    #[test]
    fn from_cells_ignores_extra_columns() {
        let row = Row::from_cells(["7", "bob", "0xabc", "t1", "note"]).expect("row");
        assert_eq!(row.to_cells(), ["7", "bob", "0xabc", "t1"].map(String::from));
    }

    #[test]
    fn from_cells_skips_blank_rows() {
        assert!(Row::from_cells(Vec::<String>::new()).is_none());
        assert!(Row::from_cells(["", " ", "", ""]).is_none());
    }

    #[test]
    fn sort_by_id_is_lexicographic() {
        let mut rows = vec![Row::new("2", "b"), Row::new("10", "a"), Row::new("1", "c")];
        sort_by_id(&mut rows);
        let ids: Vec<&str> = rows.iter().map(|row| row.id.as_str()).collect();
        assert_eq!(ids, ["1", "10", "2"]);
        assert!(is_sorted_by_id(&rows));
    }

    #[test]
    fn sort_by_id_keeps_first_duplicate_in_front() {
        let mut rows = vec![
            Row::new("5", "later"),
            Row::new("1", "x"),
            Row::new("5", "second"),
        ];
        sort_by_id(&mut rows);
        assert_eq!(rows[1].name, "later");
        assert_eq!(rows[2].name, "second");
    }
}
