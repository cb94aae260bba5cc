//! A1 cell-range notation (`Sheet1!A1:D`, `'Roster 2024'!B2:E500`).

use std::fmt;
use std::str::FromStr;

use crate::roster::ROW_WIDTH;

/// Parsed range. Rows and columns are zero-based; `last_row` is inclusive and
/// `None` means the range is open-ended downwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct A1Range {
    sheet: Option<String>,
    first_col: usize,
    last_col: usize,
    first_row: usize,
    last_row: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct A1RangeError(String);

impl fmt::Display for A1RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid A1 range: {}", self.0)
    }
}

impl std::error::Error for A1RangeError {}

impl A1Range {
    pub fn sheet(&self) -> Option<&str> {
        self.sheet.as_deref()
    }

    pub fn first_col(&self) -> usize {
        self.first_col
    }

    pub fn last_col(&self) -> usize {
        self.last_col
    }

    pub fn first_row(&self) -> usize {
        self.first_row
    }

    pub fn last_row(&self) -> Option<usize> {
        self.last_row
    }

    pub fn width(&self) -> usize {
        self.last_col - self.first_col + 1
    }

    /// Number of rows the range can hold, if bounded.
    pub fn capacity(&self) -> Option<usize> {
        self.last_row.map(|last| last - self.first_row + 1)
    }
}

impl FromStr for A1Range {
    type Err = A1RangeError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        let (sheet, cells) = match input.rsplit_once('!') {
            Some((sheet, cells)) => (Some(parse_sheet_name(sheet)?), cells),
            None => (None, input),
        };
        let (start, end) = cells
            .split_once(':')
            .ok_or_else(|| A1RangeError(format!("{input:?} has no `:` between cells")))?;

        let (first_col, first_row) = parse_cell(start)?;
        let (last_col, last_row) = parse_cell(end)?;
        let first_col = first_col
            .ok_or_else(|| A1RangeError(format!("start cell {start:?} has no column")))?;
        let last_col =
            last_col.ok_or_else(|| A1RangeError(format!("end cell {end:?} has no column")))?;
        let first_row = first_row.unwrap_or(0);

        if last_col < first_col {
            return Err(A1RangeError(format!("{input:?} ends left of where it starts")));
        }
        if let Some(last_row) = last_row {
            if last_row < first_row {
                return Err(A1RangeError(format!("{input:?} ends above where it starts")));
            }
        }
        let range = Self {
            sheet,
            first_col,
            last_col,
            first_row,
            last_row,
        };
        if range.width() < ROW_WIDTH {
            return Err(A1RangeError(format!(
                "{input:?} spans {} columns; roster rows need {ROW_WIDTH}",
                range.width()
            )));
        }
        Ok(range)
    }
}

impl fmt::Display for A1Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(sheet) = &self.sheet {
            if sheet.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                write!(f, "{sheet}!")?;
            } else {
                write!(f, "'{}'!", sheet.replace('\'', "''"))?;
            }
        }
        write!(
            f,
            "{}{}:{}",
            column_label(self.first_col),
            self.first_row + 1,
            column_label(self.last_col)
        )?;
        if let Some(last_row) = self.last_row {
            write!(f, "{}", last_row + 1)?;
        }
        Ok(())
    }
}

fn parse_sheet_name(raw: &str) -> Result<String, A1RangeError> {
    let raw = raw.trim();
    let name = match raw.strip_prefix('\'').and_then(|rest| rest.strip_suffix('\'')) {
        Some(quoted) => quoted.replace("''", "'"),
        None => raw.to_string(),
    };
    if name.is_empty() {
        return Err(A1RangeError("empty sheet name".to_string()));
    }
    Ok(name)
}

/// Split a cell like `B12` into zero-based column and row. Either half may be absent
/// (`D` is a whole column, `5` a whole row).
fn parse_cell(cell: &str) -> Result<(Option<usize>, Option<usize>), A1RangeError> {
    let cell = cell.trim();
    let split = cell
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(cell.len());
    let (letters, digits) = cell.split_at(split);
    if letters.is_empty() && digits.is_empty() {
        return Err(A1RangeError("empty cell reference".to_string()));
    }

    let col = if letters.is_empty() {
        None
    } else {
        Some(column_index(letters))
    };
    let row = if digits.is_empty() {
        None
    } else {
        let number: usize = digits
            .parse()
            .map_err(|_| A1RangeError(format!("bad row in cell {cell:?}")))?;
        if number == 0 {
            return Err(A1RangeError(format!("rows start at 1 in cell {cell:?}")));
        }
        Some(number - 1)
    };
    Ok((col, row))
}

fn column_index(letters: &str) -> usize {
    letters
        .bytes()
        .map(|b| usize::from(b.to_ascii_uppercase() - b'A') + 1)
        .fold(0, |acc, digit| acc * 26 + digit)
        - 1
}

fn column_label(mut index: usize) -> String {
    let mut label = Vec::new();
    loop {
        label.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    label.reverse();
    String::from_utf8(label).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parses_default_roster_range() {
        let range: A1Range = "Sheet1!A1:D".parse().expect("range");
        assert_eq!(range.sheet(), Some("Sheet1"));
        assert_eq!((range.first_col(), range.last_col()), (0, 3));
        assert_eq!(range.first_row(), 0);
        assert_eq!(range.last_row(), None);
        assert_eq!(range.capacity(), None);
    }

    #[test]
    fn parses_bounded_range_without_sheet() {
        let range: A1Range = "b2:e50".parse().expect("range");
        assert_eq!(range.sheet(), None);
        assert_eq!((range.first_col(), range.last_col()), (1, 4));
        assert_eq!(range.first_row(), 1);
        assert_eq!(range.capacity(), Some(49));
    }

    #[test]
    fn parses_quoted_sheet_names() {
        let range: A1Range = "'Roster ''24'!A1:D".parse().expect("range");
        assert_eq!(range.sheet(), Some("Roster '24"));
        assert_eq!(range.to_string(), "'Roster ''24'!A1:D");
    }

    #[rstest]
    #[case("Sheet1!A1:C")]
    #[case("Sheet1!A1")]
    #[case("Sheet1!D1:A")]
    #[case("A5:D2")]
    #[case("A0:D")]
    #[case("!A1:D")]
    #[case("1:5")]
    fn rejects_bad_ranges(#[case] raw: &str) {
        assert!(raw.parse::<A1Range>().is_err(), "{raw} should be rejected");
    }

    #[rstest]
    #[case("A", 0)]
    #[case("Z", 25)]
    #[case("AA", 26)]
    #[case("AZ", 51)]
    #[case("BA", 52)]
    fn column_letters_round_trip(#[case] letters: &str, #[case] index: usize) {
        assert_eq!(column_index(letters), index);
        assert_eq!(column_label(index), letters);
    }

    #[test]
    fn display_renders_bounded_ranges() {
        let range: A1Range = "Data!AA10:AD20".parse().expect("range");
        assert_eq!(range.to_string(), "Data!AA10:AD20");
    }
}
