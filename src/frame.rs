//! Raw tabular data
//!
//! Both the uploaded input dataset and the explanation table returned by the model are plain
//! tables of named columns. Cells are kept untyped until a consumer asks for a numeric view,
//! because the same table mixes feature names, labels and numbers.
use std::fmt;
use std::io::Read;

use csv::ReaderBuilder;
use ndarray::Array1;

use crate::error::{Error, Result};

/// A single untyped cell
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Null,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Parse a raw textual value, as it appears in a CSV file
    ///
    /// Empty strings become `Null`, anything that parses as a float becomes a `Number`.
    pub fn parse(raw: &str) -> Cell {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Cell::Null
        } else if let Ok(value) = trimmed.parse::<f64>() {
            Cell::Number(value)
        } else {
            Cell::Text(raw.to_string())
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Numeric value of the cell, if any
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => Some(*value),
            Cell::Text(text) => text.trim().parse().ok(),
            Cell::Null => None,
        }
    }

    /// Textual value of the cell, if it is a non-empty text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(text) if !text.is_empty() => Some(text),
            _ => None,
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::Null
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Cell::Null)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Number(value) => write!(f, "{}", value),
            Cell::Text(text) => write!(f, "{}", text),
        }
    }
}

/// A table of named columns with one `Vec<Cell>` per row
///
/// Every row has exactly as many cells as there are columns.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Frame {
    /// Create a new frame, checking that no row is ragged
    pub fn new<S: Into<String>>(columns: Vec<S>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if let Some((row, cells)) = rows
            .iter()
            .enumerate()
            .find(|(_, cells)| cells.len() != columns.len())
        {
            return Err(Error::RaggedRow {
                row,
                expected: columns.len(),
                found: cells.len(),
            });
        }

        Ok(Frame { columns, rows })
    }

    pub(crate) fn from_parts(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        debug_assert!(rows.iter().all(|cells| cells.len() == columns.len()));
        Frame { columns, rows }
    }

    /// Read a frame from CSV bytes with a header row
    pub fn from_csv<R: Read>(csv: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(csv);
        let columns = reader
            .headers()?
            .iter()
            .map(|name| name.trim().to_string())
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?.iter().map(Cell::parse).collect());
        }

        Frame::new(columns, rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at `(row, column)` by position
    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|cells| cells.get(column))
    }

    /// Position of the column called `name`
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|column| column == name)
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))
    }

    /// Read the column called `name` as numbers
    ///
    /// Null cells become `NaN`, any other non-numeric cell is an error.
    pub fn numeric_column(&self, name: &str) -> Result<Array1<f64>> {
        let idx = self.column_index(name)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(row, cells)| match &cells[idx] {
                Cell::Null => Ok(f64::NAN),
                cell => cell.as_f64().ok_or_else(|| Error::MalformedCell {
                    row,
                    column: name.to_string(),
                }),
            })
            .collect::<Result<Vec<_>>>()
            .map(Array1::from)
    }

    /// Names of the columns which hold at least one number and nothing but numbers or nulls
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(idx, _)| {
                let mut cells = self.rows.iter().map(|cells| &cells[*idx]);
                let all_numeric = cells
                    .clone()
                    .all(|cell| cell.is_null() || cell.as_f64().is_some());
                all_numeric && cells.any(|cell| !cell.is_null())
            })
            .map(|(_, name)| name.as_str())
            .collect()
    }

    /// Create a new frame holding the rows at `indices`, in that order
    ///
    /// **Panics** if an index is out of bounds.
    pub fn select_rows(&self, indices: &[usize]) -> Frame {
        Frame {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&idx| self.rows[idx].clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn parse_cells() {
        assert_eq!(Cell::parse(""), Cell::Null);
        assert_eq!(Cell::parse("  "), Cell::Null);
        assert_eq!(Cell::parse("1.5"), Cell::Number(1.5));
        assert_eq!(Cell::parse("age"), Cell::Text("age".into()));
        assert_eq!(Cell::from(Option::<f64>::None), Cell::Null);
        assert_eq!(Cell::Text("2".into()).as_f64(), Some(2.0));
        assert_eq!(Cell::Text(String::new()).as_text(), None);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let res = Frame::new(
            vec!["a", "b"],
            vec![vec![1.0.into(), 2.0.into()], vec![1.0.into()]],
        );
        assert!(matches!(
            res,
            Err(Error::RaggedRow {
                row: 1,
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn read_csv() {
        let data = "x,y,name\n1,2.5,a\n3,,b\n";
        let frame = Frame::from_csv(data.as_bytes()).unwrap();

        assert_eq!(frame.columns(), &["x", "y", "name"]);
        assert_eq!(frame.nrows(), 2);
        assert_eq!(frame.numeric_columns(), vec!["x", "y"]);
        assert_eq!(frame.numeric_column("x").unwrap(), array![1., 3.]);

        let y = frame.numeric_column("y").unwrap();
        assert_abs_diff_eq!(y[0], 2.5);
        assert!(y[1].is_nan());

        assert!(matches!(
            frame.numeric_column("name"),
            Err(Error::MalformedCell { row: 0, .. })
        ));
        assert!(matches!(
            frame.numeric_column("z"),
            Err(Error::UnknownColumn(_))
        ));
    }

    #[test]
    fn select_rows_keeps_order() {
        let frame = Frame::new(
            vec!["x"],
            (0..5).map(|i| vec![Cell::Number(i as f64)]).collect(),
        )
        .unwrap();
        let selected = frame.select_rows(&[3, 0, 4]);
        assert_eq!(selected.numeric_column("x").unwrap(), array![3., 0., 4.]);
    }
}
