//! Parsed query result shapes.

use crate::value::Value;

/// A single row of a parsed query response.
///
/// Cells keep the order of the header they were parsed against. Different
/// tables of the same response may have different columns.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Row {
    cells: Vec<(String, Value)>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self { cells: Vec::new() }
    }

    /// Append a cell. Columns are expected to be unique within a row.
    pub fn push(&mut self, column: impl Into<String>, value: Value) {
        self.cells.push((column.into(), value));
    }

    /// Get a value by column name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    /// Get value as a string slice.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.as_str())
    }

    /// Get value as f64.
    pub fn get_double(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(|v| v.as_double())
    }

    /// Get the timestamp (_time column).
    pub fn time(&self) -> Option<&chrono::DateTime<chrono::FixedOffset>> {
        self.get("_time").and_then(|v| v.as_time())
    }

    /// Get the field value (_value column).
    pub fn value(&self) -> Option<f64> {
        self.get_double("_value")
    }

    /// Get the measurement name (_measurement column).
    pub fn measurement(&self) -> Option<&str> {
        self.get_str("_measurement")
    }

    /// Iterate over `(column, value)` pairs in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.cells.iter().map(|(column, value)| (column.as_str(), value))
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True if the row has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// One blank-line-delimited segment of a query response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table {
    /// Column names from the segment header, in order.
    pub columns: Vec<String>,
    /// Rows parsed against `columns`.
    pub rows: Vec<Row>,
}

impl Table {
    /// Table with the given header and no rows.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Position of a column in the header.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}
