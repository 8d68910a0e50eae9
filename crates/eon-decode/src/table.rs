//! Decoded tables: ordered rows sharing one column list.

use std::sync::Arc;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::value::CellValue;

/// One table row. Cells are positionally aligned with the table's columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<Vec<String>>,
    cells: Vec<CellValue>,
}

impl Row {
    pub(crate) fn new(columns: Arc<Vec<String>>, cells: Vec<CellValue>) -> Self {
        debug_assert_eq!(columns.len(), cells.len());
        Self { columns, cells }
    }

    /// Value of a named column; `None` if the table has no such column.
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.cells[i])
    }

    pub fn cells(&self) -> &[CellValue] {
        &self.cells
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Iterate `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.cells.iter())
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// An ordered sequence of rows parsed from a delimited payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedTable {
    columns: Arc<Vec<String>>,
    rows: Vec<Row>,
}

impl DecodedTable {
    /// Build a table from a header and raw cell rows.
    ///
    /// Short rows are padded with nulls, extra cells are dropped.
    pub fn from_cells(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let columns = Arc::new(columns);
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut cells| {
                cells.resize(width, CellValue::Null);
                Row::new(columns.clone(), cells)
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All values of one column, in row order.
    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a CellValue> + 'a {
        self.rows.iter().filter_map(move |row| row.get(column))
    }
}

impl Serialize for DecodedTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(row)?;
        }
        seq.end()
    }
}
