use crate::Result;
use futures::stream::BoxStream;
use std::{fmt, sync::Arc};

/// One undecoded column value of one row.
///
/// `None` is SQL NULL, which is distinct from an empty text or blob.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct Cell(pub Option<Box<[u8]>>);

impl Cell {
    pub const NULL: Cell = Cell(None);

    pub fn new(bytes: impl Into<Box<[u8]>>) -> Self {
        Self(Some(bytes.into()))
    }
    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }
    pub fn bytes(&self) -> Option<&[u8]> {
        self.0.as_deref()
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::new(value.as_bytes())
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            None => f.write_str("NULL"),
            Some(v) => write!(f, "{:?}", String::from_utf8_lossy(v)),
        }
    }
}

/// Shared reference-counted column name list.
pub type RowNames = Arc<[String]>;

/// A result row with its corresponding column labels.
#[derive(Debug, Clone)]
pub struct Row {
    /// Column names.
    pub labels: RowNames,
    /// Raw cells (aligned by index with `labels`).
    pub cells: Box<[Cell]>,
}

impl Row {
    pub fn new(labels: RowNames, cells: Box<[Cell]>) -> Self {
        Self { labels, cells }
    }
    pub fn names(&self) -> &[String] {
        &self.labels
    }
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
    pub fn get_column(&self, name: &str) -> Option<&Cell> {
        self.labels
            .iter()
            .position(|v| v == name)
            .map(|i| &self.cells[i])
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.labels.iter().map(String::as_str).zip(self.cells.iter())
    }
}

/// The forward-only result of a query.
///
/// Column labels are known before the first row is read. The stream owns the
/// driver statement: dropping `Rows` releases it, whatever the exit path.
pub struct Rows<'s> {
    pub labels: RowNames,
    pub stream: BoxStream<'s, Result<Row>>,
}

impl<'s> Rows<'s> {
    pub fn new(labels: RowNames, stream: BoxStream<'s, Result<Row>>) -> Self {
        Self { labels, stream }
    }
    pub fn columns(&self) -> &[String] {
        &self.labels
    }
}

impl fmt::Debug for Rows<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rows")
            .field("labels", &self.labels)
            .finish_non_exhaustive()
    }
}

/// Metadata about modify operations (INSERT/UPDATE/DELETE).
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowsAffected {
    /// Total number of rows impacted.
    pub rows_affected: u64,
    /// Backend-specific last inserted identifier when available.
    pub last_affected_id: Option<i64>,
}
