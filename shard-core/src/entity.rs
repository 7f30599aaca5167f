use crate::{Cell, Column, Error, Info, Result, Row, decode_into};

/// A flat struct whose fields are filled from result set columns by name.
///
/// Implemented by `#[derive(Entity)]`, which registers every field name and
/// decodes through the field type's [`Column`] implementation. Columns without a
/// matching field are skipped, so `SELECT *` against a wider table works.
pub trait Entity: Default + Send {
    /// Column names matched against the result set labels, in field order.
    fn columns() -> &'static [&'static str];

    /// Decodes `cell` into the field registered for `column`.
    ///
    /// Returns `false` when no field has that name. A null cell leaves the field
    /// as it is.
    fn assign(&mut self, column: &str, cell: &Cell) -> Result<bool>;

    /// Assigns every column of `row` to the matching field.
    fn fill(&mut self, row: &Row) -> Result<()> {
        for (column, cell) in row.iter() {
            self.assign(column, cell)?;
        }
        Ok(())
    }
}

/// Anything a whole row can be turned into: an entity or a single scalar column.
pub trait FromRow: Sized + Send {
    /// Validates the result set shape before any row is decoded.
    fn check_columns(columns: &[String]) -> Result<()>;
    fn from_row(row: &Row) -> Result<Self>;

    /// Like `from_row`, but a NULL scalar is an error instead of the default.
    fn from_row_not_null(row: &Row) -> Result<Self> {
        Self::from_row(row)
    }
}

/// `FromRow::from_row` for entities: a default instance filled from `row`.
pub fn entity_from_row<E: Entity>(row: &Row) -> Result<E> {
    let mut entity = E::default();
    entity.fill(row)?;
    Ok(entity)
}

const SINGLE_COLUMN_ERROR: &str =
    "Select expected single column in select statement for slice of non-struct values";

fn check_single_column(columns: &[String]) -> Result<()> {
    if columns.len() != 1 {
        return Err(Error::msg(SINGLE_COLUMN_ERROR));
    }
    Ok(())
}

fn scalar_from_row<T: Column + Default>(row: &Row) -> Result<T> {
    let (Some(column), Some(cell), 1) = (row.labels.first(), row.cells.first(), row.cells.len())
    else {
        return Err(Error::msg(SINGLE_COLUMN_ERROR));
    };
    let mut value = T::default();
    decode_into(&mut value, column, cell)?;
    Ok(value)
}

fn scalar_from_row_not_null<T: Column + Default>(row: &Row) -> Result<T> {
    if let (Some(column), Some(Cell(None))) = (row.labels.first(), row.cells.first()) {
        return Err(Info::new()
            .with("Column", column.clone())
            .error(format!("Unexpected NULL value for column {column}")));
    }
    scalar_from_row(row)
}

macro_rules! impl_from_row_scalar {
    ($($target:ty),+ $(,)?) => {
        $(
            impl FromRow for $target {
                fn check_columns(columns: &[String]) -> Result<()> {
                    check_single_column(columns)
                }
                fn from_row(row: &Row) -> Result<Self> {
                    scalar_from_row(row)
                }
                fn from_row_not_null(row: &Row) -> Result<Self> {
                    scalar_from_row_not_null(row)
                }
            }
        )+
    };
}

impl_from_row_scalar!(
    String,
    u8,
    u16,
    u32,
    u64,
    usize,
    i8,
    i16,
    i32,
    i64,
    isize,
    bool,
    Vec<u8>,
    Box<[u8]>,
);

impl<T: Column + Send> FromRow for Option<T> {
    fn check_columns(columns: &[String]) -> Result<()> {
        check_single_column(columns)
    }
    fn from_row(row: &Row) -> Result<Self> {
        scalar_from_row(row)
    }
}
