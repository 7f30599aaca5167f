use crate::{Cell, Decoded, Error, Info, Kind, Result, decode_cell};
use std::any;

/// A type a single cell can be decoded into.
///
/// `KIND` registers which decoding rule applies, `from_decoded` narrows the
/// decoded value to the concrete type. Field types without an implementation
/// cannot be mapped, so unsupported kinds are rejected when compiling.
///
/// A newtype joins the supported set by picking the kind of its content:
/// ```rust
/// use shard_core::{Column, Decoded, Kind, Result};
///
/// #[derive(Default)]
/// struct UserId(u64);
/// impl Column for UserId {
///     const KIND: Kind = Kind::Unsigned;
///     fn from_decoded(column: &str, value: Decoded) -> Result<Self> {
///         u64::from_decoded(column, value).map(UserId)
///     }
/// }
/// ```
pub trait Column: Sized {
    const KIND: Kind;
    fn from_decoded(column: &str, value: Decoded) -> Result<Self>;
}

/// The error returned when a decoded value does not fit the destination.
pub fn bad_row_value(column: &str, kind: impl std::fmt::Display) -> Error {
    Info::new()
        .with("Column", column.to_owned())
        .error(format!("Bad row value for column {column}: {kind}"))
}

/// Decodes `cell` into `field`. A null cell leaves the field untouched.
pub fn decode_into<T: Column>(field: &mut T, column: &str, cell: &Cell) -> Result<()> {
    let Some(bytes) = cell.bytes() else {
        return Ok(());
    };
    *field = T::from_decoded(column, decode_cell(T::KIND, column, bytes)?)?;
    Ok(())
}

macro_rules! impl_column_integer {
    ($kind:path, $decoded:path, $($target:ty),+) => {
        $(
            impl Column for $target {
                const KIND: Kind = $kind;
                fn from_decoded(column: &str, value: Decoded) -> Result<Self> {
                    match value {
                        $decoded(v) => <$target>::try_from(v)
                            .map_err(|_| bad_row_value(column, any::type_name::<Self>())),
                        _ => Err(bad_row_value(column, any::type_name::<Self>())),
                    }
                }
            }
        )+
    };
}

impl_column_integer!(Kind::Unsigned, Decoded::Unsigned, u8, u16, u32, u64, usize);
impl_column_integer!(Kind::Signed, Decoded::Signed, i8, i16, i32, i64, isize);

impl Column for String {
    const KIND: Kind = Kind::Text;
    fn from_decoded(column: &str, value: Decoded) -> Result<Self> {
        match value {
            Decoded::Text(v) => Ok(v),
            _ => Err(bad_row_value(column, "String")),
        }
    }
}

impl Column for bool {
    const KIND: Kind = Kind::Boolean;
    fn from_decoded(column: &str, value: Decoded) -> Result<Self> {
        match value {
            Decoded::Boolean(v) => Ok(v),
            _ => Err(bad_row_value(column, "bool")),
        }
    }
}

impl Column for Vec<u8> {
    const KIND: Kind = Kind::Bytes;
    fn from_decoded(column: &str, value: Decoded) -> Result<Self> {
        match value {
            Decoded::Bytes(v) => Ok(v),
            _ => Err(bad_row_value(column, "Vec<u8>")),
        }
    }
}

impl Column for Box<[u8]> {
    const KIND: Kind = Kind::Bytes;
    fn from_decoded(column: &str, value: Decoded) -> Result<Self> {
        Vec::<u8>::from_decoded(column, value).map(Vec::into_boxed_slice)
    }
}

/// `None` stays `None` on a null cell, any other cell yields `Some`.
impl<T: Column> Column for Option<T> {
    const KIND: Kind = T::KIND;
    fn from_decoded(column: &str, value: Decoded) -> Result<Self> {
        T::from_decoded(column, value).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::decode_into;
    use crate::{Cell, Column, Decoded, Info};

    #[test]
    fn null_leaves_field_untouched() {
        let mut name = String::from("alice");
        decode_into(&mut name, "name", &Cell::NULL).unwrap();
        assert_eq!(name, "alice");
        let mut age = Some(30u8);
        decode_into(&mut age, "age", &Cell::NULL).unwrap();
        assert_eq!(age, Some(30));
    }

    #[test]
    fn invalid_text_keeps_field() {
        let mut name = String::from("alice");
        let error = decode_into(&mut name, "name", &Cell::new(vec![b'a', 0xff, b'b'])).unwrap_err();
        let info = error.downcast_ref::<Info>().expect("Info is attached");
        assert_eq!(info.get("Column"), Some("name"));
        assert_eq!(name, "alice");
    }

    #[test]
    fn integer_widths() {
        let mut small = 0u8;
        decode_into(&mut small, "small", &"255".into()).unwrap();
        assert_eq!(small, 255);
        let error = decode_into(&mut small, "small", &"256".into()).unwrap_err();
        assert_eq!(
            error.root_cause().to_string(),
            "Bad row value for column small: u8"
        );
        assert_eq!(small, 255);

        let mut signed = 0i16;
        decode_into(&mut signed, "signed", &"-32768".into()).unwrap();
        assert_eq!(signed, i16::MIN);
        assert!(decode_into(&mut signed, "signed", &"40000".into()).is_err());

        let mut unsigned = 0u32;
        let error = decode_into(&mut unsigned, "unsigned", &"-1".into()).unwrap_err();
        let info = error.downcast_ref::<Info>().expect("Info is attached");
        assert_eq!(info.get("Column"), Some("unsigned"));
    }

    #[test]
    fn mismatched_variant() {
        let error = String::from_decoded("name", Decoded::Signed(1)).unwrap_err();
        assert_eq!(
            error.root_cause().to_string(),
            "Bad row value for column name: String"
        );
        assert!(bool::from_decoded("flag", Decoded::Text("true".into())).is_err());
    }

    #[test]
    fn bytes_are_verbatim() {
        let mut data = Vec::<u8>::new();
        decode_into(&mut data, "data", &Cell::new(vec![0u8, 255, 10])).unwrap();
        assert_eq!(data, [0, 255, 10]);
        let mut boxed: Box<[u8]> = Box::default();
        decode_into(&mut boxed, "data", &Cell::new(Vec::<u8>::new())).unwrap();
        assert!(boxed.is_empty());
    }
}
