use crate::{Info, Result, info::printable_bytes};
use anyhow::Context;
use std::{
    fmt::{self, Display},
    str::{self, FromStr},
};

/// The closed set of field kinds a cell can be decoded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Text,
    Unsigned,
    Signed,
    Boolean,
    Bytes,
}

impl Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Kind::Text => "string",
            Kind::Unsigned => "uint",
            Kind::Signed => "int",
            Kind::Boolean => "bool",
            Kind::Bytes => "bytes",
        })
    }
}

/// A cell decoded according to a [`Kind`], before narrowing to the field type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Text(String),
    Unsigned(u64),
    Signed(i64),
    Boolean(bool),
    Bytes(Vec<u8>),
}

impl Decoded {
    pub fn kind(&self) -> Kind {
        match self {
            Decoded::Text(..) => Kind::Text,
            Decoded::Unsigned(..) => Kind::Unsigned,
            Decoded::Signed(..) => Kind::Signed,
            Decoded::Boolean(..) => Kind::Boolean,
            Decoded::Bytes(..) => Kind::Bytes,
        }
    }
}

/// Decodes the raw bytes of a non null cell.
///
/// Text must be valid UTF-8 and is taken verbatim like bytes, integers are parsed as base 10 64 bit
/// values and booleans from their canonical text forms. A parse failure carries
/// the column name and the raw bytes.
pub fn decode_cell(kind: Kind, column: &str, bytes: &[u8]) -> Result<Decoded> {
    let context = || {
        Info::new()
            .with("Column", column.to_owned())
            .with("Bytes", printable_bytes(bytes))
    };
    Ok(match kind {
        Kind::Text => Decoded::Text(String::from_utf8(bytes.to_vec()).with_context(context)?),
        Kind::Bytes => Decoded::Bytes(bytes.to_vec()),
        Kind::Unsigned => Decoded::Unsigned(parse_number(bytes).with_context(context)?),
        Kind::Signed => Decoded::Signed(parse_number(bytes).with_context(context)?),
        Kind::Boolean => Decoded::Boolean(parse_bool(bytes).with_context(context)?),
    })
}

fn parse_number<T>(bytes: &[u8]) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(str::from_utf8(bytes)?.parse::<T>()?)
}

/// Accepts `1, t, T, TRUE, true, True, 0, f, F, FALSE, false, False`.
pub fn parse_bool(bytes: &[u8]) -> Result<bool> {
    match bytes {
        b"1" | b"t" | b"T" | b"TRUE" | b"true" | b"True" => Ok(true),
        b"0" | b"f" | b"F" | b"FALSE" | b"false" | b"False" => Ok(false),
        _ => Err(anyhow::Error::msg(format!(
            "Invalid boolean `{}`",
            String::from_utf8_lossy(bytes)
        ))),
    }
}
