use crate::Value;
use std::{borrow::Cow, rc::Rc, sync::Arc};

/// Conversion of caller values into query parameters.
///
/// Implementations reduce a type to its underlying primitive [`Value`] kind, so the
/// driver never sees a caller-defined type. String-like types all become
/// [`Value::Varchar`], which is what lets the argument normalizer treat them uniformly.
///
/// A custom string-like type can reuse the string conversion with
/// [`impl_as_value_str!`](crate::impl_as_value_str):
/// ```rust
/// use shard_core::{AsValue, Value, impl_as_value_str};
///
/// struct Email(String);
/// impl AsRef<str> for Email {
///     fn as_ref(&self) -> &str {
///         &self.0
///     }
/// }
/// impl_as_value_str!(Email);
///
/// let value = Email("alice@example.com".into()).as_value();
/// assert_eq!(value, Value::Varchar(Some("alice@example.com".into())));
/// ```
pub trait AsValue {
    /// The typed NULL of this type, used for `None` values.
    fn as_empty_value() -> Value;
    /// Convert into the owned parameter representation.
    fn as_value(self) -> Value;
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

macro_rules! impl_as_value {
    ($source:ty, $destination:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
        }
    };
    ($source:ty, $destination:path, $via:ty) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self as $via))
            }
        }
    };
}

impl_as_value!(bool, Value::Boolean);
impl_as_value!(i8, Value::Int8);
impl_as_value!(i16, Value::Int16);
impl_as_value!(i32, Value::Int32);
impl_as_value!(i64, Value::Int64);
impl_as_value!(isize, Value::Int64, i64);
impl_as_value!(u8, Value::UInt8);
impl_as_value!(u16, Value::UInt16);
impl_as_value!(u32, Value::UInt32);
impl_as_value!(u64, Value::UInt64);
impl_as_value!(usize, Value::UInt64, u64);
impl_as_value!(f32, Value::Float32);
impl_as_value!(f64, Value::Float64);
impl_as_value!(String, Value::Varchar);
impl_as_value!(Box<[u8]>, Value::Blob);

/// Implements [`AsValue`] for string-like types through their `AsRef<str>` view.
#[macro_export]
macro_rules! impl_as_value_str {
    ($($source:ty),+ $(,)?) => {
        $(
            impl $crate::AsValue for $source {
                fn as_empty_value() -> $crate::Value {
                    $crate::Value::Varchar(None)
                }
                fn as_value(self) -> $crate::Value {
                    $crate::Value::Varchar(Some(
                        ::std::convert::AsRef::<str>::as_ref(&self).to_owned(),
                    ))
                }
            }
        )+
    };
}

impl_as_value_str!(&str, &String, Cow<'_, str>, Box<str>, Rc<str>, Arc<str>);

impl AsValue for char {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self.into()))
    }
}

impl AsValue for Vec<u8> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self.into_boxed_slice()))
    }
}

impl AsValue for &[u8] {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self.into()))
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
}

/// Builds the argument list of a statement.
///
/// ```rust
/// use shard_core::{Value, args};
/// let args = args!["alice", 30, true];
/// assert_eq!(args.len(), 3);
/// assert_eq!(args[1], Value::Int32(Some(30)));
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($arg)),+]
    };
}
