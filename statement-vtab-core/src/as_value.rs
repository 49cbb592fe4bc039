use crate::{Error, Result, Value};
use std::any;

/// Conversion between native Rust types and the dynamically typed [`Value`]
/// used for statement bindings and row decoding.
///
/// Integer conversions check the range before narrowing, the error names
/// both the offending value and the target type.
///
/// # Examples
/// ```rust
/// use statement_vtab_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert_eq!(v, Value::Int64(Some(42)));
/// let n: i32 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// NULL of the variant used by this type.
    fn as_empty_value() -> Value;
    fn as_value(self) -> Value;
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
}

macro_rules! impl_as_value_integer {
    ($($source:ty),+ $(,)?) => {
        $(
            impl AsValue for $source {
                fn as_empty_value() -> Value {
                    Value::Int64(None)
                }
                fn as_value(self) -> Value {
                    Value::Int64(Some(self as i64))
                }
                fn try_from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::Int64(Some(v)) => <$source>::try_from(v).map_err(|_| {
                            Error::msg(format!(
                                "Value {v}: i64 is out of range for {}",
                                any::type_name::<Self>(),
                            ))
                        }),
                        _ => Err(Error::msg(format!(
                            "Cannot convert {value:?} to {}",
                            any::type_name::<Self>(),
                        ))),
                    }
                }
            }

            impl From<$source> for Value {
                fn from(value: $source) -> Self {
                    value.as_value()
                }
            }
        )+
    };
}
impl_as_value_integer!(i8, i16, i32, i64, u8, u16, u32);

impl AsValue for bool {
    fn as_empty_value() -> Value {
        Value::Int64(None)
    }
    fn as_value(self) -> Value {
        Value::Int64(Some(self as i64))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Int64(Some(v)) => Ok(v != 0),
            _ => Err(Error::msg(format!("Cannot convert {value:?} to bool"))),
        }
    }
}

impl AsValue for f64 {
    fn as_empty_value() -> Value {
        Value::Float64(None)
    }
    fn as_value(self) -> Value {
        Value::Float64(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float64(Some(v)) => Ok(v),
            Value::Int64(Some(v)) => Ok(v as f64),
            _ => Err(Error::msg(format!("Cannot convert {value:?} to f64"))),
        }
    }
}

impl AsValue for String {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(Some(v)) => Ok(v),
            Value::Int64(Some(v)) => Ok(v.to_string()),
            Value::Float64(Some(v)) => Ok(v.to_string()),
            _ => Err(Error::msg(format!("Cannot convert {value:?} to String"))),
        }
    }
}

impl AsValue for Box<[u8]> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(Some(v)) => Ok(v),
            Value::Varchar(Some(v)) => Ok(v.into_bytes().into_boxed_slice()),
            _ => Err(Error::msg(format!("Cannot convert {value:?} to a blob"))),
        }
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
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        T::try_from_value(value).map(Some)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        value.as_value()
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        value.as_value()
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        value.as_value()
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Varchar(Some(value.into()))
    }
}

impl From<Box<[u8]>> for Value {
    fn from(value: Box<[u8]>) -> Self {
        value.as_value()
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Blob(Some(value.into()))
    }
}
