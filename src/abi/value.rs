//! Runtime values

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ConversionError;

/// A dynamically typed argument or result flowing through a function slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Returned by functions that produce nothing
    Unit,

    // Primitives
    Bool(bool),
    S32(i32),
    S64(i64),
    U32(u32),
    U64(u64),
    F64(f64),
    Char(char),
    String(String),

    // Compound
    List(Vec<Value>),
    Option(Option<Box<Value>>),
    Tuple(Vec<Value>),
    Record { type_name: String, fields: Vec<(String, Value)> },
}

impl Value {
    /// Short name of this value's kind, used in conversion errors
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Bool(_) => "bool",
            Value::S32(_) => "s32",
            Value::S64(_) => "s64",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::F64(_) => "f64",
            Value::Char(_) => "char",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Option(_) => "option",
            Value::Tuple(_) => "tuple",
            Value::Record { .. } => "record",
        }
    }

    /// Build a record value from `(field, value)` pairs
    pub fn record<I, K, V>(type_name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Record {
            type_name: type_name.into(),
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Look up a record field by name
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record { fields, .. } => fields
                .iter()
                .find(|(field, _)| field == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }
}

/// Renders values the way a call log shows them: `1`, `hi`, `[1,2]`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "()"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::S32(v) => write!(f, "{}", v),
            Value::S64(v) => write!(f, "{}", v),
            Value::U32(v) => write!(f, "{}", v),
            Value::U64(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
            Value::Char(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
            Value::List(items) => write!(f, "[{}]", display_args(items)),
            Value::Option(None) => write!(f, "none"),
            Value::Option(Some(inner)) => write!(f, "{}", inner),
            Value::Tuple(items) => write!(f, "({})", display_args(items)),
            Value::Record { type_name, fields } => {
                write!(f, "{} {{", type_name)?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " {}: {}", name, value)?;
                }
                write!(f, " }}")
            }
        }
    }
}

/// Join values with `,`, e.g. `1,1` for the arguments of `add(1, 1)`.
pub fn display_args(values: &[Value]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

// ============================================================================
// From implementations
// ============================================================================

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Unit
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::S32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::S64(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::U32(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::U64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::Char(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        Value::Option(v.map(|x| Box::new(x.into())))
    }
}

impl<A: Into<Value>, B: Into<Value>> From<(A, B)> for Value {
    fn from((a, b): (A, B)) -> Self {
        Value::Tuple(vec![a.into(), b.into()])
    }
}

// ============================================================================
// TryFrom implementations
// ============================================================================

macro_rules! try_from_value {
    ($ty:ty, $variant:ident, $expected:literal) => {
        impl TryFrom<Value> for $ty {
            type Error = ConversionError;
            fn try_from(v: Value) -> Result<Self, Self::Error> {
                match v {
                    Value::$variant(x) => Ok(x),
                    other => Err(ConversionError::TypeMismatch {
                        expected: $expected.to_string(),
                        got: other.kind().to_string(),
                    }),
                }
            }
        }
    };
}

try_from_value!(bool, Bool, "bool");
try_from_value!(i32, S32, "s32");
try_from_value!(i64, S64, "s64");
try_from_value!(u32, U32, "u32");
try_from_value!(u64, U64, "u64");
try_from_value!(f64, F64, "f64");
try_from_value!(char, Char, "char");
try_from_value!(String, String, "string");

impl TryFrom<Value> for () {
    type Error = ConversionError;
    fn try_from(v: Value) -> Result<Self, Self::Error> {
        match v {
            Value::Unit => Ok(()),
            other => Err(ConversionError::TypeMismatch {
                expected: "unit".to_string(),
                got: other.kind().to_string(),
            }),
        }
    }
}

impl<T: TryFrom<Value, Error = ConversionError>> TryFrom<Value> for Vec<T> {
    type Error = ConversionError;
    fn try_from(v: Value) -> Result<Self, Self::Error> {
        match v {
            Value::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| {
                    T::try_from(item).map_err(|e| ConversionError::IndexError(i, Box::new(e)))
                })
                .collect(),
            other => Err(ConversionError::ExpectedList(other.kind().to_string())),
        }
    }
}

// ============================================================================
// FromValue trait - avoids coherence issues with TryFrom for Option<T>
// ============================================================================

/// Trait for converting from a Value.
///
/// Exists because a `TryFrom<Value>` impl for `Option<T>` would overlap with
/// the blanket `TryFrom<U> for T where U: Into<T>`.
pub trait FromValue: Sized {
    fn from_value(v: Value) -> Result<Self, ConversionError>;
}

impl<T: TryFrom<Value, Error = ConversionError>> FromValue for T {
    fn from_value(v: Value) -> Result<Self, ConversionError> {
        T::try_from(v)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(v: Value) -> Result<Self, ConversionError> {
        match v {
            Value::Option(None) => Ok(None),
            Value::Option(Some(inner)) => Ok(Some(T::from_value(*inner)?)),
            other => Err(ConversionError::ExpectedOption(other.kind().to_string())),
        }
    }
}
