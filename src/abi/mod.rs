//! ABI: Argument and Result Values
//!
//! Every function slot takes an ordered list of [`Value`]s and returns a
//! single [`Value`]. Typed Rust values convert in with `From` and out with
//! `TryFrom`/[`FromValue`].

mod value;

pub use value::{display_args, FromValue, Value};

use thiserror::Error;

/// Ordered argument list handed to functions and advice
pub type Args = Vec<Value>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Expected list, got {0}")]
    ExpectedList(String),

    #[error("Expected option, got {0}")]
    ExpectedOption(String),

    #[error("Element {0}: {1}")]
    IndexError(usize, Box<ConversionError>),

    #[error("Missing argument at position {0}")]
    MissingArgument(usize),
}

/// Extract and convert the argument at `index`.
///
/// ```
/// use exedore::abi::{arg, Value};
///
/// let args = vec![Value::from(2i64), Value::from(3i64)];
/// let b: i64 = arg(&args, 1).unwrap();
/// assert_eq!(b, 3);
/// ```
pub fn arg<T: FromValue>(args: &[Value], index: usize) -> Result<T, ConversionError> {
    let value = args
        .get(index)
        .cloned()
        .ok_or(ConversionError::MissingArgument(index))?;
    T::from_value(value).map_err(|e| ConversionError::IndexError(index, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arg_reports_missing_position() {
        let args: Args = vec![Value::S64(1)];
        assert_eq!(
            arg::<i64>(&args, 2),
            Err(ConversionError::MissingArgument(2))
        );
    }

    #[test]
    fn arg_wraps_mismatch_with_index() {
        let args: Args = vec![Value::S64(1), Value::Bool(false)];
        match arg::<i64>(&args, 1) {
            Err(ConversionError::IndexError(1, inner)) => {
                assert!(matches!(*inner, ConversionError::TypeMismatch { .. }));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
