//! Exedore: attach advice to named function slots
//!
//! Exedore replaces a named function slot on an object (or on a class's
//! shared method table) with a layer that runs extra behavior before, after
//! or around the original call. The receiver and the argument list are
//! forwarded explicitly, results pass straight through, and installing
//! several layers on one slot nests them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │               Interceptor               │
//! │                                         │
//! │  wrap / around  - replace a slot        │
//! │  before / after - derived layers        │
//! │  next           - continue the chain    │
//! │  intercept      - record / replay       │
//! │                                         │
//! ├─────────────────────────────────────────┤
//! │  Slots: MethodTable | Object | Class    │
//! ├─────────────────────────────────────────┤
//! │  abi: Value arguments and results       │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use exedore::abi::{arg, display_args, Value};
//! use exedore::runtime::{before, Binding, Object};
//! use std::sync::{Arc, Mutex};
//!
//! let mut math = Object::new(()).with_method("add", |_, args| {
//!     let a: i64 = arg(&args, 0)?;
//!     let b: i64 = arg(&args, 1)?;
//!     Ok(Value::S64(a + b))
//! });
//!
//! let log = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&log);
//! before(&mut math, "add", move |_, original, args| {
//!     let line = format!("Function {} called with {}", original.name(), display_args(args));
//!     sink.lock().unwrap().push(line);
//!     Ok(())
//! }, Binding::Target).unwrap();
//!
//! let sum = math.call("add", vec![Value::S64(1), Value::S64(1)]).unwrap();
//! assert_eq!(sum, Value::S64(2));
//! assert_eq!(log.lock().unwrap()[0], "Function add called with 1,1");
//! ```

pub mod abi;
pub mod runtime;

pub use abi::{Args, Value};
pub use runtime::{
    after, around, before, next, wrap, wrap_class_method, Advice, Binding, CallError, CallResult,
    Class, Function, InterceptError, MethodTable, Object, Slots,
};
