//! Interception Runtime
//!
//! Function slots, the tables that hold them, and the operations that layer
//! advice over them.
//!
//! A *slot* is a `(target, name)` pair holding exactly one [`Function`]. Any
//! target exposing [`Slots`] can be intercepted: installing advice reads the
//! current function out of the slot, captures it, and writes back a new
//! function that runs the advice around the captured one. Installing again on
//! the same slot wraps the wrapper, so the most recently installed layer runs
//! outermost.

mod advice;
mod interceptor;
mod object;
mod recorder;
mod weave;

pub use advice::{Advice, AfterFn, AroundFn, BeforeFn, Binding};
pub use interceptor::{intercept, CallInterceptor};
pub use object::{Class, Object, WeakObject};
pub use recorder::{CallRecord, RecordLimits, Recorder, Replayer};
pub use weave::{advise, after, around, before, next, wrap, wrap_class_method};

use crate::abi::{Args, ConversionError, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while installing advice
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterceptError {
    /// The slot holds no function, so there is nothing to wrap.
    #[error("no function in slot '{name}'")]
    SlotNotFound { name: String },
}

/// Failures raised while a slot is being invoked.
///
/// Interception never rewrites these: whatever an original function or an
/// advice body returns as `Err` reaches the caller of the slot unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CallError {
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Receiver for '{0}' has been dropped")]
    ReceiverDropped(String),

    #[error("Argument error: {0}")]
    Conversion(#[from] ConversionError),

    /// An arbitrary value raised by a function or advice
    #[error("Raised: {0}")]
    Raised(Value),

    #[error("{0}")]
    Failed(String),
}

impl CallError {
    pub fn raise(value: impl Into<Value>) -> Self {
        CallError::Raised(value.into())
    }

    pub fn failed(message: impl Into<String>) -> Self {
        CallError::Failed(message.into())
    }
}

/// Result of invoking a slot
pub type CallResult = Result<Value, CallError>;

type Callable<R> = dyn Fn(&R, Args) -> CallResult + Send + Sync;

/// A named function taking an explicit receiver and an argument list.
///
/// Cloning is cheap and clones share identity (see [`Function::ptr_eq`]), so
/// a saved clone can later be written back into its slot to undo every
/// layer installed since.
pub struct Function<R> {
    name: Arc<str>,
    callable: Arc<Callable<R>>,
}

impl<R> Function<R> {
    pub fn new<F>(name: impl Into<Arc<str>>, callable: F) -> Self
    where
        F: Fn(&R, Args) -> CallResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            callable: Arc::new(callable),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke with `receiver` bound as the calling context.
    pub fn call(&self, receiver: &R, args: Args) -> CallResult {
        (self.callable)(receiver, args)
    }

    /// True when both handles refer to the same underlying function
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.callable, &other.callable)
    }
}

impl<R> Clone for Function<R> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            callable: Arc::clone(&self.callable),
        }
    }
}

impl<R> fmt::Debug for Function<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function").field("name", &self.name).finish()
    }
}

// ============================================================================
// Slot Capability
// ============================================================================

/// A target whose named function slots can be read and replaced.
pub trait Slots<R> {
    /// Current function in the slot, if any.
    fn get(&self, name: &str) -> Option<Function<R>>;

    /// Replace the slot's function.
    fn set(&mut self, name: &str, function: Function<R>);

    /// Receiver that `before`/`after` advice is pinned to when installed
    /// with [`Binding::Target`]. Defaults to the call-time receiver.
    fn anchor(&self) -> Anchor<R> {
        Anchor::caller()
    }
}

/// Where pinned advice finds its receiver.
pub struct Anchor<R> {
    resolve: Option<Arc<dyn Fn() -> Option<R> + Send + Sync>>,
}

impl<R> Anchor<R> {
    /// Use whatever receiver the slot is called with.
    pub fn caller() -> Self {
        Self { resolve: None }
    }

    /// Resolve the receiver with `resolve` on every call. Returning `None`
    /// means the pinned receiver no longer exists.
    pub fn pinned<F>(resolve: F) -> Self
    where
        F: Fn() -> Option<R> + Send + Sync + 'static,
    {
        Self {
            resolve: Some(Arc::new(resolve)),
        }
    }

    pub fn is_pinned(&self) -> bool {
        self.resolve.is_some()
    }

    /// `Ok(None)` means "use the caller".
    pub(crate) fn resolve(&self, slot: &str) -> Result<Option<R>, CallError> {
        match &self.resolve {
            None => Ok(None),
            Some(resolve) => resolve()
                .map(Some)
                .ok_or_else(|| CallError::ReceiverDropped(slot.to_string())),
        }
    }
}

impl<R> Clone for Anchor<R> {
    fn clone(&self) -> Self {
        Self {
            resolve: self.resolve.clone(),
        }
    }
}

impl<R> fmt::Debug for Anchor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Anchor")
            .field("pinned", &self.is_pinned())
            .finish()
    }
}

// ============================================================================
// Method Table
// ============================================================================

/// A bare name -> function indirection table.
pub struct MethodTable<R> {
    functions: HashMap<String, Function<R>>,
}

impl<R> MethodTable<R> {
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// Register `callable` under `name`, replacing any previous function.
    pub fn insert<F>(&mut self, name: &str, callable: F)
    where
        F: Fn(&R, Args) -> CallResult + Send + Sync + 'static,
    {
        self.functions
            .insert(name.to_string(), Function::new(name, callable));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Slot names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Look up `name` and invoke it with `receiver`.
    pub fn invoke(&self, receiver: &R, name: &str, args: Args) -> CallResult {
        let function = self
            .get(name)
            .ok_or_else(|| CallError::MethodNotFound(name.to_string()))?;
        function.call(receiver, args)
    }
}

impl<R> Default for MethodTable<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for MethodTable<R> {
    fn clone(&self) -> Self {
        Self {
            functions: self.functions.clone(),
        }
    }
}

impl<R> fmt::Debug for MethodTable<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodTable")
            .field("functions", &self.names())
            .finish()
    }
}

impl<R> Slots<R> for MethodTable<R> {
    fn get(&self, name: &str) -> Option<Function<R>> {
        self.functions.get(name).cloned()
    }

    fn set(&mut self, name: &str, function: Function<R>) {
        self.functions.insert(name.to_string(), function);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_invokes_with_receiver() {
        let mut table: MethodTable<i64> = MethodTable::new();
        table.insert("offset", |base: &i64, args: Args| {
            let n: i64 = crate::abi::arg(&args, 0)?;
            Ok(Value::S64(base + n))
        });

        let result = table.invoke(&100, "offset", vec![Value::S64(5)]).unwrap();
        assert_eq!(result, Value::S64(105));
    }

    #[test]
    fn missing_method_is_reported() {
        let table: MethodTable<()> = MethodTable::new();
        assert_eq!(
            table.invoke(&(), "ghost", Vec::new()),
            Err(CallError::MethodNotFound("ghost".to_string()))
        );
    }

    #[test]
    fn clones_share_identity() {
        let f: Function<()> = Function::new("noop", |_, _| Ok(Value::Unit));
        let g = f.clone();
        let h: Function<()> = Function::new("noop", |_, _| Ok(Value::Unit));
        assert!(f.ptr_eq(&g));
        assert!(!f.ptr_eq(&h));
    }

    #[test]
    fn caller_anchor_resolves_to_none() {
        let anchor: Anchor<u8> = Anchor::caller();
        assert!(!anchor.is_pinned());
        assert_eq!(anchor.resolve("x"), Ok(None));
    }

    #[test]
    fn dead_pinned_anchor_reports_dropped_receiver() {
        let anchor: Anchor<u8> = Anchor::pinned(|| None);
        assert_eq!(
            anchor.resolve("add"),
            Err(CallError::ReceiverDropped("add".to_string()))
        );
    }
}
