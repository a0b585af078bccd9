//! Call Interceptor
//!
//! A trait for observing or short-circuiting every call that passes through a
//! slot, installed as around advice by [`intercept`]. Unlike `after` advice,
//! an interceptor sees the result of each call.
//!
//! # Recording
//!
//! A recording interceptor returns `None` from `before_call` (allowing normal
//! execution) and records the input/output in `after_call`.
//!
//! # Replay
//!
//! A replay interceptor returns `Some(recorded_output)` from `before_call`,
//! short-circuiting the actual call and returning the previously recorded value.

use super::{next, wrap, InterceptError, Slots};
use crate::abi::Value;
use std::sync::Arc;

/// Trait for intercepting calls to a slot.
pub trait CallInterceptor: Send + Sync {
    /// Called before the wrapped function executes.
    ///
    /// Return `Some(Value)` to short-circuit with that value.
    /// Return `None` to proceed with normal execution.
    fn before_call(&self, function: &str, args: &[Value]) -> Option<Value>;

    /// Called after the wrapped function returns normally. Failures skip it.
    fn after_call(&self, function: &str, args: &[Value], output: &Value);
}

/// Route every call to `target[name]` through `interceptor`.
pub fn intercept<R, T>(
    target: &mut T,
    name: &str,
    interceptor: Arc<dyn CallInterceptor>,
) -> Result<(), InterceptError>
where
    R: 'static,
    T: Slots<R> + ?Sized,
{
    wrap(target, name, move |receiver: &R, original, args| {
        if let Some(output) = interceptor.before_call(original.name(), &args) {
            tracing::trace!(slot = original.name(), "call short-circuited by interceptor");
            return Ok(output);
        }
        let output = next(receiver, original, args.clone())?;
        interceptor.after_call(original.name(), &args, &output);
        Ok(output)
    })
}
