//! Advice roles
//!
//! Each role has its own fixed shape, so `after` advice can never be written
//! expecting a result parameter it will not receive.

use super::{CallError, CallResult, Function};
use crate::abi::{Args, Value};

/// Runs in place of the slot; decides whether and how the original runs.
pub type AroundFn<R> = Box<dyn Fn(&R, &Function<R>, Args) -> CallResult + Send + Sync>;

/// Runs before the original. Its `Ok` output is discarded.
pub type BeforeFn<R> =
    Box<dyn Fn(&R, &Function<R>, &[Value]) -> Result<(), CallError> + Send + Sync>;

/// Runs after the original returned normally. Does not see the result.
pub type AfterFn<R> =
    Box<dyn Fn(&R, &Function<R>, &[Value]) -> Result<(), CallError> + Send + Sync>;

/// Advice tagged by the role it plays relative to the original.
pub enum Advice<R> {
    Around(AroundFn<R>),
    Before(BeforeFn<R>),
    After(AfterFn<R>),
}

impl<R> Advice<R> {
    pub fn around<F>(advice: F) -> Self
    where
        F: Fn(&R, &Function<R>, Args) -> CallResult + Send + Sync + 'static,
    {
        Advice::Around(Box::new(advice))
    }

    pub fn before<F>(advice: F) -> Self
    where
        F: Fn(&R, &Function<R>, &[Value]) -> Result<(), CallError> + Send + Sync + 'static,
    {
        Advice::Before(Box::new(advice))
    }

    pub fn after<F>(advice: F) -> Self
    where
        F: Fn(&R, &Function<R>, &[Value]) -> Result<(), CallError> + Send + Sync + 'static,
    {
        Advice::After(Box::new(advice))
    }

    pub fn role(&self) -> &'static str {
        match self {
            Advice::Around(_) => "around",
            Advice::Before(_) => "before",
            Advice::After(_) => "after",
        }
    }
}

/// Which receiver `before`/`after` advice and the original run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Binding {
    /// The target the advice was installed on, when the target pins one
    /// (objects do; bare tables and classes fall back to the caller).
    #[default]
    Target,
    /// The instance the slot is actually called on. Used for class-wide
    /// method tables.
    Instance,
}
