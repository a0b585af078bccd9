//! Installing advice layers into slots.
//!
//! Every operation here reduces to [`advise`]: read the slot's current
//! function, capture it, write back a layer that runs the advice around it.

use super::{
    Advice, Anchor, Binding, CallError, CallResult, Class, Function, InterceptError, Object, Slots,
};
use crate::abi::{Args, Value};

/// Invoke `function` with `context` as its receiver.
///
/// Advice uses this to continue the chain. The result, including any
/// failure, is returned untouched.
pub fn next<R>(context: &R, function: &Function<R>, args: Args) -> CallResult {
    function.call(context, args)
}

/// Install `advice` on `target[name]` in the given role.
///
/// Fails with [`InterceptError::SlotNotFound`] (leaving the target
/// untouched) when the slot holds no function.
pub fn advise<R, T>(
    target: &mut T,
    name: &str,
    advice: Advice<R>,
    binding: Binding,
) -> Result<(), InterceptError>
where
    R: 'static,
    T: Slots<R> + ?Sized,
{
    let original = target.get(name).ok_or_else(|| InterceptError::SlotNotFound {
        name: name.to_string(),
    })?;

    let anchor = match binding {
        Binding::Target => target.anchor(),
        Binding::Instance => Anchor::caller(),
    };

    tracing::debug!(
        slot = name,
        role = advice.role(),
        ?binding,
        pinned = anchor.is_pinned(),
        "installing advice layer"
    );

    let layer = match advice {
        Advice::Around(advice) => Function::new(name, move |receiver: &R, args: Args| {
            tracing::trace!(slot = original.name(), role = "around", "entering layer");
            advice(receiver, &original, args)
        }),
        Advice::Before(advice) => Function::new(name, move |caller: &R, args: Args| {
            tracing::trace!(slot = original.name(), role = "before", "entering layer");
            let pinned = anchor.resolve(original.name())?;
            let receiver = pinned.as_ref().unwrap_or(caller);
            advice(receiver, &original, &args)?;
            next(receiver, &original, args)
        }),
        Advice::After(advice) => Function::new(name, move |caller: &R, args: Args| {
            tracing::trace!(slot = original.name(), role = "after", "entering layer");
            let pinned = anchor.resolve(original.name())?;
            let receiver = pinned.as_ref().unwrap_or(caller);
            let result = next(receiver, &original, args.clone())?;
            advice(receiver, &original, &args)?;
            Ok(result)
        }),
    };

    target.set(name, layer);
    Ok(())
}

/// Replace `target[name]` with a function that hands the call-time receiver,
/// the captured original and the argument list to `advice`, returning
/// whatever `advice` returns.
pub fn wrap<R, T, F>(target: &mut T, name: &str, advice: F) -> Result<(), InterceptError>
where
    R: 'static,
    T: Slots<R> + ?Sized,
    F: Fn(&R, &Function<R>, Args) -> CallResult + Send + Sync + 'static,
{
    advise(target, name, Advice::around(advice), Binding::Instance)
}

/// [`wrap`] with its arguments in `(name, advice, target)` order.
pub fn around<R, T, F>(name: &str, advice: F, target: &mut T) -> Result<(), InterceptError>
where
    R: 'static,
    T: Slots<R> + ?Sized,
    F: Fn(&R, &Function<R>, Args) -> CallResult + Send + Sync + 'static,
{
    wrap(target, name, advice)
}

/// Run `advice` before every call to `target[name]`.
///
/// Advice installed later runs earlier. A failing advice stops the call:
/// neither the original nor any layer below it runs.
pub fn before<R, T, F>(
    target: &mut T,
    name: &str,
    advice: F,
    binding: Binding,
) -> Result<(), InterceptError>
where
    R: 'static,
    T: Slots<R> + ?Sized,
    F: Fn(&R, &Function<R>, &[Value]) -> Result<(), CallError> + Send + Sync + 'static,
{
    advise(target, name, Advice::before(advice), binding)
}

/// Run `advice` after every call to `target[name]` that returns normally.
///
/// The original's result is returned to the caller; advice does not see it.
/// Advice installed later runs later.
pub fn after<R, T, F>(
    target: &mut T,
    name: &str,
    advice: F,
    binding: Binding,
) -> Result<(), InterceptError>
where
    R: 'static,
    T: Slots<R> + ?Sized,
    F: Fn(&R, &Function<R>, &[Value]) -> Result<(), CallError> + Send + Sync + 'static,
{
    advise(target, name, Advice::after(advice), binding)
}

/// [`wrap`] applied to a class's shared method table, so every instance,
/// existing or future, goes through `advice` with itself as receiver.
pub fn wrap_class_method<S, F>(
    class: &Class<S>,
    name: &str,
    advice: F,
) -> Result<(), InterceptError>
where
    S: Send + Sync + 'static,
    F: Fn(&Object<S>, &Function<Object<S>>, Args) -> CallResult + Send + Sync + 'static,
{
    let mut shared = class.clone();
    wrap(&mut shared, name, advice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::arg;
    use crate::runtime::MethodTable;
    use std::sync::{Arc, Mutex};

    fn math() -> MethodTable<()> {
        let mut table = MethodTable::new();
        table.insert("add", |_: &(), args: Args| {
            let a: i64 = arg(&args, 0)?;
            let b: i64 = arg(&args, 1)?;
            Ok(Value::S64(a + b))
        });
        table
    }

    #[test]
    fn missing_slot_leaves_target_untouched() {
        let mut table = math();
        let err = wrap(&mut table, "subtract", |r, f, args| next(r, f, args)).unwrap_err();
        assert_eq!(
            err,
            InterceptError::SlotNotFound {
                name: "subtract".to_string()
            }
        );
        assert_eq!(table.names(), vec!["add".to_string()]);
    }

    #[test]
    fn layer_keeps_slot_name() {
        let mut table = math();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        wrap(&mut table, "add", move |r, f, args| {
            log.lock().unwrap().push(f.name().to_string());
            next(r, f, args)
        })
        .unwrap();
        wrap(&mut table, "add", |r, f, args| next(r, f, args)).unwrap();

        table
            .invoke(&(), "add", vec![Value::S64(1), Value::S64(2)])
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["add".to_string()]);
        assert_eq!(table.get("add").unwrap().name(), "add");
    }

    #[test]
    fn saved_function_restores_slot() {
        let mut table = math();
        let saved = table.get("add").unwrap();
        wrap(&mut table, "add", |_, _, _| Ok(Value::S64(0))).unwrap();
        assert!(!table.get("add").unwrap().ptr_eq(&saved));

        table.set("add", saved.clone());
        let result = table
            .invoke(&(), "add", vec![Value::S64(2), Value::S64(2)])
            .unwrap();
        assert_eq!(result, Value::S64(4));
        assert!(table.get("add").unwrap().ptr_eq(&saved));
    }
}
