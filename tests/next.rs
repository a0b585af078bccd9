//! Integration tests for `next`

use exedore::abi::{arg, Args, Value};
use exedore::runtime::{next, CallError, Function, Object, Slots};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn doubler(calls: &Arc<AtomicUsize>) -> Function<()> {
    let calls = Arc::clone(calls);
    Function::new("double", move |_, args: Args| {
        calls.fetch_add(1, Ordering::SeqCst);
        let n: i64 = arg(&args, 0)?;
        Ok(Value::S64(n * 2))
    })
}

#[test]
fn test_calls_the_function() {
    let calls = Arc::new(AtomicUsize::new(0));
    let double = doubler(&calls);

    // An empty argument list fails inside the function, but it still ran.
    let _ = next(&(), &double, Vec::new());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_passes_arguments_and_returns_result() {
    let calls = Arc::new(AtomicUsize::new(0));
    let double = doubler(&calls);
    let secret = 271_828;

    let result = next(&(), &double, vec![Value::S64(secret)]).expect("call");
    assert_eq!(result, Value::S64(secret * 2));
    assert_eq!(result, double.call(&(), vec![Value::S64(secret)]).expect("direct"));
}

#[test]
fn test_propagates_failure_verbatim() {
    let calls = Arc::new(AtomicUsize::new(0));
    let double = doubler(&calls);

    let direct = double.call(&(), vec![Value::from("x")]);
    let through = next(&(), &double, vec![Value::from("x")]);
    assert!(matches!(through, Err(CallError::Conversion(_))));
    assert_eq!(through, direct);
}

#[test]
fn test_binds_the_given_context() {
    let class = exedore::runtime::Class::<i64>::new("Counter").method("scaled", |this, args| {
        let factor: i64 = arg(&args, 0)?;
        Ok(Value::S64(*this.read() * factor))
    });
    let three = class.instantiate(3);
    let ten = class.instantiate(10);

    let scaled = three.get("scaled").expect("method");
    assert_eq!(
        next(&three, &scaled, vec![Value::S64(2)]).expect("call"),
        Value::S64(6)
    );
    // Same function, different receiver.
    assert_eq!(
        next(&ten, &scaled, vec![Value::S64(2)]).expect("call"),
        Value::S64(20)
    );
}

#[test]
fn test_context_can_be_any_receiver_type() {
    let greet: Function<String> = Function::new("greet", |name: &String, _| {
        Ok(Value::String(format!("hello {}", name)))
    });
    assert_eq!(
        next(&"exedore".to_string(), &greet, vec![]).expect("call"),
        Value::from("hello exedore")
    );

    let object = Object::new(()).with_method("unit", |_, _| Ok(Value::Unit));
    let unit = object.get("unit").expect("method");
    assert_eq!(next(&object, &unit, vec![]), Ok(Value::Unit));
}
