#[macro_use]
mod cases;

use std::sync::Arc;
use std::thread;

use pretty_assertions::assert_eq;
use safe_eval::{Engine, EngineOptions, Error, ExecutionOptions, Policy, Value, ViolationKind};

test_case!(
    slice_head,
    compile: "_[:3]",
    arg: cases::range(9),
    result: Value("[0, 1, 2]"),
);

test_case!(
    float_of_argument,
    compile: "float(_)",
    arg: "3",
    result: Value("3.0"),
);

test_case!(
    str_of_float,
    compile: "str(float(_))",
    arg: "3",
    result: Value("'3.0'"),
);

test_case!(
    conditional_on_argument,
    compile: "9 if _ else 4",
    arg: 0,
    result: Value("4"),
);

test_case!(
    cmp_with_catalog,
    engine: cases::engine(&["ord", "cmp"]),
    compile: "cmp(_, 4)",
    arg: 5,
    result: Value("1"),
);

test_case!(
    cmp_of_ord_with_catalog,
    engine: cases::engine(&["ord", "cmp"]),
    compile: "cmp(ord(_), 4)",
    arg: "a",
    result: Value("1"),
);

test_case!(
    cmp_without_catalog,
    compile: "cmp(_, 4)",
    arg: 5,
    result: Unsafe("call to 'cmp' not in allowed list"),
);

test_case!(
    dunder_attribute_is_a_runtime_error,
    compile: "_.__class__",
    arg: 1,
    result: Runtime("AttributeError: 'int' object has no attribute '__class__'"),
);

test_case!(
    argument_error_is_not_unsafe,
    compile: "int(_)",
    arg: "x",
    result: Runtime("ValueError: invalid literal for int() with base 10: 'x'"),
);

#[test]
fn test_compile_fails_before_any_call() {
    let err = Engine::default().compile("[_, evil(_)]").err().unwrap();
    assert!(matches!(
        err,
        Error::Unsafe(ref v) if v.kind == ViolationKind::DisallowedCall { name: "evil".to_string() }
    ));
}

#[test]
fn test_compiled_expression_outlives_engine() {
    let expr = {
        let engine = Engine::default();
        engine.compile("int(_) * 2").unwrap()
    };
    assert_eq!(expr.call(Value::from("21")).unwrap(), Value::Int(42));
}

#[test]
fn test_calls_do_not_leak_state() {
    let expr = Engine::default().compile("[x for x in _]").unwrap();
    assert_eq!(expr.call(Value::from("ab")).unwrap().repr(), "['a', 'b']");
    assert_eq!(expr.call(cases::range(2)).unwrap().repr(), "[0, 1]");
}

#[test]
fn test_concurrent_calls_of_one_compiled_expression() {
    let expr = Arc::new(
        cases::FULL
            .compile("sum([x * _ for x in [1, 2, 3]]) if _ else -1")
            .unwrap(),
    );
    let handles: Vec<_> = (0..8)
        .map(|n| {
            let expr = Arc::clone(&expr);
            thread::spawn(move || (n, expr.call(Value::Int(n)).unwrap()))
        })
        .collect();
    for handle in handles {
        let (n, value) = handle.join().unwrap();
        let expected = if n == 0 { -1 } else { 6 * n };
        assert_eq!(value, Value::Int(expected), "{n}");
    }
}

#[test]
fn test_into_fn_is_shareable() {
    let shout = cases::BASE.compile("str(_) * 2").unwrap().into_fn();
    let results: Vec<Value> = thread::scope(|s| {
        let handles: Vec<_> = ["a", "b"]
            .into_iter()
            .map(|arg| {
                let shout = shout.clone();
                s.spawn(move || shout(Value::from(arg)).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(results, vec![Value::from("aa"), Value::from("bb")]);
}

#[test]
fn test_recursion_limit() {
    let engine = Engine::with_options(
        Policy::default(),
        EngineOptions {
            execution: ExecutionOptions { max_depth: 50 },
        },
    );
    let deep = format!("{}_{}", "(".repeat(60), ")".repeat(60));
    // Parentheses do not add nodes.
    assert_eq!(engine.compile(&deep).unwrap().call(Value::Int(1)).unwrap(), Value::Int(1));

    let deep = format!("{}_", "-".repeat(60));
    let err = engine.compile(&deep).unwrap().call(Value::Int(1)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "RecursionError: maximum evaluation depth exceeded (51 > 50)"
    );
}
