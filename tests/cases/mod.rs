// Shared by several test binaries; each uses a subset.
#![allow(dead_code)]

use once_cell::sync::Lazy;
use safe_eval::{Engine, Error, Policy, Value, stdlib};

/// Engine with the base policy, shared by every test in a binary.
pub static BASE: Lazy<Engine> = Lazy::new(Engine::default);

/// Engine with the whole function catalog allowed.
pub static FULL: Lazy<Engine> = Lazy::new(|| engine(&[
    "ord", "chr", "cmp", "len", "abs", "min", "max", "sum", "bool", "round", "sorted",
]));

pub fn engine(allow: &[&str]) -> Engine {
    let policy = Policy::builder()
        .allow_all(allow.iter().map(|name| {
            stdlib::by_name(name).unwrap_or_else(|| panic!("unknown function {name}"))
        }))
        .unwrap()
        .build();
    Engine::new(policy)
}

pub fn range(n: i64) -> Value {
    Value::from((0..n).map(Value::Int).collect::<Vec<_>>())
}

/// What a test case expects from an engine call.
#[derive(Debug)]
pub enum Outcome {
    /// Success, compared by `repr()`.
    Value(&'static str),
    /// Rejected by the parser.
    Parse,
    /// Rejected by the verifier; the message is the violation's.
    Unsafe(&'static str),
    /// Failed while evaluating; the message is the runtime error's.
    Runtime(&'static str),
}

pub fn check(input: &str, result: Result<Value, Error>, expected: Outcome) {
    match (&result, &expected) {
        (Ok(value), Outcome::Value(repr)) => assert_eq!(value.repr(), *repr, "{input}"),
        (Err(Error::Parse(_)), Outcome::Parse) => {}
        (Err(Error::Unsafe(err)), Outcome::Unsafe(message)) => {
            assert_eq!(err.to_string(), *message, "{input}")
        }
        (Err(Error::Runtime(err)), Outcome::Runtime(message)) => {
            assert_eq!(err.to_string(), *message, "{input}")
        }
        _ => panic!("{input}: expected {expected:?}, got {result:?}"),
    }
}

/// Declare a test evaluating `input` on an engine.
///
/// With `compile` and `arg` the input is compiled once and called with `_`
/// bound to `arg`; otherwise it is evaluated with `bindings` (default none).
macro_rules! test_case {
    (
        $name:ident,
        $(engine: $engine:expr,)?
        input: $input:expr,
        $(bindings: [$(($bname:expr, $bvalue:expr)),* $(,)?],)?
        result: $result:expr $(,)?
    ) => {
        #[test]
        fn $name() {
            let engine: &safe_eval::Engine = test_case!(@engine $($engine)?);
            let bindings: Vec<(&str, safe_eval::Value)> = vec![$($(($bname, $bvalue.into())),*)?];
            $crate::cases::check($input, engine.evaluate($input, &bindings), {
                #[allow(unused_imports)]
                use $crate::cases::Outcome::*;
                $result
            });
        }
    };
    (
        $name:ident,
        $(engine: $engine:expr,)?
        compile: $input:expr,
        arg: $arg:expr,
        result: $result:expr $(,)?
    ) => {
        #[test]
        fn $name() {
            let engine: &safe_eval::Engine = test_case!(@engine $($engine)?);
            let result = engine
                .compile($input)
                .and_then(|expr| expr.call($arg.into()).map_err(safe_eval::Error::from));
            $crate::cases::check($input, result, {
                #[allow(unused_imports)]
                use $crate::cases::Outcome::*;
                $result
            });
        }
    };
    (@engine) => { &$crate::cases::BASE };
    (@engine $engine:expr) => { &$engine };
}
