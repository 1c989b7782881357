//! Function catalog
//!
//! Native functions that can be placed on a
//! [`Policy`](crate::verifier::Policy):
//! - Base set: `float`, `int`, `str`. Every policy built with
//!   [`Policy::builder()`](crate::verifier::Policy::builder) starts with these.
//! - Opt-in: `ord`, `chr`, `cmp`, `len`, `abs`, `min`, `max`, `sum`, `bool`,
//!   `round`, `sorted`. Look them up with [`by_name`] and allow them
//!   explicitly.
//!
//! All of them are pure functions of their arguments with host (Python)
//! semantics for the cases they support.

use crate::{
    evaluator::{Evaluator, RuntimeError},
    parser::Span,
    values::{ArgSpec, NativeFunction, Value},
};

pub mod convert;
pub mod numeric;
pub mod sequence;


/// The functions every default policy allows.
pub fn base() -> Vec<NativeFunction> {
    vec![convert::float(), convert::int(), convert::str()]
}

/// Opt-in functions, in no particular order.
pub fn catalog() -> Vec<NativeFunction> {
    vec![
        convert::ord(),
        convert::chr(),
        numeric::cmp(),
        sequence::len(),
        numeric::abs(),
        numeric::min(),
        numeric::max(),
        numeric::sum(),
        convert::bool(),
        numeric::round(),
        sequence::sorted(),
    ]
}

/// Look up an opt-in function by name.
///
/// Base functions are not returned here since policies already carry them.
pub fn by_name(name: &str) -> Option<NativeFunction> {
    catalog().into_iter().find(|f| f.name() == name)
}

/// Bind arguments into a fixed-size array matching `spec`'s parameters.
fn bind<const N: usize>(
    spec: &ArgSpec<'_>,
    args: &[Value],
    kwargs: &[(String, Value)],
) -> Result<[Option<Value>; N], RuntimeError> {
    spec.bind(args, kwargs)?
        .try_into()
        .map_err(|bound: Vec<_>| {
            RuntimeError::type_error(format!("expected {N} parameters, bound {}", bound.len()))
        })
}

/// Call a `key=` function on one item, on the evaluator that called the
/// native function.
fn call_key(evaluator: &mut Evaluator, func: &Value, item: Value) -> Result<Value, RuntimeError> {
    evaluator
        .call(func, &[item], &[], &Span::new(0, 0))
        .map_err(|err| err.kind)
}
