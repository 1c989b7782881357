//! Numeric functions: `abs`, `round`, `cmp`, `min`, `max`, `sum`.

use core::cmp::Ordering;

use super::{bind, call_key};
use crate::{
    evaluator::{Evaluator, RuntimeError, binary, iterate, order},
    parser::BinaryOp,
    stdlib::convert::float_to_int,
    values::{ArgSpec, NativeFunction, Value},
};

const ABS: ArgSpec<'static> = ArgSpec::new("abs", &["x"], 1);
const ROUND: ArgSpec<'static> = ArgSpec::new("round", &["number", "ndigits"], 1);
const CMP: ArgSpec<'static> = ArgSpec::new("cmp", &["a", "b"], 2);
const SUM: ArgSpec<'static> = ArgSpec::new("sum", &["iterable", "start"], 1);

fn overflow() -> RuntimeError {
    RuntimeError::OverflowError("integer overflow".to_string())
}

// ============================================================================
// Basic Operations
// ============================================================================

/// Absolute value of an int or float
pub fn abs() -> NativeFunction {
    NativeFunction::new("abs", |args, kwargs| {
        let [x] = bind::<1>(&ABS, args, kwargs)?;
        match x {
            Some(Value::Float(f)) => Ok(Value::Float(f.abs())),
            Some(v) if v.as_int().is_some() => v
                .as_int()
                .and_then(i64::checked_abs)
                .map(Value::Int)
                .ok_or_else(overflow),
            other => Err(RuntimeError::type_error(format!(
                "bad operand type for abs(): '{}'",
                other.map_or("NoneType", |v| v.type_name())
            ))),
        }
    })
}

/// Round half to even, either to an int or to `ndigits` decimal places
pub fn round() -> NativeFunction {
    NativeFunction::new("round", |args, kwargs| {
        let [number, ndigits] = bind::<2>(&ROUND, args, kwargs)?;
        let ndigits = match ndigits {
            None | Some(Value::None) => None,
            Some(n) => Some(n.as_int().ok_or_else(|| {
                RuntimeError::type_error(format!(
                    "'{}' object cannot be interpreted as an integer",
                    n.type_name()
                ))
            })?),
        };
        match (number, ndigits) {
            (Some(Value::Float(x)), None) => float_to_int(x.round_ties_even()).map(Value::Int),
            (Some(Value::Float(x)), Some(n)) => Ok(Value::Float(round_float(x, n))),
            (Some(v), n) if v.as_int().is_some() => {
                let i = v.as_int().unwrap_or_default();
                round_int(i, n.unwrap_or(0)).map(Value::Int)
            }
            (other, _) => Err(RuntimeError::type_error(format!(
                "type {} doesn't define __round__ method",
                other.map_or("NoneType", |v| v.type_name())
            ))),
        }
    })
}

fn round_float(x: f64, ndigits: i64) -> f64 {
    if !x.is_finite() {
        return x;
    }
    // Beyond these an f64 either has no digits to drop or rounds to zero.
    if ndigits > 308 {
        return x;
    }
    if ndigits < -308 {
        return 0.0 * x.signum();
    }
    let exp = ndigits as i32;
    let scaled = if exp >= 0 {
        (x * 10f64.powi(exp)).round_ties_even() / 10f64.powi(exp)
    } else {
        (x / 10f64.powi(-exp)).round_ties_even() * 10f64.powi(-exp)
    };
    if scaled.is_finite() { scaled } else { x }
}

fn round_int(x: i64, ndigits: i64) -> Result<i64, RuntimeError> {
    if ndigits >= 0 {
        return Ok(x);
    }
    let Some(pow) = u32::try_from(-ndigits).ok().and_then(|e| 10i128.checked_pow(e)) else {
        return Ok(0);
    };
    let x = i128::from(x);
    let rem = x.rem_euclid(pow);
    let base = x - rem;
    let rounded = match (rem * 2).cmp(&pow) {
        Ordering::Greater => base + pow,
        Ordering::Equal if (base / pow) % 2 != 0 => base + pow,
        _ => base,
    };
    i64::try_from(rounded).map_err(|_| overflow())
}

/// Three-way comparison: -1, 0 or 1
pub fn cmp() -> NativeFunction {
    NativeFunction::new("cmp", |args, kwargs| {
        let [a, b] = bind::<2>(&CMP, args, kwargs)?;
        let (a, b) = (a.unwrap_or(Value::None), b.unwrap_or(Value::None));
        if a == b {
            return Ok(Value::Int(0));
        }
        Ok(Value::Int(match order("<", &a, &b)? {
            Some(Ordering::Less) => -1,
            Some(Ordering::Greater) => 1,
            Some(Ordering::Equal) | None => 0,
        }))
    })
}

// ============================================================================
// Aggregates
// ============================================================================

/// Smallest argument, or smallest item of a single iterable argument
pub fn min() -> NativeFunction {
    NativeFunction::reentrant("min", |evaluator, args, kwargs| {
        extreme(evaluator, "min", Ordering::Less, args, kwargs)
    })
}

/// Largest argument, or largest item of a single iterable argument
pub fn max() -> NativeFunction {
    NativeFunction::reentrant("max", |evaluator, args, kwargs| {
        extreme(evaluator, "max", Ordering::Greater, args, kwargs)
    })
}

fn extreme(
    evaluator: &mut Evaluator,
    name: &str,
    wanted: Ordering,
    args: &[Value],
    kwargs: &[(String, Value)],
) -> Result<Value, RuntimeError> {
    let mut key = None;
    let mut default = None;
    for (k, v) in kwargs {
        match k.as_str() {
            "key" if !v.is_none() => key = Some(v),
            "key" => {}
            "default" => default = Some(v),
            other => {
                return Err(RuntimeError::type_error(format!(
                    "{name}() got an unexpected keyword argument '{other}'"
                )));
            }
        }
    }

    let items = match args {
        [] => {
            return Err(RuntimeError::type_error(format!(
                "{name} expected at least 1 argument, got 0"
            )));
        }
        [iterable] => iterate(iterable)?,
        _ if default.is_some() => {
            return Err(RuntimeError::type_error(format!(
                "Cannot specify a default for {name}() with multiple positional arguments"
            )));
        }
        _ => args.to_vec(),
    };

    let symbol = if wanted == Ordering::Less { "<" } else { ">" };
    let mut best: Option<(Value, Value)> = None;
    for item in items {
        let k = match key {
            Some(f) => call_key(evaluator, f, item.clone())?,
            None => item.clone(),
        };
        best = match best {
            None => Some((item, k)),
            // The first of several equal items wins.
            Some((b, bk)) => {
                if order(symbol, &k, &bk)? == Some(wanted) {
                    Some((item, k))
                } else {
                    Some((b, bk))
                }
            }
        };
    }

    match (best, default) {
        (Some((item, _)), _) => Ok(item),
        (None, Some(default)) => Ok(default.clone()),
        (None, None) => Err(RuntimeError::value_error(format!(
            "{name}() iterable argument is empty"
        ))),
    }
}

/// Sum of the items of an iterable, added to `start`
pub fn sum() -> NativeFunction {
    NativeFunction::new("sum", |args, kwargs| {
        let [iterable, start] = bind::<2>(&SUM, args, kwargs)?;
        let start = start.unwrap_or(Value::Int(0));
        if matches!(start, Value::Str(_)) {
            return Err(RuntimeError::type_error(
                "sum() can't sum strings [use ''.join(seq) instead]",
            ));
        }
        let items = iterate(&iterable.unwrap_or(Value::None))?;
        items
            .iter()
            .try_fold(start, |total, item| binary(BinaryOp::Add, &total, item))
    })
}
