//! Sequence functions: `len`, `sorted`.

use core::cmp::Ordering;

use super::{bind, call_key};
use crate::{
    evaluator::{RuntimeError, iterate, order},
    values::{ArgSpec, NativeFunction, Value},
};

const LEN: ArgSpec<'static> = ArgSpec::new("len", &["obj"], 1);

/// Number of items in a string, list, tuple, set or dict
pub fn len() -> NativeFunction {
    NativeFunction::new("len", |args, kwargs| {
        let [obj] = bind::<1>(&LEN, args, kwargs)?;
        let n = match &obj {
            Some(Value::Str(s)) => s.chars().count(),
            Some(Value::List(items) | Value::Tuple(items) | Value::Set(items)) => items.len(),
            Some(Value::Dict(pairs)) => pairs.len(),
            other => {
                return Err(RuntimeError::type_error(format!(
                    "object of type '{}' has no len()",
                    other.as_ref().map_or("NoneType", Value::type_name)
                )));
            }
        };
        i64::try_from(n)
            .map(Value::Int)
            .map_err(|_| RuntimeError::OverflowError("length too large".to_string()))
    })
}

/// New list with the items of an iterable in ascending order.
///
/// The sort is stable, also with `reverse=True`. Unordered pairs (NaN) compare
/// as equal.
pub fn sorted() -> NativeFunction {
    NativeFunction::reentrant("sorted", |evaluator, args, kwargs| {
        let [iterable] = args else {
            return Err(RuntimeError::type_error(format!(
                "sorted expected 1 argument, got {}",
                args.len()
            )));
        };

        let mut key = None;
        let mut reverse = false;
        for (k, v) in kwargs {
            match k.as_str() {
                "key" if !v.is_none() => key = Some(v),
                "key" => {}
                "reverse" => reverse = v.is_truthy(),
                other => {
                    return Err(RuntimeError::type_error(format!(
                        "sorted() got an unexpected keyword argument '{other}'"
                    )));
                }
            }
        }

        let mut keyed = iterate(iterable)?
            .into_iter()
            .map(|item| {
                let k = match key {
                    Some(f) => call_key(evaluator, f, item.clone())?,
                    None => item.clone(),
                };
                Ok((k, item))
            })
            .collect::<Result<Vec<_>, RuntimeError>>()?;

        let mut failure = None;
        keyed.sort_by(|(a, _), (b, _)| {
            if failure.is_some() {
                return Ordering::Equal;
            }
            let ordering = match order("<", a, b) {
                Ok(ordering) => ordering.unwrap_or(Ordering::Equal),
                Err(err) => {
                    failure = Some(err);
                    Ordering::Equal
                }
            };
            if reverse { ordering.reverse() } else { ordering }
        });
        if let Some(err) = failure {
            return Err(err);
        }

        Ok(Value::List(keyed.into_iter().map(|(_, item)| item).collect()))
    })
}
