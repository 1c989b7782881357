//! Conversions: `float`, `int`, `str`, `bool`, `ord`, `chr`.
//!
//! `float`, `int` and `str` form the base set every policy starts with.

use super::bind;
use crate::{
    evaluator::RuntimeError,
    values::{ArgSpec, NativeFunction, Value, repr_str},
};

const FLOAT: ArgSpec<'static> = ArgSpec::new("float", &["x"], 0);
const INT: ArgSpec<'static> = ArgSpec::new("int", &["x", "base"], 0);
const STR: ArgSpec<'static> = ArgSpec::new("str", &["object"], 0);
const BOOL: ArgSpec<'static> = ArgSpec::new("bool", &["x"], 0);
const ORD: ArgSpec<'static> = ArgSpec::new("ord", &["c"], 1);
const CHR: ArgSpec<'static> = ArgSpec::new("chr", &["i"], 1);

pub fn float() -> NativeFunction {
    NativeFunction::new("float", |args, kwargs| {
        let [x] = bind::<1>(&FLOAT, args, kwargs)?;
        match x {
            None => Ok(Value::Float(0.0)),
            Some(Value::Float(x)) => Ok(Value::Float(x)),
            Some(Value::Int(n)) => Ok(Value::Float(n as f64)),
            Some(Value::Bool(b)) => Ok(Value::Float(if b { 1.0 } else { 0.0 })),
            Some(Value::Str(s)) => parse_float(&s).map(Value::Float),
            Some(other) => Err(RuntimeError::type_error(format!(
                "float() argument must be a string or a real number, not '{}'",
                other.type_name()
            ))),
        }
    })
}

fn parse_float(text: &str) -> Result<f64, RuntimeError> {
    let trimmed = text.trim();
    let valid_underscores = !trimmed.starts_with('_')
        && !trimmed.ends_with('_')
        && !trimmed.contains("__");
    trimmed
        .replace('_', "")
        .parse::<f64>()
        .ok()
        .filter(|_| valid_underscores && !trimmed.is_empty())
        .ok_or_else(|| {
            RuntimeError::value_error(format!(
                "could not convert string to float: {}",
                repr_str(text)
            ))
        })
}

pub fn int() -> NativeFunction {
    NativeFunction::new("int", |args, kwargs| {
        let [x, base] = bind::<2>(&INT, args, kwargs)?;
        let base = match base {
            None => None,
            Some(b) => Some(b.as_int().ok_or_else(|| {
                RuntimeError::type_error(format!(
                    "'{}' object cannot be interpreted as an integer",
                    b.type_name()
                ))
            })?),
        };
        match (x, base) {
            (None, None) => Ok(Value::Int(0)),
            (Some(Value::Str(s)), base) => parse_int(&s, base.unwrap_or(10)).map(Value::Int),
            (None, Some(_)) => Err(RuntimeError::type_error("int() missing string argument")),
            (Some(_), Some(_)) => Err(RuntimeError::type_error(
                "int() can't convert non-string with explicit base",
            )),
            (Some(Value::Int(n)), None) => Ok(Value::Int(n)),
            (Some(Value::Bool(b)), None) => Ok(Value::Int(i64::from(b))),
            (Some(Value::Float(x)), None) => float_to_int(x).map(Value::Int),
            (Some(other), None) => Err(RuntimeError::type_error(format!(
                "int() argument must be a string or a real number, not '{}'",
                other.type_name()
            ))),
        }
    })
}

/// Truncate towards zero.
pub(crate) fn float_to_int(x: f64) -> Result<i64, RuntimeError> {
    if x.is_nan() {
        return Err(RuntimeError::value_error("cannot convert float NaN to integer"));
    }
    if x.is_infinite() {
        return Err(RuntimeError::OverflowError(
            "cannot convert float infinity to integer".to_string(),
        ));
    }
    let truncated = x.trunc();
    // i64::MAX is not representable; 2^63 is the first float out of range.
    if truncated < -9_223_372_036_854_775_808.0 || truncated >= 9_223_372_036_854_775_808.0 {
        return Err(RuntimeError::OverflowError("int too large".to_string()));
    }
    Ok(truncated as i64)
}

fn parse_int(text: &str, base: i64) -> Result<i64, RuntimeError> {
    let invalid = || {
        RuntimeError::value_error(format!(
            "invalid literal for int() with base {}: {}",
            base,
            repr_str(text)
        ))
    };
    if base != 0 && !(2..=36).contains(&base) {
        return Err(RuntimeError::value_error(
            "int() base must be >= 2 and <= 36, or 0",
        ));
    }

    let trimmed = text.trim();
    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let lower = unsigned.to_ascii_lowercase();
    let prefixed = |prefix: &str, radix: i64| {
        lower
            .strip_prefix(prefix)
            .filter(|_| base == radix || base == 0)
    };
    let (radix, digits) = if let Some(rest) = prefixed("0x", 16) {
        (16, rest)
    } else if let Some(rest) = prefixed("0o", 8) {
        (8, rest)
    } else if let Some(rest) = prefixed("0b", 2) {
        (2, rest)
    } else if base == 0 {
        // Base 0 without a prefix means decimal, without leading zeros.
        if lower.len() > 1 && lower.starts_with('0') && !lower.trim_start_matches('0').is_empty() {
            return Err(invalid());
        }
        (10, lower.as_str())
    } else {
        (base, lower.as_str())
    };

    let digits = digits.strip_prefix('_').unwrap_or(digits);
    if digits.is_empty() || digits.ends_with('_') || digits.contains("__") {
        return Err(invalid());
    }
    let cleaned = digits.replace('_', "");
    let radix = u32::try_from(radix).map_err(|_| invalid())?;
    // Parse with the sign attached so that i64::MIN is reachable.
    let signed = if negative {
        format!("-{cleaned}")
    } else {
        cleaned
    };
    i64::from_str_radix(&signed, radix).map_err(|err| match err.kind() {
        core::num::IntErrorKind::PosOverflow | core::num::IntErrorKind::NegOverflow => {
            RuntimeError::OverflowError("int too large".to_string())
        }
        _ => invalid(),
    })
}

pub fn str() -> NativeFunction {
    NativeFunction::new("str", |args, kwargs| {
        let [object] = bind::<1>(&STR, args, kwargs)?;
        Ok(Value::Str(object.map(|v| v.to_string()).unwrap_or_default()))
    })
}

pub fn bool() -> NativeFunction {
    NativeFunction::new("bool", |args, kwargs| {
        let [x] = bind::<1>(&BOOL, args, kwargs)?;
        Ok(Value::Bool(x.is_some_and(|v| v.is_truthy())))
    })
}

pub fn ord() -> NativeFunction {
    NativeFunction::new("ord", |args, kwargs| {
        let [c] = bind::<1>(&ORD, args, kwargs)?;
        match c {
            Some(Value::Str(s)) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Value::Int(i64::from(u32::from(c)))),
                    _ => Err(RuntimeError::type_error(format!(
                        "ord() expected a character, but string of length {} found",
                        s.chars().count()
                    ))),
                }
            }
            other => Err(RuntimeError::type_error(format!(
                "ord() expected string of length 1, but {} found",
                other.map_or("NoneType", |v| v.type_name())
            ))),
        }
    })
}

pub fn chr() -> NativeFunction {
    NativeFunction::new("chr", |args, kwargs| {
        let [i] = bind::<1>(&CHR, args, kwargs)?;
        let code = i
            .as_ref()
            .and_then(Value::as_int)
            .ok_or_else(|| RuntimeError::type_error("an integer is required"))?;
        u32::try_from(code)
            .ok()
            .and_then(char::from_u32)
            .map(|c| Value::Str(c.to_string()))
            .ok_or_else(|| RuntimeError::value_error("chr() arg not in range(0x110000)"))
    })
}
