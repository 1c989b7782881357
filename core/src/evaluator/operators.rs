//! Operator implementations on runtime values.
//!
//! Integer arithmetic is checked: overflow raises `OverflowError` instead of
//! wrapping. Floor division and modulo round towards negative infinity.

use core::cmp::Ordering;

use crate::evaluator::RuntimeError;
use crate::parser::{BinaryOp, CompareOp, UnaryOp};
use crate::values::Value;

type OpResult<T> = Result<T, RuntimeError>;

#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

fn num(value: &Value) -> Option<Num> {
    match value {
        Value::Int(n) => Some(Num::Int(*n)),
        Value::Bool(b) => Some(Num::Int(i64::from(*b))),
        Value::Float(x) => Some(Num::Float(*x)),
        _ => None,
    }
}

fn overflow() -> RuntimeError {
    RuntimeError::OverflowError("integer overflow".to_string())
}

fn unsupported(op: &str, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::type_error(format!(
        "unsupported operand type(s) for {}: '{}' and '{}'",
        op,
        left.type_name(),
        right.type_name()
    ))
}

// ============================================================================
// Binary operators
// ============================================================================

pub(crate) fn binary(op: BinaryOp, left: &Value, right: &Value) -> OpResult<Value> {
    match (op, left, right) {
        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
        (BinaryOp::Add, Value::List(a), Value::List(b)) => {
            Ok(Value::List(a.iter().chain(b).cloned().collect()))
        }
        (BinaryOp::Add, Value::Tuple(a), Value::Tuple(b)) => {
            Ok(Value::Tuple(a.iter().chain(b).cloned().collect()))
        }
        (BinaryOp::Mul, seq @ (Value::Str(_) | Value::List(_) | Value::Tuple(_)), count)
        | (BinaryOp::Mul, count, seq @ (Value::Str(_) | Value::List(_) | Value::Tuple(_)))
            if matches!(count, Value::Int(_) | Value::Bool(_)) =>
        {
            repeat(seq, count.as_int().unwrap_or(0))
        }
        (BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor, Value::Bool(a), Value::Bool(b)) => {
            Ok(Value::Bool(match op {
                BinaryOp::BitAnd => a & b,
                BinaryOp::BitOr => a | b,
                _ => a ^ b,
            }))
        }
        _ => match (num(left), num(right)) {
            (Some(Num::Int(a)), Some(Num::Int(b))) => binary_int(op, a, b),
            (Some(a), Some(b)) => {
                let (a, b) = (as_f64(a), as_f64(b));
                match op {
                    BinaryOp::BitAnd
                    | BinaryOp::BitOr
                    | BinaryOp::BitXor
                    | BinaryOp::LShift
                    | BinaryOp::RShift
                    | BinaryOp::MatMul => Err(unsupported(op.symbol(), left, right)),
                    _ => binary_float(op, a, b).map(Value::Float),
                }
            }
            _ => Err(unsupported(op.symbol(), left, right)),
        },
    }
}

fn as_f64(n: Num) -> f64 {
    match n {
        Num::Int(i) => i as f64,
        Num::Float(x) => x,
    }
}

/// Largest result `*` will build for a string or sequence, in bytes.
const MAX_REPEAT_BYTES: usize = 1 << 30;

fn repeat(seq: &Value, count: i64) -> OpResult<Value> {
    let times = usize::try_from(count).unwrap_or(0);
    let too_long = || RuntimeError::OverflowError("repeated sequence is too long".to_string());
    let checked_len = |len: usize, item_size: usize| {
        len.checked_mul(times)
            .filter(|total| total.saturating_mul(item_size) <= MAX_REPEAT_BYTES)
            .ok_or_else(too_long)
    };
    match seq {
        Value::Str(s) => {
            checked_len(s.len(), 1)?;
            Ok(Value::Str(s.repeat(times)))
        }
        Value::List(items) | Value::Tuple(items) => {
            let total = checked_len(items.len(), size_of::<Value>())?;
            let mut out = Vec::with_capacity(total);
            for _ in 0..times {
                out.extend(items.iter().cloned());
            }
            Ok(match seq {
                Value::List(_) => Value::List(out),
                _ => Value::Tuple(out),
            })
        }
        other => Err(RuntimeError::type_error(format!(
            "can't multiply sequence of type '{}'",
            other.type_name()
        ))),
    }
}

fn binary_int(op: BinaryOp, a: i64, b: i64) -> OpResult<Value> {
    let result = match op {
        BinaryOp::Add => a.checked_add(b).ok_or_else(overflow)?,
        BinaryOp::Sub => a.checked_sub(b).ok_or_else(overflow)?,
        BinaryOp::Mul => a.checked_mul(b).ok_or_else(overflow)?,
        BinaryOp::Div => {
            if b == 0 {
                return Err(RuntimeError::ZeroDivisionError("division by zero".to_string()));
            }
            return Ok(Value::Float(a as f64 / b as f64));
        }
        BinaryOp::FloorDiv => {
            if b == 0 {
                return Err(RuntimeError::ZeroDivisionError(
                    "integer division or modulo by zero".to_string(),
                ));
            }
            let q = a.checked_div(b).ok_or_else(overflow)?;
            if a % b != 0 && ((a < 0) != (b < 0)) {
                q - 1
            } else {
                q
            }
        }
        BinaryOp::Mod => {
            if b == 0 {
                return Err(RuntimeError::ZeroDivisionError(
                    "integer modulo by zero".to_string(),
                ));
            }
            let r = a.checked_rem(b).unwrap_or(0);
            if r != 0 && ((r < 0) != (b < 0)) {
                r + b
            } else {
                r
            }
        }
        BinaryOp::Pow => {
            if b < 0 {
                if a == 0 {
                    return Err(RuntimeError::ZeroDivisionError(
                        "0.0 cannot be raised to a negative power".to_string(),
                    ));
                }
                return Ok(Value::Float((a as f64).powf(b as f64)));
            }
            match u32::try_from(b) {
                Ok(exp) => a.checked_pow(exp).ok_or_else(overflow)?,
                Err(_) => match a {
                    0 | 1 => a,
                    -1 => {
                        if b % 2 == 0 {
                            1
                        } else {
                            -1
                        }
                    }
                    _ => return Err(overflow()),
                },
            }
        }
        BinaryOp::LShift => {
            if b < 0 {
                return Err(RuntimeError::value_error("negative shift count"));
            }
            if a == 0 {
                0
            } else if b >= 64 {
                return Err(overflow());
            } else {
                let shifted = a << b;
                if shifted >> b != a {
                    return Err(overflow());
                }
                shifted
            }
        }
        BinaryOp::RShift => {
            if b < 0 {
                return Err(RuntimeError::value_error("negative shift count"));
            }
            if b >= 64 {
                if a < 0 { -1 } else { 0 }
            } else {
                a >> b
            }
        }
        BinaryOp::BitAnd => a & b,
        BinaryOp::BitOr => a | b,
        BinaryOp::BitXor => a ^ b,
        BinaryOp::MatMul => {
            return Err(unsupported(op.symbol(), &Value::Int(a), &Value::Int(b)));
        }
    };
    Ok(Value::Int(result))
}

fn binary_float(op: BinaryOp, a: f64, b: f64) -> OpResult<f64> {
    let zero_div = |msg: &str| Err(RuntimeError::ZeroDivisionError(msg.to_string()));
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return zero_div("float division by zero");
            }
            a / b
        }
        BinaryOp::FloorDiv => {
            if b == 0.0 {
                return zero_div("float floor division by zero");
            }
            (a / b).floor()
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                return zero_div("float modulo");
            }
            let r = a % b;
            if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
                r + b
            } else {
                r
            }
        }
        BinaryOp::Pow => {
            if a == 0.0 && b < 0.0 {
                return zero_div("0.0 cannot be raised to a negative power");
            }
            if a < 0.0 && b.fract() != 0.0 {
                return Err(RuntimeError::value_error(
                    "negative number cannot be raised to a fractional power",
                ));
            }
            let r = a.powf(b);
            if r.is_infinite() && a.is_finite() && b.is_finite() {
                return Err(RuntimeError::OverflowError(
                    "numerical result out of range".to_string(),
                ));
            }
            r
        }
        _ => {
            return Err(RuntimeError::type_error(format!(
                "unsupported operand type(s) for {}: 'float' and 'float'",
                op.symbol()
            )));
        }
    };
    Ok(result)
}

// ============================================================================
// Unary operators
// ============================================================================

pub(super) fn unary(op: UnaryOp, operand: &Value) -> OpResult<Value> {
    let bad_operand = |symbol: &str| {
        Err(RuntimeError::type_error(format!(
            "bad operand type for unary {}: '{}'",
            symbol,
            operand.type_name()
        )))
    };
    match op {
        UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
        UnaryOp::Pos => match num(operand) {
            Some(Num::Int(n)) => Ok(Value::Int(n)),
            Some(Num::Float(x)) => Ok(Value::Float(x)),
            None => bad_operand("+"),
        },
        UnaryOp::Neg => match num(operand) {
            Some(Num::Int(n)) => n.checked_neg().map(Value::Int).ok_or_else(overflow),
            Some(Num::Float(x)) => Ok(Value::Float(-x)),
            None => bad_operand("-"),
        },
        UnaryOp::Invert => match num(operand) {
            Some(Num::Int(n)) => Ok(Value::Int(!n)),
            _ => bad_operand("~"),
        },
    }
}

// ============================================================================
// Comparisons
// ============================================================================

pub(super) fn compare(op: CompareOp, left: &Value, right: &Value) -> OpResult<bool> {
    match op {
        CompareOp::Eq => Ok(left == right),
        CompareOp::NotEq => Ok(left != right),
        CompareOp::Is => Ok(is_same(left, right)),
        CompareOp::IsNot => Ok(!is_same(left, right)),
        CompareOp::In => contains(right, left),
        CompareOp::NotIn => contains(right, left).map(|found| !found),
        CompareOp::Lt | CompareOp::LtE | CompareOp::Gt | CompareOp::GtE => {
            let ordering = order(op.symbol(), left, right)?;
            Ok(match ordering {
                None => false,
                Some(ordering) => match op {
                    CompareOp::Lt => ordering == Ordering::Less,
                    CompareOp::LtE => ordering != Ordering::Greater,
                    CompareOp::Gt => ordering == Ordering::Greater,
                    _ => ordering != Ordering::Less,
                },
            })
        }
    }
}

/// `None` and booleans compare by identity; everything else by value.
fn is_same(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::None, Value::None) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::None | Value::Bool(_), _) | (_, Value::None | Value::Bool(_)) => false,
        _ => left == right,
    }
}

/// Implements `item in container`.
pub(super) fn contains(container: &Value, item: &Value) -> OpResult<bool> {
    match container {
        Value::List(items) | Value::Tuple(items) | Value::Set(items) => {
            Ok(items.iter().any(|v| v == item))
        }
        Value::Dict(pairs) => Ok(pairs.iter().any(|(k, _)| k == item)),
        Value::Str(haystack) => match item {
            Value::Str(needle) => Ok(haystack.contains(needle.as_str())),
            other => Err(RuntimeError::type_error(format!(
                "'in <string>' requires string as left operand, not {}",
                other.type_name()
            ))),
        },
        other => Err(RuntimeError::type_error(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

/// Ordering used by `<`, `<=`, `>`, `>=` and by sorting. `None` means
/// unordered (a NaN was involved).
pub(crate) fn order(symbol: &str, left: &Value, right: &Value) -> OpResult<Option<Ordering>> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
        (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
            for (x, y) in a.iter().zip(b) {
                if x != y {
                    return order(symbol, x, y);
                }
            }
            Ok(Some(a.len().cmp(&b.len())))
        }
        _ => match (num(left), num(right)) {
            (Some(Num::Int(a)), Some(Num::Int(b))) => Ok(Some(a.cmp(&b))),
            (Some(a), Some(b)) => Ok(as_f64(a).partial_cmp(&as_f64(b))),
            _ => Err(RuntimeError::type_error(format!(
                "'{}' not supported between instances of '{}' and '{}'",
                symbol,
                left.type_name(),
                right.type_name()
            ))),
        },
    }
}

// ============================================================================
// Subscripts, slices and iteration
// ============================================================================

fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let index = if index < 0 { index + len } else { index };
    if (0..len).contains(&index) {
        usize::try_from(index).ok()
    } else {
        None
    }
}

pub(super) fn index(container: &Value, key: &Value) -> OpResult<Value> {
    match container {
        Value::List(items) | Value::Tuple(items) => {
            let kind = container.type_name();
            let i = key.as_int().ok_or_else(|| {
                RuntimeError::type_error(format!(
                    "{} indices must be integers or slices, not {}",
                    kind,
                    key.type_name()
                ))
            })?;
            normalize_index(i, items.len())
                .map(|i| items[i].clone())
                .ok_or_else(|| RuntimeError::IndexError(format!("{kind} index out of range")))
        }
        Value::Str(s) => {
            let i = key.as_int().ok_or_else(|| {
                RuntimeError::type_error(format!(
                    "string indices must be integers, not '{}'",
                    key.type_name()
                ))
            })?;
            let count = s.chars().count();
            normalize_index(i, count)
                .and_then(|i| s.chars().nth(i))
                .map(|c| Value::Str(c.to_string()))
                .ok_or_else(|| RuntimeError::IndexError("string index out of range".to_string()))
        }
        Value::Dict(pairs) => pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| RuntimeError::KeyError(key.repr())),
        other => Err(RuntimeError::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

fn slice_bound(value: Option<&Value>) -> OpResult<Option<i64>> {
    match value {
        None | Some(Value::None) => Ok(None),
        Some(v) => v.as_int().map(Some).ok_or_else(|| {
            RuntimeError::type_error("slice indices must be integers or None")
        }),
    }
}

/// Positions selected by `[lower:upper:step]` on a sequence of `len` items.
fn slice_positions(
    len: usize,
    lower: Option<i64>,
    upper: Option<i64>,
    step: Option<i64>,
) -> OpResult<Vec<usize>> {
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(RuntimeError::value_error("slice step cannot be zero"));
    }
    let len = i64::try_from(len).map_err(|_| overflow())?;

    // Clamp into [floor, ceil] after resolving negative offsets.
    let adjust = |bound: i64, floor: i64, ceil: i64| -> i64 {
        let bound = if bound < 0 {
            bound.saturating_add(len)
        } else {
            bound
        };
        bound.clamp(floor, ceil)
    };
    let (start, stop) = if step > 0 {
        (
            lower.map_or(0, |b| adjust(b, 0, len)),
            upper.map_or(len, |b| adjust(b, 0, len)),
        )
    } else {
        (
            lower.map_or(len - 1, |b| adjust(b, -1, len - 1)),
            upper.map_or(-1, |b| adjust(b, -1, len - 1)),
        )
    };

    let mut positions = Vec::new();
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        if let Ok(pos) = usize::try_from(i) {
            positions.push(pos);
        }
        match i.checked_add(step) {
            Some(next) => i = next,
            None => break,
        }
    }
    Ok(positions)
}

pub(super) fn slice(
    container: &Value,
    lower: Option<&Value>,
    upper: Option<&Value>,
    step: Option<&Value>,
) -> OpResult<Value> {
    let (lower, upper, step) = (slice_bound(lower)?, slice_bound(upper)?, slice_bound(step)?);
    match container {
        Value::List(items) | Value::Tuple(items) => {
            let picked = slice_positions(items.len(), lower, upper, step)?
                .into_iter()
                .map(|i| items[i].clone())
                .collect();
            Ok(match container {
                Value::List(_) => Value::List(picked),
                _ => Value::Tuple(picked),
            })
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let picked = slice_positions(chars.len(), lower, upper, step)?
                .into_iter()
                .map(|i| chars[i])
                .collect();
            Ok(Value::Str(picked))
        }
        other => Err(RuntimeError::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

/// Elements produced by iterating over a value.
pub(crate) fn iterate(value: &Value) -> OpResult<Vec<Value>> {
    match value {
        Value::List(items) | Value::Tuple(items) | Value::Set(items) => Ok(items.clone()),
        Value::Dict(pairs) => Ok(pairs.iter().map(|(k, _)| k.clone()).collect()),
        Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
        other => Err(RuntimeError::type_error(format!(
            "'{}' object is not iterable",
            other.type_name()
        ))),
    }
}
