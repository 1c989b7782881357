//! Runtime evaluation errors.
//!
//! These occur after an expression has passed verification. They are never
//! safety violations: the verifier has already accepted the tree, and what
//! remains are ordinary failures such as a bad operand type or a missing key.
//! Native functions report the same errors, so they propagate unchanged.

use thiserror::Error;

use crate::parser::Span;

/// Failure raised while evaluating an expression, named after the host
/// language's exception classes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("NameError: name '{name}' is not defined")]
    NameError { name: String },

    #[error("TypeError: {0}")]
    TypeError(String),

    #[error("ValueError: {0}")]
    ValueError(String),

    #[error("ZeroDivisionError: {0}")]
    ZeroDivisionError(String),

    #[error("IndexError: {0}")]
    IndexError(String),

    /// Carries the `repr()` of the missing key.
    #[error("KeyError: {0}")]
    KeyError(String),

    #[error("AttributeError: '{type_name}' object has no attribute '{attr}'")]
    AttributeError { type_name: String, attr: String },

    #[error("OverflowError: {0}")]
    OverflowError(String),

    /// Evaluation nested deeper than `max_depth`.
    #[error("RecursionError: maximum evaluation depth exceeded ({depth} > {max_depth})")]
    RecursionLimit { depth: usize, max_depth: usize },
}

impl RuntimeError {
    pub fn type_error(message: impl Into<String>) -> Self {
        RuntimeError::TypeError(message.into())
    }

    pub fn value_error(message: impl Into<String>) -> Self {
        RuntimeError::ValueError(message.into())
    }

    /// Stable diagnostic code.
    pub fn code(&self) -> &'static str {
        match self {
            RuntimeError::NameError { .. } => "R001",
            RuntimeError::TypeError(_) => "R002",
            RuntimeError::ValueError(_) => "R003",
            RuntimeError::ZeroDivisionError(_) => "R004",
            RuntimeError::IndexError(_) => "R005",
            RuntimeError::KeyError(_) => "R006",
            RuntimeError::AttributeError { .. } => "R007",
            RuntimeError::OverflowError(_) => "R008",
            RuntimeError::RecursionLimit { .. } => "R009",
        }
    }
}

/// A [`RuntimeError`] together with the node that raised it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct ExecutionError {
    pub kind: RuntimeError,
    pub span: Span,
}

impl ExecutionError {
    pub fn new(kind: RuntimeError, span: Span) -> Self {
        Self { kind, span }
    }
}
