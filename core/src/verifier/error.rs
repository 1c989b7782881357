use thiserror::Error;

use crate::parser::Span;

/// The first construct that made an expression unsafe to evaluate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct SafetyViolation {
    pub kind: ViolationKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViolationKind {
    /// The source is not exactly one expression statement.
    #[error("must be a single expression (found {found})")]
    NotSingleExpression { found: String },

    /// A call whose callee is a name outside the allow-set.
    #[error("call to '{name}' not in allowed list")]
    DisallowedCall { name: String },

    /// A call whose callee is not a plain name, so it cannot be checked
    /// against the allow-set.
    #[error("call to <unnamed> not in allowed list (callee is {callee})")]
    UnnamedCallee { callee: &'static str },
}

impl SafetyViolation {
    pub fn new(kind: ViolationKind, span: Span) -> Self {
        Self { kind, span }
    }
}

impl ViolationKind {
    /// Stable diagnostic code.
    pub fn code(&self) -> &'static str {
        match self {
            ViolationKind::NotSingleExpression { .. } => "S001",
            ViolationKind::DisallowedCall { .. } => "S002",
            ViolationKind::UnnamedCallee { .. } => "S003",
        }
    }

    pub fn help(&self) -> &'static str {
        match self {
            ViolationKind::NotSingleExpression { .. } => {
                "only a single bare expression can be evaluated"
            }
            ViolationKind::DisallowedCall { .. } => {
                "register the function on the policy to allow calling it"
            }
            ViolationKind::UnnamedCallee { .. } => "only functions called by plain name are allowed",
        }
    }
}

/// Errors raised while building a [`Policy`](super::Policy).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("callable '{name}' is already registered")]
    DuplicateCallable { name: String },

    #[error("'{name}' is reserved for the expression argument")]
    ReservedName { name: String },

    #[error("'{name}' is not a valid identifier")]
    InvalidName { name: String },
}
