//! Public error types for the engine API.
//!
//! Each stage keeps its own error type; this module wraps them in one enum
//! and turns any of them into [`Diagnostic`]s for rendering.

use core::fmt;

use thiserror::Error;

use crate::evaluator::ExecutionError;
use crate::parser::{ParseError, Span};
use crate::verifier::SafetyViolation;

/// Error returned by [`Engine`](super::Engine) operations.
///
/// The variant says which stage failed. A [`SafetyViolation`] is only ever
/// reported as [`Error::Unsafe`]; runtime failures of verified expressions
/// are [`Error::Runtime`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The text is not valid expression syntax.
    #[error("syntax error: {0}")]
    Parse(#[from] ParseError),

    /// The text parsed but failed verification. Nothing was evaluated.
    #[error("unsafe expression: {0}")]
    Unsafe(#[from] SafetyViolation),

    /// Evaluation of a verified expression failed.
    #[error("{0}")]
    Runtime(#[from] ExecutionError),
}

impl Error {
    /// Source location of the failure.
    pub fn span(&self) -> &Span {
        match self {
            Error::Parse(err) => &err.span,
            Error::Unsafe(err) => &err.span,
            Error::Runtime(err) => &err.span,
        }
    }

    pub fn is_safety_violation(&self) -> bool {
        matches!(self, Error::Unsafe(_))
    }

    /// Convert to diagnostics for display.
    pub fn to_diagnostics(&self) -> Vec<Diagnostic> {
        let diagnostic = match self {
            Error::Parse(err) => Diagnostic {
                severity: Severity::Error,
                message: format!("syntax error: {}", err.message),
                span: err.span.clone(),
                related: Vec::new(),
                help: None,
                code: Some("P001".to_string()),
            },
            Error::Unsafe(err) => Diagnostic {
                severity: Severity::Error,
                message: err.kind.to_string(),
                span: err.span.clone(),
                related: Vec::new(),
                help: Some(err.kind.help().to_string()),
                code: Some(err.kind.code().to_string()),
            },
            Error::Runtime(err) => Diagnostic {
                severity: Severity::Error,
                message: err.kind.to_string(),
                span: err.span.clone(),
                related: Vec::new(),
                help: None,
                code: Some(err.kind.code().to_string()),
            },
        };
        vec![diagnostic]
    }
}

/// A diagnostic message (error, warning, or info) with source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Severity level (error, warning, info).
    pub severity: Severity,

    /// Primary diagnostic message.
    pub message: String,

    /// Source location of the primary issue.
    pub span: Span,

    /// Related locations that provide additional context.
    pub related: Vec<RelatedInfo>,

    /// Optional help text suggesting how to fix the issue.
    pub help: Option<String>,

    /// Optional error code (e.g., "S002") for documentation lookup.
    pub code: Option<String>,
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Related information for a diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedInfo {
    /// Source location of the related information.
    pub span: Span,

    /// Message explaining the relevance.
    pub message: String,
}
