use pest::error::InputLocation;
use thiserror::Error;

use crate::parser::{Rule, Span};

/// Syntax error in the source text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }

    pub(crate) fn at(message: impl Into<String>, span: pest::Span<'_>) -> Self {
        Self::new(message, Span::from(span))
    }
}

impl From<pest::error::Error<Rule>> for ParseError {
    fn from(err: pest::error::Error<Rule>) -> Self {
        let span = match err.location {
            InputLocation::Pos(pos) => Span::new(pos, pos),
            InputLocation::Span((start, end)) => Span::new(start, end),
        };
        Self {
            message: err.variant.message().into_owned(),
            span,
        }
    }
}
