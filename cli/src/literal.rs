//! Command-line literals for `--bind` values and `call` arguments.
//!
//! A literal is any expression that evaluates without calling anything:
//! numbers, strings, `None`, `True`/`False` and containers of those. It is
//! checked against an empty policy, so a literal can never run a function.

use safe_eval::{Engine, Error, Policy, Value};

pub struct LiteralParser {
    engine: Engine,
}

impl LiteralParser {
    pub fn new() -> Self {
        Self {
            engine: Engine::new(Policy::empty()),
        }
    }

    pub fn parse(&self, text: &str) -> Result<Value, Error> {
        self.engine.evaluate(text, &[])
    }
}

/// Split a `NAME=LITERAL` binding at the first `=`.
pub fn parse_binding(text: &str) -> Result<(String, String), String> {
    match text.split_once('=') {
        Some((name, literal)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), literal.to_string()))
        }
        _ => Err(format!("expected NAME=LITERAL, got '{text}'")),
    }
}
