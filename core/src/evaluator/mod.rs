//! Tree-walking evaluator for verified expressions.
//!
//! The evaluator interprets the expression grammar the parser produces and
//! nothing else: values have no attributes, there is no I/O and no import
//! machinery, and the only names in reach are the ones in the scope it is
//! given. It never decides whether an expression is safe; the verifier does
//! that before anything gets here.
//!
//! ## Design Principles
//!
//! - **Never panic**: All adversarial inputs must be handled gracefully
//! - **Stack-safe**: Depth tracking bounds the evaluator's own recursion
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use safe_eval_core::{evaluator::{self, Scope}, parser::{self, StmtKind}, values::Value};
//!
//! let module = parser::parse("x * 2").unwrap();
//! let StmtKind::Expr(expr) = &module.body[0].kind else { unreachable!() };
//!
//! let scope = Arc::new(Scope::from_bindings(None, [("x", Value::Int(21))]));
//! let result = evaluator::eval(expr, &scope).unwrap();
//! assert_eq!(result, Value::Int(42));
//! ```

mod error;
mod eval;
mod operators;
mod scope;


pub use error::{ExecutionError, RuntimeError};
pub use eval::Evaluator;
pub use scope::Scope;

pub(crate) use operators::{binary, iterate, order};

use std::sync::Arc;

use crate::parser::Expr;
use crate::values::Value;

/// Limits applied while evaluating.
#[derive(Debug, Clone)]
pub struct EvaluatorOptions {
    /// Maximum evaluation stack depth. Every node and every call takes one
    /// level. The default fits a 2 MiB thread stack in unoptimized builds.
    pub max_depth: usize,
}

impl Default for EvaluatorOptions {
    fn default() -> Self {
        Self { max_depth: 200 }
    }
}

/// Evaluate an expression with default limits.
///
/// Uses default stack depth limit of 200.
pub fn eval(expr: &Expr, scope: &Arc<Scope>) -> Result<Value, ExecutionError> {
    eval_with_options(expr, scope, EvaluatorOptions::default())
}

/// Evaluate an expression with custom limits.
pub fn eval_with_options(
    expr: &Expr,
    scope: &Arc<Scope>,
    options: EvaluatorOptions,
) -> Result<Value, ExecutionError> {
    Evaluator::new(options).eval(expr, scope)
}
