//! Compiled expressions.

use core::fmt;
use std::sync::Arc;

use super::ExecutionOptions;
use crate::evaluator::{self, ExecutionError, Scope};
use crate::parser::Expr;
use crate::values::Value;
use crate::verifier::ARGUMENT_NAME;

/// A verified expression of one argument, `_`, ready to be called.
///
/// Compiled expressions own everything they need: the tree, the callables of
/// the policy they were verified against and the execution limits. They are
/// cheap to clone and can be shared between threads; every call builds its
/// own scope.
///
/// # Example
///
/// ```
/// use safe_eval_core::api::Engine;
/// use safe_eval_core::values::Value;
///
/// let engine = Engine::default();
/// let half = engine.compile("float(_) / 2").unwrap();
///
/// assert_eq!(half.call(Value::Int(3)).unwrap(), Value::Float(1.5));
/// assert_eq!(half.call(Value::from("5")).unwrap(), Value::Float(2.5));
/// ```
#[derive(Clone)]
pub struct CompiledExpression {
    source: Arc<str>,
    expr: Arc<Expr>,
    globals: Arc<Scope>,
    options: ExecutionOptions,
}

impl CompiledExpression {
    /// Created by [`Engine::compile`](super::Engine::compile) once the tree
    /// has passed verification.
    pub(crate) fn new(
        source: &str,
        expr: Expr,
        globals: Arc<Scope>,
        options: ExecutionOptions,
    ) -> Self {
        Self {
            source: source.into(),
            expr: Arc::new(expr),
            globals,
            options,
        }
    }

    /// Evaluate with `_` bound to `arg`.
    ///
    /// `_` shadows nothing: it can never be registered as a callable.
    pub fn call(&self, arg: Value) -> Result<Value, ExecutionError> {
        let scope = Arc::new(Scope::from_bindings(
            Some(self.globals.clone()),
            [(ARGUMENT_NAME, arg)],
        ));
        evaluator::eval_with_options(&self.expr, &scope, (&self.options).into())
    }

    /// Turn the expression into a plain function.
    pub fn into_fn(self) -> impl Fn(Value) -> Result<Value, ExecutionError> + Send + Sync + Clone {
        move |arg| self.call(arg)
    }

    /// The text the expression was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }
}

impl fmt::Debug for CompiledExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledExpression")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
