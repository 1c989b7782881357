//! The evaluation engine.

use std::sync::Arc;

use tracing::debug;

use super::{CompiledExpression, EngineOptions, Error};
use crate::evaluator::{self, Scope};
use crate::parser::{self, Module};
use crate::values::Value;
use crate::verifier::{Policy, Verifier};

/// Verifies and evaluates expressions against one [`Policy`].
///
/// The engine manages:
/// - The policy (allowed callables, verbosity)
/// - A global scope holding the allowed callables
/// - Runtime configuration (EngineOptions)
///
/// Nothing is evaluated before the whole tree has passed verification.
///
/// # Example
///
/// ```
/// use safe_eval_core::api::Engine;
/// use safe_eval_core::stdlib;
/// use safe_eval_core::values::Value;
/// use safe_eval_core::verifier::Policy;
///
/// let policy = Policy::builder()
///     .allow(stdlib::by_name("len").unwrap())
///     .unwrap()
///     .build();
/// let engine = Engine::new(policy);
///
/// let value = engine.evaluate("len(xs) * 2", &[("xs", Value::from(vec![Value::Int(1)]))]).unwrap();
/// assert_eq!(value, Value::Int(2));
///
/// assert!(engine.evaluate("open('x')", &[]).unwrap_err().is_safety_violation());
/// ```
#[derive(Clone)]
pub struct Engine {
    policy: Policy,
    globals: Arc<Scope>,
    options: EngineOptions,
}

impl Engine {
    pub fn new(policy: Policy) -> Self {
        Self::with_options(policy, EngineOptions::default())
    }

    pub fn with_options(policy: Policy, options: EngineOptions) -> Self {
        let globals = Scope::from_bindings(
            None,
            policy
                .callables()
                .map(|f| (f.name().to_string(), Value::from(f.clone()))),
        );
        Self {
            policy,
            globals: Arc::new(globals),
            options,
        }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Access the engine options.
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Parse and verify `source` without evaluating it.
    pub fn check(&self, source: &str) -> Result<(), Error> {
        debug!(source, "check");
        let module = parser::parse(source)?;
        Verifier::new(&self.policy).check(&module)?;
        Ok(())
    }

    /// Parse, verify and evaluate `source`.
    ///
    /// `bindings` are visible as variables and take precedence over allowed
    /// callables of the same name.
    pub fn evaluate(&self, source: &str, bindings: &[(&str, Value)]) -> Result<Value, Error> {
        debug!(source, bindings = bindings.len(), "evaluate");
        let module = parser::parse(source)?;
        self.evaluate_module(&module, bindings)
    }

    /// Verify and evaluate an already parsed module.
    pub fn evaluate_module(
        &self,
        module: &Module,
        bindings: &[(&str, Value)],
    ) -> Result<Value, Error> {
        let expr = Verifier::new(&self.policy).verified_expr(module)?;
        let scope = Arc::new(Scope::from_bindings(
            Some(self.globals.clone()),
            bindings
                .iter()
                .map(|(name, value)| (*name, value.clone())),
        ));
        let value =
            evaluator::eval_with_options(expr, &scope, (&self.options.execution).into())?;
        debug!(result = %value.repr(), "evaluated");
        Ok(value)
    }

    /// Parse and verify `source` once, for repeated calls with `_` bound to
    /// an argument.
    ///
    /// # Example
    ///
    /// ```
    /// use safe_eval_core::api::Engine;
    /// use safe_eval_core::values::Value;
    ///
    /// let engine = Engine::default();
    /// let head = engine.compile("_[:3]").unwrap();
    /// let items: Vec<Value> = (0..9).map(Value::Int).collect();
    ///
    /// assert_eq!(head.call(Value::from(items)).unwrap().to_string(), "[0, 1, 2]");
    /// ```
    pub fn compile(&self, source: &str) -> Result<CompiledExpression, Error> {
        debug!(source, "compile");
        let module = parser::parse(source)?;
        let expr = Verifier::new(&self.policy).verified_expr(&module)?;
        Ok(CompiledExpression::new(
            source,
            expr.clone(),
            self.globals.clone(),
            self.options.execution.clone(),
        ))
    }
}

impl Default for Engine {
    /// An engine with the base policy.
    fn default() -> Self {
        Self::new(Policy::default())
    }
}
