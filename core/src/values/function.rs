//! Callable values.
//!
//! Two kinds of callables exist at runtime: native functions registered on a
//! [`Policy`](crate::verifier::Policy) and lambdas created while evaluating an
//! expression. Both are reference counted so values stay cheap to clone.

use core::fmt;
use std::sync::Arc;

use crate::evaluator::{Evaluator, EvaluatorOptions, RuntimeError, Scope};
use crate::parser::Expr;
use crate::values::Value;

/// Signature of a native function: positional arguments, then keyword arguments
/// in call order.
pub type NativeFn =
    dyn Fn(&[Value], &[(String, Value)]) -> Result<Value, RuntimeError> + Send + Sync;

/// Signature of a native function that calls back into expression values,
/// such as a `key=` function. Callbacks go through the evaluator that called
/// the native function, so they count against its depth limit.
pub type ReentrantFn = dyn Fn(&mut Evaluator, &[Value], &[(String, Value)]) -> Result<Value, RuntimeError>
    + Send
    + Sync;

#[derive(Clone)]
enum Body {
    Plain(Arc<NativeFn>),
    Reentrant(Arc<ReentrantFn>),
}

/// A named Rust function callable from expressions.
#[derive(Clone)]
pub struct NativeFunction {
    name: Arc<str>,
    body: Body,
}

impl NativeFunction {
    pub fn new<F>(name: impl Into<Arc<str>>, func: F) -> Self
    where
        F: Fn(&[Value], &[(String, Value)]) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            body: Body::Plain(Arc::new(func)),
        }
    }

    /// A native function that receives the calling evaluator.
    pub fn reentrant<F>(name: impl Into<Arc<str>>, func: F) -> Self
    where
        F: Fn(&mut Evaluator, &[Value], &[(String, Value)]) -> Result<Value, RuntimeError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            body: Body::Reentrant(Arc::new(func)),
        }
    }

    /// The name the function is registered and called under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Call outside of any evaluation. Callbacks start with a fresh depth
    /// budget.
    pub fn call(&self, args: &[Value], kwargs: &[(String, Value)]) -> Result<Value, RuntimeError> {
        self.call_in(&mut Evaluator::new(EvaluatorOptions::default()), args, kwargs)
    }

    /// Call on behalf of `evaluator`.
    pub fn call_in(
        &self,
        evaluator: &mut Evaluator,
        args: &[Value],
        kwargs: &[(String, Value)],
    ) -> Result<Value, RuntimeError> {
        match &self.body {
            Body::Plain(func) => func(args, kwargs),
            Body::Reentrant(func) => func(evaluator, args, kwargs),
        }
    }

    fn same_body(&self, other: &NativeFunction) -> bool {
        match (&self.body, &other.body) {
            (Body::Plain(a), Body::Plain(b)) => Arc::ptr_eq(a, b),
            (Body::Reentrant(a), Body::Reentrant(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A closure created by a `lambda` expression.
///
/// Defaults are evaluated once, when the lambda is created. The body sees the
/// scope that was current at that point.
pub struct Lambda {
    pub params: Vec<String>,
    pub defaults: Vec<Option<Value>>,
    pub varargs: Option<String>,
    pub kwargs: Option<String>,
    pub body: Expr,
    pub scope: Arc<Scope>,
}

#[derive(Clone)]
pub enum Function {
    Native(NativeFunction),
    Lambda(Arc<Lambda>),
}

impl Function {
    pub(crate) fn same_as(&self, other: &Function) -> bool {
        match (self, other) {
            (Function::Native(a), Function::Native(b)) => a.same_body(b),
            (Function::Lambda(a), Function::Lambda(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Native(native) => write!(f, "<built-in function {}>", native.name()),
            Function::Lambda(_) => f.write_str("<function <lambda>>"),
        }
    }
}

impl From<NativeFunction> for Value {
    fn from(func: NativeFunction) -> Self {
        Value::Function(Function::Native(func))
    }
}

/// Parameter list of a native function, used to bind call arguments by
/// position or keyword.
///
/// ```
/// use safe_eval_core::values::{ArgSpec, Value};
///
/// let spec = ArgSpec::new("round", &["number", "ndigits"], 1);
/// let bound = spec.bind(&[Value::Float(2.5)], &[]).unwrap();
/// assert_eq!(bound[0], Some(Value::Float(2.5)));
/// assert_eq!(bound[1], None);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ArgSpec<'a> {
    name: &'a str,
    params: &'a [&'a str],
    required: usize,
}

impl<'a> ArgSpec<'a> {
    /// `required` leading parameters must be supplied; the rest are optional.
    pub const fn new(name: &'a str, params: &'a [&'a str], required: usize) -> Self {
        Self {
            name,
            params,
            required,
        }
    }

    pub fn bind(
        &self,
        args: &[Value],
        kwargs: &[(String, Value)],
    ) -> Result<Vec<Option<Value>>, RuntimeError> {
        if args.len() > self.params.len() {
            return Err(RuntimeError::TypeError(format!(
                "{}() takes at most {} argument{} ({} given)",
                self.name,
                self.params.len(),
                if self.params.len() == 1 { "" } else { "s" },
                args.len()
            )));
        }

        let mut bound: Vec<Option<Value>> = vec![None; self.params.len()];
        for (slot, arg) in bound.iter_mut().zip(args) {
            *slot = Some(arg.clone());
        }

        for (key, value) in kwargs {
            let index = self
                .params
                .iter()
                .position(|p| p == key)
                .ok_or_else(|| {
                    RuntimeError::TypeError(format!(
                        "{}() got an unexpected keyword argument '{}'",
                        self.name, key
                    ))
                })?;
            if bound[index].is_some() {
                return Err(RuntimeError::TypeError(format!(
                    "{}() got multiple values for argument '{}'",
                    self.name, key
                )));
            }
            bound[index] = Some(value.clone());
        }

        if let Some(missing) = bound
            .iter()
            .take(self.required)
            .position(Option::is_none)
        {
            return Err(RuntimeError::TypeError(format!(
                "{}() missing required argument: '{}'",
                self.name, self.params[missing]
            )));
        }

        Ok(bound)
    }
}
