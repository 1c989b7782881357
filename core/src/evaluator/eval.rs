//! Core evaluation logic.

use std::sync::Arc;

use crate::evaluator::{
    EvaluatorOptions, ExecutionError, RuntimeError, Scope,
    operators::{self, iterate},
};
use crate::parser::{BoolOp, Comprehension, Constant, DictItem, Expr, ExprKind, Keyword, Parameters, Span};
use crate::values::{Function, Lambda, Value, dict_insert};

type EvalResult = Result<Value, ExecutionError>;

/// Tree-walking evaluator for verified expressions.
pub struct Evaluator {
    options: EvaluatorOptions,
    depth: usize,
}

impl Evaluator {
    pub fn new(options: EvaluatorOptions) -> Self {
        Self { options, depth: 0 }
    }

    /// Evaluate an expression node.
    pub fn eval(&mut self, expr: &Expr, scope: &Arc<Scope>) -> EvalResult {
        self.enter(&expr.span)?;
        let result = self.eval_inner(expr, scope);
        self.depth -= 1;

        result
    }

    /// Take one level of depth, or fail if none is left.
    fn enter(&mut self, span: &Span) -> Result<(), ExecutionError> {
        if self.depth >= self.options.max_depth {
            return Err(ExecutionError::new(
                RuntimeError::RecursionLimit {
                    depth: self.depth + 1,
                    max_depth: self.options.max_depth,
                },
                span.clone(),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    /// Inner evaluation logic (no depth tracking).
    fn eval_inner(&mut self, expr: &Expr, scope: &Arc<Scope>) -> EvalResult {
        let fail = |kind: RuntimeError| ExecutionError::new(kind, expr.span.clone());

        match &expr.kind {
            ExprKind::Name(name) => scope
                .lookup(name)
                .cloned()
                .ok_or_else(|| fail(RuntimeError::NameError { name: name.clone() })),

            ExprKind::Constant(constant) => Ok(match constant {
                Constant::None => Value::None,
                Constant::Bool(b) => Value::Bool(*b),
                Constant::Int(n) => Value::Int(*n),
                Constant::Float(x) => Value::Float(*x),
                Constant::Str(s) => Value::Str(s.clone()),
            }),

            ExprKind::BoolOp { op, left, right } => {
                let left = self.eval(left, scope)?;
                // Short-circuit: the deciding operand is the result.
                let decided = match op {
                    BoolOp::And => !left.is_truthy(),
                    BoolOp::Or => left.is_truthy(),
                };
                if decided {
                    Ok(left)
                } else {
                    self.eval(right, scope)
                }
            }

            ExprKind::BinOp { op, left, right } => {
                let left = self.eval(left, scope)?;
                let right = self.eval(right, scope)?;
                operators::binary(*op, &left, &right).map_err(fail)
            }

            ExprKind::UnaryOp { op, operand } => {
                let operand = self.eval(operand, scope)?;
                operators::unary(*op, &operand).map_err(fail)
            }

            ExprKind::Compare {
                left,
                ops,
                comparators,
            } => {
                let mut left = self.eval(left, scope)?;
                for (op, right) in ops.iter().zip(comparators) {
                    let right = self.eval(right, scope)?;
                    if !operators::compare(*op, &left, &right).map_err(fail)? {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            }

            ExprKind::IfExp { test, body, orelse } => {
                if self.eval(test, scope)?.is_truthy() {
                    self.eval(body, scope)
                } else {
                    self.eval(orelse, scope)
                }
            }

            ExprKind::Lambda { params, body } => self.make_lambda(params, body, scope),

            ExprKind::Call {
                func,
                args,
                keywords,
            } => {
                let callee = self.eval(func, scope)?;
                let args = self.eval_items(args, scope)?;
                let kwargs = self.eval_keywords(keywords, scope)?;
                self.call(&callee, &args, &kwargs, &expr.span)
            }

            ExprKind::Attribute { value, attr } => {
                let value = self.eval(value, scope)?;
                Err(fail(RuntimeError::AttributeError {
                    type_name: value.type_name().to_string(),
                    attr: attr.clone(),
                }))
            }

            ExprKind::Subscript { value, index } => {
                let container = self.eval(value, scope)?;
                if let ExprKind::Slice { lower, upper, step } = &index.kind {
                    let mut bound = |part: &Option<Box<Expr>>| -> Result<Option<Value>, ExecutionError> {
                        part.as_deref().map(|e| self.eval(e, scope)).transpose()
                    };
                    let (lower, upper, step) = (bound(lower)?, bound(upper)?, bound(step)?);
                    return operators::slice(
                        &container,
                        lower.as_ref(),
                        upper.as_ref(),
                        step.as_ref(),
                    )
                    .map_err(fail);
                }
                let key = self.eval(index, scope)?;
                operators::index(&container, &key).map_err(fail)
            }

            ExprKind::Slice { .. } => Err(fail(RuntimeError::type_error(
                "slices are only supported as a direct subscript",
            ))),

            ExprKind::Starred(_) => Err(fail(RuntimeError::type_error(
                "can't use starred expression here",
            ))),

            ExprKind::List(items) => Ok(Value::List(self.eval_items(items, scope)?)),
            ExprKind::Tuple(items) => Ok(Value::Tuple(self.eval_items(items, scope)?)),
            ExprKind::Set(items) => Ok(Value::set_from(self.eval_items(items, scope)?)),

            ExprKind::Dict(items) => {
                let mut pairs = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        DictItem::Pair { key, value } => {
                            let key = self.eval(key, scope)?;
                            let value = self.eval(value, scope)?;
                            dict_insert(&mut pairs, key, value);
                        }
                        DictItem::Spread(mapping) => match self.eval(mapping, scope)? {
                            Value::Dict(entries) => {
                                for (key, value) in entries {
                                    dict_insert(&mut pairs, key, value);
                                }
                            }
                            other => {
                                return Err(ExecutionError::new(
                                    RuntimeError::type_error(format!(
                                        "'{}' object is not a mapping",
                                        other.type_name()
                                    )),
                                    mapping.span.clone(),
                                ));
                            }
                        },
                    }
                }
                Ok(Value::Dict(pairs))
            }

            ExprKind::ListComp {
                element,
                generators,
            }
            | ExprKind::GeneratorExp {
                element,
                generators,
            } => {
                let mut out = Vec::new();
                self.comprehension(generators, scope, &mut |ev, local| {
                    out.push(ev.eval(element, local)?);
                    Ok(())
                })?;
                Ok(Value::List(out))
            }

            ExprKind::SetComp {
                element,
                generators,
            } => {
                let mut out = Vec::new();
                self.comprehension(generators, scope, &mut |ev, local| {
                    out.push(ev.eval(element, local)?);
                    Ok(())
                })?;
                Ok(Value::set_from(out))
            }

            ExprKind::DictComp {
                key,
                value,
                generators,
            } => {
                let mut out = Vec::new();
                self.comprehension(generators, scope, &mut |ev, local| {
                    let k = ev.eval(key, local)?;
                    let v = ev.eval(value, local)?;
                    dict_insert(&mut out, k, v);
                    Ok(())
                })?;
                Ok(Value::Dict(out))
            }
        }
    }

    /// Evaluate display or argument items, expanding `*iterable` spreads.
    fn eval_items(&mut self, items: &[Expr], scope: &Arc<Scope>) -> Result<Vec<Value>, ExecutionError> {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            if let ExprKind::Starred(inner) = &item.kind {
                let spread = self.eval(inner, scope)?;
                out.extend(
                    iterate(&spread).map_err(|kind| ExecutionError::new(kind, item.span.clone()))?,
                );
            } else {
                out.push(self.eval(item, scope)?);
            }
        }
        Ok(out)
    }

    fn eval_keywords(
        &mut self,
        keywords: &[Keyword],
        scope: &Arc<Scope>,
    ) -> Result<Vec<(String, Value)>, ExecutionError> {
        let mut out: Vec<(String, Value)> = Vec::with_capacity(keywords.len());
        for keyword in keywords {
            let fail = |kind: RuntimeError| ExecutionError::new(kind, keyword.span.clone());
            let value = self.eval(&keyword.value, scope)?;
            let entries = match (&keyword.arg, value) {
                (Some(name), value) => vec![(name.clone(), value)],
                (None, Value::Dict(pairs)) => pairs
                    .into_iter()
                    .map(|(k, v)| match k {
                        Value::Str(name) => Ok((name, v)),
                        _ => Err(fail(RuntimeError::type_error("keywords must be strings"))),
                    })
                    .collect::<Result<_, _>>()?,
                (None, other) => {
                    return Err(fail(RuntimeError::type_error(format!(
                        "argument after ** must be a mapping, not {}",
                        other.type_name()
                    ))));
                }
            };
            for (name, value) in entries {
                if out.iter().any(|(existing, _)| *existing == name) {
                    return Err(fail(RuntimeError::type_error(format!(
                        "got multiple values for keyword argument '{name}'"
                    ))));
                }
                out.push((name, value));
            }
        }
        Ok(out)
    }

    fn make_lambda(&mut self, params: &Parameters, body: &Expr, scope: &Arc<Scope>) -> EvalResult {
        let defaults = params
            .params
            .iter()
            .map(|p| p.default.as_ref().map(|d| self.eval(d, scope)).transpose())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::Function(Function::Lambda(Arc::new(Lambda {
            params: params.params.iter().map(|p| p.name.clone()).collect(),
            defaults,
            varargs: params.varargs.clone(),
            kwargs: params.kwargs.clone(),
            body: body.clone(),
            scope: scope.clone(),
        }))))
    }

    /// Invoke a callable value. Native errors are attributed to the call site.
    ///
    /// Every call takes a level of depth on top of the nodes it evaluates, and
    /// native functions that call back (`sorted(key=...)`) do so through this
    /// evaluator, so recursion through either stays within `max_depth`.
    pub fn call(
        &mut self,
        callee: &Value,
        args: &[Value],
        kwargs: &[(String, Value)],
        span: &Span,
    ) -> EvalResult {
        self.enter(span)?;
        let result = self.call_inner(callee, args, kwargs, span);
        self.depth -= 1;

        result
    }

    fn call_inner(
        &mut self,
        callee: &Value,
        args: &[Value],
        kwargs: &[(String, Value)],
        span: &Span,
    ) -> EvalResult {
        let fail = |kind: RuntimeError| ExecutionError::new(kind, span.clone());
        match callee {
            Value::Function(Function::Native(native)) => {
                native.call_in(self, args, kwargs).map_err(fail)
            }
            Value::Function(Function::Lambda(lambda)) => {
                let local = bind_lambda_args(lambda, args, kwargs).map_err(fail)?;
                self.eval(&lambda.body, &Arc::new(local))
            }
            other => Err(fail(RuntimeError::type_error(format!(
                "'{}' object is not callable",
                other.type_name()
            )))),
        }
    }

    /// Run the `for`/`if` clauses of a comprehension, calling `emit` once per
    /// surviving combination. Comprehension variables live in their own scope.
    fn comprehension(
        &mut self,
        generators: &[Comprehension],
        scope: &Arc<Scope>,
        emit: &mut dyn FnMut(&mut Self, &Arc<Scope>) -> Result<(), ExecutionError>,
    ) -> Result<(), ExecutionError> {
        let mut local = Arc::new(Scope::child(scope.clone()));
        self.run_generators(generators, &mut local, emit)
    }

    fn run_generators(
        &mut self,
        generators: &[Comprehension],
        local: &mut Arc<Scope>,
        emit: &mut dyn FnMut(&mut Self, &Arc<Scope>) -> Result<(), ExecutionError>,
    ) -> Result<(), ExecutionError> {
        let Some((first, rest)) = generators.split_first() else {
            return emit(self, local);
        };

        let iterable = self.eval(&first.iter, local)?;
        let items =
            iterate(&iterable).map_err(|kind| ExecutionError::new(kind, first.iter.span.clone()))?;

        'items: for item in items {
            // Copies the scope only if a lambda captured the previous iteration.
            assign_target(&first.target, item, Arc::make_mut(local))?;
            for cond in &first.ifs {
                if !self.eval(cond, local)?.is_truthy() {
                    continue 'items;
                }
            }
            self.run_generators(rest, local, emit)?;
        }
        Ok(())
    }
}

fn bind_lambda_args(
    lambda: &Lambda,
    args: &[Value],
    kwargs: &[(String, Value)],
) -> Result<Scope, RuntimeError> {
    let arity = lambda.params.len();
    let mut bound: Vec<Option<Value>> = vec![None; arity];
    for (slot, arg) in bound.iter_mut().zip(args) {
        *slot = Some(arg.clone());
    }

    let extra = args.get(arity..).unwrap_or_default();
    if !extra.is_empty() && lambda.varargs.is_none() {
        return Err(RuntimeError::type_error(format!(
            "<lambda>() takes {} positional argument{} but {} were given",
            arity,
            if arity == 1 { "" } else { "s" },
            args.len()
        )));
    }

    let mut extra_kwargs = Vec::new();
    for (name, value) in kwargs {
        match lambda.params.iter().position(|p| p == name) {
            Some(i) if bound[i].is_some() => {
                return Err(RuntimeError::type_error(format!(
                    "<lambda>() got multiple values for argument '{name}'"
                )));
            }
            Some(i) => bound[i] = Some(value.clone()),
            None if lambda.kwargs.is_some() => {
                extra_kwargs.push((Value::Str(name.clone()), value.clone()));
            }
            None => {
                return Err(RuntimeError::type_error(format!(
                    "<lambda>() got an unexpected keyword argument '{name}'"
                )));
            }
        }
    }

    let mut local = Scope::child(lambda.scope.clone());
    for ((name, slot), default) in lambda.params.iter().zip(bound).zip(&lambda.defaults) {
        let value = slot.or_else(|| default.clone()).ok_or_else(|| {
            RuntimeError::type_error(format!(
                "<lambda>() missing required positional argument: '{name}'"
            ))
        })?;
        local.set(name.clone(), value);
    }
    if let Some(varargs) = &lambda.varargs {
        local.set(varargs.clone(), Value::Tuple(extra.to_vec()));
    }
    if let Some(kwargs) = &lambda.kwargs {
        local.set(kwargs.clone(), Value::Dict(extra_kwargs));
    }
    Ok(local)
}

/// Bind a comprehension target, unpacking tuples and lists.
fn assign_target(target: &Expr, value: Value, scope: &mut Scope) -> Result<(), ExecutionError> {
    let fail = |kind: RuntimeError| ExecutionError::new(kind, target.span.clone());
    match &target.kind {
        ExprKind::Name(name) => {
            scope.set(name.clone(), value);
            Ok(())
        }
        ExprKind::Tuple(targets) | ExprKind::List(targets) => {
            let values = iterate(&value).map_err(|_| {
                fail(RuntimeError::type_error(format!(
                    "cannot unpack non-iterable {} object",
                    value.type_name()
                )))
            })?;
            let star = targets
                .iter()
                .position(|t| matches!(t.kind, ExprKind::Starred(_)));
            match star {
                None => {
                    if values.len() != targets.len() {
                        return Err(fail(unpack_mismatch(targets.len(), values.len(), false)));
                    }
                    for (t, v) in targets.iter().zip(values) {
                        assign_target(t, v, scope)?;
                    }
                }
                Some(star) => {
                    let after = targets.len() - star - 1;
                    if values.len() < targets.len() - 1 {
                        return Err(fail(unpack_mismatch(targets.len() - 1, values.len(), true)));
                    }
                    let mut values = values;
                    let tail = values.split_off(values.len() - after);
                    let middle = values.split_off(star);
                    for (t, v) in targets[..star].iter().zip(values) {
                        assign_target(t, v, scope)?;
                    }
                    if let ExprKind::Starred(inner) = &targets[star].kind {
                        assign_target(inner, Value::List(middle), scope)?;
                    }
                    for (t, v) in targets[star + 1..].iter().zip(tail) {
                        assign_target(t, v, scope)?;
                    }
                }
            }
            Ok(())
        }
        _ => Err(fail(RuntimeError::type_error(format!(
            "cannot assign to {}",
            target.describe()
        )))),
    }
}

fn unpack_mismatch(expected: usize, got: usize, at_least: bool) -> RuntimeError {
    if got > expected && !at_least {
        RuntimeError::value_error(format!("too many values to unpack (expected {expected})"))
    } else if at_least {
        RuntimeError::value_error(format!(
            "not enough values to unpack (expected at least {expected}, got {got})"
        ))
    } else {
        RuntimeError::value_error(format!(
            "not enough values to unpack (expected {expected}, got {got})"
        ))
    }
}
