//! safe-eval - Evaluate untrusted Python-style expressions
//!
//! # Overview
//!
//! safe-eval evaluates a small, restricted subset of Python expression syntax
//! supplied by users of a host application. Common use cases include:
//!
//! - Column transformations and computed fields
//! - Filters and sort keys
//! - Small formulas in configuration files
//!
//! Every expression is parsed and checked against a [`Policy`] before
//! anything runs. The policy lists the functions the expression may call;
//! anything else is rejected with a [`SafetyViolation`].
//!
//! # Quick Start
//!
//! ```
//! use safe_eval::{Engine, Policy, Value, stdlib};
//!
//! let policy = Policy::builder()
//!     .allow(stdlib::by_name("len").unwrap())
//!     .unwrap()
//!     .build();
//! let engine = Engine::new(policy);
//!
//! // Evaluate once, with named bindings
//! let value = engine.evaluate("len(name) > 3", &[("name", Value::from("Ada"))]).unwrap();
//! assert_eq!(value, Value::Bool(false));
//!
//! // Compile once, call many times with `_` bound to the argument
//! let first = engine.compile("_[0]").unwrap();
//! assert_eq!(first.call(Value::from("xyz")).unwrap(), Value::from("x"));
//!
//! // Calls outside the policy never run
//! assert!(engine.compile("open('/etc/passwd')").is_err());
//! ```
//!
//! # Native Functions
//!
//! Register Rust functions with [`NativeFunction`]:
//!
//! ```
//! use safe_eval::{Engine, NativeFunction, Policy, Value};
//! use safe_eval::evaluator::RuntimeError;
//!
//! let double = NativeFunction::new("double", |args, _kwargs| match args {
//!     [Value::Int(n)] => Ok(Value::Int(n * 2)),
//!     _ => Err(RuntimeError::type_error("double() takes one int")),
//! });
//! let engine = Engine::new(Policy::builder().allow(double).unwrap().build());
//!
//! assert_eq!(engine.evaluate("double(21)", &[]).unwrap(), Value::Int(42));
//! ```

// Re-export public API from safe_eval_core
pub use safe_eval_core::api::{
    CompiledExpression, Diagnostic, Engine, EngineOptions, Error, ExecutionOptions, RelatedInfo,
    Severity,
};

// Re-export commonly used types and values
pub use safe_eval_core::values::{self, ArgSpec, Function, NativeFunction, Value};
pub use safe_eval_core::verifier::{
    self, Policy, PolicyBuilder, PolicyError, SafetyViolation, ViolationKind,
};
pub use safe_eval_core::{evaluator, parser, stdlib};

// Error rendering with ariadne
mod error_renderer;
pub use error_renderer::{
    render_error, render_error_to, render_error_to_string, render_error_to_string_no_color,
};
