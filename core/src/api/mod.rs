//! Public API for verifying and evaluating expressions.
//!
//! This module ties the pipeline together:
//!
//! 1. **Parse** the text into a syntax tree
//! 2. **Verify** the tree against a [`Policy`](crate::verifier::Policy)
//! 3. **Evaluate** it once ([`Engine::evaluate`]) or compile it into a
//!    reusable function of `_` ([`Engine::compile`])
//!
//! # Example
//!
//! ```
//! use safe_eval_core::api::{Engine, Error};
//! use safe_eval_core::values::Value;
//!
//! let engine = Engine::default();
//!
//! let double = engine.compile("float(_) * 2").unwrap();
//! assert_eq!(double.call(Value::from("1.5")).unwrap(), Value::Float(3.0));
//!
//! let err = engine.compile("__import__('os')").unwrap_err();
//! assert!(matches!(err, Error::Unsafe(_)));
//! ```

pub mod engine;
pub mod error;
pub mod expression;
pub mod options;

pub use engine::Engine;
pub use error::{Diagnostic, Error, RelatedInfo, Severity};
pub use expression::CompiledExpression;
pub use options::{EngineOptions, ExecutionOptions};
