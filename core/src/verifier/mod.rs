//! Syntax-tree safety verifier.
//!
//! The verifier decides whether a parsed expression may be evaluated. It
//! accepts exactly one expression statement, and only if every call in it
//! goes to a plain name registered on the [`Policy`]. Everything else is
//! accepted structurally: the evaluator has no way to reach anything that is
//! not in its scope, so calls are the only thing that needs policing.
//!
//! ```
//! use safe_eval_core::{parser, verifier::{Policy, Verifier, ViolationKind}};
//!
//! let policy = Policy::default();
//! let verifier = Verifier::new(&policy);
//!
//! assert!(verifier.check(&parser::parse("float(_) * 2").unwrap()).is_ok());
//!
//! let err = verifier.check(&parser::parse("open('/etc/passwd')").unwrap()).unwrap_err();
//! assert_eq!(err.kind, ViolationKind::DisallowedCall { name: "open".into() });
//! ```

mod error;
mod policy;
#[allow(clippy::module_inception)]
mod verifier;

pub use error::{PolicyError, SafetyViolation, ViolationKind};
pub use policy::{ARGUMENT_NAME, Policy, PolicyBuilder};
pub use verifier::Verifier;

#[cfg(test)]
mod verifier_test;

#[cfg(test)]
mod policy_test;
