//! Core of the safe expression evaluator.
//!
//! Text goes through three stages: [`parser`] builds a syntax tree,
//! [`verifier`] checks it against a [`Policy`](verifier::Policy) of allowed
//! callables, and [`evaluator`] interprets it. [`api::Engine`] runs the
//! stages in order and never evaluates a tree that failed verification.

pub mod api;
pub mod evaluator;
pub mod parser;
pub mod stdlib;
pub mod values;
pub mod verifier;

pub use api::{CompiledExpression, Engine, EngineOptions, Error, ExecutionOptions};
pub use values::{NativeFunction, Value};
pub use verifier::{Policy, PolicyBuilder, PolicyError, SafetyViolation, ViolationKind};

/// Test utilities for enabling logging in tests
#[cfg(test)]
pub mod test_utils {
    /// Initialize tracing subscriber for tests with DEBUG level
    /// Call this at the start of tests where you want to see logging output
    ///
    /// # Example
    /// ```ignore
    /// #[test]
    /// fn test_verbose_policy() {
    ///     test_utils::init_test_logging();
    ///     // ... your test code
    /// }
    /// ```
    pub fn init_test_logging() {
        use tracing_subscriber::{EnvFilter, fmt};

        // Try to initialize, ignore error if already initialized
        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }
}
