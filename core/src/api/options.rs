//! Configuration options for the engine.

use crate::evaluator::EvaluatorOptions;

/// Configuration options for expression execution.
///
/// These options control resource limits during evaluation.
///
/// # Example
///
/// ```
/// use safe_eval_core::api::ExecutionOptions;
///
/// let options = ExecutionOptions { max_depth: 500 };
/// ```
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Maximum evaluation stack depth (for recursion protection).
    ///
    /// Default: 200
    pub max_depth: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self { max_depth: 200 }
    }
}

impl From<&ExecutionOptions> for EvaluatorOptions {
    fn from(options: &ExecutionOptions) -> Self {
        EvaluatorOptions {
            max_depth: options.max_depth,
        }
    }
}

/// Configuration options for the engine.
///
/// Every expression evaluated or compiled by an engine uses these.
///
/// # Example
///
/// ```
/// use safe_eval_core::api::{EngineOptions, ExecutionOptions};
///
/// let options = EngineOptions {
///     execution: ExecutionOptions { max_depth: 500 },
/// };
/// ```
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Options for execution.
    pub execution: ExecutionOptions,
}
