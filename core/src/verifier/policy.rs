//! Allow-set configuration for the verifier.

use std::sync::Arc;

use hashbrown::HashMap;

use crate::stdlib;
use crate::values::NativeFunction;
use crate::verifier::PolicyError;

/// Name bound to the argument of a compiled expression.
pub const ARGUMENT_NAME: &str = "_";

/// Which functions an expression may call.
///
/// A policy is a single table from name to function: the allow-set the
/// verifier checks against is exactly the set of keys the evaluator can
/// resolve. It is immutable once built and cheap to clone.
///
/// ```
/// use safe_eval_core::{stdlib, verifier::Policy};
///
/// let policy = Policy::builder()
///     .allow(stdlib::by_name("len").unwrap())?
///     .build();
/// assert!(policy.is_allowed("len"));
/// assert!(policy.is_allowed("float"));
/// assert!(!policy.is_allowed("open"));
/// # Ok::<(), safe_eval_core::verifier::PolicyError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Policy {
    callables: Arc<HashMap<String, NativeFunction>>,
    verbose: bool,
}

impl Policy {
    /// A builder seeded with the base set (`float`, `int`, `str`).
    pub fn builder() -> PolicyBuilder {
        let mut builder = PolicyBuilder::empty();
        for func in stdlib::base() {
            builder.callables.insert(func.name().to_string(), func);
        }
        builder
    }

    /// A policy with no callables at all. Every call is rejected.
    pub fn empty() -> Self {
        PolicyBuilder::empty().build()
    }

    pub fn is_allowed(&self, name: &str) -> bool {
        self.callables.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&NativeFunction> {
        self.callables.get(name)
    }

    /// Allowed names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.callables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn callables(&self) -> impl Iterator<Item = &NativeFunction> {
        self.callables.values()
    }
}

impl Default for Policy {
    /// The base set only.
    fn default() -> Self {
        Policy::builder().build()
    }
}

/// Builds a [`Policy`]. Entries are owned by the builder; nothing the caller
/// keeps aliases the finished policy.
#[derive(Debug, Clone, Default)]
pub struct PolicyBuilder {
    callables: HashMap<String, NativeFunction>,
    verbose: bool,
}

impl PolicyBuilder {
    /// A builder without the base set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add a callable under its own name.
    pub fn allow(mut self, func: NativeFunction) -> Result<Self, PolicyError> {
        let name = func.name();
        if name == ARGUMENT_NAME {
            return Err(PolicyError::ReservedName {
                name: name.to_string(),
            });
        }
        if !is_identifier(name) {
            return Err(PolicyError::InvalidName {
                name: name.to_string(),
            });
        }
        if self.callables.contains_key(name) {
            return Err(PolicyError::DuplicateCallable {
                name: name.to_string(),
            });
        }
        self.callables.insert(name.to_string(), func);
        Ok(self)
    }

    pub fn allow_all(
        self,
        funcs: impl IntoIterator<Item = NativeFunction>,
    ) -> Result<Self, PolicyError> {
        funcs.into_iter().try_fold(self, PolicyBuilder::allow)
    }

    /// Trace every node the verifier visits at `info` level.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn build(self) -> Policy {
        Policy {
            callables: Arc::new(self.callables),
            verbose: self.verbose,
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
