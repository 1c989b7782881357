//! Lexical scopes.
//!
//! A scope is a flat table of bindings plus an optional parent. Lookups walk
//! outwards until a name is found. Scopes are shared through `Arc` so that a
//! lambda can keep the scope it was created in alive after evaluation moves on.

use std::sync::Arc;

use hashbrown::HashMap;

use crate::values::Value;

#[derive(Clone, Default)]
pub struct Scope {
    vars: HashMap<String, Value>,
    parent: Option<Arc<Scope>>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn child(parent: Arc<Scope>) -> Self {
        Self {
            vars: HashMap::new(),
            parent: Some(parent),
        }
    }

    pub fn from_bindings<I, K>(parent: Option<Arc<Scope>>, bindings: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            vars: bindings.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            parent,
        }
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    /// Innermost binding of `name`.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        let mut scope = self;
        loop {
            if let Some(value) = scope.vars.get(name) {
                return Some(value);
            }
            scope = scope.parent.as_deref()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inner_binding_shadows_outer() {
        let outer = Arc::new(Scope::from_bindings(None, [("x", Value::Int(1)), ("y", Value::Int(2))]));
        let mut inner = Scope::child(outer.clone());
        inner.set("x", Value::Int(10));

        assert_eq!(inner.lookup("x"), Some(&Value::Int(10)));
        assert_eq!(inner.lookup("y"), Some(&Value::Int(2)));
        assert_eq!(outer.lookup("x"), Some(&Value::Int(1)));
        assert_eq!(inner.lookup("z"), None);
    }
}
