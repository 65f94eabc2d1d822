//! Lexical scoping plus the package-level environment registry identifiers
//! fall back to.
//!
//! `Env` is an `Rc<RefCell<_>>` handle rather than an owned struct so that a
//! function literal can close over its defining scope by reference —
//! cloning an `Env` shares the underlying bindings, it doesn't snapshot
//! them.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use indexmap::IndexMap;

use crate::object::Object;

struct EnvironmentData {
    outer: Option<Env>,
    bindings: IndexMap<String, Object>,
}

/// A chain of lexical scopes: one block, function body, or package scope.
#[derive(Clone)]
pub struct Env(Rc<RefCell<EnvironmentData>>);

impl std::fmt::Debug for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Env").field("bindings", &self.0.borrow().bindings.keys().collect::<Vec<_>>()).finish()
    }
}

impl Env {
    #[must_use]
    pub fn root() -> Self {
        Self(Rc::new(RefCell::new(EnvironmentData { outer: None, bindings: IndexMap::new() })))
    }

    #[must_use]
    pub fn child_of(outer: &Self) -> Self {
        Self(Rc::new(RefCell::new(EnvironmentData { outer: Some(outer.clone()), bindings: IndexMap::new() })))
    }

    /// Declares a new binding in this scope, shadowing an outer one of the
    /// same name.
    pub fn declare(&self, name: impl Into<String>, value: Object) {
        self.0.borrow_mut().bindings.insert(name.into(), value);
    }

    /// Three-tier resolution: local scope, then outer
    /// scopes in order, stopping at the first match. Package-level and
    /// universe (builtin) fallback is layered on top by the evaluator,
    /// which tries `Env::get` first and only then consults the package
    /// registry and the builtin table.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Object> {
        let data = self.0.borrow();
        if let Some(v) = data.bindings.get(name) {
            return Some(v.clone());
        }
        data.outer.as_ref().and_then(|outer| outer.get(name))
    }

    /// Reassigns an existing binding, searching outer scopes the same way
    /// `get` does. Returns `false` (and declares nothing) if `name` isn't
    /// bound anywhere in the chain — callers fall back to `declare` for a
    /// fresh `:=`.
    pub fn assign(&self, name: &str, value: Object) -> bool {
        let mut data = self.0.borrow_mut();
        if let Some(slot) = data.bindings.get_mut(name) {
            *slot = value;
            return true;
        }
        match &data.outer {
            Some(outer) => outer.assign(name, value),
            None => false,
        }
    }

    #[must_use]
    pub fn is_declared_locally(&self, name: &str) -> bool {
        self.0.borrow().bindings.contains_key(name)
    }
}

/// Package-level environments keyed by import path. One `Env` per package is created lazily the
/// first time a symbol from that package is needed.
#[derive(Debug, Clone, Default)]
pub struct PackageEnvironments {
    by_import_path: HashMap<String, Env>,
}

impl PackageEnvironments {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&mut self, import_path: &str) -> Env {
        self.by_import_path.entry(import_path.to_string()).or_insert_with(Env::root).clone()
    }

    #[must_use]
    pub fn get(&self, import_path: &str) -> Option<Env> {
        self.by_import_path.get(import_path).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_scope_shadows_outer() {
        let outer = Env::root();
        outer.declare("x", Object::integer(1));
        let inner = Env::child_of(&outer);
        inner.declare("x", Object::integer(2));

        assert!(matches!(inner.get("x"), Some(v) if matches!(v.kind(), crate::object::ObjectKind::Integer(2))));
        assert!(matches!(outer.get("x"), Some(v) if matches!(v.kind(), crate::object::ObjectKind::Integer(1))));
    }

    #[test]
    fn assign_mutates_outer_binding_in_place() {
        let outer = Env::root();
        outer.declare("x", Object::integer(1));
        let inner = Env::child_of(&outer);

        assert!(inner.assign("x", Object::integer(9)));
        assert!(matches!(outer.get("x"), Some(v) if matches!(v.kind(), crate::object::ObjectKind::Integer(9))));
    }

    #[test]
    fn assign_to_undeclared_name_fails() {
        let env = Env::root();
        assert!(!env.assign("missing", Object::nil()));
    }
}
