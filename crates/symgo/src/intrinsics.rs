//! Host-supplied call handlers.
//!
//! An intrinsic stands in for a function or method the evaluator will never
//! walk into — either because it's out of scan policy (`fmt.Println`) or
//! because the host wants to observe or special-case a particular call
//! (`(*bytes.Buffer).WriteString`). The default-intrinsic hook fires before
//! any other dispatch and is the core observability primitive host tools
//! build call graphs on.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::object::IntrinsicFn;

/// Builds the registry key for a package-level function: `pkgpath.Name`.
#[must_use]
pub fn function_key(pkg_path: &str, name: &str) -> String {
    format!("{pkg_path}.{name}")
}

/// Builds the registry key for a method: `(pkgpath.Type).Method` for a
/// value receiver, `(*pkgpath.Type).Method` for a pointer receiver.
#[must_use]
pub fn method_key(pkg_path: &str, type_name: &str, method: &str, pointer_receiver: bool) -> String {
    if pointer_receiver {
        format!("(*{pkg_path}.{type_name}).{method}")
    } else {
        format!("({pkg_path}.{type_name}).{method}")
    }
}

/// Holds every registered intrinsic plus the optional default hook.
#[derive(Default)]
pub struct IntrinsicRegistry {
    by_key: IndexMap<String, Rc<IntrinsicFn>>,
    default: Option<Rc<IntrinsicFn>>,
}

impl std::fmt::Debug for IntrinsicRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntrinsicRegistry")
            .field("keys", &self.by_key.keys().collect::<Vec<_>>())
            .field("has_default", &self.default.is_some())
            .finish()
    }
}

impl IntrinsicRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the handler for `key`. A later registration
    /// for the same key silently wins, mirroring how a host's init-order
    /// intrinsic tables are typically assembled: general-purpose defaults
    /// first, specific overrides layered on after.
    pub fn register(&mut self, key: impl Into<String>, handler: Rc<IntrinsicFn>) {
        self.by_key.insert(key.into(), handler);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Rc<IntrinsicFn>> {
        self.by_key.get(key).cloned()
    }

    pub fn register_default(&mut self, handler: Rc<IntrinsicFn>) {
        self.default = Some(handler);
    }

    #[must_use]
    pub fn default_intrinsic(&self) -> Option<Rc<IntrinsicFn>> {
        self.default.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Object;

    #[test]
    fn function_key_format() {
        assert_eq!(function_key("fmt", "Println"), "fmt.Println");
    }

    #[test]
    fn method_key_format_for_value_and_pointer_receivers() {
        assert_eq!(method_key("bytes", "Buffer", "Len", false), "(bytes.Buffer).Len");
        assert_eq!(method_key("bytes", "Buffer", "WriteString", true), "(*bytes.Buffer).WriteString");
    }

    #[test]
    fn later_registration_overrides_earlier_for_same_key() {
        let mut registry = IntrinsicRegistry::new();
        registry.register("fmt.Println", Rc::new(|_ctx, _args| Object::integer(1)));
        registry.register("fmt.Println", Rc::new(|_ctx, _args| Object::integer(2)));

        let handler = registry.get("fmt.Println").expect("handler present");
        let ctx = crate::context::EvalContext::new();
        let result = handler(&ctx, &[]);
        assert!(matches!(result.kind(), crate::object::ObjectKind::Integer(2)));
    }
}
