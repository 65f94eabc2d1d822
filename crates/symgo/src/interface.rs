//! Interface method resolution.
//!
//! Three pieces of state, all keyed by interface type identity
//! (`TypeInfo::identity()`):
//!
//! - `bindings` — manual host bindings (`Evaluator::bind_interface`), the
//!   highest-priority source of truth; a host tool uses this when it already
//!   knows which concrete type an interface variable holds in practice.
//! - `implementations` — concrete types discovered at runtime, the moment a
//!   concrete value is assigned to an interface-typed variable and the
//!   scanner confirms it structurally satisfies the interface.
//! - `pending` — interface-method calls made before any concrete type was
//!   known for that interface. Draining is the caller's job (the call
//!   mechanism in `call.rs`): this module only tracks which calls are
//!   waiting and hands back the ones a new binding can now resolve.

use goscan::{Pos, Scanner};
use indexmap::{IndexMap, IndexSet};

use crate::{object::Object, resolver::Resolver};

/// A method call made through an interface-typed value with no concrete
/// implementation bound yet.
#[derive(Debug, Clone)]
pub struct PendingCall {
    pub interface_identity: String,
    pub method: String,
    pub receiver: Object,
    pub args: Vec<Object>,
    pub pos: Pos,
}

/// A manually or automatically bound concrete implementation for an
/// interface, including pointer discipline — method-key construction
/// distinguishes `(pkg.Type).M` from `(*pkg.Type).M`.
#[derive(Debug, Clone)]
pub struct Binding {
    pub concrete: goscan::TypeInfo,
    pub is_pointer: bool,
}

#[derive(Debug, Default)]
pub struct InterfaceRegistry {
    bindings: IndexMap<String, Binding>,
    implementations: IndexMap<String, IndexSet<String>>,
    concrete_types: IndexMap<String, goscan::TypeInfo>,
    pending: Vec<PendingCall>,
}

impl InterfaceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Manual host binding: "treat every value of this interface as this
    /// concrete type".
    pub fn bind(&mut self, interface_identity: impl Into<String>, concrete: goscan::TypeInfo, is_pointer: bool) {
        self.bindings.insert(interface_identity.into(), Binding { concrete, is_pointer });
    }

    #[must_use]
    pub fn binding(&self, interface_identity: &str) -> Option<&Binding> {
        self.bindings.get(interface_identity)
    }

    /// Records that `concrete` was assigned to a variable of type
    /// `interface`, after the scanner has already confirmed
    /// `Scanner::implements`. Returns `true` if this is the first time this
    /// particular concrete type was seen for this interface (the caller
    /// uses this to decide whether to attempt draining `pending`).
    pub fn record_implementation(&mut self, interface_identity: &str, concrete_identity: &str) -> bool {
        self.implementations.entry(interface_identity.to_string()).or_default().insert(concrete_identity.to_string())
    }

    #[must_use]
    pub fn implementations_of(&self, interface_identity: &str) -> &[String] {
        self.implementations.get(interface_identity).map_or(&[], |set| set.as_slice())
    }

    /// Confirms (or discovers) that `concrete` satisfies `interface`, then
    /// records the implementation if so. This is the entry point the
    /// assignment-evaluation code in `eval/stmt.rs` calls every time an
    /// interface-typed variable receives a new concrete value.
    pub fn note_assignment<S: Scanner>(
        &mut self,
        resolver: &Resolver<S>,
        interface: &goscan::TypeInfo,
        concrete: &goscan::TypeInfo,
    ) -> bool {
        if !resolver.implements(concrete, interface) {
            return false;
        }
        self.concrete_types.entry(concrete.identity()).or_insert_with(|| concrete.clone());
        self.record_implementation(&interface.identity(), &concrete.identity())
    }

    /// Full `TypeInfo` for a concrete type previously seen by
    /// `note_assignment`, looked up by identity. `implementations_of` only
    /// hands back identity strings; redispatching a drained pending call
    /// needs the actual method set, which this recovers.
    #[must_use]
    pub fn concrete_type(&self, identity: &str) -> Option<&goscan::TypeInfo> {
        self.concrete_types.get(identity)
    }

    pub fn push_pending(&mut self, call: PendingCall) {
        self.pending.push(call);
    }

    /// Drains every pending call queued against `interface_identity`,
    /// handing them back to the caller in the order they were queued so it
    /// can now dispatch them against a concrete implementation.
    pub fn drain_pending_for(&mut self, interface_identity: &str) -> Vec<PendingCall> {
        let (matching, rest): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.pending).into_iter().partition(|p| p.interface_identity == interface_identity);
        self.pending = rest;
        matching
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use goscan::{ScanError, ScanPolicy, Scanner, types::{Kind, MethodInfo, Signature, TypeInfo}};
    use std::rc::Rc;

    use super::*;

    struct AlwaysImplements;

    impl Scanner for AlwaysImplements {
        fn resolve_package(&self, import_path: &str) -> Result<Rc<goscan::PackageInfo>, ScanError> {
            Ok(Rc::new(goscan::PackageInfo::unresolved_stub(import_path)))
        }
        fn resolve_type(&self, _pkg_path: &str, _name: &str) -> Option<Rc<TypeInfo>> {
            None
        }
        fn implements(&self, _concrete: &TypeInfo, _interface: &TypeInfo) -> bool {
            true
        }
    }

    fn iface() -> TypeInfo {
        TypeInfo {
            name: "Reader".to_string(),
            pkg_path: "io".to_string(),
            kind: Kind::Interface,
            underlying: None,
            fields: Vec::new(),
            methods: vec![MethodInfo {
                name: "Read".to_string(),
                signature: Rc::new(Signature { params: Vec::new(), variadic: false, results: Vec::new() }),
                pointer_receiver: false,
            }],
            unresolved: false,
        }
    }

    fn concrete() -> TypeInfo {
        TypeInfo { name: "File".to_string(), pkg_path: "os".to_string(), kind: Kind::Struct, underlying: None, fields: Vec::new(), methods: Vec::new(), unresolved: false }
    }

    #[test]
    fn manual_binding_is_retrievable() {
        let mut registry = InterfaceRegistry::new();
        registry.bind("io.Reader", concrete(), true);
        assert!(registry.binding("io.Reader").is_some());
        assert!(registry.binding("io.Writer").is_none());
    }

    #[test]
    fn note_assignment_records_only_when_scanner_confirms() {
        let resolver = Resolver::new(AlwaysImplements, ScanPolicy::all());
        let mut registry = InterfaceRegistry::new();
        let first_time = registry.note_assignment(&resolver, &iface(), &concrete());
        assert!(first_time);
        let second_time = registry.note_assignment(&resolver, &iface(), &concrete());
        assert!(!second_time, "already-recorded implementation should report false");
    }

    #[test]
    fn draining_only_returns_calls_for_the_matching_interface() {
        let mut registry = InterfaceRegistry::new();
        registry.push_pending(PendingCall {
            interface_identity: "io.Reader".to_string(),
            method: "Read".to_string(),
            receiver: Object::nil(),
            args: Vec::new(),
            pos: Pos::NONE,
        });
        registry.push_pending(PendingCall {
            interface_identity: "io.Writer".to_string(),
            method: "Write".to_string(),
            receiver: Object::nil(),
            args: Vec::new(),
            pos: Pos::NONE,
        });

        let drained = registry.drain_pending_for("io.Reader");
        assert_eq!(drained.len(), 1);
        assert_eq!(registry.pending_count(), 1);
    }
}
