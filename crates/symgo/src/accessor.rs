//! Field and method resolution for selector expressions (`x.y`).
//!
//! Walks embedded fields depth-first with cycle protection, and degrades
//! gracefully to a placeholder rather than a hard error whenever the
//! receiver's shape can't support a selector at all — a non-struct value, an
//! interface with no bound implementation yet, or a type the scan policy
//! excluded.

use std::{cell::RefCell, collections::HashSet, rc::Rc};

use goscan::{Pos, Scanner, types::Kind};

use crate::{
    env::PackageEnvironments,
    error::EvalError,
    interface::InterfaceRegistry,
    intrinsics::method_key,
    logger::{LogEvent, LogKind, Logger, Severity},
    object::{BaseObject, FieldType, FunctionValue, InstanceValue, Object, ObjectKind, PlaceholderValue, TypeRef},
    resolver::Resolver,
};

/// Tracks which warn-once events this `Evaluator` has already emitted, so
/// repeated access to the same out-of-policy member or the same unbound
/// interface method logs exactly once. Keyed by a plain
/// `"{type_identity}.{selector}"` string rather than a tuple.
#[derive(Debug, Default)]
pub struct AccessDedup {
    warned_unresolved: RefCell<HashSet<String>>,
    synthetic_methods: RefCell<HashSet<String>>,
}

impl AccessDedup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time this `(type, field)` pair is seen.
    fn first_unresolved_access(&self, key: String) -> bool {
        self.warned_unresolved.borrow_mut().insert(key)
    }

    /// Returns `true` the first time this `(interface, method)` pair is seen.
    fn first_synthetic_method(&self, key: String) -> bool {
        self.synthetic_methods.borrow_mut().insert(key)
    }
}

enum Found {
    Field(Object),
    Method(Object),
}

/// Resolves `receiver.selector`, producing either the accessed value or an
/// `Object::Error`/placeholder describing why it couldn't be.
pub fn access<S: Scanner>(
    receiver: &Object,
    selector: &str,
    pos: Pos,
    resolver: &Resolver<S>,
    package_envs: &mut PackageEnvironments,
    interfaces: &InterfaceRegistry,
    logger: &mut dyn Logger,
    dedup: &AccessDedup,
) -> Object {
    let receiver = receiver.force();

    match receiver.kind() {
        ObjectKind::Pointer(ptr) => access(&ptr.target, selector, pos, resolver, package_envs, interfaces, logger, dedup),

        ObjectKind::Package(pkg) => access_package(&pkg.info, &pkg.env, selector, pos, resolver, package_envs, logger),

        ObjectKind::Instance(inst) => {
            let ty = Rc::clone(&inst.borrow().ty);
            if ty.unresolved {
                if dedup.first_unresolved_access(format!("{}.{selector}", ty.identity())) {
                    logger.warn(LogEvent {
                        severity: Severity::Warn,
                        kind: LogKind::OutOfPolicyAccess,
                        pos,
                        message: format!("{}.{selector} is out of scan policy", ty.identity()).into(),
                    });
                }
                return Object::typed_placeholder(format!("out-of-policy selector {selector}"), ty);
            }

            let mut visited = HashSet::new();
            match find_in_type(&ty, selector, Some(receiver.clone()), resolver, package_envs, logger, dedup, &mut visited) {
                Some(Found::Field(name_default)) => name_default,
                Some(Found::Method(method)) => method,
                None => {
                    if let Some(field_value) = inst.borrow().fields.get(selector) {
                        return field_value.clone();
                    }
                    Object::error(EvalError::UnknownSelector { pos, selector: selector.to_string() })
                }
            }
        }

        ObjectKind::Type(ty) => {
            if ty.kind_is_interface() {
                synthetic_interface_method(ty, selector, None, pos, interfaces, logger, dedup)
            } else {
                let mut visited = HashSet::new();
                match find_in_type(ty, selector, None, resolver, package_envs, logger, dedup, &mut visited) {
                    Some(Found::Method(method)) => method,
                    Some(Found::Field(_)) | None => {
                        Object::error(EvalError::UnknownSelector { pos, selector: selector.to_string() })
                    }
                }
            }
        }

        ObjectKind::SymbolicPlaceholder(ph) => match receiver.base().resolved_type.as_ref() {
            Some(ty) if ty.kind_is_interface() => {
                synthetic_interface_method(ty, selector, Some(receiver.clone()), pos, interfaces, logger, dedup)
            }
            Some(ty) if !ty.unresolved => {
                let mut visited = HashSet::new();
                match find_in_type(ty, selector, Some(receiver.clone()), resolver, package_envs, logger, dedup, &mut visited) {
                    Some(Found::Field(v)) => v,
                    Some(Found::Method(m)) => m,
                    None => Object::typed_placeholder(format!("unresolved selector {selector}"), Rc::clone(ty)),
                }
            }
            _ => {
                let _ = ph;
                Object::placeholder(format!("selector {selector} on unresolved placeholder"))
            }
        },

        ObjectKind::Nil => match receiver.base().resolved_type.as_ref() {
            Some(ty) if ty.kind_is_interface() => {
                synthetic_interface_method(ty, selector, Some(receiver.clone()), pos, interfaces, logger, dedup)
            }
            _ => Object::placeholder(format!("invalid selector {selector} on NIL value")),
        },

        other => Object::placeholder(format!("invalid selector {selector} on {} value", other.label())),
    }
}

pub(crate) fn access_package<S: Scanner>(
    info: &goscan::PackageInfo,
    pkg_env: &crate::env::Env,
    selector: &str,
    pos: Pos,
    resolver: &Resolver<S>,
    package_envs: &mut PackageEnvironments,
    logger: &mut dyn Logger,
) -> Object {
    if let Some(decl) = info.functions.get(selector) {
        return Object::new(ObjectKind::Function(Rc::new(FunctionValue {
            name: decl.name.clone(),
            qualified_name: format!("{}.{}", info.path, decl.name),
            decl: Rc::clone(decl),
            env: pkg_env.clone(),
            receiver: None,
            type_params: decl.type_params.iter().flat_map(|f| f.names.clone()).collect(),
            package_path: info.path.clone(),
        })));
    }

    if let Some(ty) = info.types.get(selector) {
        return Object::new(ObjectKind::Type(Rc::clone(ty)));
    }

    if let Some(var) = info.vars.get(selector) {
        return match (&var.const_string_value, &var.ty) {
            (Some(s), _) => Object::string(s.as_str()),
            (None, Some(ty)) => Object::typed_placeholder(format!("package var {selector}"), Rc::clone(ty)),
            (None, None) => Object::placeholder(format!("package var {selector}")),
        };
    }

    let _ = (resolver, package_envs);
    logger.warn(LogEvent {
        severity: Severity::Warn,
        kind: LogKind::OutOfPolicyAccess,
        pos,
        message: format!("{}.{selector} not found in package scope", info.path).into(),
    });
    Object::placeholder(format!("unknown package member {}.{selector}", info.path))
}

/// Depth-first search over `ty`'s own members, then its embedded fields in
/// declaration order. `visited` guards against revisiting a type identity —
/// embedded-field chains are acyclic in valid Go, but a scanner fixture or
/// an unresolved stub could otherwise loop.
fn find_in_type<S: Scanner>(
    ty: &TypeRef,
    selector: &str,
    receiver: Option<Object>,
    resolver: &Resolver<S>,
    package_envs: &mut PackageEnvironments,
    logger: &mut dyn Logger,
    dedup: &AccessDedup,
    visited: &mut HashSet<String>,
) -> Option<Found> {
    if !visited.insert(ty.identity()) {
        return None;
    }

    if let Some(field) = ty.own_field(selector) {
        let value = receiver
            .as_ref()
            .and_then(|recv| match recv.kind() {
                ObjectKind::Instance(inst) => inst.borrow().fields.get(selector).cloned(),
                _ => None,
            })
            .unwrap_or_else(|| Object::with_base(ObjectKind::Nil, BaseObject { resolved_type: Some(Rc::clone(&field.ty)), field_type: Some(FieldType::plain(Rc::clone(&field.ty))) }));
        return Some(Found::Field(value));
    }

    if let Some(method) = ty.own_method(selector) {
        let pkg = resolver.resolve_package(&ty.pkg_path, &mut crate::logger::NoopLogger);
        let key = format!("{}.{}", ty.name, selector);
        if let Some(decl) = pkg.functions.get(&key) {
            let env = package_envs.get_or_create(&ty.pkg_path);
            return Some(Found::Method(Object::new(ObjectKind::Function(Rc::new(FunctionValue {
                name: selector.to_string(),
                qualified_name: method_key(&ty.pkg_path, &ty.name, selector, method.pointer_receiver),
                decl: Rc::clone(decl),
                env,
                receiver,
                type_params: Vec::new(),
                package_path: ty.pkg_path.clone(),
            })))));
        }
        return Some(Found::Method(Object::placeholder(format!(
            "method {} declared but body unavailable",
            method_key(&ty.pkg_path, &ty.name, selector, method.pointer_receiver)
        ))));
    }

    let mut assumed_on: Option<TypeRef> = None;
    for embedded in ty.embedded_fields() {
        if embedded.ty.unresolved {
            // Can't look inside it, so assume the selector exists there
            // rather than treat it as absent. A resolved embedded type
            // elsewhere in declaration order still wins if it has the member.
            assumed_on.get_or_insert_with(|| Rc::clone(&embedded.ty));
            continue;
        }
        if let Some(found) = find_in_type(&embedded.ty, selector, receiver.clone(), resolver, package_envs, logger, dedup, visited) {
            return Some(found);
        }
    }

    if let Some(unresolved_ty) = assumed_on {
        if dedup.first_unresolved_access(format!("{}.{selector}", unresolved_ty.identity())) {
            logger.warn(LogEvent {
                severity: Severity::Warn,
                kind: LogKind::OutOfPolicyAccess,
                pos: Pos::NONE,
                message: format!("assuming {}.{selector} exists on out-of-policy embedded type", unresolved_ty.identity()).into(),
            });
        }
        return Some(Found::Field(Object::typed_placeholder(
            format!("assumed field/method {selector} on out-of-policy embedded type"),
            unresolved_ty,
        )));
    }

    None
}

/// Resolves `ty.method` the same way `access` would for a concrete receiver,
/// without needing a full selector expression. Used to redispatch a drained
/// pending interface call against a newly-discovered implementor when no intrinsic is registered for it and the method body must run
/// instead.
pub(crate) fn resolve_method<S: Scanner>(
    ty: &TypeRef,
    method: &str,
    receiver: Option<Object>,
    resolver: &Resolver<S>,
    package_envs: &mut PackageEnvironments,
    logger: &mut dyn Logger,
    dedup: &AccessDedup,
) -> Option<Object> {
    let mut visited = HashSet::new();
    match find_in_type(ty, method, receiver, resolver, package_envs, logger, dedup, &mut visited) {
        Some(Found::Method(m)) => Some(m),
        Some(Found::Field(_)) | None => None,
    }
}

/// Builds the placeholder standing in for a call through an interface-typed
/// selector. If `interfaces` already carries a manual binding or a
/// previously-discovered implementation for `ty`, the intrinsic-registry key
/// for that concrete type's method is precomputed and stashed on
/// `bound_key` so the call mechanism can dispatch straight to a registered
/// intrinsic without going through deferred resolution. Absent any binding,
/// `bound_key` falls back to a key built from the interface type itself, so a
/// host that registers an intrinsic directly on `(pkg.Iface).Method` — to
/// intercept a call through a nil interface value, say — still gets a hit;
/// the call mechanism only uses the key if the registry actually has a
/// handler for it.
fn synthetic_interface_method(
    ty: &TypeRef,
    selector: &str,
    receiver: Option<Object>,
    pos: Pos,
    interfaces: &InterfaceRegistry,
    logger: &mut dyn Logger,
    dedup: &AccessDedup,
) -> Object {
    let declared = ty.own_method(selector);
    if dedup.first_synthetic_method(format!("{}.{selector}", ty.identity())) {
        logger.debug(LogEvent {
            severity: Severity::Debug,
            kind: LogKind::SyntheticMethod,
            pos,
            message: format!("synthetic method for unbound interface {} method {selector}", ty.identity()).into(),
        });
    }

    let bound_key = interfaces
        .binding(&ty.identity())
        .map(|binding| method_key(&binding.concrete.pkg_path, &binding.concrete.name, selector, binding.is_pointer))
        .or_else(|| Some(method_key(&ty.pkg_path, &ty.name, selector, false)));

    Object::new(ObjectKind::SymbolicPlaceholder(Rc::new(PlaceholderValue {
        reason: Some(format!("unbound interface method {}.{selector}", ty.identity())),
        underlying_func: declared.map(|_| Object::placeholder(format!("declared method {selector}"))),
        receiver,
        bound_key,
    })))
}

/// Helper on `TypeInfo` this module relies on heavily enough to warrant a
/// short extension trait rather than repeating `matches!(ty.kind, Kind::Interface)`.
trait TypeInfoExt {
    fn kind_is_interface(&self) -> bool;
}

impl TypeInfoExt for goscan::TypeInfo {
    fn kind_is_interface(&self) -> bool {
        matches!(self.kind, Kind::Interface)
    }
}
