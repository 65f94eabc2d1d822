//! The `Scanner` trait: the boundary between `symgo`'s evaluator and
//! whatever actually parses and type-checks Go source.

use std::{fmt, rc::Rc};

use crate::{package::PackageInfo, types::TypeInfo};

/// Failure resolving a package or type. Scanners are expected to be
/// best-effort for out-of-policy packages (see [`ScanPolicy`]) rather than
/// erroring; a real `ScanError` should be rare — missing module, malformed
/// source, and similar host-level problems.
#[derive(Debug, Clone)]
pub struct ScanError {
    pub import_path: String,
    pub message: String,
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scan error for {}: {}", self.import_path, self.message)
    }
}

impl std::error::Error for ScanError {}

/// A predicate on import paths deciding whether the evaluator may cross into
/// that package's source. Cheaply cloneable (wraps an `Rc`) since it is
/// threaded through every package lookup.
#[derive(Clone)]
pub struct ScanPolicy(Rc<dyn Fn(&str) -> bool>);

impl fmt::Debug for ScanPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanPolicy").finish_non_exhaustive()
    }
}

impl ScanPolicy {
    /// The default: every package is in policy.
    #[must_use]
    pub fn all() -> Self {
        Self(Rc::new(|_| true))
    }

    pub fn new(predicate: impl Fn(&str) -> bool + 'static) -> Self {
        Self(Rc::new(predicate))
    }

    /// Only packages whose import path starts with `prefix` are in policy.
    /// The common case for scoping an analysis to "my own module".
    #[must_use]
    pub fn under_prefix(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self::new(move |path| path.starts_with(&prefix))
    }

    #[must_use]
    pub fn allows(&self, import_path: &str) -> bool {
        (self.0)(import_path)
    }
}

impl Default for ScanPolicy {
    fn default() -> Self {
        Self::all()
    }
}

/// The scanner's public surface: lazy, cached resolution of packages and
/// types. Implementations may load and parse Go source however they like;
/// `symgo` only ever sees the results through this trait.
pub trait Scanner {
    /// Resolves a package by import path, loading and parsing it if this is
    /// the first reference. Implementations are expected to cache the
    /// result for process lifetime.
    ///
    /// # Errors
    /// Returns `Err` only for genuine host-level failures (module not
    /// found, I/O error); an out-of-policy import should still resolve,
    /// typically to [`PackageInfo::unresolved_stub`].
    fn resolve_package(&self, import_path: &str) -> Result<Rc<PackageInfo>, ScanError>;

    /// Resolves a single named type within an already-resolved package.
    /// Returns `None` if the package has no type of that name.
    fn resolve_type(&self, pkg_path: &str, name: &str) -> Option<Rc<TypeInfo>>;

    /// Structural implements-check: does `concrete`'s method set satisfy
    /// every method `interface` declares? The scanner is the sole authority
    /// here; the evaluator never second-guesses a `false`
    /// result, and a scanner unable to decide should return `false` rather
    /// than panic.
    fn implements(&self, concrete: &TypeInfo, interface: &TypeInfo) -> bool {
        let Some(methods) = method_set(interface) else {
            return false;
        };
        methods.iter().all(|iface_method| {
            concrete
                .methods
                .iter()
                .any(|m| m.name == iface_method.name && m.signature.structurally_matches(&iface_method.signature))
        })
    }
}

fn method_set(ty: &TypeInfo) -> Option<&[crate::types::MethodInfo]> {
    match ty.kind {
        crate::types::Kind::Interface => Some(&ty.methods),
        _ => None,
    }
}
