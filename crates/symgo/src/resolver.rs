//! Wraps a [`goscan::Scanner`] with scan-policy enforcement, so the rest of
//! the evaluator never has to check [`ScanPolicy`] itself — it only ever
//! sees a [`goscan::PackageInfo`]/[`goscan::TypeInfo`] that may be
//! `unresolved`, never a denied access.

use std::{cell::RefCell, rc::Rc};

use goscan::{Pos, ScanPolicy, Scanner, types::Kind};
use indexmap::IndexMap;

use crate::logger::{LogEvent, LogKind, Logger, Severity};

pub struct Resolver<S: Scanner> {
    scanner: S,
    policy: ScanPolicy,
    packages: RefCell<IndexMap<String, Rc<goscan::PackageInfo>>>,
}

impl<S: Scanner> Resolver<S> {
    pub fn new(scanner: S, policy: ScanPolicy) -> Self {
        Self { scanner, policy, packages: RefCell::new(IndexMap::new()) }
    }

    #[must_use]
    pub fn policy(&self) -> &ScanPolicy {
        &self.policy
    }

    #[must_use]
    pub fn scanner(&self) -> &S {
        &self.scanner
    }

    /// Resolves (and caches) a package by import path. Out-of-policy
    /// imports and genuine scanner failures both degrade to an unresolved
    /// stub rather than propagating an `EvalError` — only identifier/
    /// selector resolution *within* an in-policy package surfaces a hard
    /// error.
    pub fn resolve_package(&self, import_path: &str, logger: &mut dyn Logger) -> Rc<goscan::PackageInfo> {
        if let Some(cached) = self.packages.borrow().get(import_path) {
            return Rc::clone(cached);
        }

        let pkg = if !self.policy.allows(import_path) {
            logger.warn(LogEvent {
                severity: Severity::Warn,
                kind: LogKind::OutOfPolicyAccess,
                pos: Pos::NONE,
                message: format!("package {import_path} is out of scan policy").into(),
            });
            Rc::new(goscan::PackageInfo::unresolved_stub(import_path))
        } else {
            match self.scanner.resolve_package(import_path) {
                Ok(pkg) => pkg,
                Err(err) => {
                    logger.warn(LogEvent {
                        severity: Severity::Warn,
                        kind: LogKind::OutOfPolicyAccess,
                        pos: Pos::NONE,
                        message: format!("failed to resolve {import_path}: {err}").into(),
                    });
                    Rc::new(goscan::PackageInfo::unresolved_stub(import_path))
                }
            }
        };

        self.packages.borrow_mut().insert(import_path.to_string(), Rc::clone(&pkg));
        pkg
    }

    /// Resolves a named type within `pkg_path`. Produces a best-effort
    /// `Kind::Unresolved` `TypeInfo` rather than `None` so callers never have
    /// to special-case "type not found" versus "type out of policy" —
    /// both look the same to downstream code.
    pub fn resolve_type(&self, pkg_path: &str, name: &str, logger: &mut dyn Logger) -> Rc<goscan::TypeInfo> {
        if !self.policy.allows(pkg_path) {
            logger.warn(LogEvent {
                severity: Severity::Warn,
                kind: LogKind::OutOfPolicyAccess,
                pos: Pos::NONE,
                message: format!("type {pkg_path}.{name} is out of scan policy").into(),
            });
            return Rc::new(goscan::TypeInfo::unresolved(pkg_path, name, Kind::Unresolved));
        }

        self.scanner
            .resolve_type(pkg_path, name)
            .unwrap_or_else(|| Rc::new(goscan::TypeInfo::unresolved(pkg_path, name, Kind::Unresolved)))
    }

    /// Delegates to the scanner's structural `implements` check.
    #[must_use]
    pub fn implements(&self, concrete: &goscan::TypeInfo, interface: &goscan::TypeInfo) -> bool {
        self.scanner.implements(concrete, interface)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use goscan::{ScanError, ScanPolicy, Scanner, types::Kind};

    use super::Resolver;
    use crate::logger::{LogKind, RecordingLogger};

    struct FixtureScanner;

    impl Scanner for FixtureScanner {
        fn resolve_package(&self, import_path: &str) -> Result<Rc<goscan::PackageInfo>, ScanError> {
            Ok(Rc::new(goscan::PackageInfo {
                path: import_path.to_string(),
                name: "fixture".to_string(),
                files: Vec::new(),
                functions: indexmap::IndexMap::new(),
                types: indexmap::IndexMap::new(),
                vars: indexmap::IndexMap::new(),
                fully_resolved: true,
            }))
        }

        fn resolve_type(&self, pkg_path: &str, name: &str) -> Option<Rc<goscan::TypeInfo>> {
            Some(Rc::new(goscan::TypeInfo::unresolved(pkg_path, name, Kind::Struct)))
        }
    }

    #[test]
    fn out_of_policy_package_degrades_to_stub_with_warning() {
        let resolver = Resolver::new(FixtureScanner, ScanPolicy::under_prefix("example.com/allowed"));
        let mut logger = RecordingLogger::new();

        let pkg = resolver.resolve_package("example.com/denied", &mut logger);
        assert!(!pkg.fully_resolved);
        assert_eq!(resolver.packages.borrow().len(), 1);
        assert_eq!(logger.count(&LogKind::OutOfPolicyAccess), 1);
    }

    #[test]
    fn in_policy_package_resolves_through_scanner() {
        let resolver = Resolver::new(FixtureScanner, ScanPolicy::all());
        let mut logger = RecordingLogger::new();

        let pkg = resolver.resolve_package("example.com/allowed", &mut logger);
        assert!(pkg.fully_resolved);
        assert_eq!(logger.count(&LogKind::OutOfPolicyAccess), 0);
    }

    #[test]
    fn package_lookup_is_cached() {
        let resolver = Resolver::new(FixtureScanner, ScanPolicy::all());
        let mut logger = RecordingLogger::new();

        let first = resolver.resolve_package("example.com/allowed", &mut logger);
        let second = resolver.resolve_package("example.com/allowed", &mut logger);
        assert!(Rc::ptr_eq(&first, &second));
    }
}
