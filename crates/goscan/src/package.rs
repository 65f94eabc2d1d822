//! Package-level metadata, as a scanner would hand it to an evaluator.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::{
    ast::{File, FuncDecl},
    types::TypeInfo,
};

/// A package-level `var`/`const`, already evaluated to the extent the
/// scanner can do so without running code (literal initializers only).
#[derive(Debug, Clone)]
pub struct VarInfo {
    pub name: String,
    pub ty: Option<Rc<TypeInfo>>,
    /// Present when the scanner could constant-fold the initializer
    /// (string/numeric/bool literals); symbolic initializers are left as
    /// `None` and evaluated lazily by `symgo` on first reference.
    pub const_string_value: Option<String>,
}

/// A loaded Go package: its files, declared functions, and declared types.
#[derive(Debug, Clone)]
pub struct PackageInfo {
    /// Import path, e.g. `"github.com/example/project/internal/util"`.
    pub path: String,
    /// Package name as declared (`package util`), which may differ from the
    /// last path component.
    pub name: String,
    pub files: Vec<Rc<File>>,
    /// Package-level functions keyed by name, plus every method keyed by
    /// `"TypeName.Method"` regardless of receiver kind — the receiver's
    /// pointer-ness lives on the owning `TypeInfo`'s `MethodInfo`, not in
    /// this key, since a type can't declare both a value- and a
    /// pointer-receiver method of the same name.
    pub functions: IndexMap<String, Rc<FuncDecl>>,
    pub types: IndexMap<String, Rc<TypeInfo>>,
    pub vars: IndexMap<String, VarInfo>,
    /// `true` once every file in the package has gone through full
    /// resolution; `false` for a stub created for an out-of-policy import
    /// (see `Scanner::resolve_package`).
    pub fully_resolved: bool,
}

impl PackageInfo {
    /// An empty, unresolved package stub for an import the scan policy
    /// excludes. Carries just enough identity for selector resolution to
    /// produce a meaningful placeholder.
    #[must_use]
    pub fn unresolved_stub(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = path.rsplit('/').next().unwrap_or(&path).to_string();
        Self {
            path,
            name,
            files: Vec::new(),
            functions: IndexMap::new(),
            types: IndexMap::new(),
            vars: IndexMap::new(),
            fully_resolved: false,
        }
    }
}
