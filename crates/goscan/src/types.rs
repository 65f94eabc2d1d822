//! Type descriptors: the scanner's resolved view of a Go type.
//!
//! A [`TypeInfo`] is the unit the evaluator's accessor helper and interface-
//! resolution subsystem reason about. Types referencing other types (a
//! slice's element, a struct's embedded field, a pointer's pointee) hold
//! `Rc<TypeInfo>` so a single declared type can be shared across every
//! reference to it without re-resolution.

use std::rc::Rc;

/// Basic (predeclared) Go types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    UnsafePointer,
    /// The untyped `nil`/bare `any` edge cases the scanner couldn't pin down
    /// further than "this is predeclared".
    Invalid,
}

/// A function/method signature, shared between `TypeInfo::Func` and
/// `MethodInfo`.
#[derive(Debug, Clone)]
pub struct Signature {
    pub params: Vec<Rc<TypeInfo>>,
    pub variadic: bool,
    pub results: Vec<Rc<TypeInfo>>,
}

impl Signature {
    /// Structural comparison used by the interface-resolution subsystem to
    /// decide whether a concrete method satisfies an interface method.
    /// Compares parameter/result type identity by name + package path
    /// rather than by `Rc` pointer, since a type may be resolved more than
    /// once by independent scanner calls.
    #[must_use]
    pub fn structurally_matches(&self, other: &Self) -> bool {
        self.variadic == other.variadic
            && self.params.len() == other.params.len()
            && self.results.len() == other.results.len()
            && self
                .params
                .iter()
                .zip(&other.params)
                .all(|(a, b)| a.identity() == b.identity())
            && self
                .results
                .iter()
                .zip(&other.results)
                .all(|(a, b)| a.identity() == b.identity())
    }
}

/// The shape of a type: what it's made of, independent of its name.
#[derive(Debug, Clone)]
pub enum Kind {
    Basic(BasicKind),
    Struct,
    Interface,
    Pointer(Rc<TypeInfo>),
    Slice(Rc<TypeInfo>),
    Array(usize, Rc<TypeInfo>),
    Map(Rc<TypeInfo>, Rc<TypeInfo>),
    Chan(Rc<TypeInfo>),
    Func(Rc<Signature>),
    /// A named type over another shape (`type Celsius float64`); the
    /// underlying shape is reachable through `TypeInfo::underlying`.
    Named,
    /// The scan policy excluded the package declaring this type, or the
    /// scanner's lazy resolution hasn't reached it yet.
    Unresolved,
}

#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub name: String,
    pub ty: Rc<TypeInfo>,
    /// True for a field introduced by embedding (`Response` in `struct {
    /// base.Response }`), which participates in promoted-field/method
    /// lookup.
    pub embedded: bool,
    pub tag: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MethodInfo {
    pub name: String,
    pub signature: Rc<Signature>,
    /// Whether the method is declared on `*T` rather than `T`.
    pub pointer_receiver: bool,
}

/// A resolved (or deliberately unresolved) Go type.
#[derive(Debug, Clone)]
pub struct TypeInfo {
    pub name: String,
    /// Empty for predeclared basic types and unnamed composite types.
    pub pkg_path: String,
    pub kind: Kind,
    /// For `Kind::Named`, the underlying shape (e.g. `float64` for
    /// `type Celsius float64`). `None` for everything else.
    pub underlying: Option<Rc<TypeInfo>>,
    /// Declared fields, own + embedded, in declaration order. Empty unless
    /// `kind` is `Struct` (or `Named` over a struct).
    pub fields: Vec<FieldInfo>,
    /// The type's method set. For a named struct type this includes both
    /// value- and pointer-receiver methods; receiver discipline is recorded
    /// per-method in `MethodInfo::pointer_receiver`.
    pub methods: Vec<MethodInfo>,
    /// `true` when the scanner could not fully resolve this type (its
    /// declaring package was out of scan policy, or resolution is still
    /// pending). Downstream evaluation must treat fields/methods/kind as
    /// best-effort in this case.
    pub unresolved: bool,
}

impl TypeInfo {
    /// A minimal placeholder for a type the scan policy excluded, optionally
    /// carrying a best-effort `Kind` when the scanner's lightweight index
    /// knows the declaration shape without resolving its body.
    #[must_use]
    pub fn unresolved(pkg_path: impl Into<String>, name: impl Into<String>, kind: Kind) -> Self {
        Self {
            name: name.into(),
            pkg_path: pkg_path.into(),
            kind,
            underlying: None,
            fields: Vec::new(),
            methods: Vec::new(),
            unresolved: true,
        }
    }

    #[must_use]
    pub fn basic(kind: BasicKind) -> Self {
        let name = match kind {
            BasicKind::Bool => "bool",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::Complex64 => "complex64",
            BasicKind::Complex128 => "complex128",
            BasicKind::String => "string",
            BasicKind::UnsafePointer => "unsafe.Pointer",
            BasicKind::Invalid => "invalid",
        };
        Self {
            name: name.to_string(),
            pkg_path: String::new(),
            kind: Kind::Basic(kind),
            underlying: None,
            fields: Vec::new(),
            methods: Vec::new(),
            unresolved: false,
        }
    }

    /// A stable identity string (`pkg_path.Name`) used for structural method
    /// comparisons and map keys. Predeclared types use their bare name.
    #[must_use]
    pub fn identity(&self) -> String {
        if self.pkg_path.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.pkg_path, self.name)
        }
    }

    /// Looks up a method declared directly on this type (not via embedding).
    #[must_use]
    pub fn own_method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| m.name == name)
    }

    #[must_use]
    pub fn own_field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| !f.embedded && f.name == name)
    }

    #[must_use]
    pub fn embedded_fields(&self) -> impl Iterator<Item = &FieldInfo> {
        self.fields.iter().filter(|f| f.embedded)
    }
}
