//! The runtime value model: a tagged sum every evaluated expression yields.
//!
//! Every [`Object`] is an `Rc`-backed handle, so cloning an `Object` is
//! cheap and two clones referring to the same underlying value compare
//! equal under [`Object::ptr_eq`] — this is the "pointer equality, not
//! structural equality" identity the memoization cache and recursion guard
//! rely on. Interior mutability (`RefCell`) is used only where a value needs
//! to change in place after creation — a `Variable`'s current value and
//! growing possible-types set — reaching for shared mutable cells only where
//! aliasing is semantically required, not by default.

use std::{cell::RefCell, fmt, rc::Rc};

use goscan::{Pos, TypeInfo, ast};
use indexmap::{IndexMap, IndexSet};

use crate::{env::Env, error::EvalError};

pub type TypeRef = Rc<TypeInfo>;

/// A semantic type descriptor with pointer/slice/map adornments layered on
/// top of a resolved [`TypeInfo`], used to type composite-literal elements
/// and placeholders precisely even when the underlying `TypeInfo` alone
/// would lose the adornment (e.g. a field declared `*io.Reader` vs
/// `io.Reader`).
#[derive(Debug, Clone)]
pub struct FieldType {
    pub elem: TypeRef,
    pub pointer: bool,
    pub slice: bool,
    pub map: bool,
    pub variadic: bool,
}

impl FieldType {
    #[must_use]
    pub fn plain(elem: TypeRef) -> Self {
        Self { elem, pointer: false, slice: false, map: false, variadic: false }
    }

    #[must_use]
    pub fn pointer_to(elem: TypeRef) -> Self {
        Self { elem, pointer: true, slice: false, map: false, variadic: false }
    }
}

/// Fields every `Object` carries regardless of its kind.
#[derive(Debug, Clone, Default)]
pub struct BaseObject {
    pub resolved_type: Option<TypeRef>,
    pub field_type: Option<FieldType>,
}

impl BaseObject {
    #[must_use]
    pub fn typed(ty: TypeRef) -> Self {
        Self { resolved_type: Some(ty), field_type: None }
    }
}

/// A fully-qualified function or method name, used both for intrinsic key
/// construction and for display/debugging.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fqn(pub String);

impl fmt::Display for Fqn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A handler registered in the [`crate::intrinsics::IntrinsicRegistry`].
/// Receives the evaluation context, the callee `Object` as `args[0]` (for a
/// default-intrinsic hook) or the bound receiver (for a method intrinsic),
/// followed by call arguments in source order.
pub type IntrinsicFn = dyn Fn(&crate::context::EvalContext, &[Object]) -> Object;

pub struct IntrinsicValue {
    pub key: String,
    pub handler: Rc<IntrinsicFn>,
}

impl fmt::Debug for IntrinsicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntrinsicValue").field("key", &self.key).finish_non_exhaustive()
    }
}

/// A user-defined function or method, bound to its defining environment.
#[derive(Debug, Clone)]
pub struct FunctionValue {
    pub name: String,
    /// Qualified name for diagnostics, e.g. `(*Foo).Bar`.
    pub qualified_name: String,
    pub decl: Rc<ast::FuncDecl>,
    /// The environment this function closes over — its package scope, plus
    /// any enclosing local scope for a function literal.
    pub env: Env,
    /// Bound receiver, present once this `Function` has been produced as a
    /// *method value* (`x.M`) rather than looked up as a bare declaration.
    pub receiver: Option<Object>,
    pub type_params: Vec<String>,
    pub package_path: String,
}

/// A symbolic struct value. `fields` holds whichever field values are
/// concretely known; fields absent from the map are treated as zero-valued
/// placeholders of their declared type on first access.
#[derive(Debug, Clone)]
pub struct InstanceValue {
    pub ty: TypeRef,
    pub fields: IndexMap<String, Object>,
}

/// Wraps another `Object`. Distinguishes pointer- from value-receiver method
/// dispatch; stateful mutation through a pointer (`*p = x`) is not modelled,
/// the same as for slices and maps.
#[derive(Debug, Clone)]
pub struct PointerValue {
    pub target: Object,
}

/// A symbolic slice. `elements` is `None` when the slice's contents are
/// entirely unknown (e.g. the result of a call to an out-of-policy
/// function); `Some` (possibly empty) when at least the literal elements
/// seen so far are known, as for a composite literal.
#[derive(Debug, Clone)]
pub struct SliceValue {
    pub elem_type: Option<TypeRef>,
    pub elements: Option<Vec<Object>>,
}

/// A symbolic map. Entries are kept as an association list (not a hash map)
/// because Go map keys can be arbitrary comparable `Object`s and the
/// evaluator never needs fast lookup — only to recall the literal
/// key/value pairs a composite literal declared.
#[derive(Debug, Clone)]
pub struct MapValue {
    pub key_type: Option<TypeRef>,
    pub value_type: Option<TypeRef>,
    pub entries: Option<Vec<(Object, Object)>>,
}

#[derive(Debug, Clone)]
pub struct ChannelValue {
    pub elem_type: Option<TypeRef>,
    pub dir: ast::ChanDir,
}

/// A named binding. Tracks the monotonically growing set of concrete types
/// ever assigned to it in addition to its
/// current value.
#[derive(Debug, Clone)]
pub struct VariableValue {
    pub name: String,
    pub value: Object,
    /// Type identities (`TypeInfo::identity()`) ever assigned to this
    /// variable. Only grows across branches for interface-typed variables;
    /// concrete non-interface variables simply replace `value` on
    /// assignment and this set stays a single entry.
    pub possible_types: IndexSet<String>,
    pub declared_type: Option<TypeRef>,
    pub fully_evaluated: bool,
}

#[derive(Debug, Clone)]
pub struct PackageValue {
    pub info: Rc<goscan::PackageInfo>,
    pub env: Env,
}

/// Stands in for a value whose concrete form is unknown.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderValue {
    pub reason: Option<String>,
    /// Present for an unresolved interface-method call: the declared method
    /// being invoked, kept so a later concrete binding can re-dispatch
    ///.
    pub underlying_func: Option<Object>,
    pub receiver: Option<Object>,
    /// Precomputed intrinsic-registry key for a method call through an
    /// interface value with a manual or discovered binding. `None` when
    /// no binding is known yet, in which case the call mechanism falls back
    /// to deferring the call.
    pub bound_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReturnValueData {
    pub value: Object,
}

#[derive(Debug, Clone)]
pub struct PanicValue {
    pub value: Object,
    pub pos: Pos,
}

/// The tagged sum of every kind of runtime value.
#[derive(Debug, Clone)]
pub enum ObjectKind {
    Integer(i64),
    Float(f64),
    Str(Rc<str>),
    Boolean(bool),
    Nil,
    Function(Rc<FunctionValue>),
    Intrinsic(Rc<IntrinsicValue>),
    Instance(Rc<RefCell<InstanceValue>>),
    Pointer(Rc<PointerValue>),
    Slice(Rc<RefCell<SliceValue>>),
    Map(Rc<RefCell<MapValue>>),
    Channel(Rc<ChannelValue>),
    Variable(Rc<RefCell<VariableValue>>),
    Package(Rc<PackageValue>),
    Type(TypeRef),
    SymbolicPlaceholder(Rc<PlaceholderValue>),
    Error(Rc<EvalError>),
    ReturnValue(Rc<ReturnValueData>),
    MultiReturn(Rc<Vec<Object>>),
    Break(Option<Rc<str>>),
    Continue(Option<Rc<str>>),
    Fallthrough,
    PanicError(Rc<PanicValue>),
}

impl ObjectKind {
    /// A short uppercase label used in placeholder reasons and debug output
    /// (e.g. "invalid selector on SLICE value").
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Integer(_) => "INTEGER",
            Self::Float(_) => "FLOAT",
            Self::Str(_) => "STRING",
            Self::Boolean(_) => "BOOLEAN",
            Self::Nil => "NIL",
            Self::Function(_) => "FUNCTION",
            Self::Intrinsic(_) => "INTRINSIC",
            Self::Instance(_) => "INSTANCE",
            Self::Pointer(_) => "POINTER",
            Self::Slice(_) => "SLICE",
            Self::Map(_) => "MAP",
            Self::Channel(_) => "CHANNEL",
            Self::Variable(_) => "VARIABLE",
            Self::Package(_) => "PACKAGE",
            Self::Type(_) => "TYPE",
            Self::SymbolicPlaceholder(_) => "PLACEHOLDER",
            Self::Error(_) => "ERROR",
            Self::ReturnValue(_) => "RETURN_VALUE",
            Self::MultiReturn(_) => "MULTI_RETURN",
            Self::Break(_) => "BREAK",
            Self::Continue(_) => "CONTINUE",
            Self::Fallthrough => "FALLTHROUGH",
            Self::PanicError(_) => "PANIC",
        }
    }
}

struct ObjectData {
    base: BaseObject,
    kind: ObjectKind,
}

impl fmt::Debug for ObjectData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object").field("kind", &self.kind).field("base", &self.base).finish()
    }
}

/// A handle to one runtime value. Cheap to clone (`Rc`); two clones share
/// identity (see [`Object::ptr_eq`]).
#[derive(Clone)]
pub struct Object(Rc<ObjectData>);

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Object {
    #[must_use]
    pub fn new(kind: ObjectKind) -> Self {
        Self(Rc::new(ObjectData { base: BaseObject::default(), kind }))
    }

    #[must_use]
    pub fn with_base(kind: ObjectKind, base: BaseObject) -> Self {
        Self(Rc::new(ObjectData { base, kind }))
    }

    #[must_use]
    pub fn kind(&self) -> &ObjectKind {
        &self.0.kind
    }

    #[must_use]
    pub fn base(&self) -> &BaseObject {
        &self.0.base
    }

    /// Pointer-equality identity. Used for the memoization fingerprint and
    /// the recursion guard.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    /// A stable `usize` identity, suitable as a hash-map key component for
    /// the memoization cache and recursion-guard stack.
    #[must_use]
    pub fn identity(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    /// Unwraps a `Variable` wrapper to its current value; returns `self`
    /// unchanged for any other kind. Every call argument is force-evaluated
    /// this way before being handed to `applyFunction`.
    #[must_use]
    pub fn force(&self) -> Self {
        match &self.0.kind {
            ObjectKind::Variable(v) => v.borrow().value.clone(),
            _ => self.clone(),
        }
    }

    #[must_use]
    pub fn integer(v: i64) -> Self {
        Self::new(ObjectKind::Integer(v))
    }

    #[must_use]
    pub fn float(v: f64) -> Self {
        Self::new(ObjectKind::Float(v))
    }

    #[must_use]
    pub fn string(v: impl Into<Rc<str>>) -> Self {
        Self::new(ObjectKind::Str(v.into()))
    }

    #[must_use]
    pub fn boolean(v: bool) -> Self {
        Self::new(ObjectKind::Boolean(v))
    }

    #[must_use]
    pub fn nil() -> Self {
        Self::new(ObjectKind::Nil)
    }

    #[must_use]
    pub fn fallthrough_sentinel() -> Self {
        Self::new(ObjectKind::Fallthrough)
    }

    #[must_use]
    pub fn break_sentinel(label: Option<Rc<str>>) -> Self {
        Self::new(ObjectKind::Break(label))
    }

    #[must_use]
    pub fn continue_sentinel(label: Option<Rc<str>>) -> Self {
        Self::new(ObjectKind::Continue(label))
    }

    #[must_use]
    pub fn error(err: EvalError) -> Self {
        Self::new(ObjectKind::Error(Rc::new(err)))
    }

    #[must_use]
    pub fn return_value(value: Self) -> Self {
        Self::new(ObjectKind::ReturnValue(Rc::new(ReturnValueData { value })))
    }

    #[must_use]
    pub fn multi_return(values: Vec<Self>) -> Self {
        Self::new(ObjectKind::MultiReturn(Rc::new(values)))
    }

    #[must_use]
    pub fn placeholder(reason: impl Into<String>) -> Self {
        Self::new(ObjectKind::SymbolicPlaceholder(Rc::new(PlaceholderValue {
            reason: Some(reason.into()),
            ..Default::default()
        })))
    }

    #[must_use]
    pub fn typed_placeholder(reason: impl Into<String>, ty: TypeRef) -> Self {
        Self::with_base(
            ObjectKind::SymbolicPlaceholder(Rc::new(PlaceholderValue {
                reason: Some(reason.into()),
                ..Default::default()
            })),
            BaseObject::typed(ty),
        )
    }

    #[must_use]
    pub fn variable(value: VariableValue) -> Self {
        Self::new(ObjectKind::Variable(Rc::new(RefCell::new(value))))
    }

    #[must_use]
    pub fn instance(value: InstanceValue) -> Self {
        let ty = Rc::clone(&value.ty);
        Self::with_base(ObjectKind::Instance(Rc::new(RefCell::new(value))), BaseObject::typed(ty))
    }

    #[must_use]
    pub fn pointer(target: Self) -> Self {
        Self::new(ObjectKind::Pointer(Rc::new(PointerValue { target })))
    }

    /// Is this object (after unwrapping a `Variable`) truthy for `if`/`for`
    /// condition folding? Returns `None` when the condition is not a
    /// concrete boolean, meaning the caller must explore both branches.
    #[must_use]
    pub fn as_concrete_bool(&self) -> Option<bool> {
        match self.force().kind() {
            ObjectKind::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_control_flow(&self) -> bool {
        matches!(
            self.kind(),
            ObjectKind::Break(_)
                | ObjectKind::Continue(_)
                | ObjectKind::Fallthrough
                | ObjectKind::ReturnValue(_)
                | ObjectKind::Error(_)
                | ObjectKind::PanicError(_)
        )
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self.kind(), ObjectKind::Error(_))
    }

    /// Best-effort concrete `TypeInfo` for a value, unwrapping one level of
    /// pointer indirection so `&A{}` assigned to an interface-typed
    /// variable still carries `A`'s identity.
    #[must_use]
    pub fn concrete_type(&self) -> Option<TypeRef> {
        match self.kind() {
            ObjectKind::Pointer(p) => p.target.concrete_type(),
            _ => self.base().resolved_type.clone(),
        }
    }
}
