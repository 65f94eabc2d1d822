//! Configuration surface host tools use to construct an [`crate::Evaluator`]
//!.
//!
//! Grouping every knob behind one builder (rather than a long constructor
//! parameter list) keeps embeddable-interpreter configuration manageable as
//! it grows.

use std::rc::Rc;

use goscan::ScanPolicy;

use crate::object::Object;

/// One `(key, handler)` pair registered before evaluation starts. Keys
/// follow the intrinsic-key construction rules — e.g. `fmt.Println`,
/// `(*bytes.Buffer).Write`.
pub type InitialIntrinsic = (String, Rc<crate::object::IntrinsicFn>);

/// Resource budgets the call mechanism enforces independently of the
/// identity-based recursion guard.
#[derive(Debug, Clone, Copy)]
pub struct ResourceBudget {
    /// Hard ceiling on call-stack depth. Exceeding it yields
    /// `EvalError::DepthExceeded` rather than overflowing the host stack.
    pub max_call_depth: usize,
    /// Optional ceiling on evaluated AST nodes, mirrored into the
    /// `EvalContext` the evaluator constructs if the caller didn't supply
    /// one of its own.
    pub max_steps: Option<u64>,
}

impl Default for ResourceBudget {
    fn default() -> Self {
        Self { max_call_depth: 10_000, max_steps: None }
    }
}

/// Builder for evaluator construction. Every field has a sensible default;
/// hosts typically only set `scan_policy` and a handful of intrinsics.
pub struct EvaluatorOptions {
    pub scan_policy: ScanPolicy,
    pub budget: ResourceBudget,
    pub initial_intrinsics: Vec<InitialIntrinsic>,
    pub initial_default_intrinsic: Option<Rc<crate::object::IntrinsicFn>>,
}

impl std::fmt::Debug for EvaluatorOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluatorOptions")
            .field("budget", &self.budget)
            .field("initial_intrinsics", &self.initial_intrinsics.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .field("initial_default_intrinsic", &self.initial_default_intrinsic.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for EvaluatorOptions {
    fn default() -> Self {
        Self {
            scan_policy: ScanPolicy::all(),
            budget: ResourceBudget::default(),
            initial_intrinsics: Vec::new(),
            initial_default_intrinsic: None,
        }
    }
}

impl EvaluatorOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_scan_policy(mut self, policy: ScanPolicy) -> Self {
        self.scan_policy = policy;
        self
    }

    #[must_use]
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.budget.max_call_depth = depth;
        self
    }

    #[must_use]
    pub fn with_max_steps(mut self, steps: u64) -> Self {
        self.budget.max_steps = Some(steps);
        self
    }

    /// Registers an intrinsic to install as soon as the `Evaluator` is
    /// built.
    #[must_use]
    pub fn with_intrinsic(
        mut self,
        key: impl Into<String>,
        handler: impl Fn(&crate::context::EvalContext, &[Object]) -> Object + 'static,
    ) -> Self {
        self.initial_intrinsics.push((key.into(), Rc::new(handler)));
        self
    }

    /// Registers the default-intrinsic hook fired on every call before any
    /// other dispatch.
    #[must_use]
    pub fn with_default_intrinsic(
        mut self,
        handler: impl Fn(&crate::context::EvalContext, &[Object]) -> Object + 'static,
    ) -> Self {
        self.initial_default_intrinsic = Some(Rc::new(handler));
        self
    }
}
