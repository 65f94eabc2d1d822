//! The evaluator: owns every piece of engine state and exposes the
//! entry points a host tool drives.
//!
//! Generic over three host-supplied policies — `Scanner` for package
//! resolution, `Logger` for observability, `Tracer` for per-node tracing.
//! Monomorphizing over these rather than boxing them as trait objects means
//! a host that doesn't need tracing (`NoopTracer`) pays nothing for it.

use std::rc::Rc;

use goscan::{Pos, Scanner, ast};

use crate::{
    accessor::{self, AccessDedup},
    call::{CallMachinery, DeferredCall},
    context::EvalContext,
    env::{Env, PackageEnvironments},
    interface::InterfaceRegistry,
    intrinsics::IntrinsicRegistry,
    logger::Logger,
    object::{FunctionValue, Object, ObjectKind},
    options::{EvaluatorOptions, ResourceBudget},
    resolver::Resolver,
    tracer::Tracer,
};

/// Owns every piece of state one evaluation run needs: the package scanner
/// and its cache, the interface-implementation registry, the intrinsic
/// table, the call-memoization/recursion-guard stack, and the active
/// defer/panic frames. A single `Evaluator` is meant to live for the
/// lifetime of one whole-program analysis; nothing about it assumes a
/// single-threaded host beyond the `Rc`s backing `Object` and `Env`.
pub struct Evaluator<S: Scanner, L: Logger, Tr: Tracer> {
    pub(crate) resolver: Resolver<S>,
    pub(crate) logger: L,
    pub(crate) tracer: Tr,
    pub(crate) ctx: EvalContext,
    pub(crate) package_envs: PackageEnvironments,
    pub(crate) interfaces: InterfaceRegistry,
    pub(crate) intrinsics: IntrinsicRegistry,
    pub(crate) calls: CallMachinery,
    pub(crate) defer_stack: Vec<Vec<DeferredCall>>,
    pub(crate) active_panic: Option<Object>,
    pub(crate) current_function: Option<String>,
    pub(crate) current_package: Option<String>,
    pub(crate) budget: ResourceBudget,
    pub(crate) access_dedup: AccessDedup,
}

impl<S: Scanner, L: Logger, Tr: Tracer> Evaluator<S, L, Tr> {
    /// Builds a fresh evaluator. `logger`/`tracer` are typically
    /// `NoopLogger`/`NoopTracer` unless the host wants observability.
    #[must_use]
    pub fn new(scanner: S, logger: L, tracer: Tr, options: EvaluatorOptions) -> Self {
        let budget = options.budget;
        let ctx = match budget.max_steps {
            Some(max_steps) => EvalContext::with_step_budget(max_steps),
            None => EvalContext::new(),
        };

        let mut intrinsics = IntrinsicRegistry::new();
        for (key, handler) in options.initial_intrinsics {
            intrinsics.register(key, handler);
        }
        if let Some(handler) = options.initial_default_intrinsic {
            intrinsics.register_default(handler);
        }

        Self {
            resolver: Resolver::new(scanner, options.scan_policy),
            logger,
            tracer,
            ctx,
            package_envs: PackageEnvironments::new(),
            interfaces: InterfaceRegistry::new(),
            intrinsics,
            calls: CallMachinery::new(),
            defer_stack: Vec::new(),
            active_panic: None,
            current_function: None,
            current_package: None,
            budget,
            access_dedup: AccessDedup::new(),
        }
    }

    /// The shared cancellation/step-budget context for this run. A host
    /// calls `.cancellation_handle()` on it from a watchdog thread to abort
    /// evaluation early.
    #[must_use]
    pub fn context(&self) -> &EvalContext {
        &self.ctx
    }

    #[must_use]
    pub fn interfaces(&self) -> &InterfaceRegistry {
        &self.interfaces
    }

    /// Manually binds every value of `interface_fqn` to a known concrete
    /// type, ahead of (or instead of) runtime discovery via assignment
    ///.
    pub fn bind_interface(&mut self, interface_fqn: impl Into<String>, concrete: goscan::TypeInfo, is_pointer: bool) {
        self.interfaces.bind(interface_fqn, concrete, is_pointer);
    }

    /// Registers a host intrinsic under `key`.
    pub fn register_intrinsic(&mut self, key: impl Into<String>, handler: impl Fn(&EvalContext, &[Object]) -> Object + 'static) {
        self.intrinsics.register(key, Rc::new(handler));
    }

    /// Registers the default-intrinsic hook observing every call before any
    /// other dispatch.
    pub fn register_default_intrinsic(&mut self, handler: impl Fn(&EvalContext, &[Object]) -> Object + 'static) {
        self.intrinsics.register_default(Rc::new(handler));
    }

    /// Evaluates every top-level declaration in `file`, declaring
    /// package-level functions, types, and vars into `pkg_path`'s shared
    /// environment. Safe to call once per file of a package;
    /// declarations accumulate in the same package environment across calls.
    pub fn eval_file(&mut self, file: &ast::File, pkg_path: &str) {
        self.current_package = Some(pkg_path.to_string());
        let env = self.package_envs.get_or_create(pkg_path);
        for decl in &file.decls {
            self.eval_decl(decl, &env, pkg_path);
        }
    }

    fn eval_decl(&mut self, decl: &ast::Decl, env: &Env, pkg_path: &str) {
        match decl {
            // Methods aren't declared loose in package scope — they're
            // found through `accessor::access` via the scanner's
            // `PackageInfo::functions`, keyed `"TypeName.Method"`.
            ast::Decl::Func(f) if f.recv.is_some() => {}
            ast::Decl::Func(f) => {
                let qualified_name = crate::intrinsics::function_key(pkg_path, &f.name);
                let func = Object::new(ObjectKind::Function(Rc::new(FunctionValue {
                    name: f.name.clone(),
                    qualified_name,
                    decl: Rc::clone(f),
                    env: env.clone(),
                    receiver: None,
                    type_params: f.type_params.iter().flat_map(|field| field.names.clone()).collect(),
                    package_path: pkg_path.to_string(),
                })));
                env.declare(f.name.clone(), func);
            }
            ast::Decl::Gen(gd) => {
                self.eval_gen_decl(gd, env);
            }
        }
    }

    /// The library's general-purpose entry point: evaluates a single file's
    /// top-level declarations, a statement, or an expression, against `env`
    /// in the context of `pkg_path`. `eval_file` and `apply` are thin
    /// convenience wrappers over the same dispatch used here for the two
    /// most common host call shapes (declaring a whole file; entering a
    /// function by value).
    pub fn eval(&mut self, node: goscan::ast::Node<'_>, env: &Env, pkg_path: &str) -> Object {
        self.current_package = Some(pkg_path.to_string());
        match node {
            goscan::ast::Node::File(file) => {
                for decl in &file.decls {
                    self.eval_decl(decl, env, pkg_path);
                }
                Object::nil()
            }
            goscan::ast::Node::Stmt(stmt) => self.eval_stmt(stmt, env),
            goscan::ast::Node::Expr(expr) => self.eval_expr(expr, env),
        }
    }

    /// Binds the result of an `Evaluator::find_object`/function-literal
    /// lookup's call, the way a host tool drives a discovered entry point
    /// directly rather than through a `CallExpr` in the AST.
    pub fn apply(&mut self, function: &Object, args: Vec<Object>) -> Object {
        self.apply_call(function, args, Pos::NONE)
    }

    /// Looks up `name` in the current package's environment, falling back to
    /// the package scope itself (functions, types, package-level vars) if
    /// the binding hasn't been evaluated into the environment yet. Returns
    /// `None` rather than a placeholder when nothing by that name exists at
    /// all, distinguishing "not found" from "found but unresolved".
    pub fn find_object(&mut self, name: &str) -> Option<Object> {
        let pkg_path = self.current_package.clone()?;
        self.find_object_in_package(&pkg_path, name)
    }

    pub fn find_object_in_package(&mut self, pkg_path: &str, name: &str) -> Option<Object> {
        let env = self.package_envs.get_or_create(pkg_path);
        if let Some(obj) = env.get(name) {
            return Some(obj);
        }

        let pkg = self.resolver.resolve_package(pkg_path, &mut self.logger);
        if !pkg.fully_resolved {
            return None;
        }

        let result = accessor::access_package(&pkg, &env, name, Pos::NONE, &self.resolver, &mut self.package_envs, &mut self.logger);
        match result.kind() {
            ObjectKind::SymbolicPlaceholder(ph) if ph.reason.as_deref().is_some_and(|r| r.starts_with("unknown package member")) => None,
            _ => Some(result),
        }
    }
}
