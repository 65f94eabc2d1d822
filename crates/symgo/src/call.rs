//! The call mechanism: the single path every `CallExpr`
//! goes through, in a fixed order of precedence.
//!
//! 1. The default-intrinsic hook, if registered, observes every call
//!    (callee + arguments) before anything else happens. Its result is
//!    discarded — it exists purely so host tools can build call graphs.
//! 2. A registered intrinsic for this exact callee short-circuits body
//!    dispatch entirely.
//! 3. A memoized result from a previous identical call (same function
//!    identity, same argument identities) is returned without re-evaluating
//!    the body.
//! 4. The identity-based recursion guard: if this exact `(callee, args)`
//!    fingerprint is already on the call stack, evaluation has looped back
//!    on itself with no way to make progress, and a placeholder is returned
//!    instead of recursing forever.
//! 5. An unresolved interface method call is deferred: the call is queued
//!    in the interface registry and a placeholder return value stands in
//!    for it until a concrete implementation becomes known.
//! 6. Anything else callable runs its body; anything not callable at all
//!    produces an `Object::Error`.

use std::rc::Rc;

use goscan::{Pos, Scanner, ast};

use crate::{
    env::Env,
    error::EvalError,
    logger::{LogEvent, LogKind, Logger, Severity},
    object::{FunctionValue, Object, ObjectKind, PlaceholderValue},
    tracer::Tracer,
};

/// A `defer` statement's callee and arguments, captured eagerly at the
/// `defer` site per Go semantics; invocation itself waits for the enclosing
/// call frame to exit.
#[derive(Debug, Clone)]
pub struct DeferredCall {
    pub callee: Object,
    pub args: Vec<Object>,
    pub pos: Pos,
}

/// Identity fingerprint for one call: the callee's identity plus each
/// (force-unwrapped) argument's identity, in order. Two calls with the same
/// fingerprint are, by definition, indistinguishable to the evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CallFingerprint {
    callee: usize,
    args: Vec<usize>,
}

/// A memo-cache entry. Keeps the callee and argument `Object`s alive
/// alongside the cached result so their addresses — which back
/// `CallFingerprint`'s identity hash — can never be freed and reused by an
/// unrelated object while the entry exists.
struct MemoEntry {
    #[allow(dead_code)]
    callee: Object,
    #[allow(dead_code)]
    args: Vec<Object>,
    result: Object,
}

#[derive(Default)]
pub struct CallMachinery {
    memo: std::collections::HashMap<CallFingerprint, MemoEntry>,
    stack: Vec<CallFingerprint>,
}

impl CallMachinery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

/// Recovers `(interface_identity, method)` from a placeholder built by
/// `accessor::synthetic_interface_method`, whose reason string is
/// `"unbound interface method {pkg_path}.{type_name}.{selector}"`. The
/// identity itself may contain dots (`pkg_path.TypeName`), so the split must
/// happen at the *last* dot, not the first.
fn interface_method_from_reason(ph: &Rc<PlaceholderValue>) -> Option<(String, String)> {
    let reason = ph.reason.as_deref()?;
    let qualified = reason.strip_prefix("unbound interface method ")?;
    let (interface_identity, method) = qualified.rsplit_once('.')?;
    Some((interface_identity.to_string(), method.to_string()))
}

impl<S: Scanner, L: Logger, Tr: Tracer> crate::evaluator::Evaluator<S, L, Tr> {
    /// Entry point for `CallExpr` evaluation and for a host driving a
    /// function directly (`Evaluator::apply`).
    pub(crate) fn apply_call(&mut self, callee: &Object, args: Vec<Object>, pos: Pos) -> Object {
        let callee = callee.force();
        let args: Vec<Object> = args.iter().map(Object::force).collect();

        self.run_default_intrinsic(&callee, &args);

        if let Some(result) = self.try_registered_intrinsic(&callee, &args) {
            return result;
        }

        let fingerprint = CallFingerprint {
            callee: callee.identity(),
            args: args.iter().map(Object::identity).collect(),
        };

        if let Some(entry) = self.calls.memo.get(&fingerprint) {
            return entry.result.clone();
        }

        if self.calls.stack.contains(&fingerprint) {
            self.logger.warn(LogEvent {
                severity: Severity::Warn,
                kind: LogKind::RecursionGuardHit,
                pos,
                message: "recursive call with identical arguments short-circuited".into(),
            });
            return match callee.kind() {
                ObjectKind::Function(f) => self.result_placeholder(&f.env, &f.decl.results, "recursion guard"),
                _ => Object::placeholder("recursion guard"),
            };
        }

        if self.calls.stack.len() >= self.budget.max_call_depth {
            return Object::error(EvalError::DepthExceeded { pos, depth: self.calls.stack.len() });
        }

        if let ObjectKind::SymbolicPlaceholder(ph) = callee.kind() {
            if let Some(deferred) = self.try_defer_interface_call(ph, &args, pos) {
                return deferred;
            }
        }

        let result = match callee.kind() {
            ObjectKind::Function(f) => {
                self.calls.stack.push(fingerprint.clone());
                let result = self.invoke_function(&f, &args, pos);
                self.calls.stack.pop();
                result
            }
            ObjectKind::Intrinsic(intr) => (intr.handler)(&self.ctx, &args),
            _ => Object::error(EvalError::UnsupportedNode { pos, kind: "call of non-callable value" }),
        };

        self.calls.memo.insert(fingerprint, MemoEntry { callee, args, result: result.clone() });
        result
    }

    fn run_default_intrinsic(&mut self, callee: &Object, args: &[Object]) {
        let Some(handler) = self.intrinsics.default_intrinsic() else { return };
        let mut observed = Vec::with_capacity(args.len() + 1);
        observed.push(callee.clone());
        observed.extend_from_slice(args);
        let _ = handler(&self.ctx, &observed);
    }

    /// Step 2 of the call mechanism. A `SymbolicPlaceholder` callee with a
    /// `bound_key` (`accessor::access` precomputed it when the receiver's
    /// interface type already had a binding) dispatches to that intrinsic
    /// with the receiver prepended to `args`, ahead of deferred interface
    /// resolution.
    fn try_registered_intrinsic(&mut self, callee: &Object, args: &[Object]) -> Option<Object> {
        let (key, receiver_prefix): (String, Option<Object>) = match callee.kind() {
            ObjectKind::Function(f) => (f.qualified_name.clone(), None),
            ObjectKind::Intrinsic(intr) => (intr.key.clone(), None),
            ObjectKind::SymbolicPlaceholder(ph) => (ph.bound_key.clone()?, ph.receiver.clone()),
            _ => return None,
        };
        let handler = self.intrinsics.get(&key)?;
        if let Some(receiver) = receiver_prefix {
            let mut call_args = Vec::with_capacity(args.len() + 1);
            call_args.push(receiver);
            call_args.extend_from_slice(args);
            Some(handler(&self.ctx, &call_args))
        } else {
            Some(handler(&self.ctx, args))
        }
    }

    /// When the callee is the synthetic placeholder `accessor::access` built
    /// for an unbound interface method, the call can't run anything — it's
    /// deferred until a concrete type is bound for that interface. Returns `None` for any other kind of placeholder, which falls
    /// through to the generic not-callable error.
    fn try_defer_interface_call(&mut self, ph: &Rc<PlaceholderValue>, args: &[Object], pos: Pos) -> Option<Object> {
        let (interface_identity, method) = interface_method_from_reason(ph)?;

        self.interfaces.push_pending(crate::interface::PendingCall {
            interface_identity,
            method,
            receiver: ph.receiver.clone().unwrap_or_else(Object::nil),
            args: args.to_vec(),
            pos,
        });
        Some(Object::placeholder("deferred interface call"))
    }

    /// Redispatches every pending call queued against `interface_identity`
    /// now that a concrete implementation is known. Called
    /// from the assignment logic in `eval/stmt.rs` right after
    /// `InterfaceRegistry::note_assignment` reports a newly-seen
    /// implementation. Tries a registered intrinsic for the concrete type's
    /// method first, then falls back to running the method's actual body;
    /// a call that can't be resolved either way logs
    /// `LogKind::InterfaceBindingMismatch` and is dropped.
    pub(crate) fn drain_and_dispatch_pending(&mut self, interface_identity: &str, concrete_identity: &str) {
        let Some(concrete) = self.interfaces.concrete_type(concrete_identity).cloned() else { return };
        let pending = self.interfaces.drain_pending_for(interface_identity);

        for call in pending {
            let mut call_args = Vec::with_capacity(call.args.len() + 1);
            call_args.push(call.receiver.clone());
            call_args.extend(call.args.iter().cloned());

            let pointer_key = crate::intrinsics::method_key(&concrete.pkg_path, &concrete.name, &call.method, true);
            let value_key = crate::intrinsics::method_key(&concrete.pkg_path, &concrete.name, &call.method, false);

            if let Some(handler) = self.intrinsics.get(&pointer_key).or_else(|| self.intrinsics.get(&value_key)) {
                (handler)(&self.ctx, &call_args);
                continue;
            }

            let ty = Rc::new(concrete.clone());
            let resolved = crate::accessor::resolve_method(
                &ty,
                &call.method,
                Some(call.receiver.clone()),
                &self.resolver,
                &mut self.package_envs,
                &mut self.logger,
                &self.access_dedup,
            );
            match resolved {
                Some(callee) => {
                    self.apply_call(&callee, call.args, call.pos);
                }
                None => {
                    self.logger.warn(LogEvent {
                        severity: Severity::Warn,
                        kind: LogKind::InterfaceBindingMismatch,
                        pos: call.pos,
                        message: format!("no method {} found on newly-bound {concrete_identity} for pending call", call.method).into(),
                    });
                }
            }
        }
    }

    /// Binds receiver/parameters into a fresh child of the function's
    /// defining environment and executes its body.
    fn invoke_function(&mut self, f: &Rc<FunctionValue>, args: &[Object], pos: Pos) -> Object {
        if self.ctx.tick() {
            return Object::error(EvalError::ContextCancelled { pos });
        }

        let Some(body) = &f.decl.body else {
            return Object::placeholder(format!("{} has no body (declaration only)", f.qualified_name));
        };

        let call_env = Env::child_of(&f.env);

        if let (Some(recv_field), Some(receiver)) = (&f.decl.recv, &f.receiver) {
            if let Some(name) = recv_field.names.first() {
                call_env.declare(name.clone(), receiver.clone());
            }
        }

        self.bind_params(&call_env, &f.decl.params, f.decl.variadic, args);

        self.defer_stack.push(Vec::new());
        let previous_function = self.current_function.replace(f.qualified_name.clone());
        let result = self.eval_block(body, call_env);
        self.current_function = previous_function;
        let result = self.unwrap_function_result(result, &f.decl.results, &f.env);
        self.run_deferred_frame(result)
    }

    /// Pops the current call frame's defer list and runs it LIFO, matching
    /// real Go frame-exit order. If the frame's own result was a panic, a
    /// deferred call that invokes `recover()` clears `self.active_panic` and
    /// the frame resolves normally instead of propagating it.
    fn run_deferred_frame(&mut self, result: Object) -> Object {
        let deferred = self.defer_stack.pop().unwrap_or_default();
        let panicking = matches!(result.kind(), ObjectKind::PanicError(_));
        if deferred.is_empty() {
            return result;
        }

        if panicking {
            self.active_panic = Some(result.clone());
        }

        for call in deferred.into_iter().rev() {
            self.apply_call(&call.callee, call.args, call.pos);
        }

        match self.active_panic.take() {
            Some(panic_value) => panic_value,
            None if panicking => Object::placeholder("recovered from panic"),
            None => result,
        }
    }

    fn bind_params(&mut self, env: &Env, params: &[ast::Field], variadic: bool, args: &[Object]) {
        let mut cursor = 0usize;
        for (i, field) in params.iter().enumerate() {
            let is_last = i + 1 == params.len();
            if variadic && is_last {
                let rest = args.get(cursor..).unwrap_or_default().to_vec();
                let slice = Object::new(ObjectKind::Slice(Rc::new(std::cell::RefCell::new(crate::object::SliceValue {
                    elem_type: None,
                    elements: Some(rest),
                }))));
                for name in &field.names {
                    env.declare(name.clone(), slice.clone());
                }
                continue;
            }
            for name in &field.names {
                let value = args.get(cursor).cloned().unwrap_or_else(Object::nil);
                env.declare(name.clone(), value);
                cursor += 1;
            }
            if field.names.is_empty() {
                cursor += 1;
            }
        }
    }

    /// Normalizes whatever the body produced into the call's return value:
    /// an explicit `return` unwraps to its inner value (single or
    /// `MultiReturn`); falling off the end of the body yields a zero-ish
    /// placeholder per declared result, or `Object::nil()` for a
    /// no-results function.
    fn unwrap_function_result(&mut self, executed: Object, results: &[ast::Field], env: &Env) -> Object {
        match executed.kind() {
            ObjectKind::ReturnValue(data) => data.value.clone(),
            ObjectKind::Error(_) | ObjectKind::PanicError(_) => executed,
            _ => self.result_placeholder(env, results, "implicit zero return"),
        }
    }

    /// Builds a placeholder standing in for a call's declared results
    /// without running the body: one typed placeholder per result field,
    /// wrapped in a `MultiReturn` for more than one, `Object::nil()` for
    /// none. Each result's declared type is resolved against `env` so a
    /// caller that selects a field or dispatches a method on the
    /// placeholder still has a type to resolve against; a result whose type
    /// expression can't be resolved (a bare type parameter, for instance)
    /// degrades to an untyped placeholder for that slot only. Shared by the
    /// recursion guard and by a function body falling off its end without
    /// an explicit `return`.
    fn result_placeholder(&mut self, env: &Env, results: &[ast::Field], reason: &str) -> Object {
        match results.len() {
            0 => Object::nil(),
            1 => self.typed_result_placeholder(&results[0], env, reason),
            _ => Object::multi_return(results.iter().map(|field| self.typed_result_placeholder(field, env, reason)).collect()),
        }
    }

    fn typed_result_placeholder(&mut self, field: &ast::Field, env: &Env, reason: &str) -> Object {
        match self.resolve_type_expr(&field.ty, env) {
            Some(ty) => Object::typed_placeholder(reason.to_string(), ty),
            None => Object::placeholder(reason.to_string()),
        }
    }
}
