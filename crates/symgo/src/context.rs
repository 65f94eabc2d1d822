//! Cooperative cancellation and step budgeting threaded through every
//! evaluator entry point.
//!
//! `EvalContext` is cheap to clone — it wraps shared handles, not owned
//! state — so it can be passed by value into every recursive `eval`/`apply`
//! call.

use std::{
    cell::Cell,
    rc::Rc,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

/// Shared cancellation + step-budget state for one root `Eval`/`Apply` call.
///
/// Cloning an `EvalContext` shares the same underlying counters; there is
/// exactly one logical context per analysis run, even though many frames
/// each hold a clone of it.
///
/// The cancellation flag is an `Arc<AtomicBool>` rather than `Rc` even
/// though `EvalContext` itself is single-threaded: it's the one piece of
/// this struct a host needs to reach from a watchdog thread (via
/// [`EvalContext::cancellation_handle`]), and an `Arc`'s refcount is safe to
/// touch concurrently where an `Rc`'s is not.
#[derive(Debug, Clone)]
pub struct EvalContext {
    cancelled: Arc<AtomicBool>,
    steps: Rc<Cell<u64>>,
    max_steps: Option<u64>,
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}

impl EvalContext {
    /// A context with no cancellation source and no step budget — suitable
    /// for tests and for hosts that enforce limits externally.
    #[must_use]
    pub fn new() -> Self {
        Self { cancelled: Arc::new(AtomicBool::new(false)), steps: Rc::new(Cell::new(0)), max_steps: None }
    }

    /// A context bounded to at most `max_steps` evaluated AST nodes. Exceeding
    /// the budget is reported the same way as cancellation: the evaluator
    /// returns an error immediately rather than continuing to walk the tree.
    #[must_use]
    pub fn with_step_budget(max_steps: u64) -> Self {
        let mut ctx = Self::new();
        ctx.max_steps = Some(max_steps);
        ctx
    }

    /// Returns a handle that a host can flip from another thread (e.g. a
    /// timeout watchdog) to cancel an in-flight evaluation.
    #[must_use]
    pub fn cancellation_handle(&self) -> CancellationHandle {
        CancellationHandle(Arc::clone(&self.cancelled))
    }

    /// Checked once per evaluated AST node. Returns `true` once either cancellation or the step budget
    /// has been tripped.
    pub fn tick(&self) -> bool {
        if self.cancelled.load(Ordering::Relaxed) {
            return true;
        }
        let Some(max) = self.max_steps else {
            return false;
        };
        let next = self.steps.get() + 1;
        self.steps.set(next);
        next > max
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// A cloneable, thread-safe switch to cancel an [`EvalContext`]. Kept
/// separate from `EvalContext` itself because `EvalContext` is `!Send`
/// (its step counter is a plain `Rc<Cell<_>>`, local to the evaluator's
/// thread) while the handle must be `Send` to live on a watchdog thread.
#[derive(Debug, Clone)]
pub struct CancellationHandle(Arc<AtomicBool>);

impl CancellationHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::EvalContext;

    #[test]
    fn step_budget_trips_after_limit() {
        let ctx = EvalContext::with_step_budget(3);
        assert!(!ctx.tick());
        assert!(!ctx.tick());
        assert!(!ctx.tick());
        assert!(ctx.tick());
    }

    #[test]
    fn cancellation_handle_is_observed() {
        let ctx = EvalContext::new();
        let handle = ctx.cancellation_handle();
        assert!(!ctx.tick());
        handle.cancel();
        assert!(ctx.tick());
    }
}
