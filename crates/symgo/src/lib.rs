//! A symbolic execution engine for Go source: it interprets a
//! scanned package's AST to recover call graphs, interface implementations,
//! and reachable API surface, without compiling or running the program.
//!
//! The engine over-approximates on purpose. Where a real Go program picks
//! one branch of an `if`, one case of a `switch`, one iteration of a loop,
//! `symgo` explores all of them so that whole-program analyses (orphan-
//! function detection, interface-implementation discovery, conversion-code
//! generation) see every path a caller *could* take, at the cost of
//! producing values that are placeholders rather than concrete results.
//!
//! [`Evaluator`] is the entry point. It is generic over three host-supplied
//! policies — a [`goscan::Scanner`] for pulling in packages on demand, a
//! [`Logger`] for observability, and a [`Tracer`] for per-node tracing — so
//! a host tool pays for exactly the instrumentation it asks for and nothing
//! more; the no-op implementations ([`logger::NoopLogger`],
//! [`tracer::NoopTracer`]) compile away entirely.

mod accessor;
mod call;
mod context;
mod env;
mod error;
mod eval;
mod evaluator;
mod interface;
mod intrinsics;
pub mod logger;
mod object;
mod options;
mod resolver;
pub mod tracer;

pub use crate::{
    call::{CallMachinery, DeferredCall},
    context::{CancellationHandle, EvalContext},
    env::{Env, PackageEnvironments},
    error::EvalError,
    evaluator::Evaluator,
    interface::{Binding, InterfaceRegistry, PendingCall},
    intrinsics::{IntrinsicRegistry, function_key, method_key},
    logger::{LogEvent, LogKind, Logger, Severity},
    object::{BaseObject, FieldType, FunctionValue, InstanceValue, Object, ObjectKind, TypeRef},
    options::{EvaluatorOptions, ResourceBudget},
    resolver::Resolver,
    tracer::{TraceEvent, TraceKind, Tracer},
};

pub use goscan;
