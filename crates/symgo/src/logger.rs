//! Structured logging for evaluator diagnostics.
//!
//! Same shape as [`crate::tracer::Tracer`]: a trait with no-op defaults so
//! hosts that don't care about logging pay nothing, plus a recording
//! implementation for assertions like "logs exactly one warning per
//! `(type, field)` pair".

use std::borrow::Cow;

use goscan::Pos;

/// The structured reason a log event was emitted, so host tools can branch
/// on `kind` instead of parsing `message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogKind {
    /// Field or method access fell through to a placeholder because the
    /// owning type's package was out of scan policy.
    OutOfPolicyAccess,
    /// A synthetic method `Object` was created for an interface method with
    /// no known implementation, the first time that `(interface, method)`
    /// pair is seen.
    SyntheticMethod,
    /// The identity-based recursion guard short-circuited a call.
    RecursionGuardHit,
    /// An identifier could not be found; `in_func` names the enclosing
    /// function for context.
    IdentifierNotFound { in_func: Option<String> },
    /// A pending interface call could not be re-dispatched because the
    /// bound concrete type's method set didn't structurally match.
    InterfaceBindingMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warn,
    Debug,
}

#[derive(Debug, Clone)]
pub struct LogEvent<'a> {
    pub severity: Severity,
    pub kind: LogKind,
    pub pos: Pos,
    pub message: Cow<'a, str>,
}

/// Trait for the evaluator's structured logger.
pub trait Logger: std::fmt::Debug {
    fn warn(&mut self, _event: LogEvent<'_>) {}
    fn debug(&mut self, _event: LogEvent<'_>) {}
}

/// Zero-cost default: discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {}

/// An owned copy of a [`LogEvent`], for storage in [`RecordingLogger`].
#[derive(Debug, Clone)]
pub struct OwnedLogEvent {
    pub severity: Severity,
    pub kind: LogKind,
    pub pos: Pos,
    pub message: String,
}

impl From<LogEvent<'_>> for OwnedLogEvent {
    fn from(e: LogEvent<'_>) -> Self {
        Self { severity: e.severity, kind: e.kind, pos: e.pos, message: e.message.into_owned() }
    }
}

/// Collects every warn/debug event for test assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingLogger {
    pub events: Vec<OwnedLogEvent>,
}

impl RecordingLogger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn count(&self, kind: &LogKind) -> usize {
        self.events.iter().filter(|e| &e.kind == kind).count()
    }
}

impl Logger for RecordingLogger {
    fn warn(&mut self, event: LogEvent<'_>) {
        self.events.push(event.into());
    }

    fn debug(&mut self, event: LogEvent<'_>) {
        self.events.push(event.into());
    }
}

/// Writes every event to stderr as `LEVEL pos: message`. Useful for manual
/// debugging sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrLogger;

impl Logger for StderrLogger {
    fn warn(&mut self, event: LogEvent<'_>) {
        eprintln!("WARN {}: {}", event.pos, event.message);
    }

    fn debug(&mut self, event: LogEvent<'_>) {
        eprintln!("DEBUG {}: {}", event.pos, event.message);
    }
}
