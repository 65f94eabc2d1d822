//! Data shapes produced by a lightweight Go package scanner.
//!
//! `goscan` is deliberately thin: it defines the *shape* of a typed Go AST,
//! package metadata, and type descriptors, plus the [`Scanner`] trait that
//! consumers (primarily the `symgo` crate) program against. It contains no
//! lexer, parser, or filesystem/module-resolution logic — producing these
//! values from real `.go` files is the job of a host tool's own scanner,
//! which is out of scope here.
//!
//! Everything in this crate is plain data: positions, AST nodes, and type
//! descriptors shared via [`std::rc::Rc`] so a single parsed declaration can
//! be referenced from many places (a function's body, a method set entry,
//! an embedded-field chain) without cloning the tree.

pub mod ast;
pub mod package;
pub mod scanner;
pub mod types;

pub use ast::{Expr, File, Node, Stmt};
pub use package::{PackageInfo, VarInfo};
pub use scanner::{ScanError, ScanPolicy, Scanner};
pub use types::{FieldInfo, Kind, MethodInfo, Signature, TypeInfo};

/// A source position, analogous to `go/token.Position`.
///
/// All three fields are best-effort: a synthesized or host-injected AST node
/// (for example one built by a test fixture) may legitimately use zeroes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Pos {
    /// Byte offset from the start of the file.
    pub offset: u32,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub col: u32,
}

impl std::fmt::Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl Pos {
    /// A position carrying no location information.
    pub const NONE: Self = Self { offset: 0, line: 0, col: 0 };
}
