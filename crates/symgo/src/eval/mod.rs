//! The evaluator core: expression and statement semantics.
//!
//! Split one module per syntactic category: expressions vs. statements.

mod expr;
mod stmt;
