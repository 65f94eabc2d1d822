//! Selecting a field off a slice-typed value has no struct shape to walk,
//! so `accessor::access` degrades straight to a placeholder describing why
//! instead of the caller ever seeing an `Object::Error`.

mod support;

use support::{array_type, assign, block, composite_lit, func_decl, ident, int_lit, ret, sel};
use symgo::logger::NoopLogger;
use symgo::tracer::NoopTracer;
use symgo::{Evaluator, EvaluatorOptions, ObjectKind};

#[test]
fn field_access_on_a_slice_is_a_placeholder_not_an_error() {
    let main_decl = func_decl(
        "main",
        None,
        Vec::new(),
        Vec::new(),
        block(vec![
            assign(vec![ident("s")], goscan::ast::AssignOp::Define, vec![composite_lit(Some(array_type(ident("int"))), vec![int_lit(1), int_lit(2), int_lit(3)])]),
            ret(vec![sel(ident("s"), "foo")]),
        ]),
    );
    let f = support::file("app", vec![goscan::ast::Decl::Func(main_decl)]);

    let mut evaluator = Evaluator::new(support::FixtureScanner::new(), NoopLogger, NoopTracer, EvaluatorOptions::new());
    evaluator.eval_file(&f, "app");
    let main_fn = evaluator.find_object("main").expect("main declared");

    let result = evaluator.apply(&main_fn, Vec::new());

    assert!(!result.is_error(), "field access on a slice should not surface as an error: {result:?}");
    match result.kind() {
        ObjectKind::SymbolicPlaceholder(ph) => {
            let reason = ph.reason.as_deref().unwrap_or_default();
            assert!(reason.contains("invalid selector") && reason.contains("SLICE"), "unexpected placeholder reason: {reason}");
        }
        other => panic!("expected a placeholder standing in for the selector, got {other:?}"),
    }
}
