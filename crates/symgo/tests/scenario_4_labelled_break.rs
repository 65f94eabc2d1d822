//! `break Outer` from a doubly-nested `for` propagates as a labelled
//! `Break` object through the inner loop (whose own label doesn't match)
//! until it reaches the loop that declared `Outer`, which absorbs it and
//! lets the statement after the loop run.

mod support;

use goscan::ast::{AssignOp, BinaryOp, BranchKind, IncDecOp};
use support::{Observations, assign, binary, block, branch, call, expr_stmt, for_stmt, func_decl, ident, if_stmt, incdec, int_lit};
use symgo::logger::NoopLogger;
use symgo::tracer::NoopTracer;
use symgo::{Evaluator, EvaluatorOptions, Object};

#[test]
fn labelled_break_unwinds_to_the_labelled_loop_only() {
    let inner_for = for_stmt(
        Some(assign(vec![ident("j")], AssignOp::Define, vec![int_lit(0)])),
        Some(binary(BinaryOp::Lss, ident("j"), int_lit(1))),
        Some(incdec(ident("j"), IncDecOp::Inc)),
        block(vec![
            expr_stmt(call(ident("trace"), vec![support::str_lit("inner_loop")])),
            if_stmt(
                binary(BinaryOp::Land, binary(BinaryOp::Eql, ident("i"), int_lit(0)), binary(BinaryOp::Eql, ident("j"), int_lit(0))),
                block(vec![branch(BranchKind::Break, Some("Outer"))]),
                None,
            ),
        ]),
        None,
    );

    let outer_for = for_stmt(
        Some(assign(vec![ident("i")], AssignOp::Define, vec![int_lit(0)])),
        Some(binary(BinaryOp::Lss, ident("i"), int_lit(1))),
        Some(incdec(ident("i"), IncDecOp::Inc)),
        block(vec![expr_stmt(call(ident("trace"), vec![support::str_lit("outer_loop")])), inner_for]),
        Some("Outer"),
    );

    let trace_decl = func_decl("trace", None, vec![support::field(vec!["label"], ident("any"))], Vec::new(), block(Vec::new()));
    let main_decl = func_decl(
        "main",
        None,
        Vec::new(),
        Vec::new(),
        block(vec![outer_for, expr_stmt(call(ident("trace"), vec![support::str_lit("after_outer_loop")]))]),
    );
    let f = support::file("app", vec![goscan::ast::Decl::Func(trace_decl), goscan::ast::Decl::Func(main_decl)]);

    let observations = Observations::new();
    let observed = observations.clone();

    let mut evaluator = Evaluator::new(
        support::FixtureScanner::new(),
        NoopLogger,
        NoopTracer,
        EvaluatorOptions::new().with_intrinsic("app.trace", move |_ctx, args| {
            if let symgo::ObjectKind::Str(s) = args[0].kind() {
                observed.record(s.to_string(), &[]);
            }
            Object::nil()
        }),
    );
    evaluator.eval_file(&f, "app");
    let main_fn = evaluator.find_object("main").expect("main declared");
    let result = evaluator.apply(&main_fn, Vec::new());

    assert!(!result.is_error(), "labelled break should resolve cleanly: {result:?}");
    assert_eq!(observations.count("outer_loop"), 1);
    assert_eq!(observations.count("inner_loop"), 1);
    assert_eq!(observations.count("after_outer_loop"), 1);
}
