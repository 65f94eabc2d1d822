//! A call through a nil interface-typed value never has a concrete type to
//! dispatch to, but a host that registered an intrinsic directly on the
//! interface's own key still gets to observe the call instead of the
//! evaluator deferring it forever or reporting an unresolved method.

mod support;

use support::{Observations, block, call, expr_stmt, field, func_decl, interface_type, sel, type_decl, var_decl};
use symgo::logger::NoopLogger;
use symgo::tracer::NoopTracer;
use symgo::{Evaluator, EvaluatorOptions, Object};

#[test]
fn nil_interface_method_with_a_registered_intrinsic_fires_without_error() {
    let main_decl = func_decl(
        "main",
        None,
        Vec::new(),
        Vec::new(),
        block(vec![var_decl(vec!["r"], Some(support::ident("Runner")), Vec::new()), expr_stmt(call(sel(support::ident("r"), "Stop"), Vec::new()))]),
    );
    let f = support::file(
        "app",
        vec![type_decl("Runner", interface_type(vec![field(vec!["Stop"], support::ident("func"))])), goscan::ast::Decl::Func(main_decl)],
    );

    let observations = Observations::new();
    let observed = observations.clone();

    let mut evaluator = Evaluator::new(
        support::FixtureScanner::new(),
        NoopLogger,
        NoopTracer,
        EvaluatorOptions::new().with_intrinsic("(app.Runner).Stop", move |_ctx, _args| {
            observed.record("stop", &[]);
            Object::nil()
        }),
    );
    evaluator.eval_file(&f, "app");
    let main_fn = evaluator.find_object("main").expect("main declared");

    let result = evaluator.apply(&main_fn, Vec::new());

    assert!(!result.is_error(), "a nil interface call with a matching intrinsic should not error: {result:?}");
    assert_eq!(observations.count("stop"), 1);
}
