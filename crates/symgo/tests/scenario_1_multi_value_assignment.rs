//! `x, _ := myFunc()` followed by `observe(x)`: the two-value destructure
//! unwraps a `MultiReturn` and discards the blank target, then the call
//! mechanism passes the surviving value through to a second intrinsic.

mod support;

use goscan::ast::AssignOp;
use support::{Observations, assign, block, call, expr_stmt, field, file, func_decl, ident};
use symgo::logger::NoopLogger;
use symgo::tracer::NoopTracer;
use symgo::{Evaluator, EvaluatorOptions, Object, ObjectKind};

#[test]
fn observe_receives_the_first_return_value() {
    let my_func = func_decl("myFunc", None, Vec::new(), Vec::new(), block(Vec::new()));
    let observe = func_decl("observe", None, vec![field(vec!["v"], ident("any"))], Vec::new(), block(Vec::new()));
    let main = func_decl(
        "main",
        None,
        Vec::new(),
        Vec::new(),
        block(vec![
            assign(vec![ident("x"), ident("_")], AssignOp::Define, vec![call(ident("myFunc"), Vec::new())]),
            expr_stmt(call(ident("observe"), vec![ident("x")])),
        ]),
    );
    let f = file("app", vec![
        goscan::ast::Decl::Func(my_func),
        goscan::ast::Decl::Func(observe),
        goscan::ast::Decl::Func(main),
    ]);

    let observations = Observations::new();
    let observed = observations.clone();

    let mut evaluator = Evaluator::new(
        support::FixtureScanner::new(),
        NoopLogger,
        NoopTracer,
        EvaluatorOptions::new()
            .with_intrinsic("app.myFunc", |_ctx, _args| Object::multi_return(vec![Object::string("hello"), Object::nil()]))
            .with_intrinsic("app.observe", move |_ctx, args| {
                observed.record("observe", args);
                Object::nil()
            }),
    );

    evaluator.eval_file(&f, "app");
    let main_fn = evaluator.find_object("main").expect("main declared");
    let result = evaluator.apply(&main_fn, Vec::new());
    assert!(!result.is_error(), "main should evaluate cleanly: {result:?}");

    let calls = observations.calls("observe");
    assert_eq!(calls.len(), 1);
    assert!(matches!(calls[0][0].kind(), ObjectKind::Str(s) if s.as_ref() == "hello"));
}
