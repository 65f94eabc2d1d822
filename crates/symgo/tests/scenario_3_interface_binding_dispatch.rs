//! Calling a method through an interface-typed value dispatches to whatever
//! concrete type was bound for that interface via `bind_interface`, using the
//! intrinsic-registry key precomputed by the synthetic-method placeholder —
//! no concrete `bytes.Buffer` value ever has to exist.

mod support;

use goscan::types::{Kind, MethodInfo, Signature, TypeInfo};
use support::{Observations, block, call, expr_stmt, field, func_decl, ident, sel};
use symgo::logger::NoopLogger;
use symgo::tracer::NoopTracer;
use symgo::{Evaluator, EvaluatorOptions, Object, ObjectKind};

#[test]
fn bound_concrete_method_intrinsic_fires_through_interface_call() {
    let io_writer = TypeInfo {
        name: "Writer".to_string(),
        pkg_path: "io".to_string(),
        kind: Kind::Interface,
        underlying: None,
        fields: Vec::new(),
        methods: vec![MethodInfo {
            name: "WriteString".to_string(),
            signature: std::rc::Rc::new(Signature { params: Vec::new(), variadic: false, results: Vec::new() }),
            pointer_receiver: true,
        }],
        unresolved: false,
    };

    let bytes_buffer = TypeInfo {
        name: "Buffer".to_string(),
        pkg_path: "bytes".to_string(),
        kind: Kind::Struct,
        underlying: None,
        fields: Vec::new(),
        methods: vec![MethodInfo {
            name: "WriteString".to_string(),
            signature: std::rc::Rc::new(Signature { params: Vec::new(), variadic: false, results: Vec::new() }),
            pointer_receiver: true,
        }],
        unresolved: false,
    };

    let call_fn = func_decl(
        "Call",
        None,
        vec![field(vec!["writer"], ident("any"))],
        Vec::new(),
        block(vec![expr_stmt(call(sel(ident("writer"), "WriteString"), vec![support::str_lit("x")]))]),
    );
    let f = support::file("app", vec![goscan::ast::Decl::Func(call_fn)]);

    let observations = Observations::new();
    let observed = observations.clone();

    let mut evaluator = Evaluator::new(
        support::FixtureScanner::new(),
        NoopLogger,
        NoopTracer,
        EvaluatorOptions::new().with_intrinsic("(*bytes.Buffer).WriteString", move |_ctx, args| {
            observed.record("write_string", args);
            Object::nil()
        }),
    );
    evaluator.bind_interface("io.Writer", bytes_buffer, true);
    evaluator.eval_file(&f, "app");

    let call_decl = evaluator.find_object("Call").expect("Call declared");
    let writer = Object::typed_placeholder("io.Writer parameter", std::rc::Rc::new(io_writer));
    let result = evaluator.apply(&call_decl, vec![writer]);

    assert!(!result.is_error(), "bound interface dispatch should not error: {result:?}");
    let calls = observations.calls("write_string");
    assert_eq!(calls.len(), 1);
    assert!(matches!(calls[0][1].kind(), ObjectKind::Str(s) if s.as_ref() == "x"));
}
