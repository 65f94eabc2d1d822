//! A `switch v := i.(type) { case Greeter: ... }` case rebinds `v` to the
//! concrete `Greeter` carried by the `any`-typed interface value, and a
//! method call on that rebound `v` resolves through the package's own
//! method table rather than staying a synthetic interface placeholder.

mod support;

use goscan::types::{BasicKind, Kind, MethodInfo, Signature, TypeInfo};
use support::{Observations, block, call, expr_stmt, field, func_decl, ident, sel, type_case, type_switch};
use symgo::logger::NoopLogger;
use symgo::tracer::NoopTracer;
use symgo::{Evaluator, EvaluatorOptions, InstanceValue, Object, ObjectKind};

#[test]
fn type_switch_case_dispatches_to_the_concrete_type_method() {
    let greeter_ty = std::rc::Rc::new(TypeInfo {
        name: "Greeter".to_string(),
        pkg_path: "app".to_string(),
        kind: Kind::Struct,
        underlying: None,
        fields: vec![goscan::types::FieldInfo { name: "Name".to_string(), ty: std::rc::Rc::new(TypeInfo::basic(BasicKind::String)), embedded: false, tag: None }],
        methods: vec![MethodInfo { name: "Greet".to_string(), signature: std::rc::Rc::new(Signature { params: Vec::new(), variadic: false, results: Vec::new() }), pointer_receiver: false }],
        unresolved: false,
    });

    let inspect_decl = func_decl("inspect", None, vec![field(vec!["v"], ident("any"))], Vec::new(), block(Vec::new()));
    let greet_decl = func_decl(
        "Greet",
        Some(field(vec!["g"], ident("Greeter"))),
        Vec::new(),
        Vec::new(),
        block(vec![expr_stmt(call(ident("inspect"), vec![sel(ident("g"), "Name")]))]),
    );

    let mut app_pkg = goscan::PackageInfo::unresolved_stub("app");
    app_pkg.fully_resolved = true;
    app_pkg.types.insert("Greeter".to_string(), std::rc::Rc::clone(&greeter_ty));
    app_pkg.functions.insert("Greeter.Greet".to_string(), greet_decl);

    let inspect_it = func_decl(
        "inspectIt",
        None,
        vec![field(vec!["i"], ident("any"))],
        Vec::new(),
        block(vec![type_switch(
            Some("v"),
            ident("i"),
            vec![type_case(Some(vec![sel(ident("app"), "Greeter")]), vec![expr_stmt(call(sel(ident("v"), "Greet"), Vec::new()))])],
            None,
        )]),
    );
    let f = support::file("app", vec![goscan::ast::Decl::Func(inspect_decl), goscan::ast::Decl::Func(inspect_it)]);

    let observations = Observations::new();
    let observed = observations.clone();

    let mut evaluator = Evaluator::new(
        support::FixtureScanner::new().with_package("app", app_pkg),
        NoopLogger,
        NoopTracer,
        EvaluatorOptions::new().with_intrinsic("app.inspect", move |_ctx, args| {
            if let ObjectKind::Str(s) = args[0].kind() {
                observed.record("inspect", std::slice::from_ref(&args[0]));
                let _ = s;
            }
            Object::nil()
        }),
    );
    evaluator.eval_file(&f, "app");
    let inspect_it_fn = evaluator.find_object("inspectIt").expect("inspectIt declared");

    let mut fields = indexmap::IndexMap::new();
    fields.insert("Name".to_string(), Object::string("World"));
    let greeter_instance = Object::instance(InstanceValue { ty: greeter_ty, fields });

    let result = evaluator.apply(&inspect_it_fn, vec![greeter_instance]);

    assert!(!result.is_error(), "type switch dispatch should not error: {result:?}");
    let calls = observations.calls("inspect");
    assert_eq!(calls.len(), 1);
    assert!(matches!(calls[0][0].kind(), ObjectKind::Str(s) if s.as_ref() == "World"));
}
