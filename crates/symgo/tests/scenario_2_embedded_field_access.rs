//! `resp.Body` on a `*TestResponse` whose `Body` field is only reachable
//! through an embedded `base.Response`: field promotion must walk into the
//! embedded type without the caller writing anything struct-shape-aware.

mod support;

use goscan::types::{FieldInfo, Kind, TypeInfo};
use support::{block, field, func_decl, ident, ret, sel, star};
use symgo::logger::NoopLogger;
use symgo::tracer::NoopTracer;
use symgo::{Evaluator, EvaluatorOptions, InstanceValue, Object};

#[test]
fn field_promotion_reaches_through_an_embedded_struct() {
    let io_reader = TypeInfo { name: "Reader".to_string(), pkg_path: "io".to_string(), kind: Kind::Interface, underlying: None, fields: Vec::new(), methods: Vec::new(), unresolved: false };
    let io_reader_ref = std::rc::Rc::new(io_reader);

    let base_response = TypeInfo {
        name: "Response".to_string(),
        pkg_path: "base".to_string(),
        kind: Kind::Struct,
        underlying: None,
        fields: vec![FieldInfo { name: "Body".to_string(), ty: std::rc::Rc::clone(&io_reader_ref), embedded: false, tag: None }],
        methods: Vec::new(),
        unresolved: false,
    };
    let base_response_ref = std::rc::Rc::new(base_response);

    let test_response = TypeInfo {
        name: "TestResponse".to_string(),
        pkg_path: "app".to_string(),
        kind: Kind::Struct,
        underlying: None,
        fields: vec![FieldInfo { name: "Response".to_string(), ty: base_response_ref, embedded: true, tag: None }],
        methods: Vec::new(),
        unresolved: false,
    };
    let test_response_ref = std::rc::Rc::new(test_response);

    let get_body = func_decl(
        "GetBody",
        None,
        vec![field(vec!["resp"], star(ident("TestResponse")))],
        vec![field(Vec::new(), ident("Reader"))],
        block(vec![ret(vec![sel(ident("resp"), "Body")])]),
    );
    let f = support::file("app", vec![goscan::ast::Decl::Func(get_body)]);

    let mut evaluator = Evaluator::new(support::FixtureScanner::new(), NoopLogger, NoopTracer, EvaluatorOptions::new());
    evaluator.eval_file(&f, "app");
    let get_body_fn = evaluator.find_object("GetBody").expect("GetBody declared");

    let receiver = Object::pointer(Object::instance(InstanceValue { ty: test_response_ref, fields: indexmap::IndexMap::new() }));
    let result = evaluator.apply(&get_body_fn, vec![receiver]);

    assert!(!result.is_error(), "promoted field access should not error: {result:?}");
    let resolved = result.base().resolved_type.as_ref().expect("promoted field carries the embedded field's type");
    assert_eq!(resolved.identity(), "io.Reader");
}
