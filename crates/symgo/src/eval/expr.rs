//! Expression semantics.

use std::rc::Rc;

use goscan::{Pos, Scanner, ast};

use crate::{
    accessor,
    env::Env,
    error::EvalError,
    evaluator::Evaluator,
    logger::Logger as _,
    object::{BaseObject, FunctionValue, InstanceValue, MapValue, Object, ObjectKind, PointerValue, SliceValue},
    tracer::{TraceEvent, TraceKind},
};

impl<S: Scanner, L: crate::logger::Logger, Tr: crate::tracer::Tracer> Evaluator<S, L, Tr> {
    pub(crate) fn eval_expr(&mut self, expr: &ast::Expr, env: &Env) -> Object {
        self.tracer.on_node(&TraceEvent { pos: expr.pos(), kind: TraceKind::Expr });
        if self.ctx.tick() {
            return Object::error(EvalError::ContextCancelled { pos: expr.pos() });
        }

        match expr {
            ast::Expr::Ident(ident) => self.eval_ident(ident, env),
            ast::Expr::BasicLit(lit) => self.eval_basic_lit(lit),
            ast::Expr::FuncLit(lit) => self.eval_func_lit(lit, env),
            ast::Expr::CompositeLit(lit) => self.eval_composite_lit(lit, env),
            ast::Expr::ParenExpr(inner) => self.eval_expr(inner, env),
            ast::Expr::SelectorExpr(sel) => self.eval_selector(sel, env),
            ast::Expr::IndexExpr(idx) => self.eval_index(idx, env),
            ast::Expr::IndexListExpr(idx) => self.eval_expr(&idx.x, env),
            ast::Expr::SliceExpr(sl) => self.eval_slice_expr(sl, env),
            ast::Expr::TypeAssertExpr(ta) => self.eval_type_assert(ta, env),
            ast::Expr::CallExpr(call) => self.eval_call(call, env),
            ast::Expr::StarExpr(inner) => self.eval_deref(inner, env),
            ast::Expr::UnaryExpr(u) => self.eval_unary(u, env),
            ast::Expr::BinaryExpr(b) => self.eval_binary(b, env),
            ast::Expr::KeyValueExpr(kv) => self.eval_expr(&kv.value, env),
            ast::Expr::Ellipsis(inner) => inner.as_ref().map_or_else(Object::nil, |e| self.eval_expr(e, env)),
            ast::Expr::ArrayType(_)
            | ast::Expr::MapType(_)
            | ast::Expr::ChanType(_)
            | ast::Expr::StructType(_)
            | ast::Expr::InterfaceType(_)
            | ast::Expr::FuncType(_) => Object::placeholder("type expression"),
        }
    }

    fn eval_ident(&mut self, ident: &ast::Ident, env: &Env) -> Object {
        match ident.name.as_str() {
            "nil" => return Object::nil(),
            "true" => return Object::boolean(true),
            "false" => return Object::boolean(false),
            "iota" => {
                if let Some(v) = env.get("iota") {
                    return v;
                }
            }
            _ => {}
        }

        if let Some(value) = env.get(&ident.name) {
            return value;
        }

        if let Some(builtin) = self.builtin_ident(&ident.name) {
            return builtin;
        }

        self.logger.warn(crate::logger::LogEvent {
            severity: crate::logger::Severity::Warn,
            kind: crate::logger::LogKind::IdentifierNotFound { in_func: self.current_function.clone() },
            pos: ident.pos,
            message: format!("undefined: {}", ident.name).into(),
        });
        Object::error(EvalError::UnresolvedIdentifier { pos: ident.pos, name: ident.name.clone() })
    }

    fn builtin_ident(&self, name: &str) -> Option<Object> {
        const BUILTIN_FUNCS: &[&str] =
            &["len", "cap", "append", "make", "new", "panic", "recover", "print", "println", "copy", "delete", "close"];
        if BUILTIN_FUNCS.contains(&name) {
            return Some(Object::placeholder(format!("builtin {name}")));
        }
        None
    }

    fn eval_basic_lit(&self, lit: &ast::BasicLit) -> Object {
        match lit.kind {
            ast::LitKind::Int => lit.value.parse::<i64>().map_or_else(
                |_| parse_int_literal(&lit.value).map_or_else(|| Object::placeholder("malformed int literal"), Object::integer),
                Object::integer,
            ),
            ast::LitKind::Float => {
                lit.value.parse::<f64>().map_or_else(|_| Object::placeholder("malformed float literal"), Object::float)
            }
            ast::LitKind::Imag => Object::placeholder("complex literal"),
            ast::LitKind::Char => lit
                .value
                .trim_matches('\'')
                .chars()
                .next()
                .map_or_else(|| Object::placeholder("malformed rune literal"), |c| Object::integer(i64::from(c as u32))),
            ast::LitKind::String => Object::string(unquote(&lit.value)),
        }
    }

    fn eval_func_lit(&mut self, lit: &Rc<ast::FuncLit>, env: &Env) -> Object {
        let decl = Rc::new(ast::FuncDecl {
            name: "func".to_string(),
            recv: None,
            type_params: lit.ty.type_params.clone(),
            params: lit.ty.params.clone(),
            results: lit.ty.results.clone(),
            variadic: lit.ty.variadic,
            body: Some(lit.body.clone()),
            pos: lit.pos,
        });
        Object::new(ObjectKind::Function(Rc::new(FunctionValue {
            name: "func".to_string(),
            qualified_name: format!("func@{}", lit.pos),
            decl,
            env: env.clone(),
            receiver: None,
            type_params: Vec::new(),
            package_path: String::new(),
        })))
    }

    fn eval_composite_lit(&mut self, lit: &ast::CompositeLit, env: &Env) -> Object {
        let ty = lit.ty.as_ref().and_then(|t| self.resolve_type_expr(t, env));

        match ty.as_ref().map(|t| &t.kind) {
            Some(goscan::types::Kind::Struct) => {
                let ty = ty.unwrap();
                let mut fields = indexmap::IndexMap::new();
                for (i, elt) in lit.elts.iter().enumerate() {
                    match elt {
                        ast::Expr::KeyValueExpr(kv) => {
                            if let ast::Expr::Ident(key) = kv.key.as_ref() {
                                fields.insert(key.name.clone(), self.eval_expr(&kv.value, env));
                            }
                        }
                        other => {
                            if let Some(field) = ty.fields.get(i) {
                                fields.insert(field.name.clone(), self.eval_expr(other, env));
                            }
                        }
                    }
                }
                Object::instance(InstanceValue { ty, fields })
            }
            Some(goscan::types::Kind::Slice(elem)) => {
                let elem = Rc::clone(elem);
                let elements = lit.elts.iter().map(|e| self.eval_expr(e, env)).collect();
                Object::new(ObjectKind::Slice(Rc::new(std::cell::RefCell::new(SliceValue {
                    elem_type: Some(elem),
                    elements: Some(elements),
                }))))
            }
            Some(goscan::types::Kind::Map(key, value)) => {
                let (key, value) = (Rc::clone(key), Rc::clone(value));
                let entries = lit
                    .elts
                    .iter()
                    .filter_map(|e| match e {
                        ast::Expr::KeyValueExpr(kv) => Some((self.eval_expr(&kv.key, env), self.eval_expr(&kv.value, env))),
                        _ => None,
                    })
                    .collect();
                Object::new(ObjectKind::Map(Rc::new(std::cell::RefCell::new(MapValue {
                    key_type: Some(key),
                    value_type: Some(value),
                    entries: Some(entries),
                }))))
            }
            _ => {
                let elements = lit.elts.iter().map(|e| self.eval_expr(e, env)).collect();
                Object::new(ObjectKind::Slice(Rc::new(std::cell::RefCell::new(SliceValue {
                    elem_type: None,
                    elements: Some(elements),
                }))))
            }
        }
    }

    fn eval_selector(&mut self, sel: &ast::SelectorExpr, env: &Env) -> Object {
        let receiver = self.eval_expr(&sel.x, env);
        accessor::access(&receiver, &sel.sel, sel.pos, &self.resolver, &mut self.package_envs, &self.interfaces, &mut self.logger, &self.access_dedup)
    }

    pub(crate) fn eval_index(&mut self, idx: &ast::IndexExpr, env: &Env) -> Object {
        let receiver = self.eval_expr(&idx.x, env).force();
        let _index = self.eval_expr(&idx.index, env);
        match receiver.kind() {
            ObjectKind::Slice(s) => {
                let borrowed = s.borrow();
                match &borrowed.elements {
                    Some(elements) if !elements.is_empty() => elements[0].clone(),
                    _ => borrowed
                        .elem_type
                        .clone()
                        .map_or_else(|| Object::placeholder("slice element"), |t| Object::typed_placeholder("slice element", t)),
                }
            }
            ObjectKind::Map(m) => {
                let borrowed = m.borrow();
                borrowed
                    .value_type
                    .clone()
                    .map_or_else(|| Object::placeholder("map value"), |t| Object::typed_placeholder("map value", t))
            }
            _ => Object::placeholder(format!("index into {} value", receiver.kind().label())),
        }
    }

    fn eval_slice_expr(&mut self, sl: &ast::SliceExpr, env: &Env) -> Object {
        let receiver = self.eval_expr(&sl.x, env).force();
        for bound in [&sl.low, &sl.high, &sl.max].into_iter().flatten() {
            self.eval_expr(bound, env);
        }
        receiver
    }

    fn eval_type_assert(&mut self, ta: &ast::TypeAssertExpr, env: &Env) -> Object {
        let value = self.eval_expr(&ta.x, env);
        let Some(ty_expr) = &ta.ty else {
            return value;
        };
        let Some(ty) = self.resolve_type_expr(ty_expr, env) else {
            return Object::placeholder("type assertion to unresolved type");
        };
        Object::with_base(value.kind().clone(), BaseObject::typed(ty))
    }

    fn eval_deref(&mut self, inner: &ast::Expr, env: &Env) -> Object {
        let value = self.eval_expr(inner, env).force();
        match value.kind() {
            ObjectKind::Pointer(p) => p.target.clone(),
            _ => value,
        }
    }

    pub(crate) fn eval_unary(&mut self, u: &ast::UnaryExpr, env: &Env) -> Object {
        match u.op {
            ast::UnaryOp::Addr => {
                let target = self.eval_expr(&u.x, env);
                Object::new(ObjectKind::Pointer(Rc::new(PointerValue { target })))
            }
            ast::UnaryOp::Deref => self.eval_deref(&u.x, env),
            ast::UnaryOp::Recv => {
                let chan = self.eval_expr(&u.x, env).force();
                match chan.kind() {
                    ObjectKind::Channel(c) => c
                        .elem_type
                        .clone()
                        .map_or_else(|| Object::placeholder("channel receive"), |t| Object::typed_placeholder("channel receive", t)),
                    _ => Object::placeholder("channel receive on non-channel"),
                }
            }
            _ => {
                let value = self.eval_expr(&u.x, env).force();
                match (u.op, value.kind()) {
                    (ast::UnaryOp::Sub, ObjectKind::Integer(i)) => Object::integer(-i),
                    (ast::UnaryOp::Sub, ObjectKind::Float(f)) => Object::float(-f),
                    (ast::UnaryOp::Add, ObjectKind::Integer(_) | ObjectKind::Float(_)) => value,
                    (ast::UnaryOp::Not, ObjectKind::Boolean(b)) => Object::boolean(!b),
                    (ast::UnaryOp::Xor, ObjectKind::Integer(i)) => Object::integer(!i),
                    _ => Object::placeholder("unary operation on symbolic operand"),
                }
            }
        }
    }

    fn eval_binary(&mut self, b: &ast::BinaryExpr, env: &Env) -> Object {
        let lhs = self.eval_expr(&b.x, env).force();
        let rhs = self.eval_expr(&b.y, env).force();
        fold_binary(b.op, &lhs, &rhs, b.pos)
    }

    pub(crate) fn eval_call(&mut self, call: &ast::CallExpr, env: &Env) -> Object {
        if let ast::Expr::Ident(ident) = call.func.as_ref() {
            if env.get(&ident.name).is_none() {
                if let Some(result) = self.eval_builtin_call(&ident.name, &call.args, env) {
                    return result;
                }
            }
        }

        let callee = self.eval_expr(&call.func, env);
        let args: Vec<Object> = call.args.iter().map(|a| self.eval_expr(a, env)).collect();
        self.apply_call(&callee, args, call.pos)
    }

    fn eval_builtin_call(&mut self, name: &str, args: &[ast::Expr], env: &Env) -> Option<Object> {
        let evaluated: Vec<Object> = args.iter().map(|a| self.eval_expr(a, env)).collect();
        match name {
            "len" | "cap" => Some(
                evaluated
                    .first()
                    .and_then(|v| match v.force().kind() {
                        ObjectKind::Slice(s) => s.borrow().elements.as_ref().map(|e| Object::integer(e.len() as i64)),
                        ObjectKind::Str(s) => Some(Object::integer(s.len() as i64)),
                        ObjectKind::Map(m) => m.borrow().entries.as_ref().map(|e| Object::integer(e.len() as i64)),
                        _ => None,
                    })
                    .unwrap_or_else(|| Object::placeholder(format!("builtin {name} result"))),
            ),
            "append" => {
                let mut elements = match evaluated.first().map(Object::force) {
                    Some(first) => match first.kind() {
                        ObjectKind::Slice(s) => s.borrow().elements.clone().unwrap_or_default(),
                        _ => Vec::new(),
                    },
                    None => Vec::new(),
                };
                elements.extend(evaluated.into_iter().skip(1));
                Some(Object::new(ObjectKind::Slice(Rc::new(std::cell::RefCell::new(SliceValue {
                    elem_type: None,
                    elements: Some(elements),
                })))))
            }
            "new" => Some(Object::new(ObjectKind::Pointer(Rc::new(PointerValue { target: Object::nil() })))),
            "make" => Some(Object::placeholder("builtin make result")),
            "panic" => Some(Object::new(ObjectKind::PanicError(Rc::new(crate::object::PanicValue {
                value: evaluated.into_iter().next().unwrap_or_else(Object::nil),
                pos: Pos::NONE,
            })))),
            "recover" => Some(self.active_panic.take().map_or_else(Object::nil, |p| match p.kind() {
                ObjectKind::PanicError(pv) => pv.value.clone(),
                _ => p,
            })),
            "print" | "println" => Some(Object::nil()),
            "copy" => Some(Object::integer(0)),
            "delete" | "close" => Some(Object::nil()),
            _ => None,
        }
    }

    /// Best-effort resolution of a type-position `Expr` to a `TypeInfo`,
    /// used by composite literals and type assertions. Only the shapes an
    /// evaluator actually needs to distinguish are handled; anything else
    /// degrades to `None`, which callers turn into a placeholder.
    pub(crate) fn resolve_type_expr(&mut self, expr: &ast::Expr, env: &Env) -> Option<crate::object::TypeRef> {
        match expr {
            ast::Expr::Ident(ident) => match env.get(&ident.name)?.kind() {
                ObjectKind::Type(ty) => Some(Rc::clone(ty)),
                _ => None,
            },
            ast::Expr::SelectorExpr(sel) => {
                if let ast::Expr::Ident(pkg_ident) = sel.x.as_ref() {
                    let pkg = self.resolver.resolve_package(&pkg_ident.name, &mut self.logger);
                    return pkg.types.get(&sel.sel).cloned();
                }
                None
            }
            ast::Expr::StarExpr(inner) => self.resolve_type_expr(inner, env),
            ast::Expr::ArrayType(arr) => {
                let elem = self.resolve_type_expr(&arr.elt, env)?;
                Some(Rc::new(goscan::TypeInfo::unresolved("", "[]", goscan::types::Kind::Slice(elem))))
            }
            ast::Expr::MapType(m) => {
                let key = self.resolve_type_expr(&m.key, env)?;
                let value = self.resolve_type_expr(&m.value, env)?;
                Some(Rc::new(goscan::TypeInfo::unresolved("", "map", goscan::types::Kind::Map(key, value))))
            }
            ast::Expr::StructType(st) => Some(Rc::new(self.struct_type_from(st, env))),
            ast::Expr::InterfaceType(it) => Some(Rc::new(interface_type_from(it))),
            _ => None,
        }
    }

    /// Builds an unnamed struct `TypeInfo` for a local `type X struct{...}`
    /// declaration or an inline `struct{...}` composite-literal type. Embedded
    /// fields (no name) are promoted under the embedded type's own name, the
    /// same convention `goscan`'s real scanner uses for declared packages.
    fn struct_type_from(&mut self, st: &ast::StructType, env: &Env) -> goscan::TypeInfo {
        let mut fields = Vec::new();
        for field in &st.fields {
            let field_ty = self
                .resolve_type_expr(&field.ty, env)
                .unwrap_or_else(|| Rc::new(goscan::TypeInfo::unresolved("", "", goscan::types::Kind::Unresolved)));
            if field.names.is_empty() {
                fields.push(goscan::types::FieldInfo {
                    name: field_ty.name.clone(),
                    ty: Rc::clone(&field_ty),
                    embedded: true,
                    tag: field.tag.clone(),
                });
            } else {
                for name in &field.names {
                    fields.push(goscan::types::FieldInfo {
                        name: name.clone(),
                        ty: Rc::clone(&field_ty),
                        embedded: false,
                        tag: field.tag.clone(),
                    });
                }
            }
        }
        goscan::TypeInfo {
            name: String::new(),
            pkg_path: String::new(),
            kind: goscan::types::Kind::Struct,
            underlying: None,
            fields,
            methods: Vec::new(),
            unresolved: false,
        }
    }
}

/// An unnamed interface `TypeInfo`, method signatures left empty since a
/// locally-declared interface is only ever used for membership checks
/// (`own_method` presence), never structural signature comparison.
fn interface_type_from(it: &ast::InterfaceType) -> goscan::TypeInfo {
    let methods = it
        .methods
        .iter()
        .filter_map(|m| {
            m.names.first().map(|name| goscan::types::MethodInfo {
                name: name.clone(),
                signature: Rc::new(goscan::types::Signature { params: Vec::new(), variadic: false, results: Vec::new() }),
                pointer_receiver: false,
            })
        })
        .collect();
    goscan::TypeInfo {
        name: String::new(),
        pkg_path: String::new(),
        kind: goscan::types::Kind::Interface,
        underlying: None,
        fields: Vec::new(),
        methods,
        unresolved: false,
    }
}

pub(crate) fn fold_binary(op: ast::BinaryOp, lhs: &Object, rhs: &Object, pos: Pos) -> Object {
    use goscan::ast::BinaryOp as Op;
    match (lhs.kind(), rhs.kind()) {
        (ObjectKind::Integer(a), ObjectKind::Integer(b)) => fold_integer(op, *a, *b, pos),
        (ObjectKind::Float(a), ObjectKind::Float(b)) => fold_float(op, *a, *b, pos),
        (ObjectKind::Str(a), ObjectKind::Str(b)) if op == Op::Add => Object::string(format!("{a}{b}")),
        (ObjectKind::Str(a), ObjectKind::Str(b)) => fold_comparison(op, a == b),
        (ObjectKind::Boolean(a), ObjectKind::Boolean(b)) => match op {
            Op::Land => Object::boolean(*a && *b),
            Op::Lor => Object::boolean(*a || *b),
            Op::Eql => Object::boolean(a == b),
            Op::Neq => Object::boolean(a != b),
            _ => Object::placeholder("boolean operand to non-boolean operator"),
        },
        _ => Object::placeholder("binary operation with symbolic operand"),
    }
}

fn fold_integer(op: goscan::ast::BinaryOp, a: i64, b: i64, pos: Pos) -> Object {
    use goscan::ast::BinaryOp as Op;
    match op {
        Op::Add => Object::integer(a.wrapping_add(b)),
        Op::Sub => Object::integer(a.wrapping_sub(b)),
        Op::Mul => Object::integer(a.wrapping_mul(b)),
        Op::Quo => {
            if b == 0 {
                Object::error(EvalError::TypeMismatch { pos, op: "/".to_string(), lhs: "int".to_string(), rhs: "0".to_string() })
            } else {
                Object::integer(a.wrapping_div(b))
            }
        }
        Op::Rem => {
            if b == 0 {
                Object::error(EvalError::TypeMismatch { pos, op: "%".to_string(), lhs: "int".to_string(), rhs: "0".to_string() })
            } else {
                Object::integer(a.wrapping_rem(b))
            }
        }
        Op::And => Object::integer(a & b),
        Op::Or => Object::integer(a | b),
        Op::Xor => Object::integer(a ^ b),
        Op::AndNot => Object::integer(a & !b),
        Op::Shl => Object::integer(a.wrapping_shl(b as u32)),
        Op::Shr => Object::integer(a.wrapping_shr(b as u32)),
        Op::Eql => Object::boolean(a == b),
        Op::Neq => Object::boolean(a != b),
        Op::Lss => Object::boolean(a < b),
        Op::Leq => Object::boolean(a <= b),
        Op::Gtr => Object::boolean(a > b),
        Op::Geq => Object::boolean(a >= b),
        Op::Land | Op::Lor => Object::placeholder("logical operator on integer operands"),
    }
}

fn fold_float(op: goscan::ast::BinaryOp, a: f64, b: f64, pos: Pos) -> Object {
    use goscan::ast::BinaryOp as Op;
    match op {
        Op::Add => Object::float(a + b),
        Op::Sub => Object::float(a - b),
        Op::Mul => Object::float(a * b),
        Op::Quo => Object::float(a / b),
        Op::Eql => Object::boolean(a == b),
        Op::Neq => Object::boolean(a != b),
        Op::Lss => Object::boolean(a < b),
        Op::Leq => Object::boolean(a <= b),
        Op::Gtr => Object::boolean(a > b),
        Op::Geq => Object::boolean(a >= b),
        _ => Object::error(EvalError::TypeMismatch { pos, op: format!("{op:?}"), lhs: "float64".to_string(), rhs: "float64".to_string() }),
    }
}

fn fold_comparison(op: goscan::ast::BinaryOp, eq: bool) -> Object {
    use goscan::ast::BinaryOp as Op;
    match op {
        Op::Eql => Object::boolean(eq),
        Op::Neq => Object::boolean(!eq),
        _ => Object::placeholder("ordering comparison on strings"),
    }
}

fn unquote(literal: &str) -> String {
    literal.trim_matches(|c| c == '"' || c == '`').to_string()
}

fn parse_int_literal(text: &str) -> Option<i64> {
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();
    if let Some(hex) = cleaned.strip_prefix("0x").or_else(|| cleaned.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok();
    }
    if let Some(oct) = cleaned.strip_prefix("0o").or_else(|| cleaned.strip_prefix("0O")) {
        return i64::from_str_radix(oct, 8).ok();
    }
    if let Some(bin) = cleaned.strip_prefix("0b").or_else(|| cleaned.strip_prefix("0B")) {
        return i64::from_str_radix(bin, 2).ok();
    }
    cleaned.parse::<i64>().ok()
}
