//! Statement semantics: blocks, declarations, assignment,
//! control flow, and the `defer`/`go`/`panic` trio.
//!
//! Every statement evaluator over-approximates the same way the expression
//! evaluator does: an `if` with a non-concrete condition runs both arms, a
//! `for`/`range` loop unrolls exactly once regardless of how many times it
//! would really run, and every `switch`/`type switch` case body executes.
//! Control-flow results (`break`/`continue`/`fallthrough`/`return`/error/
//! panic) are ordinary `Object`s that bubble up through `eval_block` and
//! `eval_stmt` until something — a loop, a switch, a call frame — consumes
//! them.

use std::{cell::RefCell, rc::Rc};

use goscan::{Scanner, ast};

use crate::{
    env::Env,
    error::EvalError,
    evaluator::Evaluator,
    object::{Object, ObjectKind, TypeRef, VariableValue},
    tracer::{TraceEvent, TraceKind},
};

impl<S: Scanner, L: crate::logger::Logger, Tr: crate::tracer::Tracer> Evaluator<S, L, Tr> {
    /// Runs a function body (or any other already-scoped block) in `env`
    /// directly, without introducing a further child scope — the caller
    /// (`call::invoke_function`, or a nested block handler here) owns
    /// deciding whether a fresh scope is needed.
    pub(crate) fn eval_block(&mut self, block: &ast::BlockStmt, env: Env) -> Object {
        self.eval_stmts(&block.stmts, &env)
    }

    fn eval_stmts(&mut self, stmts: &[ast::Stmt], env: &Env) -> Object {
        for stmt in stmts {
            let result = self.eval_stmt(stmt, env);
            if result.is_control_flow() {
                return result;
            }
        }
        Object::nil()
    }

    pub(crate) fn eval_stmt(&mut self, stmt: &ast::Stmt, env: &Env) -> Object {
        self.tracer.on_node(&TraceEvent { pos: stmt.pos(), kind: TraceKind::Stmt });
        if self.ctx.tick() {
            return Object::error(EvalError::ContextCancelled { pos: stmt.pos() });
        }

        match stmt {
            ast::Stmt::Decl(gd) => {
                self.eval_gen_decl(gd, env);
                Object::nil()
            }
            ast::Stmt::Expr(e) => self.eval_expr(e, env),
            ast::Stmt::Send(s) => self.eval_send(s, env),
            ast::Stmt::IncDec(s) => self.eval_incdec(s, env),
            ast::Stmt::Assign(a) => self.eval_assign_stmt(a, env),
            ast::Stmt::Block(b) => self.eval_block(b, Env::child_of(env)),
            ast::Stmt::If(i) => self.eval_if(i, env),
            ast::Stmt::For(f) => self.eval_for(f, env),
            ast::Stmt::Range(r) => self.eval_range(r, env),
            ast::Stmt::Switch(sw) => self.eval_switch(sw, env),
            ast::Stmt::TypeSwitch(sw) => self.eval_type_switch(sw, env),
            ast::Stmt::Select(sel) => self.eval_select(sel, env),
            ast::Stmt::Return(r) => self.eval_return(r, env),
            ast::Stmt::Branch(b) => self.eval_branch(b),
            ast::Stmt::Labeled(l) => self.eval_stmt(&l.stmt, env),
            ast::Stmt::Defer(d) => self.eval_defer(d, env),
            ast::Stmt::Go(g) => self.eval_go(g, env),
            ast::Stmt::Empty => Object::nil(),
        }
    }

    fn eval_send(&mut self, s: &ast::SendStmt, env: &Env) -> Object {
        let _ = self.eval_expr(&s.chan, env);
        let _ = self.eval_expr(&s.value, env);
        Object::nil()
    }

    fn eval_incdec(&mut self, s: &ast::IncDecStmt, env: &Env) -> Object {
        let current = self.eval_expr(&s.x, env).force();
        let delta: i64 = if s.op == ast::IncDecOp::Inc { 1 } else { -1 };
        let updated = match current.kind() {
            ObjectKind::Integer(i) => Object::integer(i + delta),
            ObjectKind::Float(f) => Object::float(f + delta as f64),
            _ => return Object::nil(),
        };
        self.bind_lvalue(&s.x, env, updated, ast::AssignOp::Assign);
        Object::nil()
    }

    // -----------------------------------------------------------------
    // Assignment
    // -----------------------------------------------------------------

    pub(crate) fn eval_assign_stmt(&mut self, a: &ast::AssignStmt, env: &Env) -> Object {
        if let ast::AssignOp::Compound(op) = a.op {
            let lhs_expr = &a.lhs[0];
            let current = self.eval_expr(lhs_expr, env).force();
            if current.is_error() {
                return current;
            }
            let rhs_val = self.eval_expr(&a.rhs[0], env).force();
            if rhs_val.is_error() {
                return rhs_val;
            }
            let updated = super::expr::fold_binary(op, &current, &rhs_val, a.pos);
            if updated.is_error() {
                return updated;
            }
            self.bind_lvalue(lhs_expr, env, updated, ast::AssignOp::Assign);
            return Object::nil();
        }

        // `v, ok := x.(T)` — the compatibility-check form, distinguished from
        // an ordinary two-target destructure by the RHS shape.
        if a.lhs.len() == 2 && a.rhs.len() == 1 {
            if let ast::Expr::TypeAssertExpr(ta) = &a.rhs[0] {
                if ta.ty.is_some() {
                    return self.eval_two_value_type_assert(a, ta, env);
                }
            }
        }

        if a.lhs.len() > 1 && a.rhs.len() == 1 {
            let result = self.eval_expr(&a.rhs[0], env);
            if result.is_error() {
                return result;
            }
            let values: Vec<Object> = match result.kind() {
                ObjectKind::MultiReturn(values) => values.as_ref().clone(),
                _ => {
                    let mut padded = vec![result.clone()];
                    padded.resize(a.lhs.len(), Object::nil());
                    padded
                }
            };
            for (lhs_expr, value) in a.lhs.iter().zip(values) {
                self.bind_lvalue(lhs_expr, env, value, a.op);
            }
            return Object::nil();
        }

        let values: Vec<Object> = a.rhs.iter().map(|e| self.eval_expr(e, env)).collect();
        for v in &values {
            if v.is_error() {
                return v.clone();
            }
        }
        for (lhs_expr, value) in a.lhs.iter().zip(values) {
            self.bind_lvalue(lhs_expr, env, value, a.op);
        }
        Object::nil()
    }

    /// The two-value type-assertion form. A known concrete operand either
    /// matches (`ok = true`, value retagged to `T`) or doesn't (`ok = false`,
    /// zero value of `T`); a symbolic operand can't be checked, so both the
    /// value and `ok` come back as placeholders rather than picking one side
    ///.
    fn eval_two_value_type_assert(&mut self, a: &ast::AssignStmt, ta: &ast::TypeAssertExpr, env: &Env) -> Object {
        let value = self.eval_expr(&ta.x, env);
        if value.is_error() {
            return value;
        }
        let Some(ty_expr) = ta.ty.as_ref() else {
            return Object::error(EvalError::UnsupportedNode { pos: ta.pos, kind: "type switch guard used outside a switch" });
        };
        let Some(target_ty) = self.resolve_type_expr(ty_expr, env) else {
            self.bind_lvalue(&a.lhs[0], env, Object::placeholder("type assertion to unresolved type"), a.op);
            self.bind_lvalue(&a.lhs[1], env, Object::placeholder("indeterminate type assertion result"), a.op);
            return Object::nil();
        };

        match value.concrete_type() {
            Some(concrete) => {
                let matches = concrete.identity() == target_ty.identity() || self.resolver.implements(concrete.as_ref(), target_ty.as_ref());
                if matches {
                    let retagged = Object::with_base(value.force().kind().clone(), crate::object::BaseObject::typed(Rc::clone(&target_ty)));
                    self.bind_lvalue(&a.lhs[0], env, retagged, a.op);
                    self.bind_lvalue(&a.lhs[1], env, Object::boolean(true), a.op);
                } else {
                    let zero = self.zero_value(&target_ty);
                    self.bind_lvalue(&a.lhs[0], env, zero, a.op);
                    self.bind_lvalue(&a.lhs[1], env, Object::boolean(false), a.op);
                }
            }
            None => {
                self.bind_lvalue(&a.lhs[0], env, Object::typed_placeholder("type assertion result", Rc::clone(&target_ty)), a.op);
                self.bind_lvalue(&a.lhs[1], env, Object::placeholder("indeterminate type assertion result"), a.op);
            }
        }
        Object::nil()
    }

    fn bind_lvalue(&mut self, lhs: &ast::Expr, env: &Env, value: Object, op: ast::AssignOp) {
        match lhs {
            ast::Expr::Ident(ident) => self.bind_ident(ident, env, value, op),
            ast::Expr::SelectorExpr(sel) => {
                let receiver = self.eval_expr(&sel.x, env).force();
                self.assign_field(&receiver, &sel.sel, value);
            }
            // Stateful mutation through an index/pointer target isn't
            // modelled;
            // the receiver is still evaluated for its side effects on the
            // call graph.
            _ => {
                let _ = self.eval_expr(lhs, env);
            }
        }
    }

    fn assign_field(&mut self, receiver: &Object, field: &str, value: Object) {
        match receiver.kind() {
            ObjectKind::Instance(inst) => {
                inst.borrow_mut().fields.insert(field.to_string(), value);
            }
            ObjectKind::Pointer(p) => {
                let target = p.target.force();
                self.assign_field(&target, field, value);
            }
            _ => {}
        }
    }

    fn bind_ident(&mut self, ident: &ast::Ident, env: &Env, value: Object, op: ast::AssignOp) {
        if ident.name == "_" {
            return;
        }
        if matches!(op, ast::AssignOp::Define) {
            env.declare(ident.name.clone(), value);
            return;
        }
        if let Some(existing) = env.get(&ident.name) {
            if let ObjectKind::Variable(cell) = existing.kind() {
                self.update_variable(cell, &value);
                return;
            }
        }
        if !env.assign(&ident.name, value.clone()) {
            env.declare(ident.name.clone(), value);
        }
    }

    /// Reassigns an existing `Variable` binding, growing its `possible_types`
    /// set when it's interface-declared.
    fn update_variable(&mut self, cell: &Rc<RefCell<VariableValue>>, new_value: &Object) {
        let declared_type = cell.borrow().declared_type.clone();
        if let Some(ty) = declared_type.as_ref() {
            if matches!(ty.kind, goscan::types::Kind::Interface) {
                self.note_possible_type(cell, new_value, ty);
            }
        }
        let mut var = cell.borrow_mut();
        var.value = new_value.clone();
        var.fully_evaluated = true;
    }

    /// Records `new_value`'s concrete type against `iface_ty` in both the
    /// variable's own growing set and the shared interface registry, then
    /// redispatches anything that was waiting on this interface
    ///.
    fn note_possible_type(&mut self, cell: &Rc<RefCell<VariableValue>>, new_value: &Object, iface_ty: &TypeRef) {
        let Some(concrete) = new_value.concrete_type() else { return };
        let is_new_implementation = self.interfaces.note_assignment(&self.resolver, iface_ty, &concrete);
        cell.borrow_mut().possible_types.insert(concrete.identity());
        if is_new_implementation {
            self.drain_and_dispatch_pending(&iface_ty.identity(), &concrete.identity());
        }
    }

    /// Wraps `value` in a `Variable` when `declared_ty` is interface-kinded
    /// (so `PossibleTypes` can grow across later assignments); otherwise
    /// declares the plain value directly, since a concrete-typed local has
    /// nothing to accumulate.
    fn declare_var_binding(&mut self, env: &Env, name: &str, value: Object, declared_ty: Option<TypeRef>) {
        if name == "_" {
            return;
        }
        match declared_ty {
            Some(ty) if matches!(ty.kind, goscan::types::Kind::Interface) => {
                let var = VariableValue {
                    name: name.to_string(),
                    value: value.clone(),
                    possible_types: indexmap::IndexSet::new(),
                    declared_type: Some(Rc::clone(&ty)),
                    fully_evaluated: !matches!(value.kind(), ObjectKind::SymbolicPlaceholder(_)),
                };
                let obj = Object::variable(var);
                env.declare(name.to_string(), obj.clone());
                if let ObjectKind::Variable(cell) = obj.kind() {
                    self.note_possible_type(cell, &value, &ty);
                }
            }
            _ => env.declare(name.to_string(), value),
        }
    }

    /// A best-effort zero value for a declared type with no initializer.
    fn zero_value(&self, ty: &TypeRef) -> Object {
        use goscan::types::{BasicKind, Kind};
        match &ty.kind {
            Kind::Basic(BasicKind::String) => Object::string(""),
            Kind::Basic(BasicKind::Bool) => Object::boolean(false),
            Kind::Basic(BasicKind::Float32 | BasicKind::Float64) => Object::float(0.0),
            Kind::Basic(_) => Object::integer(0),
            Kind::Interface | Kind::Pointer(_) | Kind::Slice(_) | Kind::Map(_, _) | Kind::Chan(_) => {
                Object::with_base(ObjectKind::Nil, crate::object::BaseObject::typed(Rc::clone(ty)))
            }
            _ => Object::typed_placeholder("zero value", Rc::clone(ty)),
        }
    }

    // -----------------------------------------------------------------
    // Declarations
    // -----------------------------------------------------------------

    /// `const`/`var`/`type` declarations, at package scope (from
    /// `Evaluator::eval_decl`) or local scope (from a `Stmt::Decl`).
    pub(crate) fn eval_gen_decl(&mut self, gd: &ast::GenDecl, env: &Env) {
        match gd.kind {
            ast::GenDeclKind::Var => self.eval_var_decl(gd, env),
            ast::GenDeclKind::Const => self.eval_const_decl(gd, env),
            ast::GenDeclKind::Type => self.eval_type_decl(gd, env),
        }
    }

    fn eval_var_decl(&mut self, gd: &ast::GenDecl, env: &Env) {
        for spec in &gd.specs {
            let ast::Spec::Value { names, ty, values, .. } = spec else { continue };
            let declared_ty = ty.as_ref().and_then(|t| self.resolve_type_expr(t, env));

            if values.is_empty() {
                for name in names {
                    let value = declared_ty.clone().map_or_else(Object::nil, |t| self.zero_value(&t));
                    self.declare_var_binding(env, name, value, declared_ty.clone());
                }
            } else if values.len() == names.len() {
                for (name, expr) in names.iter().zip(values) {
                    let value = self.eval_expr(expr, env);
                    self.declare_var_binding(env, name, value, declared_ty.clone());
                }
            } else if values.len() == 1 && names.len() > 1 {
                let result = self.eval_expr(&values[0], env);
                let parts: Vec<Object> = match result.kind() {
                    ObjectKind::MultiReturn(vs) => vs.as_ref().clone(),
                    _ => vec![result],
                };
                for (name, value) in names.iter().zip(parts) {
                    self.declare_var_binding(env, name, value, declared_ty.clone());
                }
            }
        }
    }

    /// `const` specs repeat the previous spec's expression list when their
    /// own is empty, and `iota` is bound fresh per spec to its index within
    /// the group.
    fn eval_const_decl(&mut self, gd: &ast::GenDecl, env: &Env) {
        let mut previous: Option<(Option<Box<ast::Expr>>, Vec<ast::Expr>)> = None;

        for (i, spec) in gd.specs.iter().enumerate() {
            let ast::Spec::Value { names, ty, values, .. } = spec else { continue };
            let (eff_ty, eff_values) = if values.is_empty() {
                previous.clone().unwrap_or_else(|| (ty.clone(), values.clone()))
            } else {
                (ty.clone(), values.clone())
            };
            previous = Some((eff_ty.clone(), eff_values.clone()));

            let iota_env = Env::child_of(env);
            iota_env.declare("iota", Object::integer(i as i64));
            let declared_ty = eff_ty.as_ref().and_then(|t| self.resolve_type_expr(t, &iota_env));

            for (idx, name) in names.iter().enumerate() {
                let value = eff_values.get(idx).map_or_else(Object::nil, |expr| self.eval_expr(expr, &iota_env));
                self.declare_var_binding(env, name, value, declared_ty.clone());
            }
        }
    }

    fn eval_type_decl(&mut self, gd: &ast::GenDecl, env: &Env) {
        let pkg_path = self.current_package.clone().unwrap_or_default();
        for spec in &gd.specs {
            let ast::Spec::Type { name, ty, .. } = spec else { continue };
            let resolved = self.resolve_type_expr(ty, env);
            let named = match resolved {
                Some(base) => {
                    let mut info = (*base).clone();
                    info.name = name.clone();
                    if info.pkg_path.is_empty() {
                        info.pkg_path = pkg_path.clone();
                    }
                    Rc::new(info)
                }
                None => Rc::new(goscan::TypeInfo::unresolved(pkg_path.clone(), name.clone(), goscan::types::Kind::Unresolved)),
            };
            env.declare(name.clone(), Object::new(ObjectKind::Type(named)));
        }
    }

    // -----------------------------------------------------------------
    // Control flow
    // -----------------------------------------------------------------

    fn eval_if(&mut self, i: &ast::IfStmt, env: &Env) -> Object {
        let if_env = Env::child_of(env);
        if let Some(init) = &i.init {
            let r = self.eval_stmt(init, &if_env);
            if r.is_control_flow() {
                return r;
            }
        }

        let cond = self.eval_expr(&i.cond, &if_env);
        if cond.is_error() {
            return cond;
        }

        match cond.as_concrete_bool() {
            Some(true) => self.eval_block(&i.body, Env::child_of(&if_env)),
            Some(false) => i.els.as_ref().map_or_else(Object::nil, |els| self.eval_stmt(els, &if_env)),
            None => {
                let then_result = self.eval_block(&i.body, Env::child_of(&if_env));
                let else_result = i.els.as_ref().map_or_else(Object::nil, |els| self.eval_stmt(els, &if_env));
                if then_result.is_control_flow() { then_result } else { else_result }
            }
        }
    }

    fn eval_for(&mut self, f: &ast::ForStmt, env: &Env) -> Object {
        let for_env = Env::child_of(env);
        if let Some(init) = &f.init {
            let r = self.eval_stmt(init, &for_env);
            if r.is_control_flow() {
                return r;
            }
        }
        if let Some(cond) = &f.cond {
            let r = self.eval_expr(cond, &for_env);
            if r.is_error() {
                return r;
            }
        }

        let body_result = self.eval_block(&f.body, Env::child_of(&for_env));
        match body_result.kind() {
            ObjectKind::Break(label) => {
                if label_matches(label, &f.label) {
                    return Object::nil();
                }
                return body_result;
            }
            ObjectKind::Continue(label) => {
                if !label_matches(label, &f.label) {
                    return body_result;
                }
            }
            _ if body_result.is_control_flow() => return body_result,
            _ => {}
        }

        if let Some(post) = &f.post {
            let r = self.eval_stmt(post, &for_env);
            if r.is_control_flow() {
                return r;
            }
        }
        Object::nil()
    }

    fn eval_range(&mut self, r: &ast::RangeStmt, env: &Env) -> Object {
        let range_env = Env::child_of(env);
        let ranged = self.eval_expr(&r.x, &range_env).force();
        if ranged.is_error() {
            return ranged;
        }

        let (key_ty, value_ty) = range_element_types(&ranged);
        let body_env = Env::child_of(&range_env);
        if let Some(key_expr) = &r.key {
            let key_val = key_ty.map_or_else(|| Object::placeholder("range key"), |t| Object::typed_placeholder("range key", t));
            self.bind_range_target(key_expr, &body_env, key_val, r.define);
        }
        if let Some(value_expr) = &r.value {
            let value_val = value_ty.map_or_else(|| Object::placeholder("range value"), |t| Object::typed_placeholder("range value", t));
            self.bind_range_target(value_expr, &body_env, value_val, r.define);
        }

        let body_result = self.eval_block(&r.body, Env::child_of(&body_env));
        match body_result.kind() {
            ObjectKind::Break(label) => {
                if label_matches(label, &r.label) { Object::nil() } else { body_result }
            }
            ObjectKind::Continue(label) => {
                if label_matches(label, &r.label) { Object::nil() } else { body_result }
            }
            _ if body_result.is_control_flow() => body_result,
            _ => Object::nil(),
        }
    }

    fn bind_range_target(&mut self, expr: &ast::Expr, env: &Env, value: Object, define: bool) {
        let ast::Expr::Ident(ident) = expr else { return };
        if ident.name == "_" {
            return;
        }
        if define {
            env.declare(ident.name.clone(), value);
        } else {
            self.bind_ident(ident, env, value, ast::AssignOp::Assign);
        }
    }

    fn eval_switch(&mut self, s: &ast::SwitchStmt, env: &Env) -> Object {
        let switch_env = Env::child_of(env);
        if let Some(init) = &s.init {
            let r = self.eval_stmt(init, &switch_env);
            if r.is_control_flow() {
                return r;
            }
        }
        if let Some(tag) = &s.tag {
            let r = self.eval_expr(tag, &switch_env);
            if r.is_error() {
                return r;
            }
        }

        let mut propagate: Option<Object> = None;
        for case in &s.cases {
            for v in case.values.iter().flatten() {
                let _ = self.eval_expr(v, &switch_env);
            }
            let case_env = Env::child_of(&switch_env);
            let result = self.eval_stmts(&case.body, &case_env);
            match result.kind() {
                ObjectKind::Fallthrough => {}
                ObjectKind::Break(label) => {
                    if !label_matches(label, &s.label) && propagate.is_none() {
                        propagate = Some(result);
                    }
                }
                _ if result.is_control_flow() => {
                    if propagate.is_none() {
                        propagate = Some(result);
                    }
                }
                _ => {}
            }
        }
        propagate.unwrap_or_else(Object::nil)
    }

    fn eval_type_switch(&mut self, s: &ast::TypeSwitchStmt, env: &Env) -> Object {
        let switch_env = Env::child_of(env);
        if let Some(init) = &s.init {
            let r = self.eval_stmt(init, &switch_env);
            if r.is_control_flow() {
                return r;
            }
        }
        let subject = self.eval_expr(&s.x, &switch_env);
        if subject.is_error() {
            return subject;
        }

        let mut propagate: Option<Object> = None;
        for case in &s.cases {
            let case_env = Env::child_of(&switch_env);
            if let Some(bind_name) = &s.bind {
                let rebound = match &case.types {
                    Some(types) if types.len() == 1 => self.resolve_type_expr(&types[0], &case_env).map_or_else(
                        || subject.clone(),
                        |ty| Object::with_base(subject.force().kind().clone(), crate::object::BaseObject::typed(ty)),
                    ),
                    _ => subject.clone(),
                };
                case_env.declare(bind_name.clone(), rebound);
            }
            let result = self.eval_stmts(&case.body, &case_env);
            match result.kind() {
                ObjectKind::Break(label) => {
                    if !label_matches(label, &s.label) && propagate.is_none() {
                        propagate = Some(result);
                    }
                }
                _ if result.is_control_flow() => {
                    if propagate.is_none() {
                        propagate = Some(result);
                    }
                }
                _ => {}
            }
        }
        propagate.unwrap_or_else(Object::nil)
    }

    fn eval_select(&mut self, s: &ast::SelectStmt, env: &Env) -> Object {
        let mut propagate: Option<Object> = None;
        for case in &s.cases {
            let case_env = Env::child_of(env);
            if let Some(comm) = &case.comm {
                let r = self.eval_stmt(comm, &case_env);
                if r.is_control_flow() {
                    if propagate.is_none() {
                        propagate = Some(r);
                    }
                    continue;
                }
            }
            let result = self.eval_stmts(&case.body, &case_env);
            match result.kind() {
                ObjectKind::Break(None) => {}
                _ if result.is_control_flow() && propagate.is_none() => propagate = Some(result),
                _ => {}
            }
        }
        propagate.unwrap_or_else(Object::nil)
    }

    fn eval_return(&mut self, r: &ast::ReturnStmt, env: &Env) -> Object {
        match r.results.len() {
            0 => Object::return_value(Object::nil()),
            1 => {
                let v = self.eval_expr(&r.results[0], env);
                if v.is_error() { v } else { Object::return_value(v) }
            }
            _ => {
                let mut values = Vec::with_capacity(r.results.len());
                for e in &r.results {
                    let v = self.eval_expr(e, env);
                    if v.is_error() {
                        return v;
                    }
                    values.push(v);
                }
                Object::return_value(Object::multi_return(values))
            }
        }
    }

    fn eval_branch(&mut self, b: &ast::BranchStmt) -> Object {
        match b.kind {
            ast::BranchKind::Break => Object::break_sentinel(b.label.clone().map(Rc::from)),
            ast::BranchKind::Continue => Object::continue_sentinel(b.label.clone().map(Rc::from)),
            ast::BranchKind::Fallthrough => Object::fallthrough_sentinel(),
            ast::BranchKind::Goto => Object::error(EvalError::UnsupportedNode { pos: b.pos, kind: "goto statement" }),
        }
    }

    fn eval_defer(&mut self, d: &ast::DeferStmt, env: &Env) -> Object {
        let callee = self.eval_expr(&d.call.func, env);
        let args: Vec<Object> = d.call.args.iter().map(|e| self.eval_expr(e, env)).collect();
        if let Some(frame) = self.defer_stack.last_mut() {
            frame.push(crate::call::DeferredCall { callee, args, pos: d.pos });
        }
        Object::nil()
    }

    fn eval_go(&mut self, g: &ast::GoStmt, env: &Env) -> Object {
        let callee = self.eval_expr(&g.call.func, env);
        let args: Vec<Object> = g.call.args.iter().map(|e| self.eval_expr(e, env)).collect();
        self.apply_call(&callee, args, g.pos);
        Object::nil()
    }
}

fn label_matches(label: &Option<Rc<str>>, loop_label: &Option<String>) -> bool {
    match label {
        None => true,
        Some(l) => loop_label.as_deref() == Some(l.as_ref()),
    }
}

/// Best-effort key/value element types for a `range` target, used to type
/// the placeholders bound for the loop body.
fn range_element_types(ranged: &Object) -> (Option<TypeRef>, Option<TypeRef>) {
    match ranged.kind() {
        ObjectKind::Slice(s) => (Some(Rc::new(goscan::TypeInfo::basic(goscan::types::BasicKind::Int))), s.borrow().elem_type.clone()),
        ObjectKind::Map(m) => {
            let borrowed = m.borrow();
            (borrowed.key_type.clone(), borrowed.value_type.clone())
        }
        ObjectKind::Str(_) => (
            Some(Rc::new(goscan::TypeInfo::basic(goscan::types::BasicKind::Int))),
            Some(Rc::new(goscan::TypeInfo::basic(goscan::types::BasicKind::Int32))),
        ),
        ObjectKind::Channel(c) => (c.elem_type.clone(), None),
        _ => (None, None),
    }
}
