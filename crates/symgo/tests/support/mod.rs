//! Shared scaffolding for the integration suite: a hand-built [`Scanner`], a
//! call-observation sink, a log-observation sink, and small AST-construction
//! helpers so each scenario test can build just the Go shape it needs
//! without a real parser.

#![allow(dead_code)]

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use goscan::{Pos, Scanner, ast};
use symgo::{LogEvent, LogKind, Logger};

/// A `Scanner` backed by packages registered up front. Out-of-policy or
/// never-registered import paths degrade to [`goscan::PackageInfo::unresolved_stub`],
/// matching what a real scanner does for a package the host never indexed.
#[derive(Default)]
pub struct FixtureScanner {
    packages: HashMap<String, Rc<goscan::PackageInfo>>,
}

impl FixtureScanner {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_package(mut self, path: &str, info: goscan::PackageInfo) -> Self {
        self.packages.insert(path.to_string(), Rc::new(info));
        self
    }
}

impl Scanner for FixtureScanner {
    fn resolve_package(&self, import_path: &str) -> Result<Rc<goscan::PackageInfo>, goscan::ScanError> {
        Ok(self.packages.get(import_path).cloned().unwrap_or_else(|| Rc::new(goscan::PackageInfo::unresolved_stub(import_path))))
    }

    fn resolve_type(&self, pkg_path: &str, name: &str) -> Option<Rc<goscan::TypeInfo>> {
        self.packages.get(pkg_path)?.types.get(name).cloned()
    }
}

/// Records every call a registered intrinsic observes, keyed by a
/// caller-chosen label rather than the intrinsic key itself, so a test can
/// share one sink between several distinct handlers.
#[derive(Clone, Default)]
pub struct Observations(Rc<RefCell<Vec<(String, Vec<symgo::Object>)>>>);

impl Observations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, label: impl Into<String>, args: &[symgo::Object]) {
        self.0.borrow_mut().push((label.into(), args.to_vec()));
    }

    #[must_use]
    pub fn calls(&self, label: &str) -> Vec<Vec<symgo::Object>> {
        self.0.borrow().iter().filter(|(l, _)| l == label).map(|(_, args)| args.clone()).collect()
    }

    #[must_use]
    pub fn count(&self, label: &str) -> usize {
        self.calls(label).len()
    }
}

/// A [`Logger`] whose recorded events stay reachable after being moved into
/// an `Evaluator`, via a cloned `Rc` handle kept by the test. `RecordingLogger`
/// itself doesn't support this since `Evaluator` owns its logger by value with
/// no getter back out.
#[derive(Clone, Default, Debug)]
pub struct SharedLogger(Rc<RefCell<Vec<(LogKind, String)>>>);

impl SharedLogger {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn count(&self, kind: &LogKind) -> usize {
        self.0.borrow().iter().filter(|(k, _)| k == kind).count()
    }
}

impl Logger for SharedLogger {
    fn warn(&mut self, event: LogEvent<'_>) {
        self.0.borrow_mut().push((event.kind, event.message.into_owned()));
    }

    fn debug(&mut self, event: LogEvent<'_>) {
        self.0.borrow_mut().push((event.kind, event.message.into_owned()));
    }
}

// ---------------------------------------------------------------------
// AST builders. Every helper produces a `Pos::NONE`-positioned node; the
// integration tests care about shape, not source locations.
// ---------------------------------------------------------------------

pub fn ident(name: &str) -> ast::Expr {
    ast::Expr::Ident(ast::Ident { name: name.to_string(), pos: Pos::NONE })
}

pub fn str_lit(s: &str) -> ast::Expr {
    ast::Expr::BasicLit(ast::BasicLit { kind: ast::LitKind::String, value: format!("\"{s}\""), pos: Pos::NONE })
}

pub fn int_lit(n: i64) -> ast::Expr {
    ast::Expr::BasicLit(ast::BasicLit { kind: ast::LitKind::Int, value: n.to_string(), pos: Pos::NONE })
}

pub fn call(func: ast::Expr, args: Vec<ast::Expr>) -> ast::Expr {
    ast::Expr::CallExpr(ast::CallExpr { func: Box::new(func), args, ellipsis: false, pos: Pos::NONE })
}

pub fn sel(x: ast::Expr, name: &str) -> ast::Expr {
    ast::Expr::SelectorExpr(ast::SelectorExpr { x: Box::new(x), sel: name.to_string(), pos: Pos::NONE })
}

pub fn star(x: ast::Expr) -> ast::Expr {
    ast::Expr::StarExpr(Box::new(x))
}

pub fn addr(x: ast::Expr) -> ast::Expr {
    ast::Expr::UnaryExpr(ast::UnaryExpr { op: ast::UnaryOp::Addr, x: Box::new(x), pos: Pos::NONE })
}

pub fn binary(op: ast::BinaryOp, x: ast::Expr, y: ast::Expr) -> ast::Expr {
    ast::Expr::BinaryExpr(ast::BinaryExpr { op, x: Box::new(x), y: Box::new(y), pos: Pos::NONE })
}

pub fn composite_lit(ty: Option<ast::Expr>, elts: Vec<ast::Expr>) -> ast::Expr {
    ast::Expr::CompositeLit(ast::CompositeLit { ty: ty.map(Box::new), elts, pos: Pos::NONE })
}

pub fn kv(key: ast::Expr, value: ast::Expr) -> ast::Expr {
    ast::Expr::KeyValueExpr(ast::KeyValueExpr { key: Box::new(key), value: Box::new(value), pos: Pos::NONE })
}

pub fn array_type(elt: ast::Expr) -> ast::Expr {
    ast::Expr::ArrayType(ast::ArrayType { len: None, elt: Box::new(elt), pos: Pos::NONE })
}

pub fn struct_type(fields: Vec<ast::Field>) -> ast::Expr {
    ast::Expr::StructType(ast::StructType { fields, pos: Pos::NONE })
}

pub fn interface_type(methods: Vec<ast::Field>) -> ast::Expr {
    ast::Expr::InterfaceType(ast::InterfaceType { methods, pos: Pos::NONE })
}

pub fn field(names: Vec<&str>, ty: ast::Expr) -> ast::Field {
    ast::Field { names: names.into_iter().map(str::to_string).collect(), ty: Box::new(ty), tag: None, pos: Pos::NONE }
}

pub fn block(stmts: Vec<ast::Stmt>) -> ast::BlockStmt {
    ast::BlockStmt { stmts, pos: Pos::NONE }
}

pub fn expr_stmt(e: ast::Expr) -> ast::Stmt {
    ast::Stmt::Expr(Box::new(e))
}

pub fn ret(exprs: Vec<ast::Expr>) -> ast::Stmt {
    ast::Stmt::Return(ast::ReturnStmt { results: exprs, pos: Pos::NONE })
}

pub fn assign(lhs: Vec<ast::Expr>, op: ast::AssignOp, rhs: Vec<ast::Expr>) -> ast::Stmt {
    ast::Stmt::Assign(ast::AssignStmt { lhs, op, rhs, pos: Pos::NONE })
}

pub fn var_decl(names: Vec<&str>, ty: Option<ast::Expr>, values: Vec<ast::Expr>) -> ast::Stmt {
    ast::Stmt::Decl(ast::GenDecl {
        kind: ast::GenDeclKind::Var,
        specs: vec![ast::Spec::Value {
            names: names.into_iter().map(str::to_string).collect(),
            ty: ty.map(Box::new),
            values,
            pos: Pos::NONE,
        }],
        pos: Pos::NONE,
    })
}

pub fn type_decl(name: &str, ty: ast::Expr) -> ast::Decl {
    ast::Decl::Gen(ast::GenDecl {
        kind: ast::GenDeclKind::Type,
        specs: vec![ast::Spec::Type { name: name.to_string(), is_alias: false, ty: Box::new(ty), pos: Pos::NONE }],
        pos: Pos::NONE,
    })
}

pub fn if_stmt(cond: ast::Expr, then: ast::BlockStmt, els: Option<ast::Stmt>) -> ast::Stmt {
    ast::Stmt::If(Box::new(ast::IfStmt { init: None, cond, body: then, els, pos: Pos::NONE }))
}

pub fn for_stmt(init: Option<ast::Stmt>, cond: Option<ast::Expr>, post: Option<ast::Stmt>, body: ast::BlockStmt, label: Option<&str>) -> ast::Stmt {
    ast::Stmt::For(Box::new(ast::ForStmt { init, cond, post, body, label: label.map(str::to_string), pos: Pos::NONE }))
}

pub fn incdec(x: ast::Expr, op: ast::IncDecOp) -> ast::Stmt {
    ast::Stmt::IncDec(ast::IncDecStmt { x: Box::new(x), op, pos: Pos::NONE })
}

pub fn branch(kind: ast::BranchKind, label: Option<&str>) -> ast::Stmt {
    ast::Stmt::Branch(ast::BranchStmt { kind, label: label.map(str::to_string), pos: Pos::NONE })
}

pub fn type_switch(bind: Option<&str>, x: ast::Expr, cases: Vec<ast::TypeCaseClause>, label: Option<&str>) -> ast::Stmt {
    ast::Stmt::TypeSwitch(Box::new(ast::TypeSwitchStmt { init: None, bind: bind.map(str::to_string), x, cases, label: label.map(str::to_string), pos: Pos::NONE }))
}

pub fn type_case(types: Option<Vec<ast::Expr>>, body: Vec<ast::Stmt>) -> ast::TypeCaseClause {
    ast::TypeCaseClause { types, body, pos: Pos::NONE }
}

pub fn func_decl(name: &str, recv: Option<ast::Field>, params: Vec<ast::Field>, results: Vec<ast::Field>, body: ast::BlockStmt) -> Rc<ast::FuncDecl> {
    Rc::new(ast::FuncDecl { name: name.to_string(), recv, type_params: Vec::new(), params, results, variadic: false, body: Some(body), pos: Pos::NONE })
}

pub fn file(package: &str, decls: Vec<ast::Decl>) -> ast::File {
    ast::File { package: package.to_string(), imports: Vec::new(), decls, pos: Pos::NONE }
}
