//! loxi-sem - Static resolution pass.
//!
//! Walks the AST once between parsing and evaluation and computes, for
//! every variable reference bound in an enclosing non-global scope, the
//! number of scopes between the reference and its definition. The
//! evaluator reads locals by that distance; names with no recorded
//! distance are globals.
//!
//! The same pass enforces the contextual rules that cannot be checked by
//! the grammar: duplicate locals, reading a local in its own initializer,
//! `return`/`this`/`super` outside their legal contexts, and a class
//! inheriting from itself. Errors go to the diagnostic handler; resolution
//! continues so one run reports everything.

use loxi_par::{ClassStmt, Expr, FunctionDecl, Stmt};
use loxi_util::{sym, Handler, NodeId, Span, Symbol};
use rustc_hash::FxHashMap;

/// The resolver's output: lexical distance per expression node.
///
/// A node id maps to the number of parent frames between the use and the
/// frame holding the binding. Nodes without an entry resolve in the global
/// frame at evaluation time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    depths: FxHashMap<NodeId, usize>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the distance for a node.
    pub fn insert(&mut self, id: NodeId, depth: usize) {
        self.depths.insert(id, depth);
    }

    /// The recorded distance for a node, if it resolved to a local.
    pub fn depth(&self, id: NodeId) -> Option<usize> {
        self.depths.get(&id).copied()
    }

    /// Merges another table into this one (REPL sessions accumulate one
    /// table across inputs; node ids never collide).
    pub fn extend(&mut self, other: Bindings) {
        self.depths.extend(other.depths);
    }

    pub fn len(&self) -> usize {
        self.depths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }
}

/// What kind of function body is being resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FunctionKind {
    None,
    Function,
    Method,
    Initializer,
}

/// What kind of class body is being resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ClassKind {
    None,
    Class,
    Subclass,
}

/// The resolver.
pub struct Resolver<'a> {
    /// Lexical scope stack; each map tracks name -> "fully defined".
    /// The global scope is deliberately not represented.
    scopes: Vec<FxHashMap<Symbol, bool>>,

    /// Context for `return` checking.
    current_function: FunctionKind,

    /// Context for `this`/`super` checking.
    current_class: ClassKind,

    /// Accumulated output.
    bindings: Bindings,

    /// Error sink.
    handler: &'a Handler,
}

impl<'a> Resolver<'a> {
    pub fn new(handler: &'a Handler) -> Self {
        Self {
            scopes: Vec::new(),
            current_function: FunctionKind::None,
            current_class: ClassKind::None,
            bindings: Bindings::new(),
            handler,
        }
    }

    /// Resolves a program, consuming the resolver and returning the
    /// distance table.
    pub fn resolve(mut self, statements: &[Stmt]) -> Bindings {
        self.resolve_stmts(statements);
        self.bindings
    }

    fn resolve_stmts(&mut self, statements: &[Stmt]) {
        for statement in statements {
            self.resolve_stmt(statement);
        }
    }

    fn resolve_stmt(&mut self, statement: &Stmt) {
        match statement {
            Stmt::Block(block) => {
                self.begin_scope();
                self.resolve_stmts(&block.statements);
                self.end_scope();
            }
            Stmt::Var(var) => {
                self.declare(var.name, var.span);
                if let Some(initializer) = &var.initializer {
                    self.resolve_expr(initializer);
                }
                self.define(var.name);
            }
            Stmt::Function(decl) => {
                // The name is defined before the body resolves so the
                // function can call itself recursively.
                self.declare(decl.name, decl.span);
                self.define(decl.name);
                self.resolve_function(decl, FunctionKind::Function);
            }
            Stmt::Expr(stmt) => self.resolve_expr(&stmt.expr),
            Stmt::Print(stmt) => self.resolve_expr(&stmt.expr),
            Stmt::If(stmt) => {
                self.resolve_expr(&stmt.condition);
                self.resolve_stmt(&stmt.then_branch);
                if let Some(else_branch) = &stmt.else_branch {
                    self.resolve_stmt(else_branch);
                }
            }
            Stmt::While(stmt) => {
                self.resolve_expr(&stmt.condition);
                self.resolve_stmt(&stmt.body);
            }
            Stmt::Return(stmt) => {
                if self.current_function == FunctionKind::None {
                    self.error_at_keyword("return", "Can't return from top-level code.", stmt.span);
                }
                if let Some(value) = &stmt.value {
                    if self.current_function == FunctionKind::Initializer {
                        self.error_at_keyword(
                            "return",
                            "Can't return a value from an initializer.",
                            stmt.span,
                        );
                    }
                    self.resolve_expr(value);
                }
            }
            Stmt::Class(class) => self.resolve_class(class),
        }
    }

    fn resolve_class(&mut self, class: &ClassStmt) {
        let enclosing = self.current_class;
        self.current_class = ClassKind::Class;

        self.declare(class.name, class.span);
        self.define(class.name);

        if let Some(superclass) = &class.superclass {
            if superclass.name == class.name {
                self.error_at_name(superclass.name, "A class can't inherit from itself.", superclass.span);
            }
            self.current_class = ClassKind::Subclass;
            self.resolve_expr_variable(superclass.id, superclass.name, superclass.span);

            // The scope holding `super`, shared by every method closure.
            self.begin_scope();
            self.define(*sym::SUPER);
        }

        // The scope holding `this`.
        self.begin_scope();
        self.define(*sym::THIS);

        for method in &class.methods {
            let kind = if method.name == *sym::INIT {
                FunctionKind::Initializer
            } else {
                FunctionKind::Method
            };
            self.resolve_function(method, kind);
        }

        self.end_scope();
        if class.superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing;
    }

    fn resolve_function(&mut self, decl: &FunctionDecl, kind: FunctionKind) {
        let enclosing = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        for param in &decl.params {
            self.declare(param.name, param.span);
            self.define(param.name);
        }
        self.resolve_stmts(&decl.body);
        self.end_scope();

        self.current_function = enclosing;
    }

    fn resolve_expr(&mut self, expression: &Expr) {
        match expression {
            Expr::Literal(_) => {}
            Expr::Variable(var) => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&var.name) == Some(&false) {
                        self.error_at_name(
                            var.name,
                            "Can't read local variable in its own initializer.",
                            var.span,
                        );
                    }
                }
                self.resolve_local(var.id, var.name);
            }
            Expr::Assign(assign) => {
                self.resolve_expr(&assign.value);
                self.resolve_local(assign.id, assign.name);
            }
            Expr::Unary(unary) => self.resolve_expr(&unary.operand),
            Expr::Binary(binary) => {
                self.resolve_expr(&binary.left);
                self.resolve_expr(&binary.right);
            }
            Expr::Logical(logical) => {
                self.resolve_expr(&logical.left);
                self.resolve_expr(&logical.right);
            }
            Expr::Grouping(grouping) => self.resolve_expr(&grouping.inner),
            Expr::Call(call) => {
                self.resolve_expr(&call.callee);
                for arg in &call.args {
                    self.resolve_expr(arg);
                }
            }
            Expr::Get(get) => self.resolve_expr(&get.object),
            Expr::Set(set) => {
                self.resolve_expr(&set.value);
                self.resolve_expr(&set.object);
            }
            Expr::This(this) => {
                if self.current_class == ClassKind::None {
                    self.error_at_keyword("this", "Can't use 'this' outside of a class.", this.span);
                    return;
                }
                self.resolve_local(this.id, *sym::THIS);
            }
            Expr::Super(sup) => match self.current_class {
                ClassKind::None => {
                    self.error_at_keyword("super", "Can't use 'super' outside of a class.", sup.span);
                }
                ClassKind::Class => {
                    self.error_at_keyword(
                        "super",
                        "Can't use 'super' in a class with no superclass.",
                        sup.span,
                    );
                }
                ClassKind::Subclass => self.resolve_local(sup.id, *sym::SUPER),
            },
        }
    }

    /// Resolves a variable reference that is not wrapped in an `Expr`
    /// (the superclass name on a class declaration).
    fn resolve_expr_variable(&mut self, id: NodeId, name: Symbol, span: Span) {
        if let Some(scope) = self.scopes.last() {
            if scope.get(&name) == Some(&false) {
                self.error_at_name(
                    name,
                    "Can't read local variable in its own initializer.",
                    span,
                );
            }
        }
        self.resolve_local(id, name);
    }

    // =========================================================================
    // Scope bookkeeping
    // =========================================================================

    fn begin_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    /// Inserts a name as declared-but-not-defined in the innermost scope.
    /// Redeclaring a name in the same non-global scope is an error.
    fn declare(&mut self, name: Symbol, span: Span) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };
        if scope.contains_key(&name) {
            self.handler.error_at(
                format!("'{}'", name),
                "Already a variable with this name in this scope.",
                span,
            );
            return;
        }
        scope.insert(name, false);
    }

    /// Marks a name as fully defined in the innermost scope.
    fn define(&mut self, name: Symbol) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, true);
        }
    }

    /// Walks scopes innermost-out; the first scope containing `name`
    /// fixes the distance for this node. No hit means the name is a
    /// global read and gets no entry.
    fn resolve_local(&mut self, id: NodeId, name: Symbol) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name) {
                self.bindings.insert(id, depth);
                return;
            }
        }
    }

    fn error_at_name(&self, name: Symbol, message: &str, span: Span) {
        self.handler
            .error_at(format!("'{}'", name), message, span);
    }

    fn error_at_keyword(&self, keyword: &str, message: &str, span: Span) {
        self.handler
            .error_at(format!("'{}'", keyword), message, span);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loxi_lex::tokenize;
    use loxi_par::{Ast, Parser};
    use loxi_util::NodeIdGenerator;

    fn parse(source: &str) -> (Ast, Handler) {
        let handler = Handler::new();
        let ids = NodeIdGenerator::new();
        let tokens = tokenize(source, &handler);
        let mut parser = Parser::new(tokens, &handler, &ids);
        let ast = parser.parse();
        assert!(!handler.has_errors(), "parse errors in test source");
        (ast, handler)
    }

    fn resolve_ok(source: &str) -> (Ast, Bindings) {
        let (ast, handler) = parse(source);
        let bindings = Resolver::new(&handler).resolve(&ast);
        assert!(
            !handler.has_errors(),
            "unexpected resolve errors: {:?}",
            handler
                .take_diagnostics()
                .iter()
                .map(|d| d.render())
                .collect::<Vec<_>>()
        );
        (ast, bindings)
    }

    fn resolve_err(source: &str) -> Vec<String> {
        let (ast, handler) = parse(source);
        let _ = Resolver::new(&handler).resolve(&ast);
        assert!(handler.has_errors(), "expected resolve errors");
        handler
            .take_diagnostics()
            .iter()
            .map(|d| d.render())
            .collect()
    }

    /// Digs the expression out of a print statement.
    fn print_expr(stmt: &Stmt) -> &Expr {
        match stmt {
            Stmt::Print(print) => &print.expr,
            other => panic!("expected print statement, got {:?}", other),
        }
    }

    #[test]
    fn globals_get_no_entry() {
        let (ast, bindings) = resolve_ok("var a = 1; print a;");
        let expr = print_expr(&ast[1]);
        assert_eq!(bindings.depth(expr.id()), None);
        assert!(bindings.is_empty());
    }

    #[test]
    fn block_local_resolves_at_depth_zero() {
        let (ast, bindings) = resolve_ok("var a = 1; { var a = 2; print a; }");
        let Stmt::Block(block) = &ast[1] else { panic!() };
        let expr = print_expr(&block.statements[1]);
        assert_eq!(bindings.depth(expr.id()), Some(0));
    }

    #[test]
    fn closure_captures_across_function_scope() {
        let source = "\
fun makeCounter() {
  var i = 0;
  fun count() {
    i = i + 1;
    return i;
  }
  return count;
}";
        let (ast, bindings) = resolve_ok(source);
        let Stmt::Function(outer) = &ast[0] else { panic!() };
        let Stmt::Function(inner) = &outer.body[1] else {
            panic!()
        };
        // `i = i + 1;` — the assignment and both reads sit one function
        // scope below the declaration of `i`.
        let Stmt::Expr(assign_stmt) = &inner.body[0] else {
            panic!()
        };
        let Expr::Assign(assign) = &assign_stmt.expr else {
            panic!()
        };
        assert_eq!(bindings.depth(assign.id), Some(1));
        let Expr::Binary(sum) = assign.value.as_ref() else {
            panic!()
        };
        assert_eq!(bindings.depth(sum.left.id()), Some(1));
    }

    #[test]
    fn parameters_resolve_at_depth_zero() {
        let (ast, bindings) = resolve_ok("fun id(x) { return x; }");
        let Stmt::Function(decl) = &ast[0] else { panic!() };
        let Stmt::Return(ret) = &decl.body[0] else { panic!() };
        let value = ret.value.as_ref().unwrap();
        assert_eq!(bindings.depth(value.id()), Some(0));
    }

    #[test]
    fn this_resolves_one_scope_above_method_body() {
        let (ast, bindings) = resolve_ok("class A { m() { return this; } }");
        let Stmt::Class(class) = &ast[0] else { panic!() };
        let Stmt::Return(ret) = &class.methods[0].body[0] else {
            panic!()
        };
        let this_expr = ret.value.as_ref().unwrap();
        assert_eq!(bindings.depth(this_expr.id()), Some(1));
    }

    #[test]
    fn super_resolves_above_this_scope() {
        let source = "\
class A { m() {} }
class B < A {
  m() { return super.m; }
}";
        let (ast, bindings) = resolve_ok(source);
        let Stmt::Class(class) = &ast[1] else { panic!() };
        let Stmt::Return(ret) = &class.methods[0].body[0] else {
            panic!()
        };
        let super_expr = ret.value.as_ref().unwrap();
        // method body -> this scope -> super scope
        assert_eq!(bindings.depth(super_expr.id()), Some(2));
    }

    #[test]
    fn resolution_is_idempotent() {
        let source = "\
var a = 1;
{
  var a = 2;
  fun f(x) { return a + x; }
  print f(a);
}";
        let (ast, handler) = parse(source);
        let first = Resolver::new(&handler).resolve(&ast);
        let second = Resolver::new(&handler).resolve(&ast);
        assert!(!handler.has_errors());
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn duplicate_local_is_an_error() {
        let errors = resolve_err("{ var a = 1; var a = 2; }");
        assert!(errors
            .iter()
            .any(|m| m.contains("Already a variable with this name in this scope.")));
    }

    #[test]
    fn global_redeclaration_is_allowed() {
        let (_, bindings) = resolve_ok("var a = 1; var a = 2;");
        assert!(bindings.is_empty());
    }

    #[test]
    fn reading_local_in_its_own_initializer_is_an_error() {
        let errors = resolve_err("var a = 1; { var a = a; }");
        assert!(errors
            .iter()
            .any(|m| m.contains("Can't read local variable in its own initializer.")));
    }

    #[test]
    fn return_at_top_level_is_an_error() {
        let errors = resolve_err("return 1;");
        assert!(errors
            .iter()
            .any(|m| m.contains("Can't return from top-level code.")));
    }

    #[test]
    fn returning_a_value_from_init_is_an_error() {
        let errors = resolve_err("class A { init() { return 1; } }");
        assert!(errors
            .iter()
            .any(|m| m.contains("Can't return a value from an initializer.")));
    }

    #[test]
    fn bare_return_in_init_is_allowed() {
        resolve_ok("class A { init() { return; } }");
    }

    #[test]
    fn this_outside_a_class_is_an_error() {
        let errors = resolve_err("print this;");
        assert!(errors
            .iter()
            .any(|m| m.contains("Can't use 'this' outside of a class.")));

        let errors = resolve_err("fun f() { return this; }");
        assert!(errors
            .iter()
            .any(|m| m.contains("Can't use 'this' outside of a class.")));
    }

    #[test]
    fn super_outside_a_class_is_an_error() {
        let errors = resolve_err("print super.m;");
        assert!(errors
            .iter()
            .any(|m| m.contains("Can't use 'super' outside of a class.")));
    }

    #[test]
    fn super_without_a_superclass_is_an_error() {
        let errors = resolve_err("class A { m() { return super.m; } }");
        assert!(errors
            .iter()
            .any(|m| m.contains("Can't use 'super' in a class with no superclass.")));
    }

    #[test]
    fn class_inheriting_from_itself_is_an_error() {
        let errors = resolve_err("class A < A {}");
        assert!(errors
            .iter()
            .any(|m| m.contains("A class can't inherit from itself.")));
    }

    #[test]
    fn merged_tables_keep_both_sides() {
        let mut left = Bindings::new();
        left.insert(NodeId(1), 0);
        let mut right = Bindings::new();
        right.insert(NodeId(2), 3);
        left.extend(right);
        assert_eq!(left.depth(NodeId(1)), Some(0));
        assert_eq!(left.depth(NodeId(2)), Some(3));
        assert_eq!(left.len(), 2);
    }
}
