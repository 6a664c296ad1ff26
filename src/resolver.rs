//! Static resolution pass for the Lox interpreter.
//!
//! This module performs a single AST walk to:
//! 1. **Build lexical scopes**: maintains a stack of `HashMap<&str,bool>` tracking declared
//!    (false) and fully defined (true) names in each nested block or function.
//! 2. **Enforce static rules**: reports errors such as redeclaration in the same scope,
//!    reading a variable in its own initializer, invalid `return` outside functions,
//!    and illegal use of `this` outside of class methods.
//! 3. **Record binding distances**: for every variable occurrence (`Expr::Variable`,
//!    `Expr::Assign`, `Expr::This`), calls back into the interpreter to note whether it
//!    is a local (and at what depth) or a global.  This enables the runtime to perform
//!    lookups by climbing exactly the right number of environment frames.
//!
//! Errors are reported through the shared sink and resolution continues, so a
//! single pass surfaces every static error in the program.  The global scope
//! is not represented on the stack: names that fall off the bottom are
//! assumed global and get no side-table entry.

use std::collections::HashMap;
use std::io::Write;

use log::{debug, info};

use crate::callable::INIT_METHOD;
use crate::error::LoxError;
use crate::expr::Expr;
use crate::interpreter::Interpreter;
use crate::report::Reporter;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::Token;

/// What kind of function body are we inside?  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

/// Are we inside a class declaration?  Used to validate `this`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
}

/// Resolver: tracks scopes, enforces static rules, and *records* binding
/// distances (locals vs. globals) by calling back into the interpreter.
pub struct Resolver<'src, 'run, W: Write> {
    interpreter: &'run mut Interpreter<W>,
    reporter: &'run mut Reporter,
    scopes: Vec<HashMap<&'src str, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
}

impl<'src, 'run, W: Write> Resolver<'src, 'run, W> {
    /// Create a new resolver bound to the given interpreter and sink.
    pub fn new(interpreter: &'run mut Interpreter<W>, reporter: &'run mut Reporter) -> Self {
        info!("Resolver instantiated");
        Resolver {
            interpreter,
            reporter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
        }
    }

    /// Walk all top‑level statements.
    pub fn resolve(&mut self, statements: &'src [Stmt]) {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &'src Stmt) {
        debug!("Resolving stmt: {:?}", stmt);

        match stmt {
            Stmt::Class(name, methods) => {
                // 1. Declare & define the class name so methods can refer to it
                self.declare(name);
                self.define(name);

                // 2. Save and enter the class context
                let enclosing_class: ClassType = self.current_class;
                self.current_class = ClassType::Class;

                // 3. Open the implicit `this` scope for methods
                self.begin_scope();
                self.scopes.last_mut().unwrap().insert("this", true);

                // 4. Resolve each method in its own function context
                for method in methods {
                    let kind = if method.name.lexeme == INIT_METHOD {
                        FunctionType::Initializer
                    } else {
                        FunctionType::Method
                    };

                    self.resolve_function(kind, method);
                }

                // 5. Close the `this` scope and restore the outer context
                self.end_scope();
                self.current_class = enclosing_class;
            }

            Stmt::Block(statements) => {
                self.begin_scope();

                for s in statements {
                    self.resolve_stmt(s);
                }

                self.end_scope();
            }

            Stmt::Var(name, initializer) => {
                // 1. Declare the variable name (marked but not yet defined)
                self.declare(name);

                // 2. Resolve the initializer expression, if any
                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }

                // 3. Define the variable so it's readable in this scope
                self.define(name);
            }

            Stmt::Function(declaration) => {
                // Declared and defined eagerly so the function can recurse.
                self.declare(&declaration.name);
                self.define(&declaration.name);

                self.resolve_function(FunctionType::Function, declaration);
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If(condition, then_branch, else_branch) => {
                self.resolve_expr(condition);

                self.resolve_stmt(then_branch);

                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While(condition, body) => {
                self.resolve_expr(condition);

                self.resolve_stmt(body);
            }

            Stmt::Return(keyword, value) => {
                // 1. Ensure we're inside a function or method
                if self.current_function == FunctionType::None {
                    self.reporter.syntax_error(&LoxError::resolve(
                        keyword,
                        "Can't return from top-level code.",
                    ));
                }

                // 2. In an initializer, only bare `return;` is allowed
                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.reporter.syntax_error(&LoxError::resolve(
                            keyword,
                            "Can't return a value from an initializer.",
                        ));
                    }

                    self.resolve_expr(expr);
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &'src Expr) {
        match expr {
            Expr::Literal(_) => {
                // Literals have no sub‑expressions
            }

            Expr::Grouping(inner) => {
                self.resolve_expr(inner);
            }

            Expr::Unary(_, right) => {
                self.resolve_expr(right);
            }

            Expr::Binary(left, _, right) | Expr::Logical(left, _, right) => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable(id, tok) => {
                // Prevent reading a variable in its own initializer
                if let Some(scope) = self.scopes.last() {
                    if scope.get(tok.lexeme.as_str()) == Some(&false) {
                        self.reporter.syntax_error(&LoxError::resolve(
                            tok,
                            "Can't read local variable in its own initializer.",
                        ));
                    }
                }

                self.resolve_local(*id, tok);
            }

            Expr::Assign(id, name, value) => {
                // Resolve the right‑hand side first, then bind the assignment
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call(callee, _, arguments) => {
                self.resolve_expr(callee);

                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::This(id, keyword) => {
                // 'this' only valid inside class methods
                if self.current_class == ClassType::None {
                    self.reporter.syntax_error(&LoxError::resolve(
                        keyword,
                        "Can't use 'this' outside of a class.",
                    ));
                    return;
                }

                // Bind 'this' like a local variable
                self.resolve_local(*id, keyword);
            }

            Expr::Get(object, _) => {
                // Property names are looked up dynamically; only the object
                // expression resolves statically.
                self.resolve_expr(object);
            }

            Expr::Set(object, _, value) => {
                self.resolve_expr(object);
                self.resolve_expr(value);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function's parameters + body.
    ///
    /// `kind` indicates whether this is a normal function, a method, or an
    /// initializer.
    fn resolve_function(&mut self, kind: FunctionType, declaration: &'src FunctionDecl) {
        // 1. Save the enclosing function context so we can restore it later.
        let enclosing = self.current_function;
        self.current_function = kind;

        // 2. Begin a new lexical scope for the function parameters & body.
        self.begin_scope();

        // 3. Declare and immediately define each parameter in this new scope.
        for param in &declaration.params {
            self.declare(param);
            self.define(param);
        }

        // 4. Resolve each statement in the function body under the current context.
        for stmt in &declaration.body {
            self.resolve_stmt(stmt);
        }

        // 5. End the function's scope and restore the previous context.
        self.end_scope();
        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &'src Token) {
        // Only local scopes are tracked; globals may be redeclared silently.
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(name.lexeme.as_str()) {
                self.reporter.syntax_error(&LoxError::resolve(
                    name,
                    "Already a variable with this name in this scope.",
                ));
            }

            scope.insert(name.lexeme.as_str(), false);
        }
    }

    fn define(&mut self, name: &'src Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.as_str(), true);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this variable occurrence as either:
    ///  - a local at depth `d`, or
    ///  - a global if not found in any scope.
    fn resolve_local(&mut self, id: usize, name: &Token) {
        // 1. Search each scope from innermost outward
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(name.lexeme.as_str()) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);
                // 2. Tell the interpreter about the local binding
                self.interpreter.note_local(id, depth);
                return;
            }
        }

        // 3. Not found in any scope → it's a global
        debug!("Resolved '{}' as global", name.lexeme);
    }
}
