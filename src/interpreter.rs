use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use log::{debug, info};

use crate::callable::{clock_native, LoxClass, LoxFunction, LoxInstance, INIT_METHOD};
use crate::environment::Environment;
use crate::error::{LoxError, Result};
use crate::expr::Expr;
use crate::stmt::Stmt;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Tree-walking evaluator.
///
/// Holds the global environment (preloaded with the `clock` native), a cursor
/// to the current environment, and the resolver's side-table mapping
/// expression ids to binding distances.  `print` output goes to the supplied
/// writer so the whole pipeline is testable against a buffer.
pub struct Interpreter<W: Write> {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<usize, usize>,
    output: W,
}

impl<W: Write> Interpreter<W> {
    pub fn new(output: W) -> Self {
        let mut globals = Environment::new();

        globals.define(
            "clock",
            Value::NativeFunction {
                name: "clock",
                arity: 0,
                func: clock_native,
            },
        );

        let globals = Rc::new(RefCell::new(globals));

        Interpreter {
            globals: Rc::clone(&globals),
            environment: globals,
            locals: HashMap::new(),
            output,
        }
    }

    /// Records a local binding: the expression with this id reads its name
    /// `depth` environments up from wherever it executes.  Called by the
    /// resolver; ids without an entry are globals.
    pub fn note_local(&mut self, id: usize, depth: usize) {
        debug!("Noting local: id={}, depth={}", id, depth);

        self.locals.insert(id, depth);
    }

    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        info!("Interpreting {} statement(s)", statements.len());

        for statement in statements {
            self.execute(statement)?;
        }

        Ok(())
    }

    pub fn execute(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(())
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;

                writeln!(self.output, "{}", value)?;

                Ok(())
            }

            Stmt::Var(name, initializer) => {
                let value: Value = if let Some(expr) = initializer {
                    self.evaluate(expr)?
                } else {
                    Value::Nil
                };

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(())
            }

            Stmt::Block(statements) => {
                let environment = Environment::with_enclosing(Rc::clone(&self.environment));

                self.execute_block(statements, Rc::new(RefCell::new(environment)))
            }

            Stmt::If(condition, then_branch, else_branch) => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }

                Ok(())
            }

            Stmt::While(condition, body) => {
                while is_truthy(&self.evaluate(condition)?) {
                    self.execute(body)?;
                }

                Ok(())
            }

            Stmt::Function(declaration) => {
                let function = LoxFunction::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );

                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(function));

                Ok(())
            }

            Stmt::Return(_keyword, value) => {
                let value: Value = if let Some(expr) = value {
                    self.evaluate(expr)?
                } else {
                    Value::Nil
                };

                // Unwinds through the same channel as runtime errors; the
                // nearest function call boundary intercepts it.
                Err(LoxError::Return(value))
            }

            Stmt::Class(name, method_decls) => {
                let mut methods = Vec::with_capacity(method_decls.len());

                for declaration in method_decls {
                    let method_name = declaration.name.lexeme.clone();

                    let method = LoxFunction::new(
                        Rc::clone(declaration),
                        Rc::clone(&self.environment),
                        method_name == INIT_METHOD,
                    );

                    methods.push((method_name, method));
                }

                let class = Rc::new(LoxClass::new(name.lexeme.clone(), methods));

                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, Value::Class(class));

                Ok(())
            }
        }
    }

    /// Runs `statements` in `environment`, restoring the previous environment
    /// on every exit path: normal completion, return unwinding, and error
    /// propagation.
    pub(crate) fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> Result<()> {
        let previous: Rc<RefCell<Environment>> = Rc::clone(&self.environment);

        self.environment = environment;

        let mut result = Ok(());

        for stmt in statements {
            result = self.execute(stmt);

            if result.is_err() {
                break;
            }
        }

        self.environment = previous;

        result
    }

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(token) => self.evaluate_literal(token),

            Expr::Unary(op, expr) => self.evaluate_unary(op, expr),

            Expr::Binary(left, op, right) => self.evaluate_binary(left, op, right),

            Expr::Logical(left, op, right) => self.evaluate_logical(left, op, right),

            Expr::Grouping(expr) => self.evaluate(expr),

            Expr::Variable(id, token) => self.lookup_variable(*id, token),

            Expr::This(id, keyword) => self.lookup_variable(*id, keyword),

            Expr::Assign(id, name, expr) => {
                let value = self.evaluate(expr)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        self.environment.borrow_mut().assign_at(
                            distance,
                            &name.lexeme,
                            value.clone(),
                            name.line,
                        )?;
                    }

                    None => {
                        self.globals.borrow_mut().assign(
                            &name.lexeme,
                            value.clone(),
                            name.line,
                        )?;
                    }
                }

                Ok(value)
            }

            Expr::Call(callee, paren, arguments) => self.evaluate_call(callee, paren, arguments),

            Expr::Get(object, name) => match self.evaluate(object)? {
                Value::Instance(instance) => LoxInstance::get(&instance, name),

                _ => Err(LoxError::runtime(
                    name.line,
                    "Only instances have properties.",
                )),
            },

            Expr::Set(object, name, value) => match self.evaluate(object)? {
                Value::Instance(instance) => {
                    let value = self.evaluate(value)?;

                    instance.borrow_mut().set(&name.lexeme, value.clone());

                    Ok(value)
                }

                _ => Err(LoxError::runtime(name.line, "Only instances have fields.")),
            },
        }
    }

    fn evaluate_literal(&self, token: &Token) -> Result<Value> {
        match &token.token_type {
            TokenType::NUMBER(n) => Ok(Value::Number(*n)),

            TokenType::STRING(s) => Ok(Value::String(s.clone())),

            TokenType::TRUE => Ok(Value::Bool(true)),

            TokenType::FALSE => Ok(Value::Bool(false)),

            TokenType::NIL => Ok(Value::Nil),

            // The parser only builds literals out of the five kinds above.
            _ => Err(LoxError::runtime(token.line, "Invalid literal.")),
        }
    }

    fn evaluate_unary(&mut self, op: &Token, expr: &Expr) -> Result<Value> {
        let value: Value = self.evaluate(expr)?;

        match op.token_type {
            TokenType::MINUS => match value {
                Value::Number(n) => Ok(Value::Number(-n)),

                _ => Err(LoxError::runtime(op.line, "Operand must be a number.")),
            },

            TokenType::BANG => Ok(Value::Bool(!is_truthy(&value))),

            _ => Err(LoxError::runtime(op.line, "Invalid unary operator.")),
        }
    }

    fn evaluate_logical(&mut self, left: &Expr, op: &Token, right: &Expr) -> Result<Value> {
        let left_val: Value = self.evaluate(left)?;

        // Short-circuit: the deciding operand is returned as-is, and the
        // right operand is never evaluated.
        match op.token_type {
            TokenType::OR if is_truthy(&left_val) => Ok(left_val),

            TokenType::AND if !is_truthy(&left_val) => Ok(left_val),

            _ => self.evaluate(right),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, op: &Token, right: &Expr) -> Result<Value> {
        let left_val: Value = self.evaluate(left)?;
        let right_val: Value = self.evaluate(right)?;

        match op.token_type {
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),

                _ => Err(LoxError::runtime(
                    op.line,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::MINUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),

                _ => Err(LoxError::runtime(op.line, "Operands must be numbers.")),
            },

            TokenType::STAR => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),

                _ => Err(LoxError::runtime(op.line, "Operands must be numbers.")),
            },

            // IEEE-754 semantics apply: division by zero yields an infinity
            // or NaN, not an error.
            TokenType::SLASH => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),

                _ => Err(LoxError::runtime(op.line, "Operands must be numbers.")),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),

            TokenType::LESS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),

                _ => Err(LoxError::runtime(op.line, "Operands must be numbers.")),
            },

            TokenType::LESS_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),

                _ => Err(LoxError::runtime(op.line, "Operands must be numbers.")),
            },

            TokenType::GREATER => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),

                _ => Err(LoxError::runtime(op.line, "Operands must be numbers.")),
            },

            TokenType::GREATER_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),

                _ => Err(LoxError::runtime(op.line, "Operands must be numbers.")),
            },

            _ => Err(LoxError::runtime(op.line, "Invalid binary operator.")),
        }
    }

    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> Result<Value> {
        let callee_val = self.evaluate(callee)?;

        let mut arg_values = Vec::with_capacity(arguments.len());

        for arg in arguments {
            arg_values.push(self.evaluate(arg)?);
        }

        match callee_val {
            Value::NativeFunction { name, arity, func } => {
                debug!("Calling native function '{}'", name);

                check_arity(arity, arg_values.len(), paren.line)?;

                func(&arg_values)
            }

            Value::Function(function) => {
                check_arity(function.arity(), arg_values.len(), paren.line)?;

                function.call(self, arg_values)
            }

            Value::Class(class) => {
                check_arity(class.arity(), arg_values.len(), paren.line)?;

                LoxClass::instantiate(&class, self, arg_values)
            }

            _ => Err(LoxError::runtime(
                paren.line,
                "Can only call functions and classes.",
            )),
        }
    }

    fn lookup_variable(&self, id: usize, name: &Token) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => self
                .environment
                .borrow()
                .get_at(distance, &name.lexeme, name.line),

            None => self.globals.borrow().get(&name.lexeme, name.line),
        }
    }
}

fn check_arity(expected: usize, actual: usize, line: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(LoxError::runtime(
            line,
            format!("Expected {} arguments but got {}.", expected, actual),
        ))
    }
}

pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,

        Value::Bool(b) => *b,

        _ => true,
    }
}
