//! Runtime callables: user functions, classes, instances, and natives.
//!
//! A `LoxFunction` pairs a shared declaration with the environment captured at
//! the point of its declaration.  Invocation always allocates a child of that
//! closure, never of the caller's environment, which is what makes closures
//! observe their lexical scope regardless of call-stack shape.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;

use crate::environment::Environment;
use crate::error::{LoxError, Result};
use crate::interpreter::Interpreter;
use crate::stmt::FunctionDecl;
use crate::token::Token;
use crate::value::Value;

pub const INIT_METHOD: &str = "init";

#[derive(Debug, Clone)]
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: Rc<RefCell<Environment>>,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(
        declaration: Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        LoxFunction {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// Identity comparison: two function values are the same function only if
    /// they share both declaration and closure.
    pub fn ptr_eq(&self, other: &LoxFunction) -> bool {
        Rc::ptr_eq(&self.declaration, &other.declaration)
            && Rc::ptr_eq(&self.closure, &other.closure)
    }

    /// Produces a bound method: a copy of self whose closure is a fresh child
    /// environment defining `this` as the given instance.
    pub fn bind(&self, instance: Rc<RefCell<LoxInstance>>) -> LoxFunction {
        debug!("Binding method '{}'", self.name());

        let mut environment = Environment::with_enclosing(Rc::clone(&self.closure));
        environment.define("this", Value::Instance(instance));

        LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure: Rc::new(RefCell::new(environment)),
            is_initializer: self.is_initializer,
        }
    }

    /// Invokes the function: binds parameters in a child of the closure,
    /// executes the body, and intercepts the return-unwinding signal.
    ///
    /// Initializers always evaluate to the bound instance, whatever the body
    /// did; `this` sits at distance 0 in the bind environment, which is the
    /// closure of every bound `init`.
    pub fn call<W: Write>(
        &self,
        interpreter: &mut Interpreter<W>,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        debug!(
            "Calling function '{}' with {} argument(s)",
            self.name(),
            arguments.len()
        );

        let mut environment = Environment::with_enclosing(Rc::clone(&self.closure));

        for (param, value) in self.declaration.params.iter().zip(arguments) {
            environment.define(&param.lexeme, value);
        }

        let outcome =
            interpreter.execute_block(&self.declaration.body, Rc::new(RefCell::new(environment)));

        match outcome {
            Err(LoxError::Return(value)) => {
                if self.is_initializer {
                    self.this_binding()
                } else {
                    Ok(value)
                }
            }

            Err(e) => Err(e),

            Ok(()) => {
                if self.is_initializer {
                    self.this_binding()
                } else {
                    Ok(Value::Nil)
                }
            }
        }
    }

    fn this_binding(&self) -> Result<Value> {
        self.closure
            .borrow()
            .get_at(0, "this", self.declaration.name.line)
    }
}

#[derive(Debug)]
pub struct LoxClass {
    name: String,
    // Declaration order is preserved; later methods shadow earlier ones of
    // the same name on lookup.
    methods: Vec<(String, LoxFunction)>,
}

impl LoxClass {
    pub fn new(name: String, methods: Vec<(String, LoxFunction)>) -> Self {
        LoxClass { name, methods }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn find_method(&self, name: &str) -> Option<&LoxFunction> {
        self.methods
            .iter()
            .rev()
            .find(|(method_name, _)| method_name == name)
            .map(|(_, method)| method)
    }

    /// A class is called with exactly as many arguments as its initializer
    /// takes; without an `init`, with none.
    pub fn arity(&self) -> usize {
        self.find_method(INIT_METHOD).map_or(0, LoxFunction::arity)
    }

    /// Class call: allocate an instance, then run `init` bound to it.
    pub fn instantiate<W: Write>(
        class: &Rc<LoxClass>,
        interpreter: &mut Interpreter<W>,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        debug!("Instantiating class '{}'", class.name);

        let instance = Rc::new(RefCell::new(LoxInstance::new(Rc::clone(class))));

        if let Some(initializer) = class.find_method(INIT_METHOD) {
            initializer
                .bind(Rc::clone(&instance))
                .call(interpreter, arguments)?;
        }

        Ok(Value::Instance(instance))
    }
}

#[derive(Debug)]
pub struct LoxInstance {
    class: Rc<LoxClass>,
    fields: HashMap<String, Value>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        LoxInstance {
            class,
            fields: HashMap::new(),
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class.name
    }

    /// Property read: fields shadow methods; a method hit binds `this` to the
    /// instance.  Needs the shared handle so the bound method can retain it.
    pub fn get(instance: &Rc<RefCell<LoxInstance>>, name: &Token) -> Result<Value> {
        let borrowed = instance.borrow();

        if let Some(value) = borrowed.fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(method) = borrowed.class.find_method(&name.lexeme) {
            return Ok(Value::Function(method.bind(Rc::clone(instance))));
        }

        Err(LoxError::runtime(
            name.line,
            format!("Undefined property '{}'.", name.lexeme),
        ))
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }
}

/// The single native: seconds since the Unix epoch, as a Lox number.
pub fn clock_native(_args: &[Value]) -> Result<Value> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| LoxError::runtime(0, format!("Clock error: {}", e)))?
        .as_secs_f64();

    Ok(Value::Number(timestamp))
}
