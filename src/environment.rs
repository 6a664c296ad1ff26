use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::error::{LoxError, Result};
use crate::value::Value;

/// One frame of the lexical environment chain.
///
/// `define` always writes the current frame; `get`/`assign` walk the parent
/// chain and fail when the name is nowhere defined.  `get_at`/`assign_at` jump
/// exactly `distance` parents, as pre-computed by the resolver, and never fall
/// back to a walk: this is what keeps closures correct independent of the
/// shape of the call stack.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    pub fn define(&mut self, name: &str, value: Value) {
        debug!("Defining '{}'", name);

        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str, line: usize) -> Result<Value> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(LoxError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> Result<()> {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(LoxError::runtime(
                line,
                format!("Undefined variable '{}'.", name),
            ))
        }
    }

    pub fn get_at(&self, distance: usize, name: &str, line: usize) -> Result<Value> {
        if distance == 0 {
            self.values.get(name).cloned().ok_or_else(|| {
                LoxError::runtime(line, format!("Undefined variable '{}'.", name))
            })
        } else {
            self.enclosing
                .as_ref()
                .expect("resolved distance exceeds environment depth")
                .borrow()
                .get_at(distance - 1, name, line)
        }
    }

    pub fn assign_at(&mut self, distance: usize, name: &str, value: Value, line: usize) -> Result<()> {
        if distance == 0 {
            if self.values.contains_key(name) {
                self.values.insert(name.to_string(), value);
                Ok(())
            } else {
                Err(LoxError::runtime(
                    line,
                    format!("Undefined variable '{}'.", name),
                ))
            }
        } else {
            self.enclosing
                .as_ref()
                .expect("resolved distance exceeds environment depth")
                .borrow_mut()
                .assign_at(distance - 1, name, value, line)
        }
    }
}
